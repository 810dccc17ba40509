use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// The two remote payment processors. The default gateway is cheaper; the
/// fallback is costlier but presumed more available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayType {
	Default,
	Fallback,
}

impl GatewayType {
	pub fn as_wire(&self) -> u8 {
		match self {
			GatewayType::Default => 0,
			GatewayType::Fallback => 1,
		}
	}

	pub fn from_wire(value: u8) -> Option<GatewayType> {
		match value {
			0 => Some(GatewayType::Default),
			1 => Some(GatewayType::Fallback),
			_ => None,
		}
	}
}

impl fmt::Display for GatewayType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			GatewayType::Default => write!(f, "default"),
			GatewayType::Fallback => write!(f, "fallback"),
		}
	}
}

impl Serialize for GatewayType {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_u8(self.as_wire())
	}
}

impl<'de> Deserialize<'de> for GatewayType {
	fn deserialize<D: Deserializer<'de>>(
		deserializer: D,
	) -> Result<Self, D::Error> {
		let value = u8::deserialize(deserializer)?;
		GatewayType::from_wire(value)
			.ok_or_else(|| de::Error::custom(format!("invalid gateway type: {value}")))
	}
}

/// Encodes a best-gateway decision for the shared KV entry.
pub fn encode_decision(decision: Option<GatewayType>) -> &'static str {
	match decision {
		Some(GatewayType::Default) => "0",
		Some(GatewayType::Fallback) => "1",
		None => "",
	}
}

/// Decodes the shared KV entry. An empty or unknown value means no gateway.
pub fn decode_decision(value: &str) -> Option<GatewayType> {
	match value {
		"0" => Some(GatewayType::Default),
		"1" => Some(GatewayType::Fallback),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_wire_roundtrip() {
		assert_eq!(GatewayType::from_wire(0), Some(GatewayType::Default));
		assert_eq!(GatewayType::from_wire(1), Some(GatewayType::Fallback));
		assert_eq!(GatewayType::from_wire(2), None);
		assert_eq!(GatewayType::Default.as_wire(), 0);
		assert_eq!(GatewayType::Fallback.as_wire(), 1);
	}

	#[test]
	fn test_serde_as_integer() {
		let json = serde_json::to_string(&GatewayType::Fallback).unwrap();
		assert_eq!(json, "1");

		let parsed: GatewayType = serde_json::from_str("0").unwrap();
		assert_eq!(parsed, GatewayType::Default);

		assert!(serde_json::from_str::<GatewayType>("7").is_err());
	}

	#[test]
	fn test_decision_encoding() {
		assert_eq!(encode_decision(Some(GatewayType::Default)), "0");
		assert_eq!(encode_decision(Some(GatewayType::Fallback)), "1");
		assert_eq!(encode_decision(None), "");

		assert_eq!(decode_decision("0"), Some(GatewayType::Default));
		assert_eq!(decode_decision("1"), Some(GatewayType::Fallback));
		assert_eq!(decode_decision(""), None);
		assert_eq!(decode_decision("garbage"), None);
	}
}
