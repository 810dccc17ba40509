use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

use crate::domain::payment::ProcessedPayment;
use crate::domain::repository::PaymentRepository;
use crate::domain::summary::{AggregatedSummary, Summary};

const SUMMARY_SQL: &str = "
	SELECT
		COUNT(*) FILTER (WHERE gateway_type = 0)                         AS default_total_requests,
		COALESCE(SUM(amount) FILTER (WHERE gateway_type = 0), 0::float8) AS default_total_amount,
		COUNT(*) FILTER (WHERE gateway_type = 1)                         AS fallback_total_requests,
		COALESCE(SUM(amount) FILTER (WHERE gateway_type = 1), 0::float8) AS fallback_total_amount
	FROM payments
	WHERE ($1::timestamptz IS NULL OR requested_at >= $1)
	  AND ($2::timestamptz IS NULL OR requested_at <= $2)
";

const UPSERT_SQL: &str = "
	INSERT INTO payments (correlation_id, amount, gateway_type, requested_at)
	VALUES ($1, $2, $3, $4)
	ON CONFLICT (correlation_id) DO UPDATE
	SET amount       = EXCLUDED.amount,
	    gateway_type = EXCLUDED.gateway_type,
	    requested_at = EXCLUDED.requested_at
";

#[derive(Clone)]
pub struct PostgresPaymentRepository {
	pool: Pool,
}

impl PostgresPaymentRepository {
	pub async fn connect(
		conn_string: &str,
		max_size: usize,
	) -> anyhow::Result<Self> {
		let pg_config = conn_string.parse::<tokio_postgres::Config>()?;

		let manager = Manager::from_config(pg_config, NoTls, ManagerConfig {
			recycling_method: RecyclingMethod::Fast,
		});
		let pool = Pool::builder(manager).max_size(max_size).build()?;

		let repo = Self { pool };
		repo.ensure_schema().await?;
		Ok(repo)
	}

	async fn ensure_schema(&self) -> anyhow::Result<()> {
		let client = self.pool.get().await?;
		client
			.execute(
				"CREATE TABLE IF NOT EXISTS payments (
					correlation_id TEXT PRIMARY KEY,
					amount         DOUBLE PRECISION NOT NULL,
					gateway_type   SMALLINT NOT NULL,
					requested_at   TIMESTAMPTZ NOT NULL
				)",
				&[],
			)
			.await?;
		Ok(())
	}
}

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
	async fn save(
		&self,
		payment: &ProcessedPayment,
	) -> Result<(), Box<dyn std::error::Error + Send>> {
		let client = self
			.pool
			.get()
			.await
			.map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send>)?;

		let gateway_type = payment.gateway.as_wire() as i16;
		client
			.execute(UPSERT_SQL, &[
				&payment.correlation_id,
				&payment.amount,
				&gateway_type,
				&payment.requested_at,
			])
			.await
			.map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send>)?;

		Ok(())
	}

	async fn summary(
		&self,
		from: Option<DateTime<Utc>>,
		to: Option<DateTime<Utc>>,
	) -> Result<AggregatedSummary, Box<dyn std::error::Error + Send>> {
		let client = self
			.pool
			.get()
			.await
			.map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send>)?;

		let row = client
			.query_one(SUMMARY_SQL, &[&from, &to])
			.await
			.map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send>)?;

		Ok(AggregatedSummary {
			default:  Summary {
				total_requests: row.get(0),
				total_amount:   row.get(1),
			},
			fallback: Summary {
				total_requests: row.get(2),
				total_amount:   row.get(3),
			},
		})
	}

	async fn clear(&self) -> Result<(), Box<dyn std::error::Error + Send>> {
		let client = self
			.pool
			.get()
			.await
			.map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send>)?;

		client
			.execute("TRUNCATE payments", &[])
			.await
			.map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send>)?;

		Ok(())
	}
}
