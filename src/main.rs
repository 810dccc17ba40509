use payment_proxy::infrastructure::config::settings::Settings;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
	env_logger::init();

	let settings = Settings::load().expect("Failed to load configuration");

	payment_proxy::run(settings).await
}
