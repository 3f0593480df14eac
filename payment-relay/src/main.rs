use payment_relay::{config::Config, Application};
use service_core::observability::{init_tracing, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("info,payment_relay=debug", LogFormat::from_env());

    let config = Config::from_env()?;
    let application = Application::build(config).await?;
    application.run_until_stopped().await?;

    Ok(())
}
