use health_assistant_service::{ServiceConfig, create_app};
use tokio::net::TcpListener;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    let app = create_app(&config);
    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    let addr = listener.local_addr()?;

    info!("Health Assistant Service starting on {}", addr);
    info!(
        reasoning_model = %config.reasoning_model,
        translation_model = %config.translation_model,
        timeout_secs = config.reasoning_timeout.as_secs(),
        "reasoning agent configured"
    );
    info!("Query endpoint: POST http://{}/assistant/{{session_id}}/query", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
