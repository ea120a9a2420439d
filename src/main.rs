use msgbridge::{Config, Server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), msgbridge::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let app = msgbridge::initialize();
    let config = Config::from_env()?;

    Server::bind(config.addr).serve(app).await
}
