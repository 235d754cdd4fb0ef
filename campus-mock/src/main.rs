use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use campus_mock::{AppState, create_router};

#[derive(Parser)]
#[command(name = "campus-mock")]
#[command(about = "Mock campus dashboard REST API with sample data")]
struct Args {
    /// Listen address for the REST API
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Start with empty collections instead of sample data
    #[arg(long)]
    empty: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("campus_mock=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    let args = Args::parse();

    let state = if args.empty {
        AppState::empty()
    } else {
        AppState::new()
    };
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    info!("Mock server listening on http://{}/api", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = signal::ctrl_c().await;
            info!("Received SIGINT");
        })
        .await?;

    info!("Mock server stopped");
    Ok(())
}
