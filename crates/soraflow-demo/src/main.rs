//! Sample backend for a deployed web stack
//!
//! A small HTTP server with a landing page and a JSON API, intended to
//! be deployed to the web apps a stack provisions. App Service injects
//! the listen port through the PORT environment variable.

mod app;

use clap::Parser;

#[derive(Parser)]
#[command(name = "sora-demo")]
#[command(about = "Sample backend for a deployed web stack", long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app::router()).await?;

    Ok(())
}
