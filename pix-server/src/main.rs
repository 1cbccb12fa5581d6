use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = pix_server::config::load().snapshot();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.get("log.format") == Some("json") {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let ax = pix_server::build(&config)?;
    let addr = pix_server::bind_address(&config);

    println!("[pix] listening on http://{addr}");

    ax.listen(addr).await?;

    Ok(())
}
