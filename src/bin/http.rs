#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use clap::Parser;
    use std::net::SocketAddr;
    use std::path::PathBuf;
    use tracing_subscriber::EnvFilter;
    use work_trace::{JsonSettingsStore, SettingsStore, http_api};

    #[derive(Parser)]
    #[command(name = "http", about = "work-trace schedule HTTP API")]
    struct Args {
        /// Address to listen on.
        #[arg(long, env = "WORK_TRACE_HTTP_ADDR", default_value = "0.0.0.0:3000")]
        addr: SocketAddr,
        /// Settings JSON file; defaults are used when absent.
        #[arg(long, env = "WORK_TRACE_SETTINGS")]
        settings: Option<PathBuf>,
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings = match &args.settings {
        Some(path) => JsonSettingsStore::new(path).load_or_default()?,
        None => Default::default(),
    };

    tracing::info!(addr = %args.addr, "work-trace HTTP API listening");
    http_api::serve(args.addr, settings).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
