use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();
    if let Err(e) = mamo::runtime::run() {
        error!(error = %e, "mamo exited with an error");
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins; otherwise info-level logs from this crate, on stderr.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mamo=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
