use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "shanyraq=info,shanyraq_catalog=info";

/// Install the global subscriber. Logs go to stderr so tables and JSON on
/// stdout stay clean.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("shanyraq=debug,shanyraq_catalog=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    // A second init (e.g. from tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
