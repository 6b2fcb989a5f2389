use tracing_subscriber::EnvFilter;

/// Set up stderr logging. `RUST_LOG` wins over `debug` when set.
///
/// Stdout is left alone so JSON output can be piped.
pub fn init(debug: bool) {
    let default_level = if debug {
        "listingfinder=debug,info"
    } else {
        "listingfinder=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second init (e.g. from tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .try_init();
}
