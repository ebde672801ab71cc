use tracing_subscriber::EnvFilter;

/// Initialize logging for consumers of the library. Honors `RUST_LOG` when
/// set, otherwise defaults to info-level output for this crate. Safe to call
/// more than once; later calls are no-ops.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("chapterize=info,warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
