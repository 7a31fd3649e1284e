use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Installs the global `tracing` subscriber (fmt output, `RUST_LOG` aware).
///
/// Safe to call more than once; only the first call has an effect. If the
/// host application already installed a subscriber, that one is kept.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::from_default_env();
        let filter = match "spending_analysis_core=info".parse() {
            Ok(directive) => filter.add_directive(directive),
            Err(_) => filter,
        };

        if fmt().with_env_filter(filter).try_init().is_ok() {
            tracing::info!("spending-analysis-core tracing initialized");
        }
    });
}
