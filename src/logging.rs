use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "parcel_checkin=info";
const VERBOSE_LOG_FILTER: &str = "parcel_checkin=debug";

/// Picks the filter: `PARCEL_CHECKIN_LOG`, then `RUST_LOG`, then the default.
pub fn filter_directive(verbose: bool) -> String {
    std::env::var("PARCEL_CHECKIN_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| {
            if verbose {
                VERBOSE_LOG_FILTER.to_string()
            } else {
                DEFAULT_LOG_FILTER.to_string()
            }
        })
}

/// Logs go to stderr; stdout is kept for the courier-facing output.
pub fn init(verbose: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(filter_directive(verbose))
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()?;

    Ok(())
}
