use tracing_subscriber::{FmtSubscriber, filter::LevelFilter, util::SubscriberInitExt};

/// Installs a subscriber printing to stderr. Warnings are always shown; `verbose` adds
/// everything down to trace level.
///
/// Records from the `log` macros used by the library are forwarded to the subscriber.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::TRACE
    } else {
        LevelFilter::WARN
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .without_time()
        .finish();
    // Only fails if a subscriber is already installed.
    let _ = subscriber.try_init();
}
