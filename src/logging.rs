//! Logger setup for hosts that do not install their own `log` backend.
//!
//! On Android, stderr of an app process is discarded, so records go to
//! logcat through `android_logger`. Everywhere else `env_logger` writes them
//! to stderr. Both read the same filter.

/// Environment variable holding the log filter (`env_logger` syntax).
pub const LOG_ENV: &str = "ESPEAK_BRIDGE_LOG";

/// Logcat tag used on Android.
pub const LOG_TAG: &str = "eSpeakService";

const DEFAULT_FILTER: &str = "info";

fn filter_spec() -> String {
    std::env::var(LOG_ENV).unwrap_or_else(|_| DEFAULT_FILTER.to_string())
}

#[cfg(any(target_os = "android", test))]
fn parse_filter(spec: &str) -> env_logger::filter::Filter {
    env_logger::filter::Builder::new().parse(spec).build()
}

/// Install the platform logger, filtered by [`LOG_ENV`] (default `info`).
///
/// Safe to call repeatedly; only the first call installs a logger, and an
/// already-installed logger from the host is left in place.
#[cfg(not(target_os = "android"))]
pub fn init() {
    if env_logger::Builder::new()
        .parse_filters(&filter_spec())
        .format_target(false)
        .try_init()
        .is_ok()
    {
        log::debug!("logging initialized");
    }
}

/// Install the logcat logger under [`LOG_TAG`], filtered by [`LOG_ENV`]
/// (default `info`). Safe to call repeatedly.
#[cfg(target_os = "android")]
pub fn init() {
    let filter = parse_filter(&filter_spec());
    android_logger::init_once(
        android_logger::Config::default()
            .with_tag(LOG_TAG)
            .with_max_level(filter.filter())
            .with_filter(filter),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::LevelFilter;

    #[test]
    fn init_is_idempotent() {
        init();
        init();
        log::info!("still logging");
    }

    #[test]
    fn default_filter_keeps_info() {
        assert_eq!(parse_filter(DEFAULT_FILTER).filter(), LevelFilter::Info);
    }

    #[test]
    fn filter_accepts_module_directives() {
        let filter = parse_filter("warn,espeak_bridge::bridge=trace");
        assert_eq!(filter.filter(), LevelFilter::Trace);
        assert_eq!(parse_filter("off").filter(), LevelFilter::Off);
    }
}
