//! Structured logging via `tracing`.
//!
//! The core emits events with stable field names (`ev`, `code`, `dur_ms`) so
//! log lines stay machine parsable when the JSON formatter is selected.

use tracing_subscriber::EnvFilter;

use crate::common::config::AppCfg;

/// Install the global subscriber. Returns `false` when one is already set.
pub fn init(filter: &str, json: bool) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(filter))
        .with_target(true);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.is_ok()
}

/// Install the subscriber described by `cfg`.
pub fn init_from(cfg: &AppCfg) -> bool {
    init(&cfg.log_filter, cfg.log_json)
}

/// Parse `directives`, falling back to `info` when they are malformed.
fn env_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_refused() {
        let _ = init("yieldcast=debug", false);
        assert!(!init("info", true));
    }

    #[test]
    fn malformed_filter_falls_back_to_info() {
        use tracing::level_filters::LevelFilter;

        assert_eq!(env_filter("yieldcast=loudest").max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(env_filter("yieldcast=debug").max_level_hint(), Some(LevelFilter::DEBUG));
    }
}
