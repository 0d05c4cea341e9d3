use serde::Serialize;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global compact subscriber. `RUST_LOG` wins over `loglevel`.
pub fn init_tracing(loglevel: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(loglevel));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();
}

/// Hands `value` as pretty JSON to `log_action`, only when DEBUG is enabled.
pub fn with_pretty_json_debug<T, F>(value: &T, log_action: F)
where
    T: Serialize,
    F: FnOnce(&str),
{
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }

    let pretty_json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|error| format!("<pretty serialize failed: {error}>"));
    log_action(pretty_json.as_str());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_json_skipped_without_debug_subscriber() {
        let mut called = false;
        with_pretty_json_debug(&serde_json::json!({"alias": "rt"}), |_| called = true);
        assert!(!called);
    }
}
