//! Logging setup utilities for the Hiroba relay.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// Logs from the Hiroba crates, `tower_http` and the binary itself are enabled
/// at `default_log_level`. The filter can be overridden using the `RUST_LOG`
/// environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "hiroba_server")
/// * `default_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use hiroba_shared::logger::setup_logger;
///
/// setup_logger("hiroba_server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the default `EnvFilter` directive string.
fn default_filter(binary_name: &str, default_log_level: &str) -> String {
    format!(
        "hiroba_shared={level},hiroba_server={level},tower_http={level},{}={level}",
        binary_name.replace('-', "_"),
        level = default_log_level,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_contains_all_crates() {
        // テスト項目: デフォルトのフィルタに全クレートとバイナリが含まれる
        // given (前提条件):
        let binary_name = "hiroba-server";

        // when (操作):
        let filter = default_filter(binary_name, "info");

        // then (期待する結果):
        assert!(filter.contains("hiroba_shared=info"));
        assert!(filter.contains("hiroba_server=info"));
        assert!(filter.contains("tower_http=info"));
        // バイナリ名のハイフンはアンダースコアに変換される
        assert!(filter.ends_with("hiroba_server=info"));
    }
}
