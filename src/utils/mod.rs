//! The `utils` module provides the typed errors and logging setup shared by
//! the rest of `quotehub`.

pub mod error;
pub mod logging;

#[cfg(test)]
mod tests {
    use super::logging;
    use serial_test::serial;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    #[serial]
    fn logging_init_accepts_levels() {
        // Should not panic
        logging::init("info");
        logging::init("debug");
        logging::init("warn");
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        assert_eq!(logging::parse_level("loud"), tracing::Level::INFO);
        assert_eq!(logging::parse_level("WARNING"), tracing::Level::WARN);
        assert_eq!(logging::parse_level("Trace"), tracing::Level::TRACE);
    }

    #[test]
    #[serial]
    fn cli_level_applies_without_rust_log() {
        temp_env::with_var_unset("RUST_LOG", || {
            let filter = logging::filter("debug");
            assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
        });
    }

    #[test]
    #[serial]
    fn rust_log_overrides_cli_level() {
        temp_env::with_var("RUST_LOG", Some("warn"), || {
            let filter = logging::filter("trace");
            assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
        });
    }
}
