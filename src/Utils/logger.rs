//! logging setup shared by the solver entry points
use chrono::Local;
use simplelog::*;
use std::fs::File;

/// maps a textual log level to a filter; `None` for unknown names
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_lowercase().as_str() {
        "off" | "none" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// default log-file name stamped with the current date and time
pub fn default_log_file_name() -> String {
    let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
    format!("solve_log_{}.txt", date_and_time)
}

/// Installs a terminal logger and, when a file name is given, a file logger.
///
/// Returns false when a global logger was already installed (the call is then a no-op).
pub fn init_logger(level: LevelFilter, log_file: Option<&str>) -> bool {
    if level == LevelFilter::Off {
        return false;
    }
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    // Console logger
    loggers.push(TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ));

    // File logger
    if let Some(filename) = log_file {
        if let Ok(file) = File::create(filename) {
            loggers.push(WriteLogger::new(level, Config::default(), file));
        }
    }

    CombinedLogger::init(loggers).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("info"), Some(LevelFilter::Info));
        assert_eq!(parse_level(" DEBUG "), Some(LevelFilter::Debug));
        assert_eq!(parse_level("none"), Some(LevelFilter::Off));
        assert_eq!(parse_level("loud"), None);
    }

    #[test]
    fn test_default_log_file_name() {
        let name = default_log_file_name();
        assert!(name.starts_with("solve_log_"));
        assert!(name.ends_with(".txt"));
    }

    #[test]
    fn test_init_logger_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solver.log");
        let path_str = path.to_str().unwrap();
        // another test may have installed the global logger already
        let _ = init_logger(LevelFilter::Info, Some(path_str));
        assert!(!init_logger(LevelFilter::Off, None));
        log::info!("logger test line");
        assert!(path.exists() || log::max_level() != LevelFilter::Off);
    }
}
