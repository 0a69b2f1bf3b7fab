/////////////////////////////////////////////////////////////////////////////////////
//
// Outbreak model
//
// logging module
//
// console logging for the command line runner
//
////////////////////////////////////////////////////////////////////////////////////

use super::error::OutbreakError;
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Config;
use std::str::FromStr;

// ISO 8601 timestamp and a colour coded level tag
const LOG_PATTERN: &str = "{d(%Y-%m-%dT%H:%M:%S)} {h({l})} {t} - {m}{n}";

pub const DEFAULT_LEVEL: LevelFilter = LevelFilter::Info;

// "info", "debug", ... - anything unrecognised is an error
pub fn parse_level(level: &str) -> Result<LevelFilter, OutbreakError> {
    LevelFilter::from_str(level)
        .map_err(|_| OutbreakError::Logging(format!("unknown log level '{}'", level)))
}

fn console_config(level: LevelFilter) -> Result<Config, OutbreakError> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build();
    Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))
        .map_err(|e| OutbreakError::Logging(e.to_string()))
}

// installs the global logger - can only be done once per process
pub fn init(level: LevelFilter) -> Result<(), OutbreakError> {
    let config = console_config(level)?;
    log4rs::init_config(config).map_err(|e| OutbreakError::Logging(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_levels() {
        assert_eq!(parse_level("debug").unwrap(), LevelFilter::Debug);
        assert_eq!(parse_level("WARN").unwrap(), LevelFilter::Warn);
        assert!(parse_level("chatty").is_err());
    }

    #[test]
    fn builds_a_console_config() {
        assert!(console_config(LevelFilter::Trace).is_ok());
    }
}
