//! Server log verbosity: `-v` repeated, or `TIMEKEEP_LOG_LEVEL` as a count or
//! level name. `RUST_LOG` directives still override the result.

use clap::{builder::ValueParser, Arg, ArgAction, Command};
use tracing::Level;

pub const ARG_VERBOSITY: &str = "verbosity";

/// Level names in verbosity order; a count of zero logs errors only.
const LEVELS: [(&str, Level); 5] = [
    ("error", Level::ERROR),
    ("warn", Level::WARN),
    ("info", Level::INFO),
    ("debug", Level::DEBUG),
    ("trace", Level::TRACE),
];

/// Tracing level for a verbosity count; counts past `trace` saturate.
#[must_use]
pub fn level(verbosity: u8) -> Level {
    LEVELS
        .get(usize::from(verbosity))
        .map_or(Level::TRACE, |(_, level)| *level)
}

fn parse_verbosity(value: &str) -> Result<u8, String> {
    let value = value.trim();
    let index = match value.parse::<usize>() {
        Ok(count) => Some(count).filter(|count| *count < LEVELS.len()),
        Err(_) => LEVELS
            .iter()
            .position(|(name, _)| name.eq_ignore_ascii_case(value)),
    };
    index
        .and_then(|index| u8::try_from(index).ok())
        .ok_or_else(|| {
            format!("invalid log level {value:?}, expected 0-4 or error, warn, info, debug, trace")
        })
}

#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(parse_verbosity)
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Increase log output (-v warn, -vv info, -vvv request spans and queries, -vvvv trace); RUST_LOG overrides")
            .env("TIMEKEEP_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_accepts_counts_and_names() {
        assert_eq!(parse_verbosity("0"), Ok(0));
        assert_eq!(parse_verbosity("4"), Ok(4));
        assert_eq!(parse_verbosity("INFO"), Ok(2));
        assert_eq!(parse_verbosity(" debug "), Ok(3));
        assert!(parse_verbosity("5").is_err());
        assert!(parse_verbosity("verbose").is_err());
    }

    #[test]
    fn verbosity_count_maps_to_levels() {
        assert_eq!(level(0), Level::ERROR);
        assert_eq!(level(1), Level::WARN);
        assert_eq!(level(2), Level::INFO);
        assert_eq!(level(3), Level::DEBUG);
        assert_eq!(level(9), Level::TRACE);
    }
}
