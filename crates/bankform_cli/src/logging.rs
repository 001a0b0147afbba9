//! stderr logging for the command-line front end.

use tracing::level_filters::LevelFilter;

/// Map `-q` / `-v` counts to a level filter. Errors are always shown.
pub fn derive_level_filter(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the global fmt subscriber writing compact lines to stderr.
pub fn init_logging(level: LevelFilter) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_wins_over_verbose() {
        assert_eq!(derive_level_filter(3, true), LevelFilter::ERROR);
    }

    #[test]
    fn verbosity_steps() {
        assert_eq!(derive_level_filter(0, false), LevelFilter::WARN);
        assert_eq!(derive_level_filter(1, false), LevelFilter::INFO);
        assert_eq!(derive_level_filter(2, false), LevelFilter::DEBUG);
        assert_eq!(derive_level_filter(9, false), LevelFilter::TRACE);
    }
}
