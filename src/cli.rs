//! Command-line interface

use clap::Parser;
use std::path::PathBuf;

/// Validate the tau trigger decision against its offline emulation, and scan
/// ditau trigger thresholds on selected events
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Opt {
    /// Comma-separated list of JSON-lines event files
    pub files: String,

    /// Analysis configuration file [default: analysis.cfg if it exists]
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Where the results should be written
    #[arg(long, short, default_value = "trigval.json")]
    pub output: PathBuf,

    /// Stop after this many events
    #[arg(long)]
    pub max_events: Option<usize>,

    /// Verbosity level
    ///
    /// Possible values with increasing amount of output are
    /// 'off', 'error', 'warn', 'info', 'debug', 'trace'.
    #[arg(long, default_value = "info")]
    pub loglevel: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Opt::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let opt = Opt::parse_from(["trigval", "a.jsonl,b.jsonl"]);
        assert_eq!(opt.files, "a.jsonl,b.jsonl");
        assert_eq!(opt.config, None);
        assert_eq!(opt.output, PathBuf::from("trigval.json"));
        assert_eq!(opt.max_events, None);
        assert_eq!(opt.loglevel, "info");

        let opt = Opt::parse_from([
            "trigval",
            "--config",
            "analysis.cfg",
            "--max-events",
            "100",
            "--loglevel",
            "debug",
            "events.jsonl",
        ]);
        assert_eq!(opt.config, Some(PathBuf::from("analysis.cfg")));
        assert_eq!(opt.max_events, Some(100));
    }
}
