//! This module contains all the command line parsing code and provides a `Config` struct that
//! encapsulates all the parsed configuration options.

use crate::forest::Mode;
use crate::parallel::{default_threads, SearchConfig};
use clap::{crate_authors, crate_name, crate_version, App, Arg};
use std::ffi::OsString;
use std::time::Duration;

/// A structure to hold all the configuration parameters
#[derive(Clone, Debug)]
pub struct Config {
    /// The name of the input file
    pub input: String,

    /// The name of the output file
    pub output: Option<String>,

    /// What to compute
    pub mode: Mode,

    /// Replace common subtrees by placeholder leaves before the search
    pub use_reduction: bool,

    /// Memoize explored search states
    pub use_cache: bool,

    /// The number of worker threads to use
    pub num_threads: usize,

    /// Stop the search after this long
    pub time_limit: Option<Duration>,

    /// Report all forests of the minimum size
    pub all_forests: bool,

    /// How chatty the log is: 0 = warnings, 1 = info, 2 or more = debug
    pub verbosity: u64,
}

impl Config {
    /// Create a new config object from the command line arguments
    pub fn new() -> Self {
        Self::from_args(std::env::args_os())
    }

    /// Create a config object from the given arguments, the first being the program name
    pub fn from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        // Define the acceptable arguments
        let arg_list = [
            Arg::with_name("input")
                .required(true)
                .takes_value(true)
                .value_name("input")
                .help("input file")
                .long_help(
"input file; contains the two trees to compare in Newick format, one tree per line"),
            Arg::with_name("output")
                .required(false)
                .takes_value(true)
                .value_name("output")
                .short("o")
                .long("output")
                .help("output file")
                .long_help(
"output file; receives the distance followed by the forests or networks found"),
            Arg::with_name("mode")
                .required(false)
                .takes_value(true)
                .value_name("mode")
                .short("m")
                .long("mode")
                .validator(validate_mode)
                .help("what to compute: hybrid, network or rspr")
                .long_help(
"what to compute; \"hybrid\" = the hybridization number via a maximum acyclic agreement forest, \
\"network\" = hybridization networks built from all maximum acyclic agreement forests, \
\"rspr\" = the rSPR distance via a maximum agreement forest. The default is \"hybrid\"."),
            Arg::with_name("num_threads")
                .short("p")
                .long("num-threads")
                .required(false)
                .takes_value(true)
                .value_name("n")
                .validator(validate_num_threads)
                .help("the number of threads to use")
                .long_help(
"the number of threads to use; \"native\" = one thread less than the number of logical cores, \
but at least one. If this option is absent, this is equivalent to \"-p native\"."),
            Arg::with_name("dont_use_reduction")
                .required(false)
                .takes_value(false)
                .short("c")
                .long("no-reduction")
                .help("disable common subtree reduction")
                .long_help("do not replace subtrees common to both trees by single leaves"),
            Arg::with_name("dont_use_cache")
                .required(false)
                .takes_value(false)
                .long("no-cache")
                .help("disable memoization of search states")
                .long_help(
"do not remember explored search states; slower, but uses less memory"),
            Arg::with_name("time_limit")
                .short("t")
                .long("time-limit")
                .required(false)
                .takes_value(true)
                .value_name("seconds")
                .validator(validate_time_limit)
                .help("stop the search after this many seconds")
                .long_help(
"stop the search after this many seconds and report the bounds on the distance known at that \
point instead of the exact distance"),
            Arg::with_name("all_forests")
                .short("a")
                .long("all")
                .required(false)
                .takes_value(false)
                .help("report all forests of minimum size")
                .long_help(
"report all forests of minimum size instead of the first one found; always done in network mode"),
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .required(false)
                .takes_value(false)
                .help("log progress; repeat for more detail")
                .long_help(
"log progress (-v) or details of the search (-vv); RUST_LOG overrides this setting"),
        ];

        // Parse the arguments
        let args = App::new(crate_name!())
            .version(crate_version!())
            .author(crate_authors!())
            .about("Compute the hybridization number or rSPR distance of two rooted binary trees")
            .long_about(
"Compute the hybridization number, a minimum hybridization network or the rSPR distance of \
two rooted binary phylogenetic trees from a maximum (acyclic) agreement forest")
            .args(&arg_list)
            .get_matches_from(args);

        let input         = args.value_of("input").unwrap_or_default().to_string();
        let output        = args.value_of("output").map(|s| s.to_string());
        let mode          = args.value_of("mode").and_then(|s| s.parse().ok()).unwrap_or_default();
        let use_reduction = !args.is_present("dont_use_reduction");
        let use_cache     = !args.is_present("dont_use_cache");
        let num_threads   = num_threads(args.value_of("num_threads"));
        let time_limit    = time_limit(args.value_of("time_limit"));
        let all_forests   = args.is_present("all_forests");
        let verbosity     = args.occurrences_of("verbose");

        Self {
            input,
            output,
            mode,
            use_reduction,
            use_cache,
            num_threads,
            time_limit,
            all_forests,
            verbosity,
        }
    }

    /// The search parameters chosen on the command line
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            num_threads: self.num_threads,
            mode:        self.mode,
            use_cache:   self.use_cache,
            all_forests: self.all_forests,
            time_limit:  self.time_limit,
        }
    }

    /// The default log filter for the chosen verbosity
    pub fn log_level(&self) -> &'static str {
        match self.verbosity {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

/// Check that the mode is one we know
fn validate_mode(arg: String) -> Result<(), String> {
    arg.parse::<Mode>().map(|_| ())
}

/// Check that the provided number of threads is valid
fn validate_num_threads(arg: String) -> Result<(), String> {
    match arg.parse::<usize>() {
        Ok(x) if x > 0 => Ok(()),
        Err(_) if arg.to_lowercase() == "native" => Ok(()),
        _ => Err(String::from(
            "Number of threads must be \"native\" or a positive integer",
        )),
    }
}

/// Query the number of threads to use
fn num_threads(arg: Option<&str>) -> usize {
    match arg.map(|arg| arg.parse::<usize>()) {
        Some(Ok(n)) => n,
        _ => default_threads(),
    }
}

/// Check that the time limit is a positive number of seconds
fn validate_time_limit(arg: String) -> Result<(), String> {
    match arg.parse::<f64>() {
        Ok(x) if x > 0.0 && x.is_finite() => Ok(()),
        _ => Err(String::from("Time limit must be a positive number of seconds")),
    }
}

/// Query the time limit
fn time_limit(arg: Option<&str>) -> Option<Duration> {
    arg.and_then(|arg| arg.parse::<f64>().ok()).map(Duration::from_secs_f64)
}

#[cfg(test)]
mod tests {

    use super::*;

    /// Defaults
    #[test]
    fn defaults() {
        let cfg = Config::from_args(vec!["maaf", "trees.nwk"]);
        assert_eq!(cfg.input, "trees.nwk");
        assert_eq!(cfg.output, None);
        assert_eq!(cfg.mode, Mode::HybridNumber);
        assert!(cfg.use_reduction);
        assert!(cfg.use_cache);
        assert_eq!(cfg.num_threads, default_threads());
        assert_eq!(cfg.time_limit, None);
        assert_eq!(cfg.log_level(), "warn");
    }

    /// All options given
    #[test]
    fn options() {
        let cfg = Config::from_args(vec![
            "maaf", "-o", "out.txt", "-m", "rspr", "-p", "3", "-c", "--no-cache", "-t", "2.5",
            "-a", "-vv", "trees.nwk",
        ]);
        assert_eq!(cfg.output.as_deref(), Some("out.txt"));
        assert_eq!(cfg.mode, Mode::RsprDistance);
        assert_eq!(cfg.num_threads, 3);
        assert!(!cfg.use_reduction);
        assert!(!cfg.use_cache);
        assert_eq!(cfg.time_limit, Some(Duration::from_millis(2500)));
        assert!(cfg.all_forests);
        assert_eq!(cfg.log_level(), "debug");
        let search = cfg.search_config();
        assert_eq!(search.num_threads, 3);
        assert!(!search.first_only());
    }

    /// Validators
    #[test]
    fn validators() {
        assert!(validate_num_threads("native".to_string()).is_ok());
        assert!(validate_num_threads("0".to_string()).is_err());
        assert!(validate_time_limit("1".to_string()).is_ok());
        assert!(validate_time_limit("-1".to_string()).is_err());
        assert!(validate_mode("network".to_string()).is_ok());
        assert!(validate_mode("tree".to_string()).is_err());
    }
}
