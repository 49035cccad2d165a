use crate::filewalker::LineBudget;
use crate::highlight::DEFAULT_THEME;
use crate::patterns::{ExtensionFilter, PatternSet, load_ignore_file};
use crate::utils::{expand_tilde, normalize_cli_path};
use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_LINES: i64 = 3500;
pub const DEFAULT_OUTPUT: &str = "output.html";
pub const DEFAULT_IGNORE_FILE: &str = "ignore.txt";
pub const DEFAULT_FILE_FOOTER: &str = "</br>";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("source paths do not exist: {}", join_paths(.0))]
    MissingSources(Vec<PathBuf>),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub sources: Vec<PathBuf>,
    pub extensions: ExtensionFilter,
    pub line_budget: LineBudget,
    pub output_path: PathBuf,
    pub ignore_patterns: PatternSet,
    pub file_footer: String,
    pub theme: String,
    pub title: String,
}

impl Config {
    /// A configuration with the command line defaults, except that nothing is
    /// ignored since no ignore file is read.
    pub fn new(sources: Vec<PathBuf>, output_path: PathBuf) -> Self {
        Self {
            sources,
            extensions: ExtensionFilter::all(),
            line_budget: LineBudget::from_cli(DEFAULT_LINES),
            output_path,
            ignore_patterns: PatternSet::empty(),
            file_footer: DEFAULT_FILE_FOOTER.to_string(),
            theme: DEFAULT_THEME.to_string(),
            title: String::new(),
        }
    }

    /// Fails listing every source that does not exist.
    pub fn validate_sources(&self) -> Result<(), ConfigError> {
        check_sources(&self.sources)
    }
}

fn check_sources(sources: &[PathBuf]) -> Result<(), ConfigError> {
    let missing: Vec<PathBuf> = sources
        .iter()
        .filter(|source| !source.exists())
        .cloned()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::MissingSources(missing))
    }
}

pub fn command() -> Command {
    Command::new("codes2html")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Matias Hiltunen")
        .about("Collects source code into a single syntax-highlighted HTML document")
        .arg(
            Arg::new("sources")
                .value_name("SOURCE")
                .help("Source code directories or files")
                .required(true)
                .num_args(1..),
        )
        .arg(
            Arg::new("extensions")
                .short('e')
                .long("extensions")
                .value_name("LIST")
                .help("Comma separated file extensions to collect, e.g. \"c,cpp,h,m,mm\", or \"*\" for all")
                .default_value("*"),
        )
        .arg(
            Arg::new("lines")
                .short('l')
                .long("lines")
                .value_name("N")
                .help("Stop collecting once this many lines are written; a file is always complete, so the total may exceed it. 0 for unlimited")
                .value_parser(clap::value_parser!(i64))
                .allow_negative_numbers(true)
                .default_value("3500"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Output HTML file")
                .default_value(DEFAULT_OUTPUT),
        )
        .arg(
            Arg::new("ignore")
                .short('i')
                .long("ignore")
                .value_name("FILE")
                .help("File of glob patterns, one per line, matched against file and directory names")
                .default_value(DEFAULT_IGNORE_FILE),
        )
        .arg(
            Arg::new("footer")
                .short('f')
                .long("footer")
                .value_name("STRING")
                .help("Inserted after every file, e.g. \"</br></br>\"")
                .allow_hyphen_values(true)
                .default_value(DEFAULT_FILE_FOOTER),
        )
        .arg(
            Arg::new("theme")
                .short('t')
                .long("theme")
                .value_name("NAME")
                .help("Highlighting theme")
                .default_value(DEFAULT_THEME),
        )
        .arg(
            Arg::new("title")
                .long("title")
                .value_name("TEXT")
                .help("Document title"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("More output, repeat for even more")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only report warnings and errors")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose"),
        )
}

/// Builds the run configuration. Fails with [`ConfigError::MissingSources`]
/// before anything else is read. Reads the ignore file, so logging should be
/// set up first.
pub fn config_from_matches(matches: &ArgMatches) -> Result<Config> {
    let sources: Vec<PathBuf> = matches
        .get_many::<String>("sources")
        .map(|vals| vals.map(|s| normalize_cli_path(s)).collect())
        .unwrap_or_default();
    check_sources(&sources)?;

    let string = |id: &str| matches.get_one::<String>(id).cloned().unwrap_or_default();

    let lines = matches
        .get_one::<i64>("lines")
        .copied()
        .unwrap_or(DEFAULT_LINES);

    let ignore_file = expand_tilde(&string("ignore"));

    Ok(Config {
        sources,
        extensions: ExtensionFilter::parse(&string("extensions")),
        line_budget: LineBudget::from_cli(lines),
        output_path: expand_tilde(&string("output")),
        ignore_patterns: load_ignore_file(&ignore_file),
        file_footer: string("footer"),
        theme: string("theme"),
        title: string("title"),
    })
}

/// Log level for the given flags: `info` by default so per-file status is shown.
pub fn log_level(matches: &ArgMatches) -> &'static str {
    if matches.get_flag("quiet") {
        return "warn";
    }
    match matches.get_count("verbose") {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn parse(args: &[&str]) -> ArgMatches {
        command()
            .try_get_matches_from(std::iter::once("codes2html").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_command_is_well_formed() {
        command().debug_assert();
    }

    #[test]
    fn test_sources_are_required() {
        assert!(command().try_get_matches_from(["codes2html"]).is_err());
    }

    #[test]
    fn test_defaults() {
        let dir = tempdir().unwrap();
        let ignore = dir.path().join("none.txt");
        let config =
            config_from_matches(&parse(&["-i", ignore.to_str().unwrap(), "src"])).unwrap();

        assert_eq!(config.sources, [PathBuf::from("src")]);
        assert!(config.extensions.accepts_all());
        assert_eq!(config.line_budget.limit(), Some(3500));
        assert_eq!(config.output_path, PathBuf::from(DEFAULT_OUTPUT));
        assert!(config.ignore_patterns.is_empty());
        assert_eq!(config.file_footer, "</br>");
        assert_eq!(config.theme, DEFAULT_THEME);
        assert_eq!(config.title, "");
    }

    #[test]
    fn test_all_options() {
        let dir = tempdir().unwrap();
        let ignore = dir.path().join("ignore.txt");
        fs::write(&ignore, "*.txt\n").unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b.c");
        fs::create_dir(&a).unwrap();
        fs::write(&b, "int b;\n").unwrap();

        let matches = parse(&[
            "-e",
            "c,h",
            "-l",
            "0",
            "-o",
            "doc.html",
            "-i",
            ignore.to_str().unwrap(),
            "-f",
            "<hr>",
            "--title",
            "Project",
            "-vv",
            a.to_str().unwrap(),
            b.to_str().unwrap(),
        ]);
        let config = config_from_matches(&matches).unwrap();

        assert_eq!(config.sources, [a, b]);
        assert_eq!(config.extensions.patterns(), ["*.c", "*.h"]);
        assert_eq!(config.line_budget.limit(), None);
        assert_eq!(config.output_path, PathBuf::from("doc.html"));
        assert!(config.ignore_patterns.matches("notes.txt"));
        assert_eq!(config.file_footer, "<hr>");
        assert_eq!(config.title, "Project");
        assert_eq!(log_level(&matches), "trace");
    }

    #[test]
    fn test_negative_lines_mean_unlimited() {
        let matches = parse(&["-l", "-1", "-i", "/nonexistent/ignore.txt", "src"]);
        let config = config_from_matches(&matches).unwrap();
        assert_eq!(config.line_budget.limit(), None);
    }

    #[test]
    fn test_log_levels() {
        assert_eq!(log_level(&parse(&["src"])), "info");
        assert_eq!(log_level(&parse(&["-v", "src"])), "debug");
        assert_eq!(log_level(&parse(&["-q", "src"])), "warn");
    }

    #[test]
    fn test_missing_sources_fail_before_ignore_file_is_read() {
        let dir = tempdir().unwrap();
        let gone = dir.path().join("gone");
        let ignore = dir.path().join("ignore.txt");
        fs::write(&ignore, "*.txt\n").unwrap();

        let err = config_from_matches(&parse(&[
            "-i",
            ignore.to_str().unwrap(),
            gone.to_str().unwrap(),
        ]))
        .unwrap_err();

        match err.downcast_ref::<ConfigError>() {
            Some(ConfigError::MissingSources(missing)) => assert_eq!(missing, &[gone]),
            None => panic!("expected MissingSources, got {err}"),
        }
    }

    #[test]
    fn test_validate_sources_lists_every_missing_path() {
        let dir = tempdir().unwrap();
        let present = dir.path().join("present");
        fs::create_dir(&present).unwrap();
        let gone_a = dir.path().join("gone_a");
        let gone_b = dir.path().join("gone_b.c");

        let config = Config::new(
            vec![gone_a.clone(), present, gone_b.clone()],
            dir.path().join("out.html"),
        );
        let err = config.validate_sources().unwrap_err();
        let ConfigError::MissingSources(missing) = &err;
        assert_eq!(missing, &[gone_a.clone(), gone_b.clone()]);

        let message = err.to_string();
        assert!(message.contains(&gone_a.display().to_string()));
        assert!(message.contains(&gone_b.display().to_string()));
    }
}
