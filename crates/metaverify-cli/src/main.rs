//! metaverify - verify that no `.meta` sidecar file is missing or dangling
//!
//! Scans a directory tree and reports every asset and metafile as a TeamCity
//! test on stdout. Violations are test failures; the process still exits 0.

use clap::Parser;
use colored::Colorize;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use metaverify_cli::commands::verify::{self, VerifyArgs};
use metaverify_cli::logging;

/// Verify no missing or dangling .meta files.
#[derive(Parser, Debug)]
#[command(name = "metaverify")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root of the directory tree to scan
    root: PathBuf,

    /// File name to exclude from asset collection (repeatable, also `-ef`)
    #[arg(long = "exclude_file", visible_alias = "exclude-file", value_name = "NAME")]
    exclude_files: Vec<String>,

    /// Directory name to exclude from traversal (repeatable, also `-ed`)
    #[arg(long = "exclude_dir", visible_alias = "exclude-dir", value_name = "NAME")]
    exclude_dirs: Vec<String>,

    /// JSON file with `exclude_files` and `exclude_dirs` lists
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Exit with status 1 when any violation is reported
    #[arg(long)]
    strict: bool,

    /// Do not print the summary to stderr
    #[arg(short, long)]
    quiet: bool,

    /// Show debug diagnostics on stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_verify_args(self) -> VerifyArgs {
        VerifyArgs {
            root: self.root,
            exclude_files: self.exclude_files,
            exclude_dirs: self.exclude_dirs,
            config: self.config,
            strict: self.strict,
            quiet: self.quiet,
        }
    }
}

/// Single-dash spellings accepted for the repeatable exclusion options.
const SHORT_ALIASES: [(&str, &str); 2] = [("-ef", "--exclude_file"), ("-ed", "--exclude_dir")];

/// Rewrites `-ef`/`-ed` (also `-ef=NAME` and `-efNAME`) to their long forms.
///
/// Arguments after `--` are left untouched.
fn expand_short_aliases<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut expanded = Vec::new();
    let mut positional_only = false;

    for arg in args {
        if positional_only {
            expanded.push(arg);
            continue;
        }
        let Some(text) = arg.to_str() else {
            expanded.push(arg);
            continue;
        };
        if text == "--" {
            positional_only = true;
            expanded.push(arg);
            continue;
        }

        let alias = SHORT_ALIASES
            .iter()
            .find(|(short, _)| text.starts_with(short));
        match alias {
            Some((short, long)) => {
                let value = &text[short.len()..];
                let value = value.strip_prefix('=').unwrap_or(value);
                expanded.push(OsString::from(*long));
                if !value.is_empty() {
                    expanded.push(OsString::from(value));
                }
            }
            None => expanded.push(arg),
        }
    }

    expanded
}

fn main() -> ExitCode {
    let cli = Cli::parse_from(expand_short_aliases(std::env::args_os()));
    logging::init(cli.verbose);

    match verify::run(&cli.into_verify_args()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red(), e);
            ExitCode::from(1)
        }
    }
}
