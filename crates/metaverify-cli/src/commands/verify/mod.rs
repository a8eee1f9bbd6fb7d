//! Verify command implementation
//!
//! Collects assets and metafiles under a root and reports each of them as a
//! TeamCity test: assets in the `missing_metafiles` suite, metafiles in the
//! `dangling_metafiles` suite. Violations are test failures, not errors.

use anyhow::{Context, Result};
use colored::Colorize;
use metaverify_report::{Reporter, Suite};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::checks::{asset_for, is_dangling_metafile, is_missing_metafile, metafile_for};
use crate::collect::{collect_assets, collect_metafiles};
use crate::config::{ExclusionConfig, Exclusions};

/// Suite reporting one test per asset.
pub const MISSING_SUITE: &str = "missing_metafiles";
/// Suite reporting one test per metafile.
pub const DANGLING_SUITE: &str = "dangling_metafiles";

/// Failure message for an asset without a metafile.
pub const NO_METAFILE: &str = "No .metafile";
/// Failure message for a metafile without an asset.
pub const NO_ASSET: &str = "No asset";

/// Options of the verify command.
#[derive(Debug, Clone, Default)]
pub struct VerifyArgs {
    /// Root of the tree to scan
    pub root: PathBuf,
    /// File names excluded from asset collection
    pub exclude_files: Vec<String>,
    /// Directory names excluded from traversal
    pub exclude_dirs: Vec<String>,
    /// Optional JSON file with more exclusions
    pub config: Option<PathBuf>,
    /// Exit with status 1 when any violation is reported
    pub strict: bool,
    /// Skip the stderr summary
    pub quiet: bool,
}

impl VerifyArgs {
    /// Command-line exclusions merged with the configuration file, if any.
    pub fn exclusions(&self) -> Result<Exclusions> {
        let mut exclusions = Exclusions::new(
            self.exclude_files.iter().cloned(),
            self.exclude_dirs.iter().cloned(),
        );
        if let Some(path) = &self.config {
            exclusions.merge(ExclusionConfig::from_file(path)?);
        }
        Ok(exclusions)
    }
}

/// Counts gathered during one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifySummary {
    pub assets: usize,
    pub metafiles: usize,
    /// Assets without a metafile
    pub missing: usize,
    /// Metafiles without an asset
    pub dangling: usize,
}

impl VerifySummary {
    pub fn violations(&self) -> usize {
        self.missing + self.dangling
    }

    pub fn is_clean(&self) -> bool {
        self.violations() == 0
    }
}

/// Run the verify command.
///
/// # Returns
/// Exit code: 0 once every item was reported, or 1 in strict mode when
/// violations were found. Filesystem and configuration errors are returned
/// as `Err`.
pub fn run(args: &VerifyArgs) -> Result<ExitCode> {
    let exclusions = args.exclusions()?;
    tracing::debug!(
        root = %args.root.display(),
        exclude_files = ?exclusions.files,
        exclude_dirs = ?exclusions.dirs,
        "starting verification"
    );

    let reporter = Reporter::stdout();
    let summary = verify_tree(&reporter, &args.root, &exclusions)?;

    tracing::info!(
        assets = summary.assets,
        metafiles = summary.metafiles,
        missing = summary.missing,
        dangling = summary.dangling,
        "verification finished"
    );
    if !args.quiet {
        print_summary(&summary);
    }

    if args.strict && !summary.is_clean() {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Collects both sets under `root` and reports both suites.
pub fn verify_tree(
    reporter: &Reporter,
    root: &Path,
    exclusions: &Exclusions,
) -> Result<VerifySummary> {
    let assets = collect_assets(root, exclusions)
        .with_context(|| format!("Failed to collect assets under: {}", root.display()))?;
    let metafiles = collect_metafiles(root, exclusions)
        .with_context(|| format!("Failed to collect metafiles under: {}", root.display()))?;

    let missing = verify_missing_metafiles(reporter, &assets, &metafiles)
        .context("Failed to report missing metafiles")?;
    let dangling = verify_dangling_metafiles(reporter, &assets, &metafiles)
        .context("Failed to report dangling metafiles")?;

    Ok(VerifySummary {
        assets: assets.len(),
        metafiles: metafiles.len(),
        missing,
        dangling,
    })
}

/// Reports one test per asset, failing those without a metafile.
///
/// Returns the number of failures.
pub fn verify_missing_metafiles(
    reporter: &Reporter,
    assets: &HashSet<PathBuf>,
    metafiles: &HashSet<PathBuf>,
) -> io::Result<usize> {
    Suite::run(reporter, MISSING_SUITE, |suite| {
        let mut failures = 0;
        for asset in sorted(assets) {
            let mut test = suite.test(asset.display().to_string())?;
            if is_missing_metafile(asset, metafiles) {
                let details = format!("Metafile {} not found.", metafile_for(asset).display());
                test.fail(NO_METAFILE, &details)?;
                failures += 1;
            }
            test.finish()?;
        }
        Ok(failures)
    })
}

/// Reports one test per metafile, failing those without an asset.
///
/// Returns the number of failures.
pub fn verify_dangling_metafiles(
    reporter: &Reporter,
    assets: &HashSet<PathBuf>,
    metafiles: &HashSet<PathBuf>,
) -> io::Result<usize> {
    Suite::run(reporter, DANGLING_SUITE, |suite| {
        let mut failures = 0;
        for metafile in sorted(metafiles) {
            let mut test = suite.test(metafile.display().to_string())?;
            if is_dangling_metafile(metafile, assets) {
                let details = match asset_for(metafile) {
                    Some(asset) => format!(
                        "No file corresponding with {}. Expected {}.",
                        metafile.display(),
                        asset.display()
                    ),
                    None => format!("No file corresponding with {}.", metafile.display()),
                };
                test.fail(NO_ASSET, &details)?;
                failures += 1;
            }
            test.finish()?;
        }
        Ok(failures)
    })
}

/// Paths in a stable order so repeated runs report identically.
fn sorted(paths: &HashSet<PathBuf>) -> Vec<&PathBuf> {
    let mut sorted: Vec<_> = paths.iter().collect();
    sorted.sort();
    sorted
}

/// Print the run summary to stderr.
fn print_summary(summary: &VerifySummary) {
    eprintln!(
        "{} {} asset(s), {} metafile(s)",
        "Scanned".cyan().bold(),
        summary.assets,
        summary.metafiles
    );
    if summary.is_clean() {
        eprintln!(
            "{} {}",
            "PASSED".green().bold(),
            "no missing or dangling metafiles".dimmed()
        );
    } else {
        eprintln!(
            "{} {} missing, {} dangling",
            "FAILED".red().bold(),
            summary.missing,
            summary.dangling
        );
    }
}
