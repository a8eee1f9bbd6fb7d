//! Directory tree collection.
//!
//! [`collect`] walks a tree once and applies two predicates to every entry
//! below the root:
//!
//! - `exclude_traverse`: matching entries are dropped entirely. They are not
//!   collected and, for directories, nothing beneath them is visited.
//! - `exclude_result`: matching entries are still descended into but are not
//!   collected.
//!
//! Symbolic links are never followed; a link is collected as the link path.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::checks::is_metafile_path;
use crate::config::Exclusions;

/// An entry offered to a [`PathPredicate`].
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    path: &'a Path,
    is_dir: bool,
}

impl<'a> Candidate<'a> {
    pub fn new(path: &'a Path, is_dir: bool) -> Self {
        Self { path, is_dir }
    }

    fn from_entry(entry: &'a DirEntry) -> Self {
        Self::new(entry.path(), entry.file_type().is_dir())
    }

    pub fn path(&self) -> &'a Path {
        self.path
    }

    /// File name as UTF-8, if it has one.
    pub fn file_name(&self) -> Option<&'a str> {
        self.path.file_name().and_then(OsStr::to_str)
    }

    pub fn is_dir(&self) -> bool {
        self.is_dir
    }
}

/// Decides whether a tree entry is excluded.
pub trait PathPredicate {
    fn matches(&self, candidate: &Candidate<'_>) -> bool;
}

impl<F> PathPredicate for F
where
    F: Fn(&Candidate<'_>) -> bool,
{
    fn matches(&self, candidate: &Candidate<'_>) -> bool {
        self(candidate)
    }
}

/// Errors that abort a collection.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// The root could not be inspected.
    #[error("cannot access {}", path.display())]
    Root {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The root exists but is not a directory.
    #[error("not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    /// Listing or inspecting an entry below the root failed.
    #[error("failed to traverse {}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Lexical form of `root` used for every collected path.
///
/// Drops interior `.` segments as well as repeated and trailing separators,
/// so `assets//textures/./` and `assets/textures` collect identical paths.
/// Symbolic links and `..` are left alone.
pub fn normalize_root(root: &Path) -> PathBuf {
    root.components().collect()
}

/// Collects every entry below `root` that survives both predicates.
pub fn collect<T, R>(
    root: &Path,
    exclude_traverse: &T,
    exclude_result: &R,
) -> Result<HashSet<PathBuf>, CollectError>
where
    T: PathPredicate + ?Sized,
    R: PathPredicate + ?Sized,
{
    let root = normalize_root(root);
    let metadata = fs::metadata(&root).map_err(|source| CollectError::Root {
        path: root.clone(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(CollectError::NotADirectory { path: root });
    }

    let walker = WalkDir::new(&root)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !exclude_traverse.matches(&Candidate::from_entry(entry))
        });

    let mut found = HashSet::new();
    for entry in walker {
        let entry = entry.map_err(|source| {
            let path = source
                .path()
                .map_or_else(|| root.clone(), Path::to_path_buf);
            CollectError::Walk { path, source }
        })?;
        if !exclude_result.matches(&Candidate::from_entry(&entry)) {
            found.insert(entry.into_path());
        }
    }

    Ok(found)
}

/// Collects every asset below `root`.
///
/// Directories are assets too. An entry is skipped, along with everything
/// beneath it, when its name is excluded (directory names against
/// `exclusions.dirs`, other names against `exclusions.files`) or when it
/// ends in `.meta`.
pub fn collect_assets(
    root: &Path,
    exclusions: &Exclusions,
) -> Result<HashSet<PathBuf>, CollectError> {
    let excluded = |candidate: &Candidate<'_>| {
        let name_excluded = match candidate.file_name() {
            Some(name) if candidate.is_dir() => exclusions.is_excluded_dir(name),
            Some(name) => exclusions.is_excluded_file(name),
            None => false,
        };
        name_excluded || is_metafile_path(candidate.path())
    };

    let assets = collect(root, &excluded, &excluded)?;
    tracing::debug!(root = %root.display(), count = assets.len(), "collected assets");
    Ok(assets)
}

/// Collects every metafile below `root`, skipping excluded directories.
pub fn collect_metafiles(
    root: &Path,
    exclusions: &Exclusions,
) -> Result<HashSet<PathBuf>, CollectError> {
    let excluded_traverse = |candidate: &Candidate<'_>| {
        if candidate.is_dir() {
            candidate
                .file_name()
                .is_some_and(|name| exclusions.is_excluded_dir(name))
        } else {
            !is_metafile_path(candidate.path())
        }
    };
    let excluded_result = |candidate: &Candidate<'_>| candidate.is_dir();

    let metafiles = collect(root, &excluded_traverse, &excluded_result)?;
    tracing::debug!(root = %root.display(), count = metafiles.len(), "collected metafiles");
    Ok(metafiles)
}
