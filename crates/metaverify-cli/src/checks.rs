//! Asset/metafile correspondence.
//!
//! The metafile of `path/to/name` is `path/to/name.meta`: the suffix is
//! appended to the full file name, never substituted for its extension.

use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Extension that marks a metafile.
pub const METAFILE_EXTENSION: &str = "meta";

/// Suffix appended to an asset's name to form its metafile's name.
pub const METAFILE_SUFFIX: &str = ".meta";

/// Whether `path` names a metafile.
pub fn is_metafile_path(path: &Path) -> bool {
    path.extension() == Some(OsStr::new(METAFILE_EXTENSION))
}

/// Expected metafile of `asset`.
pub fn metafile_for(asset: &Path) -> PathBuf {
    let mut name = OsString::from(asset.as_os_str());
    name.push(METAFILE_SUFFIX);
    PathBuf::from(name)
}

/// Expected asset of `metafile`, or `None` if it does not end in `.meta`.
pub fn asset_for(metafile: &Path) -> Option<PathBuf> {
    is_metafile_path(metafile).then(|| metafile.with_extension(""))
}

/// True iff the metafile expected for `asset` is not in `metafiles`.
pub fn is_missing_metafile(asset: &Path, metafiles: &HashSet<PathBuf>) -> bool {
    !metafiles.contains(&metafile_for(asset))
}

/// True iff the asset expected for `metafile` is not in `assets`.
pub fn is_dangling_metafile(metafile: &Path, assets: &HashSet<PathBuf>) -> bool {
    match asset_for(metafile) {
        Some(asset) => !assets.contains(&asset),
        None => true,
    }
}
