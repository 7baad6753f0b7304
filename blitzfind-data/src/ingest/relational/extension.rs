//! Best-effort loading of the native spatial extension into a connection.
//!
//! Loading is an optimisation: when every candidate fails the caller reads
//! geometry columns as raw text instead of aborting.

use std::path::{Path, PathBuf};

use log::{debug, info};
use rusqlite::{Connection, LoadExtensionGuard};

/// Ordered list of library paths tried when loading the spatial extension.
///
/// The default list starts with the bare library name, resolved by the
/// platform loader, followed by common installation paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionCandidates(Vec<PathBuf>);

impl ExtensionCandidates {
    /// Use exactly the supplied candidates, in order.
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self(paths.into_iter().map(Into::into).collect())
    }

    /// A list with no candidates; loading always reports failure.
    #[must_use]
    pub const fn none() -> Self {
        Self(Vec::new())
    }

    /// Iterate the candidates in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.0.iter().map(PathBuf::as_path)
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ExtensionCandidates {
    fn default() -> Self {
        Self::new([
            "mod_spatialite",
            "/opt/homebrew/lib/mod_spatialite",
            "/usr/local/lib/mod_spatialite",
            "/usr/lib/x86_64-linux-gnu/mod_spatialite",
            "/usr/lib64/mod_spatialite",
        ])
    }
}

/// Outcome of [`load_spatial_extension`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadResult {
    /// Whether a candidate loaded.
    pub loaded: bool,
    /// The candidate that loaded, for diagnostics.
    pub path: Option<PathBuf>,
}

impl LoadResult {
    fn loaded_from(path: &Path) -> Self {
        Self {
            loaded: true,
            path: Some(path.to_path_buf()),
        }
    }
}

/// Try each candidate in order until one loads into `connection`.
///
/// Failures are logged at debug level and never returned as errors.
///
/// # Examples
/// ```
/// use rusqlite::Connection;
/// use blitzfind_data::ingest::{ExtensionCandidates, load_spatial_extension};
///
/// let conn = Connection::open_in_memory().expect("open database");
/// let candidates = ExtensionCandidates::new(["/nonexistent/mod_spatialite"]);
/// let result = load_spatial_extension(&conn, &candidates);
/// assert!(!result.loaded);
/// assert!(result.path.is_none());
/// ```
#[must_use]
pub fn load_spatial_extension(
    connection: &Connection,
    candidates: &ExtensionCandidates,
) -> LoadResult {
    if candidates.is_empty() {
        return LoadResult::default();
    }

    // SAFETY: extension loading stays enabled only while the guard lives and
    // the candidates are supplied by the caller's own configuration.
    let guard = match unsafe { LoadExtensionGuard::new(connection) } {
        Ok(guard) => guard,
        Err(err) => {
            debug!("cannot enable extension loading: {err}");
            return LoadResult::default();
        }
    };

    for candidate in candidates.iter() {
        // SAFETY: as above; a candidate that fails to load leaves the
        // connection unchanged.
        match unsafe { connection.load_extension(candidate, None) } {
            Ok(()) => {
                info!("loaded spatial extension from {}", candidate.display());
                drop(guard);
                return LoadResult::loaded_from(candidate);
            }
            Err(err) => debug!(
                "spatial extension candidate {} failed: {err}",
                candidate.display()
            ),
        }
    }

    drop(guard);
    LoadResult::default()
}
