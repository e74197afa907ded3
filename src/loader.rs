//! Directory scan that turns GPX logs into a [`TrackSet`].
//!
//! Files are visited in file-name order so that track colors and the
//! "all tracks" replay order are stable between runs. A file that cannot be
//! read or parsed is recorded in [`LoadReport::failures`] and the scan moves on.

use crate::{Point, Track, TrackSet};
use log::{debug, info, warn};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Extension of the track logs picked up by the scan (compared case-insensitively).
pub const TRACK_EXTENSION: &str = "gpx";

/// Why a single track file was skipped.
#[derive(Debug)]
pub enum TrackFileError {
    Read(io::Error),
    Parse(String),
}

impl fmt::Display for TrackFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackFileError::Read(e) => write!(f, "could not read file: {}", e),
            TrackFileError::Parse(msg) => write!(f, "invalid GPX: {}", msg),
        }
    }
}

impl std::error::Error for TrackFileError {}

/// A file that was skipped during the scan.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: TrackFileError,
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.error)
    }
}

#[derive(Debug)]
pub enum LoadError {
    /// The directory itself could not be listed.
    Directory { path: PathBuf, source: io::Error },
    /// The directory yielded no track with at least one point.
    NoTracksFound {
        path: PathBuf,
        failures: Vec<FileFailure>,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Directory { path, source } => {
                write!(f, "Cannot read track directory {}: {}", path.display(), source)
            }
            LoadError::NoTracksFound { path, failures } if failures.is_empty() => {
                write!(f, "No GPX tracks found in {}", path.display())
            }
            LoadError::NoTracksFound { path, failures } => write!(
                f,
                "No GPX tracks found in {} ({} file(s) could not be parsed)",
                path.display(),
                failures.len()
            ),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Directory { source, .. } => Some(source),
            LoadError::NoTracksFound { .. } => None,
        }
    }
}

/// Result of a directory scan: the tracks that loaded plus the files that didn't.
#[derive(Debug)]
pub struct LoadReport {
    pub tracks: TrackSet,
    pub failures: Vec<FileFailure>,
}

/// Parse one GPX document into a track named `name`.
///
/// All points of all segments of all `<trk>` elements are concatenated in
/// document order. Returns `Ok(None)` when the document holds no track points.
pub fn parse_track(name: &str, content: &str) -> Result<Option<Track>, TrackFileError> {
    let doc = gpx::read(content.as_bytes()).map_err(|e| TrackFileError::Parse(e.to_string()))?;

    let points: Vec<Point> = doc
        .tracks
        .iter()
        .flat_map(|trk| trk.segments.iter())
        .flat_map(|seg| seg.points.iter())
        .map(|wpt| {
            let p = wpt.point();
            Point::new(p.y(), p.x())
        })
        .collect();

    Ok(Track::new(name, points))
}

/// Load every `.gpx` file in `dir`, sorted by file name.
pub fn load_tracks(dir: &Path) -> Result<LoadReport, LoadError> {
    let files = track_files(dir).map_err(|source| LoadError::Directory {
        path: dir.to_path_buf(),
        source,
    })?;
    debug!("Found {} candidate track file(s) in {}", files.len(), dir.display());

    let mut tracks = Vec::with_capacity(files.len());
    let mut failures = Vec::new();

    for path in files {
        let name = file_name(&path);
        let parsed = fs::read_to_string(&path)
            .map_err(TrackFileError::Read)
            .and_then(|content| parse_track(&name, &content));

        match parsed {
            Ok(Some(track)) => {
                debug!("Loaded {} ({} points)", name, track.points.len());
                tracks.push(track);
            }
            Ok(None) => debug!("Skipping {}: no track points", name),
            Err(error) => {
                warn!("Skipping {}: {}", path.display(), error);
                failures.push(FileFailure { path, error });
            }
        }
    }

    if tracks.is_empty() {
        return Err(LoadError::NoTracksFound {
            path: dir.to_path_buf(),
            failures,
        });
    }

    let tracks = TrackSet::new(tracks);
    info!(
        "Loaded {} track(s), {} point(s) from {}",
        tracks.len(),
        tracks.all_points().len(),
        dir.display()
    );
    Ok(LoadReport { tracks, failures })
}

/// Track files directly inside `dir`, ordered by file name.
fn track_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_track_file(&path) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn is_track_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case(TRACK_EXTENSION))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
