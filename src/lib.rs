//! Core data model for GPX track replay: points, tracks, bounds and headings.
//!
//! The loader (`loader`) turns a directory of GPX logs into a [`TrackSet`],
//! `scene` describes how the tracks are drawn on the map and `animation`
//! drives the marker replay inside the page.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod animation;
pub mod loader;
pub mod scene;

/// Playback parameters shared by the engine and the control panel
pub mod defaults {
    /// Tick period at 1x speed.
    pub const BASE_INTERVAL_MS: f64 = 50.0;
    pub const MIN_SPEED: f64 = 0.5;
    pub const MAX_SPEED: f64 = 5.0;
    pub const SPEED_STEP: f64 = 0.5;
    pub const DEFAULT_SPEED: f64 = 1.0;
}

// Matches a trailing ".gpx" regardless of case
static GPX_EXTENSION_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.gpx$").unwrap());

/// A geographic position in degrees. Serialized as `[lat, lon]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

impl Point {
    pub fn new(lat: f64, lon: f64) -> Self {
        Point { lat, lon }
    }
}

impl From<[f64; 2]> for Point {
    fn from([lat, lon]: [f64; 2]) -> Self {
        Point { lat, lon }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.lat, p.lon]
    }
}

/// One named, non-empty sequence of points, usually a single GPX file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub points: Vec<Point>,
}

impl Track {
    /// Build a track, refusing empty point sequences.
    pub fn new(name: impl Into<String>, points: Vec<Point>) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        Some(Track {
            name: name.into(),
            points,
        })
    }

    /// Display label: the file name without its `.gpx` extension
    /// (`2025-10-11.gpx` -> `2025-10-11`).
    pub fn label(&self) -> String {
        GPX_EXTENSION_REGEX.replace(&self.name, "").into_owned()
    }

    pub fn first(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<Point> {
        self.points.last().copied()
    }
}

/// Tracks in file-name order together with the flattened point sequence.
///
/// Only the tracks are serialized; the global sequence is rebuilt on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Track>", into = "Vec<Track>")]
pub struct TrackSet {
    tracks: Vec<Track>,
    all_points: Vec<Point>,
}

impl TrackSet {
    pub fn new(tracks: Vec<Track>) -> Self {
        let all_points = tracks
            .iter()
            .flat_map(|t| t.points.iter().copied())
            .collect();
        TrackSet { tracks, all_points }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Every point of every track, in track order.
    pub fn all_points(&self) -> &[Point] {
        &self.all_points
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.all_points)
    }

    /// Resolve a selector key into the point sequence it plays.
    ///
    /// An unknown track index resolves to an empty sequence.
    pub fn resolve(&self, key: TrackKey) -> Vec<Point> {
        match key {
            TrackKey::All => self.all_points.clone(),
            TrackKey::Index(i) => match self.tracks.get(i) {
                Some(track) => track.points.clone(),
                None => {
                    debug!("Track index {} out of range ({} tracks)", i, self.tracks.len());
                    Vec::new()
                }
            },
        }
    }
}

impl From<Vec<Track>> for TrackSet {
    fn from(tracks: Vec<Track>) -> Self {
        TrackSet::new(tracks)
    }
}

impl From<TrackSet> for Vec<Track> {
    fn from(set: TrackSet) -> Self {
        set.tracks
    }
}

/// Extent of a point set plus the midpoint of its extrema.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
    pub center_lat: f64,
    pub center_lon: f64,
}

impl BoundingBox {
    /// Single pass over `points`; `None` when there is nothing to bound.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;

        let (mut min_lat, mut max_lat) = (first.lat, first.lat);
        let (mut min_lon, mut max_lon) = (first.lon, first.lon);
        for p in rest {
            min_lat = min_lat.min(p.lat);
            max_lat = max_lat.max(p.lat);
            min_lon = min_lon.min(p.lon);
            max_lon = max_lon.max(p.lon);
        }

        Some(BoundingBox {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
            center_lat: (min_lat + max_lat) / 2.0,
            center_lon: (min_lon + max_lon) / 2.0,
        })
    }

    pub fn center(&self) -> Point {
        Point::new(self.center_lat, self.center_lon)
    }

    /// South-west and north-east corners, in the order map fitting expects.
    pub fn corners(&self) -> [Point; 2] {
        [
            Point::new(self.min_lat, self.min_lon),
            Point::new(self.max_lat, self.max_lon),
        ]
    }
}

/// Initial bearing (forward azimuth) from `from` to `to` on a sphere, in
/// degrees within `[0, 360)`.
pub fn initial_bearing(from: Point, to: Point) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let d_lon = (to.lon - from.lon).to_radians();

    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();
    let bearing = y.atan2(x).to_degrees();
    (bearing + 360.0) % 360.0
}

/// Track selector value: every track back to back, or a single track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrackKey {
    #[default]
    All,
    Index(usize),
}

impl fmt::Display for TrackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKey::All => write!(f, "all"),
            TrackKey::Index(i) => write!(f, "{}", i),
        }
    }
}

impl FromStr for TrackKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(TrackKey::All);
        }
        trimmed
            .parse::<usize>()
            .map(TrackKey::Index)
            .map_err(|_| format!("Invalid track selection '{}'", trimmed))
    }
}
