//! Map scene description handed from the ingest step to the page.
//!
//! The scene is plain data: base layers, one styled entry per track and the
//! initial viewport. `map_helpers.js` turns it into Leaflet layers.

use crate::{BoundingBox, Point, Track, TrackSet};
use serde::{Deserialize, Serialize};

pub const INITIAL_ZOOM: u8 = 14;
pub const NO_TRACKS_MESSAGE: &str = "No GPX files found in the directory.";

/// Track colors, assigned by track index and reused cyclically.
pub const PALETTE: [&str; 7] = [
    "blue",
    "red",
    "green",
    "purple",
    "orange",
    "darkred",
    "lightblue",
];

pub fn track_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayer {
    pub name: String,
    pub url: String,
    pub attribution: String,
    pub overlay: bool,
    pub opacity: f64,
}

impl TileLayer {
    fn base(name: &str, url: &str, attribution: &str) -> Self {
        TileLayer {
            name: name.to_string(),
            url: url.to_string(),
            attribution: attribution.to_string(),
            overlay: false,
            opacity: 1.0,
        }
    }
}

/// Selectable base maps, first one shown by default.
pub fn base_layers() -> Vec<TileLayer> {
    vec![
        TileLayer::base(
            "Satellite Imagery",
            "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
            "Esri",
        ),
        TileLayer::base(
            "Detailed Topo Map",
            "https://server.arcgisonline.com/ArcGIS/rest/services/World_Topo_Map/MapServer/tile/{z}/{y}/{x}",
            "Esri",
        ),
        TileLayer::base(
            "OpenStreetMap",
            "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
            "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors",
        ),
        TileLayer::base(
            "CartoDB Voyager",
            "https://{s}.basemaps.cartocdn.com/rastertiles/voyager/{z}/{x}/{y}{r}.png",
            "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors &copy; <a href=\"https://carto.com/attributions\">CARTO</a>",
        ),
    ]
}

/// Toggleable layers drawn on top of the base map.
pub fn overlay_layers() -> Vec<TileLayer> {
    vec![TileLayer {
        name: "Nautical Charts".to_string(),
        url: "https://tiles.openseamap.org/seamark/{z}/{x}/{y}.png".to_string(),
        attribution: "Map data: &copy; <a href=\"http://www.openseamap.org\">OpenSeaMap</a> contributors"
            .to_string(),
        overlay: true,
        opacity: 0.85,
    }]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathStyle {
    pub color: String,
    pub weight: u32,
    pub opacity: f64,
}

/// Dashed overlay whose dashes crawl along the path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimatedPathStyle {
    pub color: String,
    pub weight: u32,
    pub opacity: f64,
    pub delay_ms: u32,
    pub dash_array: [u32; 2],
    pub pulse_color: String,
}

/// Circle at the last point of a track plus its permanent text label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndMarker {
    pub location: Point,
    pub radius: u32,
    pub color: String,
    pub fill_color: String,
    pub fill_opacity: f64,
    pub weight: u32,
    pub popup: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackLayer {
    pub name: String,
    pub points: Vec<Point>,
    pub path: PathStyle,
    pub animated_path: AnimatedPathStyle,
    pub end_marker: EndMarker,
}

impl TrackLayer {
    fn new(index: usize, track: &Track, end: Point) -> Self {
        let color = track_color(index).to_string();
        TrackLayer {
            name: track.name.clone(),
            points: track.points.clone(),
            path: PathStyle {
                color: color.clone(),
                weight: 3,
                opacity: 0.6,
            },
            animated_path: AnimatedPathStyle {
                color,
                weight: 4,
                opacity: 0.8,
                delay_ms: 800,
                dash_array: [10, 20],
                pulse_color: "white".to_string(),
            },
            end_marker: EndMarker {
                location: end,
                radius: 6,
                color: "darkred".to_string(),
                fill_color: "red".to_string(),
                fill_opacity: 0.9,
                weight: 2,
                popup: format!("End: {}", track.name),
                label: track.label(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapScene {
    pub center: Point,
    pub zoom: u8,
    /// South-west and north-east corners to fit the view to.
    pub fit_bounds: [Point; 2],
    pub base_layers: Vec<TileLayer>,
    pub overlays: Vec<TileLayer>,
    pub tracks: Vec<TrackLayer>,
}

impl MapScene {
    pub fn build(tracks: &TrackSet, bounds: &BoundingBox) -> Self {
        let layers = tracks
            .tracks()
            .iter()
            .enumerate()
            .filter_map(|(i, track)| track.last().map(|end| TrackLayer::new(i, track, end)))
            .collect();

        MapScene {
            center: bounds.center(),
            zoom: INITIAL_ZOOM,
            fit_bounds: bounds.corners(),
            base_layers: base_layers(),
            overlays: overlay_layers(),
            tracks: layers,
        }
    }

    /// Rebuild the track set the scene was drawn from.
    pub fn track_set(&self) -> TrackSet {
        TrackSet::new(
            self.tracks
                .iter()
                .filter_map(|layer| Track::new(layer.name.clone(), layer.points.clone()))
                .collect(),
        )
    }
}

/// What the page receives: a scene to draw, or the reason there is none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PagePayload {
    Ready { scene: MapScene },
    Empty { message: String },
}

impl PagePayload {
    /// Scene for `tracks`, or the empty state when there is nothing to bound.
    pub fn from_tracks(tracks: &TrackSet) -> Self {
        match tracks.bounds() {
            Some(bounds) => PagePayload::Ready {
                scene: MapScene::build(tracks, &bounds),
            },
            None => PagePayload::no_tracks(),
        }
    }

    pub fn no_tracks() -> Self {
        PagePayload::Empty {
            message: NO_TRACKS_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracks(count: usize) -> TrackSet {
        TrackSet::new(
            (0..count)
                .map(|i| {
                    let base = i as f64;
                    Track::new(
                        format!("2025-10-{:02}.gpx", i + 1),
                        vec![Point::new(base, base), Point::new(base + 0.5, base + 0.25)],
                    )
                    .unwrap()
                })
                .collect(),
        )
    }

    #[test]
    fn test_colors_cycle_by_index() {
        let set = tracks(9);
        let scene = MapScene::build(&set, &set.bounds().unwrap());
        let colors: Vec<&str> = scene.tracks.iter().map(|t| t.path.color.as_str()).collect();
        assert_eq!(colors[0], "blue");
        assert_eq!(colors[6], "lightblue");
        assert_eq!(colors[7], "blue");
        assert_eq!(colors[8], "red");
        assert_eq!(scene.tracks[1].animated_path.color, "red");
    }

    #[test]
    fn test_scene_viewport_from_bounds() {
        let set = tracks(2);
        let bounds = set.bounds().unwrap();
        let scene = MapScene::build(&set, &bounds);
        assert_eq!(scene.center, Point::new(0.75, 0.625));
        assert_eq!(scene.zoom, INITIAL_ZOOM);
        assert_eq!(scene.fit_bounds, [Point::new(0.0, 0.0), Point::new(1.5, 1.25)]);
        assert_eq!(scene.base_layers.len(), 4);
        assert!(scene.overlays.iter().all(|l| l.overlay));
    }

    #[test]
    fn test_end_marker_on_last_point_with_date_label() {
        let set = tracks(1);
        let scene = MapScene::build(&set, &set.bounds().unwrap());
        let end = &scene.tracks[0].end_marker;
        assert_eq!(end.location, Point::new(0.5, 0.25));
        assert_eq!(end.label, "2025-10-01");
        assert_eq!(end.popup, "End: 2025-10-01.gpx");
    }

    #[test]
    fn test_scene_track_set_round_trip_order() {
        let set = tracks(3);
        let scene = MapScene::build(&set, &set.bounds().unwrap());
        assert_eq!(scene.track_set(), set);
    }

    #[test]
    fn test_payload_tagging() {
        let json = serde_json::to_value(PagePayload::no_tracks()).unwrap();
        assert_eq!(json["status"], "empty");
        assert_eq!(json["message"], NO_TRACKS_MESSAGE);

        let ready = serde_json::to_value(PagePayload::from_tracks(&tracks(1))).unwrap();
        assert_eq!(ready["status"], "ready");
        assert_eq!(ready["scene"]["tracks"][0]["points"][1][0], 0.5);
        assert_eq!(PagePayload::from_tracks(&TrackSet::default()), PagePayload::no_tracks());
    }
}
