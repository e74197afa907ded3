//! Page-level configuration constants.

// Data
pub const SCENE_URL: &str = "scene.json";
pub const MAP_CONTAINER_ID: &str = "map";

// Position marker
pub const MARKER_GLYPH: &str = "⛵";
pub const MARKER_SIZE_PX: u32 = 24;

// Control panel
pub const ALL_TRACKS_LABEL: &str = "All Tracks";
pub const PANEL_TITLE: &str = "Track Animation";
