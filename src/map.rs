//! JavaScript interop for the Leaflet map.
//! Provides Rust bindings to map helper functions defined in map_helpers.js.

use crate::config::{MAP_CONTAINER_ID, MARKER_GLYPH, MARKER_SIZE_PX};
use serde::Serialize;
use track_replay::animation::MarkerLayer;
use track_replay::scene::MapScene;
use track_replay::Point;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(module = "/map_helpers.js")]
extern "C" {
    #[wasm_bindgen(js_name = initMap)]
    fn init_map_js(container_id: &str, scene: JsValue);

    #[wasm_bindgen(js_name = markerOnMap)]
    fn marker_on_map() -> bool;

    #[wasm_bindgen(js_name = addMarker)]
    fn add_marker_js(glyph: &str, size_px: u32);

    #[wasm_bindgen(js_name = removeMarker)]
    fn remove_marker_js();

    #[wasm_bindgen(js_name = setMarkerLatLng)]
    fn set_marker_lat_lng(lat: f64, lon: f64);

    #[wasm_bindgen(js_name = setMarkerRotation)]
    fn set_marker_rotation(degrees: f64);
}

/// Draw base layers, track paths and end markers, and fit the view.
pub fn init_map(scene: &MapScene) -> Result<(), String> {
    let value = scene
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| format!("Failed to serialize map scene: {}", e))?;
    init_map_js(MAP_CONTAINER_ID, value);
    Ok(())
}

/// The replay marker, living on the Leaflet map created by [`init_map`].
#[derive(Default)]
pub struct LeafletMarker;

impl MarkerLayer for LeafletMarker {
    fn has_active_marker(&self) -> bool {
        marker_on_map()
    }

    fn add_marker(&mut self) {
        add_marker_js(MARKER_GLYPH, MARKER_SIZE_PX);
    }

    fn remove_marker(&mut self) {
        remove_marker_js();
    }

    fn set_location(&mut self, point: Point) {
        set_marker_lat_lng(point.lat, point.lon);
    }

    fn set_orientation(&mut self, degrees: f64) {
        set_marker_rotation(degrees);
    }
}
