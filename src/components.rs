//! Pure Yew view components for the replay control panel.
//!
//! This module contains stateless components that render based on props;
//! all playback state lives in the engine owned by the main component.

use crate::config::PANEL_TITLE;
use crate::hooks::use_draggable;
use crate::utils::format_heading;
use std::rc::Rc;
use track_replay::animation::{PlaybackStatus, SpeedFactor};
use track_replay::{defaults, TrackKey};
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

/// Read-only view of the engine, taken once per render.
#[derive(Clone, Copy, PartialEq)]
pub struct PanelState {
    pub status: PlaybackStatus,
    pub current_index: usize,
    pub active_len: usize,
    pub speed: SpeedFactor,
    pub selection: TrackKey,
    pub heading: Option<f64>,
}

impl PanelState {
    pub fn is_running(&self) -> bool {
        self.status == PlaybackStatus::Running
    }
}

/// Renders the explanatory message shown when there is nothing to replay.
pub fn render_empty_state(message: &str) -> Html {
    html! {
        <div class="empty-state">
            <h2>{ "No tracks" }</h2>
            <p class="no-results-message">{ message }</p>
        </div>
    }
}

/// Renders the playback progress line under the buttons.
fn render_status(state: &PanelState) -> Html {
    let visited = state.current_index.min(state.active_len);
    html! {
        <div class="playback-status">
            { format!("{} · point {}/{} · heading {}",
                      state.status, visited, state.active_len, format_heading(state.heading)) }
        </div>
    }
}

/// Track selector: "all" plus one entry per track.
#[derive(Properties, PartialEq)]
pub struct TrackSelectProps {
    pub options: Rc<Vec<(TrackKey, String)>>,
    pub selected: TrackKey,
    pub onchange: Callback<String>,
}

#[function_component(TrackSelect)]
pub fn track_select(props: &TrackSelectProps) -> Html {
    let onchange = {
        let cb = props.onchange.clone();
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            cb.emit(select.value());
        })
    };

    html! {
        <div class="control-group">
            <label for="track-select">{ "Select Track:" }</label>
            <select id="track-select" {onchange}>
                { props.options.iter().map(|(key, label)| {
                    html!{
                        <option value={key.to_string()} selected={*key == props.selected}>
                            { label.clone() }
                        </option>
                    }
                }).collect::<Html>() }
            </select>
        </div>
    }
}

/// Speed slider, 0.5x to 5x in 0.5 steps.
#[derive(Properties, PartialEq)]
pub struct SpeedSliderProps {
    pub speed: SpeedFactor,
    pub oninput: Callback<String>,
}

#[function_component(SpeedSlider)]
pub fn speed_slider(props: &SpeedSliderProps) -> Html {
    let oninput = {
        let cb = props.oninput.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            cb.emit(input.value());
        })
    };

    html! {
        <div class="control-group">
            <label for="speed-control">
                { "Speed: " }<span id="speed-value">{ props.speed.to_string() }</span>
            </label>
            <input type="range"
                id="speed-control"
                min={defaults::MIN_SPEED.to_string()}
                max={defaults::MAX_SPEED.to_string()}
                step={defaults::SPEED_STEP.to_string()}
                value={props.speed.get().to_string()}
                {oninput}
            />
        </div>
    }
}

/// Play / pause / reset buttons; enabled state mirrors whether playback runs.
#[derive(Properties, PartialEq)]
pub struct TransportProps {
    pub running: bool,
    pub onplay: Callback<MouseEvent>,
    pub onpause: Callback<MouseEvent>,
    pub onreset: Callback<MouseEvent>,
}

#[function_component(Transport)]
pub fn transport(props: &TransportProps) -> Html {
    html! {
        <>
            <button id="play-btn" class="btn btn-primary"
                disabled={props.running} onclick={props.onplay.clone()}>{ "Play" }</button>
            <button id="pause-btn" class="btn btn-secondary"
                disabled={!props.running} onclick={props.onpause.clone()}>{ "Pause" }</button>
            <button id="reset-btn" class="btn" onclick={props.onreset.clone()}>{ "Reset" }</button>
        </>
    }
}

#[derive(Properties, PartialEq)]
pub struct ControlPanelProps {
    pub state: PanelState,
    pub options: Rc<Vec<(TrackKey, String)>>,
    pub on_select: Callback<String>,
    pub on_speed: Callback<String>,
    pub onplay: Callback<MouseEvent>,
    pub onpause: Callback<MouseEvent>,
    pub onreset: Callback<MouseEvent>,
}

/// Floating, draggable panel grouping every playback control.
#[function_component(ControlPanel)]
pub fn control_panel(props: &ControlPanelProps) -> Html {
    let drag = use_draggable();

    html! {
        <div class="animation-controls"
            style={format!("transform: {};", drag.transform)}
            onmousedown={drag.onmousedown.clone()}>
            <h4>{ PANEL_TITLE }</h4>
            <TrackSelect
                options={props.options.clone()}
                selected={props.state.selection}
                onchange={props.on_select.clone()}
            />
            <SpeedSlider speed={props.state.speed} oninput={props.on_speed.clone()} />
            <Transport
                running={props.state.is_running()}
                onplay={props.onplay.clone()}
                onpause={props.onpause.clone()}
                onreset={props.onreset.clone()}
            />
            { render_status(&props.state) }
        </div>
    }
}
