//! Main module for the track replay page using Yew.
//! Loads the scene payload, draws the map and wires the control panel to the
//! animation engine.

use gloo_net::http::Request;
use gloo_timers::callback::Interval;
use log::{debug, error, info, LevelFilter};
use std::cell::RefCell;
use std::rc::Rc;
use track_replay::animation::{AnimationEngine, Scheduler};
use track_replay::scene::{MapScene, PagePayload};
use track_replay::TrackKey;
use yew::prelude::*;

mod components;
mod config;
mod hooks;
mod map;
mod utils;

use components::{render_empty_state, ControlPanel, PanelState};
use config::{MAP_CONTAINER_ID, SCENE_URL};
use map::{init_map, LeafletMarker};
use utils::{parse_speed_input, track_options};

// ──────────────────────────────────────────────────────────────────────────────
// Type aliases for better readability
type Engine = AnimationEngine<LeafletMarker, IntervalScheduler>;
type EngineCell = Rc<RefCell<Option<Engine>>>;

/// Browser timer source: each tick is delivered through `on_tick`.
/// Dropping the returned `Interval` clears it.
struct IntervalScheduler {
    on_tick: Callback<()>,
}

impl Scheduler for IntervalScheduler {
    type Handle = Interval;

    fn schedule(&mut self, period_ms: u32) -> Interval {
        let on_tick = self.on_tick.clone();
        Interval::new(period_ms, move || on_tick.emit(()))
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Helper functions

/// Fetch the payload written by the `ingest` binary
async fn fetch_payload() -> Result<PagePayload, String> {
    let response = Request::get(SCENE_URL)
        .send()
        .await
        .map_err(|e| format!("Failed to load {}: {}", SCENE_URL, e))?;
    if !response.ok() {
        return Err(format!("{} returned HTTP {}", SCENE_URL, response.status()));
    }
    response
        .json::<PagePayload>()
        .await
        .map_err(|e| format!("Invalid {}: {}", SCENE_URL, e))
}

/// Build a callback that runs `action` against the engine, then re-renders
fn engine_callback<E: 'static>(
    engine: &EngineCell,
    force_update: &UseForceUpdateHandle,
    action: impl Fn(&mut Engine, E) + 'static,
) -> Callback<E> {
    let engine = engine.clone();
    let force_update = force_update.clone();
    Callback::from(move |event: E| {
        if let Some(engine) = engine.borrow_mut().as_mut() {
            action(engine, event);
        }
        force_update.force_update();
    })
}

// ──────────────────────────────────────────────────────────────────────────────

#[derive(Properties, PartialEq)]
struct ReplayProps {
    scene: Rc<MapScene>,
}

/// Map plus control panel for a loaded scene.
#[function_component(Replay)]
fn replay(props: &ReplayProps) -> Html {
    let engine: EngineCell = use_mut_ref(|| None);
    let force_update = use_force_update();
    let options = use_memo(props.scene.clone(), |scene| track_options(&scene.tracks));

    // Draw the map once the container is mounted, then hand the tracks to a fresh engine
    {
        let engine = engine.clone();
        let force_update = force_update.clone();
        use_effect_with(props.scene.clone(), move |scene| {
            if let Err(e) = init_map(scene) {
                error!("{}", e);
            }

            // Weak: the interval lives inside the engine it ticks.
            let weak = Rc::downgrade(&engine);
            let on_tick = Callback::from(move |_| {
                if let Some(cell) = weak.upgrade() {
                    if let Some(engine) = cell.borrow_mut().as_mut() {
                        engine.tick();
                    }
                    force_update.force_update();
                }
            });

            let tracks = scene.track_set();
            info!("Animation ready: {} track(s)", tracks.len());
            *engine.borrow_mut() = Some(AnimationEngine::new(
                tracks,
                LeafletMarker,
                IntervalScheduler { on_tick },
            ));

            move || {
                if let Some(mut engine) = engine.borrow_mut().take() {
                    engine.reset();
                }
            }
        });
    }

    let onplay = engine_callback(&engine, &force_update, |engine, _: MouseEvent| {
        if let Err(err) = engine.play() {
            debug!("Play ignored: {}", err);
        }
    });
    let onpause = engine_callback(&engine, &force_update, |engine, _: MouseEvent| engine.pause());
    let onreset = engine_callback(&engine, &force_update, |engine, _: MouseEvent| engine.reset());
    let on_speed = engine_callback(&engine, &force_update, |engine, value: String| {
        match parse_speed_input(&value) {
            Ok(speed) => {
                engine.set_speed(speed.get());
            }
            Err(msg) => debug!("Ignoring speed input: {}", msg),
        }
    });
    let on_select = engine_callback(&engine, &force_update, |engine, value: String| {
        match value.parse::<TrackKey>() {
            Ok(key) => engine.select_track(key),
            Err(msg) => debug!("{}", msg),
        }
    });

    let state = engine.borrow().as_ref().map(|e| PanelState {
        status: e.status(),
        current_index: e.current_index(),
        active_len: e.active_len(),
        speed: e.speed(),
        selection: e.selection(),
        heading: e.heading(),
    });

    html! {
        <>
            <div id={MAP_CONTAINER_ID} class="map"></div>
            { match state {
                Some(state) => html! {
                    <ControlPanel
                        {state}
                        options={options.clone()}
                        {on_select}
                        {on_speed}
                        {onplay}
                        {onpause}
                        {onreset}
                    />
                },
                None => html! {},
            } }
        </>
    }
}

/// Primary application component: loads the payload and picks the view.
#[function_component(App)]
fn app() -> Html {
    let payload = use_state(|| None::<Result<PagePayload, String>>);

    // Load the scene on mount
    {
        let payload = payload.clone();
        use_effect_with((), move |_| {
            wasm_bindgen_futures::spawn_local(async move {
                let loaded = fetch_payload().await;
                if let Err(e) = &loaded {
                    error!("{}", e);
                }
                payload.set(Some(loaded));
            });
        });
    }

    match &*payload {
        None => html! { <div class="loading">{ "Loading tracks…" }</div> },
        Some(Err(message)) => html! { <div class="error">{ message.clone() }</div> },
        Some(Ok(PagePayload::Empty { message })) => render_empty_state(message),
        Some(Ok(PagePayload::Ready { scene })) => {
            html! { <Replay scene={Rc::new(scene.clone())} /> }
        }
    }
}

/// Entry point: installs the panic hook and logger, then starts the Yew renderer.
fn main() {
    console_error_panic_hook::set_once();
    utils::init_logging(LevelFilter::Info);
    yew::Renderer::<App>::new().render();
}
