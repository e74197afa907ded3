use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Element, MouseEvent};
use yew::prelude::*;

/// Position state for a panel that can be dragged around the page.
#[derive(Clone)]
pub struct Draggable {
    /// CSS `transform` value to apply to the panel.
    pub transform: String,
    /// Attach to the panel's `onmousedown`.
    pub onmousedown: Callback<MouseEvent>,
}

// Clicks on form controls must keep working, so they never start a drag.
fn is_form_control(e: &MouseEvent) -> bool {
    e.target_dyn_into::<Element>()
        .map(|el| matches!(el.tag_name().as_str(), "BUTTON" | "INPUT" | "SELECT"))
        .unwrap_or(false)
}

/// Custom hook making an element draggable by its background.
///
/// Mouse moves are tracked on the document so the panel follows the pointer
/// even when it leaves the panel mid-drag.
#[hook]
pub fn use_draggable() -> Draggable {
    let offset = use_state(|| (0i32, 0i32));
    // Pointer position minus panel offset at grab time; Some(_) while dragging.
    let grab: Rc<RefCell<Option<(i32, i32)>>> = use_mut_ref(|| None);

    let onmousedown = {
        let grab = grab.clone();
        let (x, y) = *offset;
        Callback::from(move |e: MouseEvent| {
            if is_form_control(&e) {
                return;
            }
            *grab.borrow_mut() = Some((e.client_x() - x, e.client_y() - y));
        })
    };

    {
        let offset_setter = offset.clone();
        use_effect_with((), move |_| {
            let document = gloo_utils::document();

            let move_grab = grab.clone();
            let on_move = Closure::<dyn FnMut(MouseEvent)>::new(move |e: MouseEvent| {
                if let Some((gx, gy)) = *move_grab.borrow() {
                    e.prevent_default();
                    offset_setter.set((e.client_x() - gx, e.client_y() - gy));
                }
            });
            let on_up = Closure::<dyn FnMut(MouseEvent)>::new(move |_e: MouseEvent| {
                *grab.borrow_mut() = None;
            });

            let _ = document
                .add_event_listener_with_callback("mousemove", on_move.as_ref().unchecked_ref());
            let _ =
                document.add_event_listener_with_callback("mouseup", on_up.as_ref().unchecked_ref());

            move || {
                let _ = document.remove_event_listener_with_callback(
                    "mousemove",
                    on_move.as_ref().unchecked_ref(),
                );
                let _ = document
                    .remove_event_listener_with_callback("mouseup", on_up.as_ref().unchecked_ref());
            }
        });
    }

    let (x, y) = *offset;
    Draggable {
        transform: format!("translate({}px, {}px)", x, y),
        onmousedown,
    }
}
