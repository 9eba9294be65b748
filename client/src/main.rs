mod app;
mod canvas_surface;
mod legend;
mod listener;
mod map;
mod render_loop;
mod tooltip;
mod zoom;

use std::any::Any;
use std::cell::RefCell;

use leptos::mount::mount_to;
use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

/// Element the demo mounts into; the document body when absent.
const MOUNT_ELEMENT_ID: &str = "choropleth-demo";

thread_local! {
    static MOUNTED: RefCell<Option<Box<dyn Any>>> = RefCell::new(None);
}

fn mount_target() -> Option<HtmlElement> {
    let document = web_sys::window()?.document()?;
    document
        .get_element_by_id(MOUNT_ELEMENT_ID)
        .and_then(|node| node.dyn_into::<HtmlElement>().ok())
        .or_else(|| document.body())
}

fn main() {
    console_error_panic_hook::set_once();
    let Some(target) = mount_target() else {
        web_sys::console::warn_1(&"choropleth demo: no mount target".into());
        return;
    };

    MOUNTED.with(move |slot| {
        // Unmount a previous instance first so its effects stop.
        drop(slot.borrow_mut().take());
        let handle = mount_to(target, app::App);
        *slot.borrow_mut() = Some(Box::new(handle));
    });
}
