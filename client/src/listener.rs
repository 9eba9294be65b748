use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{AddEventListenerOptions, Event, EventTarget};

/// One DOM event listener, removed again when dropped.
pub struct EventBinding {
    target: EventTarget,
    event: &'static str,
    handler: Closure<dyn FnMut(Event)>,
}

impl EventBinding {
    /// Attach a non-passive listener, so handlers may call `preventDefault`.
    pub fn attach(
        target: &EventTarget,
        event: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self, String> {
        let handler = Closure::<dyn FnMut(Event)>::new(handler);
        let options = AddEventListenerOptions::new();
        options.set_passive(false);
        target
            .add_event_listener_with_callback_and_add_event_listener_options(
                event,
                handler.as_ref().unchecked_ref(),
                &options,
            )
            .map_err(|_| format!("failed to attach {event} listener"))?;
        Ok(Self {
            target: target.clone(),
            event,
            handler,
        })
    }
}

impl Drop for EventBinding {
    fn drop(&mut self) {
        self.target
            .remove_event_listener_with_callback(self.event, self.handler.as_ref().unchecked_ref())
            .ok();
    }
}
