use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use web_sys::{Event, HtmlCanvasElement, MouseEvent, PointerEvent, TouchEvent, WheelEvent};

use choropleth_shared::ChoroplethMap;
use choropleth_shared::config::CLICK_DRAG_THRESHOLD_PX;
use choropleth_shared::zoom::WheelDeltaMode;

use crate::listener::EventBinding;

#[derive(Default)]
struct Gesture {
    drag_pointer: Option<i32>,
    start: (f64, f64),
    last: (f64, f64),
    pinch: Option<(f64, [f64; 2])>,
}

/// Wheel, drag, double-click and pinch listeners on the map canvas, writing the engine's
/// zoom transform. Exists only while zoom is enabled; dropping it detaches every listener.
pub struct ZoomBinding {
    canvas: HtmlCanvasElement,
    listeners: Vec<EventBinding>,
}

fn local_point(canvas: &HtmlCanvasElement, client_x: f64, client_y: f64) -> [f64; 2] {
    let rect = canvas.get_bounding_client_rect();
    [client_x - rect.left(), client_y - rect.top()]
}

fn touch_pair(canvas: &HtmlCanvasElement, e: &TouchEvent) -> Option<(f64, [f64; 2])> {
    let touches = e.touches();
    if touches.length() != 2 {
        return None;
    }
    let (t0, t1) = (touches.get(0)?, touches.get(1)?);
    let dx = (t1.client_x() - t0.client_x()) as f64;
    let dy = (t1.client_y() - t0.client_y()) as f64;
    let mid = local_point(
        canvas,
        (t0.client_x() + t1.client_x()) as f64 / 2.0,
        (t0.client_y() + t1.client_y()) as f64 / 2.0,
    );
    Some(((dx * dx + dy * dy).sqrt(), mid))
}

impl ZoomBinding {
    /// `suppress_click` is raised when a drag moved far enough that the click ending it
    /// must not select a region.
    pub fn attach(
        canvas: HtmlCanvasElement,
        engine: Rc<RefCell<ChoroplethMap>>,
        redraw: Rc<dyn Fn()>,
        suppress_click: Rc<Cell<bool>>,
    ) -> Result<Self, String> {
        let gesture = Rc::new(RefCell::new(Gesture::default()));
        let mut binding = Self {
            canvas: canvas.clone(),
            listeners: Vec::new(),
        };

        binding.listen("wheel", {
            let (canvas, engine, redraw) = (canvas.clone(), engine.clone(), redraw.clone());
            move |event| {
                let Ok(e) = event.dyn_into::<WheelEvent>() else {
                    return;
                };
                e.prevent_default();
                let anchor = local_point(&canvas, e.client_x() as f64, e.client_y() as f64);
                let mode = WheelDeltaMode::from_dom(e.delta_mode());
                if engine
                    .borrow_mut()
                    .wheel(e.delta_y(), mode, e.ctrl_key(), anchor)
                {
                    redraw();
                }
            }
        })?;

        binding.listen("pointerdown", {
            let (canvas, gesture, suppress_click) =
                (canvas.clone(), gesture.clone(), suppress_click.clone());
            move |event| {
                let Ok(e) = event.dyn_into::<PointerEvent>() else {
                    return;
                };
                if e.button() != 0 {
                    return;
                }
                let point = (e.client_x() as f64, e.client_y() as f64);
                let mut g = gesture.borrow_mut();
                g.drag_pointer = Some(e.pointer_id());
                g.start = point;
                g.last = point;
                suppress_click.set(false);
                canvas.set_pointer_capture(e.pointer_id()).ok();
            }
        })?;

        binding.listen("pointermove", {
            let (engine, redraw, gesture, suppress_click) = (
                engine.clone(),
                redraw.clone(),
                gesture.clone(),
                suppress_click.clone(),
            );
            move |event| {
                let Ok(e) = event.dyn_into::<PointerEvent>() else {
                    return;
                };
                let mut g = gesture.borrow_mut();
                if g.drag_pointer != Some(e.pointer_id()) || g.pinch.is_some() {
                    return;
                }
                let point = (e.client_x() as f64, e.client_y() as f64);
                let (dx, dy) = (point.0 - g.last.0, point.1 - g.last.1);
                g.last = point;
                if (point.0 - g.start.0).abs() >= CLICK_DRAG_THRESHOLD_PX
                    || (point.1 - g.start.1).abs() >= CLICK_DRAG_THRESHOLD_PX
                {
                    suppress_click.set(true);
                }
                drop(g);
                if engine.borrow_mut().pan(dx, dy) {
                    redraw();
                }
            }
        })?;

        for name in ["pointerup", "pointercancel"] {
            binding.listen(name, {
                let (canvas, gesture) = (canvas.clone(), gesture.clone());
                move |event| {
                    let Ok(e) = event.dyn_into::<PointerEvent>() else {
                        return;
                    };
                    let mut g = gesture.borrow_mut();
                    if g.drag_pointer == Some(e.pointer_id()) {
                        g.drag_pointer = None;
                        canvas.release_pointer_capture(e.pointer_id()).ok();
                    }
                }
            })?;
        }

        binding.listen("dblclick", {
            let (canvas, engine, redraw) = (canvas.clone(), engine.clone(), redraw.clone());
            move |event| {
                let Ok(e) = event.dyn_into::<MouseEvent>() else {
                    return;
                };
                e.prevent_default();
                let anchor = local_point(&canvas, e.client_x() as f64, e.client_y() as f64);
                if engine.borrow_mut().double_click(anchor, e.shift_key()) {
                    redraw();
                }
            }
        })?;

        binding.listen("touchstart", {
            let (canvas, gesture) = (canvas.clone(), gesture.clone());
            move |event| {
                let Ok(e) = event.dyn_into::<TouchEvent>() else {
                    return;
                };
                let pair = touch_pair(&canvas, &e);
                if pair.is_some() {
                    e.prevent_default();
                }
                gesture.borrow_mut().pinch = pair;
            }
        })?;

        binding.listen("touchmove", {
            let (canvas, engine, redraw, gesture) =
                (canvas.clone(), engine.clone(), redraw.clone(), gesture.clone());
            move |event| {
                let Ok(e) = event.dyn_into::<TouchEvent>() else {
                    return;
                };
                let Some((distance, mid)) = touch_pair(&canvas, &e) else {
                    return;
                };
                e.prevent_default();
                let previous = gesture.borrow_mut().pinch.replace((distance, mid));
                let Some((previous_distance, previous_mid)) = previous else {
                    return;
                };
                if previous_distance > 0.0
                    && engine
                        .borrow_mut()
                        .pinch(distance / previous_distance, previous_mid, mid)
                {
                    redraw();
                }
            }
        })?;

        binding.listen("touchend", {
            let gesture = gesture.clone();
            move |_| gesture.borrow_mut().pinch = None
        })?;

        Ok(binding)
    }

    fn listen(
        &mut self,
        event: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<(), String> {
        self.listeners
            .push(EventBinding::attach(&self.canvas, event, handler)?);
        Ok(())
    }
}
