use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;

use choropleth_shared::frame::{FrameHandle, FrameScheduler};

/// `requestAnimationFrame`-backed [`FrameScheduler`].
///
/// Clones share one callback, so the animation driver can request the next frame from
/// inside the frame it is handling. The callback is owned by a [`RenderLoop`].
#[derive(Clone)]
pub struct RafScheduler {
    inner: Rc<Inner>,
}

struct Inner {
    window: Option<web_sys::Window>,
    raf_id: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut(f64)>>>,
}

impl FrameScheduler for RafScheduler {
    fn request_frame(&mut self) -> Option<FrameHandle> {
        let window = self.inner.window.as_ref()?;
        let cb_ref = self.inner.callback.borrow();
        let cb = cb_ref.as_ref()?;
        match window.request_animation_frame(cb.as_ref().unchecked_ref()) {
            Ok(id) => {
                self.inner.raf_id.set(Some(id));
                Some(FrameHandle(id))
            }
            Err(_) => {
                web_sys::console::warn_1(&"requestAnimationFrame failed".into());
                None
            }
        }
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Some(window) = self.inner.window.as_ref() {
            let _ = window.cancel_animation_frame(handle.0);
        }
        if self.inner.raf_id.get() == Some(handle.0) {
            self.inner.raf_id.set(None);
        }
    }
}

/// Owner of the frame callback. Dropping it cancels the pending frame and releases the
/// callback.
pub struct RenderLoop {
    scheduler: RafScheduler,
}

impl RenderLoop {
    /// `on_frame` receives the rAF timestamp and a scheduler for requesting the next frame.
    pub fn new(mut on_frame: impl FnMut(f64, &mut RafScheduler) + 'static) -> Self {
        let inner = Rc::new(Inner {
            window: web_sys::window(),
            raf_id: Cell::new(None),
            callback: RefCell::new(None),
        });

        let inner_cb = inner.clone();
        let cb = Closure::<dyn FnMut(f64)>::new(move |timestamp: f64| {
            inner_cb.raf_id.set(None);
            let mut scheduler = RafScheduler {
                inner: inner_cb.clone(),
            };
            on_frame(timestamp, &mut scheduler);
        });
        *inner.callback.borrow_mut() = Some(cb);

        Self {
            scheduler: RafScheduler { inner },
        }
    }

    pub fn scheduler(&self) -> RafScheduler {
        self.scheduler.clone()
    }
}

impl Drop for RenderLoop {
    fn drop(&mut self) {
        let inner = &self.scheduler.inner;
        if let Some(raf_id) = inner.raf_id.replace(None)
            && let Some(window) = inner.window.as_ref()
        {
            let _ = window.cancel_animation_frame(raf_id);
        }
        // The closure holds `inner`; dropping it here frees both.
        inner.callback.borrow_mut().take();
    }
}
