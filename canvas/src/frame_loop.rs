//! Per-frame callback driven by `requestAnimationFrame`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::Window;

use crate::error::CanvasError;

type FrameClosure = Closure<dyn FnMut(f64)>;

/// A running animation-frame loop. Stops when dropped.
pub struct FrameLoop {
    window: Window,
    running: Rc<Cell<bool>>,
    pending: Rc<Cell<Option<i32>>>,
    closure: Rc<RefCell<Option<FrameClosure>>>,
}

impl FrameLoop {
    /// Call `tick` with the frame timestamp once per display frame until stopped.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Js`] without a window or if the first frame
    /// cannot be requested.
    pub fn start(mut tick: impl FnMut(f64) + 'static) -> Result<Self, CanvasError> {
        let window = web_sys::window().ok_or_else(|| CanvasError::Js("no window".into()))?;
        let running = Rc::new(Cell::new(true));
        let pending = Rc::new(Cell::new(None));
        let closure: Rc<RefCell<Option<FrameClosure>>> = Rc::new(RefCell::new(None));

        let win = window.clone();
        let run = Rc::clone(&running);
        let next = Rc::clone(&pending);
        let this = Rc::clone(&closure);
        *closure.borrow_mut() = Some(Closure::wrap(Box::new(move |ts: f64| {
            next.set(None);
            if !run.get() {
                return;
            }
            tick(ts);
            if !run.get() {
                return;
            }
            if let Some(cb) = this.borrow().as_ref() {
                match win.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    Ok(id) => next.set(Some(id)),
                    Err(e) => log::error!("frame loop: requestAnimationFrame failed: {e:?}"),
                }
            }
        }) as Box<dyn FnMut(f64)>));

        let first = match closure.borrow().as_ref() {
            Some(cb) => window.request_animation_frame(cb.as_ref().unchecked_ref()).map_err(|e| CanvasError::js(&e))?,
            None => return Err(CanvasError::Js("frame callback missing".into())),
        };
        pending.set(Some(first));

        Ok(Self { window, running, pending, closure })
    }

    /// Cancel the pending frame and stop rescheduling.
    pub fn stop(&self) {
        self.running.set(false);
        if let Some(id) = self.pending.take() {
            if let Err(e) = self.window.cancel_animation_frame(id) {
                log::warn!("frame loop: cancelAnimationFrame failed: {e:?}");
            }
        }
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.stop();
        // Breaks the closure's reference to itself.
        self.closure.borrow_mut().take();
    }
}
