//! Asynchronous image decoding.

use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlImageElement;

use crate::error::CanvasError;

type EventClosure = Closure<dyn FnMut(web_sys::Event)>;

/// Load and decode the image at `src`.
///
/// Resolves once the browser fires `load`; nothing is borrowed while the
/// decode is in flight. There is no timeout and no cancellation.
///
/// # Errors
///
/// Returns [`CanvasError::ImageDecode`] when the browser fires `error`.
pub async fn decode_image(src: &str) -> Result<HtmlImageElement, CanvasError> {
    let img = HtmlImageElement::new().map_err(|e| CanvasError::js(&e))?;

    // Only one of the two handlers ever fires; both are held here until the
    // promise settles and dropped afterwards.
    let mut handlers: Option<(EventClosure, EventClosure)> = None;
    let promise = js_sys::Promise::new(&mut |resolve: js_sys::Function, reject: js_sys::Function| {
        let onload = Closure::once(move |_: web_sys::Event| {
            if let Err(e) = resolve.call0(&JsValue::NULL) {
                log::warn!("loader: resolve threw: {e:?}");
            }
        });
        let onerror = Closure::once(move |_: web_sys::Event| {
            if let Err(e) = reject.call1(&JsValue::NULL, &JsValue::from_str("the browser could not decode the image")) {
                log::warn!("loader: reject threw: {e:?}");
            }
        });
        img.set_onload(Some(onload.as_ref().unchecked_ref()));
        img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        handlers = Some((onload, onerror));
    });
    img.set_src(src);

    let settled = JsFuture::from(promise).await;
    img.set_onload(None);
    img.set_onerror(None);
    drop(handlers);

    settled.map_err(|e| CanvasError::ImageDecode {
        src: truncate_src(src),
        reason: e.as_string().unwrap_or_else(|| format!("{e:?}")),
    })?;

    log::debug!("loader: decoded {}x{} image", img.natural_width(), img.natural_height());
    Ok(img)
}

/// `data:` URLs can be megabytes long; keep error messages readable.
fn truncate_src(src: &str) -> String {
    const MAX: usize = 96;
    match src.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &src[..cut]),
        None => src.to_owned(),
    }
}
