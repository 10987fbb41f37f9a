//! Rendering: paints the canvas scene to a 2D context.
//!
//! This module is the only place that draws on [`web_sys::CanvasRenderingContext2d`].
//! It reads the engine state and the decoded rasters and produces pixels; it
//! never mutates application state.
//!
//! Ring widths, ring offsets and dash lengths are specified in screen pixels
//! and divided by the viewport scale, so outlines look the same at every zoom.

use std::collections::HashMap;

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use crate::consts::{
    BACKGROUND, DASH_PX, GROUP_RING_COLOR, GROUP_RING_OFFSET_PX, MARQUEE_FILL, RING_WIDTH_PX, SELECTION_COLOR,
    SELECTION_RING_OFFSET_PX,
};
use crate::doc::{ImageId, ImageNode};
use crate::engine::EngineCore;
use crate::error::CanvasError;
use crate::hit::Rect;
use crate::input::InputState;

/// Fill for nodes whose raster is still decoding.
const PLACEHOLDER_FILL: &str = "#E0DDD6";

/// Draw the full scene: images, group and selection rings, then the marquee.
///
/// # Errors
///
/// Returns [`CanvasError::Js`] if any `Canvas2D` call throws.
pub fn draw(
    ctx: &CanvasRenderingContext2d,
    core: &EngineCore,
    sprites: &HashMap<ImageId, HtmlImageElement>,
) -> Result<(), CanvasError> {
    draw_scene(ctx, core, sprites).map_err(|e| CanvasError::js(&e))
}

fn draw_scene(
    ctx: &CanvasRenderingContext2d,
    core: &EngineCore,
    sprites: &HashMap<ImageId, HtmlImageElement>,
) -> Result<(), JsValue> {
    let vp = core.viewport;
    let px = vp.screen_dist_to_world(1.0);

    // Layer 1: clear in device pixels, then switch to world space.
    ctx.set_transform(core.dpr, 0.0, 0.0, core.dpr, 0.0, 0.0)?;
    ctx.set_fill_style_str(BACKGROUND);
    ctx.fill_rect(0.0, 0.0, core.viewport_width, core.viewport_height);
    ctx.translate(vp.tx, vp.ty)?;
    ctx.scale(vp.scale, vp.scale)?;

    // Layer 2: images in list order, bottom first.
    for node in core.doc.images() {
        draw_image(ctx, node, sprites.get(&node.id))?;
    }

    // Layer 3: rings. Group ring sits outside the selection ring.
    ctx.set_line_width(RING_WIDTH_PX * px);
    for node in core.doc.images() {
        if node.group_id.is_some() {
            set_dash(ctx, None)?;
            ctx.set_stroke_style_str(GROUP_RING_COLOR);
            stroke_outset(ctx, &node.bounds(), GROUP_RING_OFFSET_PX * px);
        }
        if node.selected {
            set_dash(ctx, Some(DASH_PX * px))?;
            ctx.set_stroke_style_str(SELECTION_COLOR);
            stroke_outset(ctx, &node.bounds(), SELECTION_RING_OFFSET_PX * px);
        }
    }

    // Layer 4: marquee.
    if let InputState::Marquee { start, current } = core.input {
        let rect = Rect::from_corners(start, current);
        ctx.set_fill_style_str(MARQUEE_FILL);
        ctx.fill_rect(rect.x, rect.y, rect.w, rect.h);
        set_dash(ctx, Some(DASH_PX * px))?;
        ctx.set_line_width(px);
        ctx.set_stroke_style_str(SELECTION_COLOR);
        ctx.stroke_rect(rect.x, rect.y, rect.w, rect.h);
    }

    set_dash(ctx, None)
}

fn draw_image(ctx: &CanvasRenderingContext2d, node: &ImageNode, raster: Option<&HtmlImageElement>) -> Result<(), JsValue> {
    match raster {
        Some(img) => ctx.draw_image_with_html_image_element_and_dw_and_dh(img, node.x, node.y, node.w, node.h),
        None => {
            ctx.set_fill_style_str(PLACEHOLDER_FILL);
            ctx.fill_rect(node.x, node.y, node.w, node.h);
            Ok(())
        }
    }
}

fn stroke_outset(ctx: &CanvasRenderingContext2d, r: &Rect, by: f64) {
    ctx.stroke_rect(r.x - by, r.y - by, r.w + 2.0 * by, r.h + 2.0 * by);
}

fn set_dash(ctx: &CanvasRenderingContext2d, dash: Option<f64>) -> Result<(), JsValue> {
    let segments = js_sys::Array::new();
    if let Some(len) = dash {
        segments.push(&JsValue::from_f64(len));
        segments.push(&JsValue::from_f64(len));
    }
    ctx.set_line_dash(&segments)
}
