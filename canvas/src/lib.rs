//! Image canvas engine for the browser workspace.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It owns the
//! full lifecycle of the canvas: translating raw DOM input events into
//! selection, drag, pan, zoom and grouping changes, maintaining the viewport,
//! hit-testing images, and repainting on the next animation frame whenever
//! something changed. The host page only forwards DOM events to
//! [`bindings::CanvasHandle`] and relays the resulting realtime frames.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`doc`] | Image nodes, groups, and the store that keeps them consistent |
//! | [`viewport`] | Pan/zoom transform and coordinate conversions |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`hit`] | Hit-testing and marquee intersection |
//! | [`notify`] | Deferred selection-change notification |
//! | [`render`] | Scene painting on the 2D context |
//! | [`loader`] | Asynchronous image decoding |
//! | [`frame_loop`] | `requestAnimationFrame` driver |
//! | [`bindings`] | JavaScript surface |
//! | [`config`] | Host-supplied tunables |
//! | [`consts`] | Shared numeric constants and colors |
//! | [`error`] | Crate error type |

pub mod bindings;
pub mod config;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod error;
pub mod frame_loop;
pub mod hit;
pub mod input;
pub mod loader;
pub mod notify;
pub mod render;
pub mod viewport;
