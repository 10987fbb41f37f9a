//! Domain services used by the HTTP and WebSocket routes.
//!
//! ARCHITECTURE
//! ============
//! Services own state mutation and room broadcast so route handlers stay
//! focused on protocol translation and status codes.

pub mod canvas;
pub mod chat;
pub mod room;
pub mod upload;
