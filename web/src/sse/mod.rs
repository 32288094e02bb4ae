//! SSE HTTP handlers for the web layer.
//!
//! This module contains only the Axum handlers for the subscribe and trigger
//! endpoints. The broker itself (registry, sinks, broadcast) lives in the
//! `sse` crate.

pub mod handler;
