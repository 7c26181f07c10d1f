//! HTTP surface for the media conversion service.

pub mod api;
pub mod metrics;
pub mod state;
