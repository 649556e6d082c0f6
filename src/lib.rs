// src/lib.rs
//
// Core of the regional traffic-monitoring dashboard: rolling chart windows,
// vehicle-share synthesis, incident filtering, live-stream session handling
// and the nearest-camera lookup, all driven by one selection value.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod events;
pub mod lookup;
pub mod selection;
pub mod share;
pub mod stream;
pub mod types;
pub mod window;
