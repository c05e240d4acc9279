//! HTTP request handlers for the map service.

pub mod health;
pub mod map;
