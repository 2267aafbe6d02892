/*
 * Responsibility
 * - v1 の入口 (routes() と route marker を re-export)
 */
pub mod dto;
pub mod extractors;
pub mod handlers;
mod routes;

pub use routes::{PREFIX, markers, routes};
