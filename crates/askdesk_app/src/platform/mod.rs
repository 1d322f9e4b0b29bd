//! Terminal front end: stdin in, rendered conversation out.
mod app;
mod config;
mod effects;
mod logging;
mod render;

pub use app::run_app;
