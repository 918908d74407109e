//! Terminal front end: argument parsing, config, logging, and the message loop.
mod app;
mod args;
mod config;
mod effects;
mod input;
mod logging;
mod render;

pub use app::run_app;
pub use args::Args;
