#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod graph;
pub mod loader;
pub mod render;
pub mod util;
