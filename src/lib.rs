// Library root for the like relay

pub mod api;
pub mod config;
pub mod core;
pub mod engine;
pub mod loader;
pub mod proxy;
