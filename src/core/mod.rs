//! Host primitives: HTTP server and plugin loading

pub mod http;
pub mod plugins;

pub use http::*;
pub use plugins::*;
