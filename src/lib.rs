//! Secret Tree - Load mounted service credentials into a configuration map.
//!
//! This library walks a `<root>/<service>/<instance>/<file>` directory tree
//! and returns one record per instance, ready to be serialized into an
//! application's runtime configuration.

pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod render;
pub mod types;
