//! tripcache library
//!
//! This module exposes the offline layer's building blocks for the tripcache
//! binary and for integration tests: the versioned cache store, the request
//! router, the install/activate lifecycle, the deferred sync queue, and the
//! control message protocol.

pub mod cli;
pub mod config;
pub mod control;
pub mod fallback;
pub mod layer;
pub mod lifecycle;
pub mod net;
pub mod router;
pub mod store;
pub mod sync;
