//! Versioned response cache for offline storage
//!
//! This module stores serialized HTTP responses in named, versioned
//! namespaces (e.g. `static-v3`). A namespace is retired wholesale when the
//! cache version rolls over; entries are never migrated between versions and
//! carry no per-entry expiry. Two backends implement the `CacheStore` trait:
//! `DiskStore` persists entries as JSON files under the XDG cache directory,
//! and `MemoryStore` keeps them in a map for tests.

mod disk;
mod memory;
mod response;
mod traits;

pub use disk::DiskStore;
pub use memory::MemoryStore;
pub use response::{CachedResponse, StoredResponse};
pub use traits::{CacheStore, NamespaceSize, SizeReport, StoreError};

/// The named cache partitions the offline layer maintains
///
/// Each kind becomes one versioned namespace: static assets, API data, and
/// page shells. Uncategorized GET responses share the pages namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceKind {
    /// Immutable build artifacts: scripts, styles, fonts, images
    Static,
    /// JSON responses from the backend API
    Api,
    /// HTML documents served for navigations
    Pages,
}

impl NamespaceKind {
    /// All partition kinds, in sweep order
    pub const ALL: [NamespaceKind; 3] = [
        NamespaceKind::Static,
        NamespaceKind::Api,
        NamespaceKind::Pages,
    ];

    /// The namespace tag prefix, to which the cache version is appended
    pub fn prefix(self) -> &'static str {
        match self {
            NamespaceKind::Static => "static",
            NamespaceKind::Api => "api",
            NamespaceKind::Pages => "pages",
        }
    }
}
