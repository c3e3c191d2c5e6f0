//! Control messages from the page to the offline layer
//!
//! The page steers the layer with small tagged messages: promote a waiting
//! version, push one record into the cache, wipe everything, or ask for a
//! size report. Messages carry a `type` tag on the wire; dispatch happens in
//! `OfflineLayer::handle_message`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::SizeReport;

/// A control message sent by the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ControlMessage {
    /// Promote a waiting layer to active immediately
    SkipWaiting,
    /// Cache a single API record pushed by the page
    #[serde(rename = "cache-one-record")]
    CacheRecord {
        /// Request URL the record should answer
        key: String,
        /// The JSON body to store
        payload: Value,
    },
    /// Delete every cache namespace
    ClearAll,
    /// Report per-namespace entry counts and sizes
    ReportCacheSize,
}

/// Reply to a control message
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ControlReply {
    /// The message was applied
    Ack,
    /// Current cache usage, answering `ReportCacheSize`
    CacheSize(SizeReport),
}
