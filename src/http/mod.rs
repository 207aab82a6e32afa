//! HTTP server module
//!
//! Serves recorded assets straight out of a segment store:
//! - Axum router with health, version and asset listing endpoints
//! - Playlist and segment handlers with HLS headers
//! - LRU segment cache with a memory budget
//! - CORS middleware

pub mod cache;
pub mod handlers;
pub mod routes;

use std::sync::Arc;

use crate::config::WriterConfig;
use crate::segment::SegmentStore;

pub use cache::SegmentCache;
pub use routes::create_router;

/// Shared state for the asset server
pub struct ServeState {
    /// Where recorded segments and playlists live
    pub store: Arc<dyn SegmentStore>,
    /// Segment bytes already read from the store
    pub cache: SegmentCache,
    pub config: WriterConfig,
}

impl ServeState {
    pub fn new(config: WriterConfig, store: Arc<dyn SegmentStore>) -> Self {
        Self {
            store,
            cache: SegmentCache::new(config.cache.clone()),
            config,
        }
    }
}
