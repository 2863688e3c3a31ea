use std::sync::Arc;

use crate::codec::{Codec, Dictionary, DiscoveryCache, StandardRules};
use crate::config::AppConfig;

/// Shared application state passed to all handlers via Axum's State extractor.
pub struct AppState {
    pub codec: Codec,
    pub config: AppConfig,
    pub start_time: std::time::Instant,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: AppConfig) -> SharedState {
        let dictionary = Dictionary::load(config.dictionary_path.as_deref(), &StandardRules);
        let codec = Codec::new(
            Arc::new(StandardRules),
            Arc::new(dictionary),
            Arc::new(DiscoveryCache::new(config.cache_capacity)),
        );

        Arc::new(AppState {
            codec,
            config,
            start_time: std::time::Instant::now(),
        })
    }
}
