//! Position-code codec.
//!
//! [`Codec`] ties the pieces together: the read-only [`Dictionary`], the
//! shared [`DiscoveryCache`] and a [`RulesEngine`]. Parsing, generation and
//! move application are implemented on it in their own modules.

pub mod cache;
pub mod dictionary;
pub mod generator;
pub mod moves;
pub mod parser;
pub mod rules;
pub mod share;
pub mod types;

use std::sync::Arc;

pub use cache::DiscoveryCache;
pub use dictionary::Dictionary;
pub use moves::MoveError;
pub use rules::{Classification, RulesEngine, RulesError, StandardRules};
pub use share::ShareCard;
pub use types::{Board, CodecError, MoveToken, Position, STARTING_BOARD, Side, Square};

/// Parser, generator and move engine over shared lookup tables.
///
/// Cloning is cheap; clones share the dictionary and the cache.
#[derive(Clone)]
pub struct Codec {
    rules: Arc<dyn RulesEngine>,
    dictionary: Arc<Dictionary>,
    cache: Arc<DiscoveryCache>,
}

impl Codec {
    pub fn new(
        rules: Arc<dyn RulesEngine>,
        dictionary: Arc<Dictionary>,
        cache: Arc<DiscoveryCache>,
    ) -> Self {
        Self {
            rules,
            dictionary,
            cache,
        }
    }

    /// Standard chess with the builtin dictionary and a cache of `capacity`.
    pub fn standard(capacity: usize) -> Self {
        let dictionary = Dictionary::builtin(&StandardRules);
        Self::new(
            Arc::new(StandardRules),
            Arc::new(dictionary),
            Arc::new(DiscoveryCache::new(capacity)),
        )
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn cache(&self) -> &DiscoveryCache {
        &self.cache
    }
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec")
            .field("dictionary", &self.dictionary.len())
            .field("cache", &self.cache.len())
            .finish()
    }
}
