//! Static opening dictionary.
//!
//! Built once at startup from a tab-separated table of `key`, `name` and a
//! move line. Every line is replayed through the rules engine so the
//! dictionary can answer both key → board and board → key. Read-only after
//! construction.

use std::collections::HashMap;
use std::path::Path;

use tracing::{info, warn};

use super::moves::walk;
use super::rules::RulesEngine;
use super::types::Board;

/// The table shipped with the crate.
pub const BUILTIN_SOURCE: &str = include_str!("../../data/openings.tsv");

/// Longest accepted key. Four characters would overlap a move token.
const MAX_KEY_LEN: usize = 3;

/// One dictionary row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub name: String,
    /// Normalized move line from the starting position.
    pub moves: String,
    pub board: Board,
}

/// Bidirectional key ↔ board table.
#[derive(Debug, Default)]
pub struct Dictionary {
    entries: Vec<Entry>,
    by_key: HashMap<String, usize>,
    by_board: HashMap<Board, usize>,
}

impl Dictionary {
    /// Empty dictionary; every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Dictionary built from the embedded table.
    pub fn builtin(rules: &dyn RulesEngine) -> Self {
        Self::from_source(BUILTIN_SOURCE, rules)
    }

    /// Build from `path` when given and readable, otherwise from the embedded table.
    pub fn load(path: Option<&Path>, rules: &dyn RulesEngine) -> Self {
        let Some(path) = path else {
            return Self::builtin(rules);
        };
        match std::fs::read_to_string(path) {
            Ok(source) => Self::from_source(&source, rules),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read dictionary, using builtin table");
                Self::builtin(rules)
            }
        }
    }

    /// Parse a table. Lines that fail to parse or replay are skipped.
    pub fn from_source(source: &str, rules: &dyn RulesEngine) -> Self {
        let mut dict = Self::default();

        for (lineno, line) in source.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let cols: Vec<&str> = line.split('\t').collect();
            let [key, name, moves] = cols.as_slice() else {
                warn!(line = lineno + 1, "dictionary line needs three tab-separated columns");
                continue;
            };
            let key = key.trim();

            if key.is_empty()
                || key.len() > MAX_KEY_LEN
                || !key.chars().all(|c| c.is_ascii_alphanumeric())
            {
                warn!(line = lineno + 1, key, "dictionary key must be 1-3 alphanumerics");
                continue;
            }
            if dict.by_key.contains_key(key) {
                warn!(line = lineno + 1, key, "duplicate dictionary key");
                continue;
            }

            let (board, moves) = match walk(rules, moves.trim(), |_| {}) {
                Ok(reached) => reached,
                Err(e) => {
                    warn!(line = lineno + 1, key, error = %e, "dictionary line does not replay");
                    continue;
                }
            };

            let index = dict.entries.len();
            dict.by_key.insert(key.to_string(), index);
            // First key to reach a board keeps it.
            dict.by_board.entry(board.clone()).or_insert(index);
            dict.entries.push(Entry {
                key: key.to_string(),
                name: name.trim().to_string(),
                moves,
                board,
            });
        }

        info!(entries = dict.entries.len(), "opening dictionary ready");
        dict
    }

    /// Board for `key`.
    pub fn lookup_by_key(&self, key: &str) -> Option<&Board> {
        self.entry(key).map(|e| &e.board)
    }

    /// Preferred key for `board`.
    pub fn lookup_by_board(&self, board: &Board) -> Option<&str> {
        self.by_board
            .get(board)
            .map(|&i| self.entries[i].key.as_str())
    }

    /// Full row for `key`.
    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.by_key.get(key).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
