//! FAQ store: static question → answer mapping loaded once at startup.
//!
//! Lookups are exact matches on the normalized (trimmed, lower-cased)
//! question. A missing or malformed source degrades to an empty store.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, warn};

use crate::flow::normalize;

/// Immutable FAQ mapping. Shared read-only across conversations.
#[derive(Debug, Clone, Default)]
pub struct FaqStore {
    entries: BTreeMap<String, String>,
}

impl FaqStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a store from (question, answer) pairs, normalizing the questions.
    pub fn from_pairs<I, Q, A>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Q, A)>,
        Q: AsRef<str>,
        A: Into<String>,
    {
        let mut entries = BTreeMap::new();
        for (question, answer) in pairs {
            let key = normalize(question.as_ref());
            if key.is_empty() {
                warn!("Skipping FAQ entry with an empty question");
                continue;
            }
            if entries.insert(key.clone(), answer.into()).is_some() {
                warn!(question = %key, "Duplicate FAQ question after normalization; keeping the last answer");
            }
        }
        Self { entries }
    }

    /// Parse a JSON object of question → answer.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: BTreeMap<String, String> = serde_json::from_str(json)?;
        Ok(Self::from_pairs(raw))
    }

    /// Load the FAQ file. Never fails: a missing or malformed file yields an
    /// empty store and a warning.
    pub async fn load(path: &Path) -> Self {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "FAQ file not readable; FAQ disabled");
                return Self::empty();
            }
        };
        match Self::from_json(&contents) {
            Ok(store) => {
                info!(path = %path.display(), entries = store.len(), "FAQ loaded");
                store
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "FAQ file malformed; FAQ disabled");
                Self::empty()
            }
        }
    }

    /// Exact lookup after normalization.
    pub fn lookup(&self, question: &str) -> Option<&str> {
        self.entries.get(&normalize(question)).map(String::as_str)
    }

    /// Normalized questions, in menu order.
    pub fn questions(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
