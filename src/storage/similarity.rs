//! Query similarity index over past research runs.
//!
//! Backed by ares-vector's embedded HNSW index with cosine distance.
//! Queries are embedded with a deterministic hashed bag-of-words projection
//! so the index works without an embedding model or network access. Full
//! payloads live in a side store (optionally persisted as JSON) keyed by
//! entry id, mirroring how vectors and documents are kept separate.
//!
//! Every failure here degrades to a miss: `add` swallows errors and
//! `search` returns an empty list. The pipeline never observes an error
//! from this collaborator.

use ares_vector::{Config, DistanceMetric, VectorDb};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::types::{AppError, Result};

const COLLECTION: &str = "research_runs";
const EMBEDDING_DIMS: usize = 256;

/// One similar prior query.
#[derive(Debug, Clone)]
pub struct SimilarityHit {
    /// The previously indexed query.
    pub query: String,
    /// The payload stored alongside it.
    pub payload: Value,
    /// Cosine distance to the probe query (lower is closer).
    pub distance: f32,
}

/// A stored run: the original query plus its result payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRun {
    query: String,
    payload: Value,
}

/// Embedded vector index of past research queries and their outcomes.
pub struct SimilarityIndex {
    db: VectorDb,
    /// Payload storage keyed by entry id.
    entries: Arc<RwLock<HashMap<String, StoredRun>>>,
    /// Storage path (None for in-memory).
    path: Option<PathBuf>,
}

impl SimilarityIndex {
    /// Open the index, persistent under `path` or in-memory when `None`.
    pub async fn open(path: Option<PathBuf>) -> Result<Self> {
        let config = match &path {
            Some(p) => Config::persistent(p.to_string_lossy().to_string()),
            None => Config::memory(),
        };

        let db = VectorDb::open(config)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to open similarity index: {e}")))?;

        if !db.list_collections().contains(&COLLECTION.to_string()) {
            db.create_collection(COLLECTION, EMBEDDING_DIMS, DistanceMetric::Cosine)
                .await
                .map_err(|e| {
                    AppError::Storage(format!("Failed to create similarity collection: {e}"))
                })?;
        }

        let index = Self {
            db,
            entries: Arc::new(RwLock::new(HashMap::new())),
            path,
        };

        if let Some(ref p) = index.path {
            index.load_entries(p).await;
        }

        Ok(index)
    }

    /// Index a query and its result payload. Failures are swallowed.
    pub async fn add(&self, query: &str, payload: &Value) {
        let id = entry_id(query);
        let embedding = embed(query);

        if let Err(e) = self.db.insert(COLLECTION, &id, &embedding, None).await {
            tracing::debug!("similarity insert failed: {e}");
            return;
        }

        {
            let mut entries = self.entries.write();
            entries.insert(
                id,
                StoredRun {
                    query: query.to_string(),
                    payload: payload.clone(),
                },
            );
        }

        if self.path.is_some() {
            self.save_entries().await;
        }
    }

    /// Find up to `n` similar prior queries. Failures yield an empty list.
    pub async fn search(&self, query: &str, n: usize) -> Vec<SimilarityHit> {
        let embedding = embed(query);

        let results = match self.db.search(COLLECTION, &embedding, n).await {
            Ok(results) => results,
            Err(e) => {
                tracing::debug!("similarity search failed: {e}");
                return Vec::new();
            }
        };

        let entries = self.entries.read();
        results
            .into_iter()
            .filter_map(|hit| {
                let stored = entries.get(&hit.id)?;
                Some(SimilarityHit {
                    query: stored.query.clone(),
                    payload: stored.payload.clone(),
                    // The index reports a similarity score; callers reason
                    // in cosine distance.
                    distance: 1.0 - hit.score,
                })
            })
            .collect()
    }

    async fn load_entries(&self, path: &Path) {
        let entries_path = path.join("entries.json");
        let Ok(raw) = tokio::fs::read_to_string(&entries_path).await else {
            return;
        };
        match serde_json::from_str::<HashMap<String, StoredRun>>(&raw) {
            Ok(loaded) => {
                let mut entries = self.entries.write();
                *entries = loaded;
            }
            Err(e) => tracing::debug!("discarding unreadable similarity entries: {e}"),
        }
    }

    async fn save_entries(&self) {
        let Some(ref path) = self.path else { return };

        // Clone the data to avoid holding the lock across await.
        let serialized = {
            let entries = self.entries.read();
            match serde_json::to_string_pretty(&*entries) {
                Ok(s) => s,
                Err(e) => {
                    tracing::debug!("failed to serialize similarity entries: {e}");
                    return;
                }
            }
        };

        if let Err(e) = tokio::fs::create_dir_all(path).await {
            tracing::debug!("failed to create similarity dir: {e}");
            return;
        }
        if let Err(e) = tokio::fs::write(path.join("entries.json"), serialized).await {
            tracing::debug!("failed to write similarity entries: {e}");
        }
    }
}

fn entry_id(query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Deterministic hashed bag-of-words embedding, L2-normalized.
///
/// Tokens are lowercased alphanumeric runs; each token increments the
/// bucket selected by the low bits of its SHA-256 digest.
fn embed(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; EMBEDDING_DIMS];

    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let digest = Sha256::digest(token.to_lowercase().as_bytes());
        let bucket = u64::from_le_bytes(digest[..8].try_into().expect("digest is 32 bytes"))
            as usize
            % EMBEDDING_DIMS;
        vector[bucket] += 1.0;
    }

    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut vector {
            *x /= norm;
        }
    }
    vector
}
