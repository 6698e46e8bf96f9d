// SPDX-FileCopyrightText: 2025 ECHIDNA Project Team
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Content-addressed proof cache
//!
//! Keys are SHA-256 digests over the canonical formula, the sorted axiom
//! strings, the prover name and the sorted prover configuration, so the
//! same question asked of the same prover always lands on the same entry
//! regardless of axiom or option order.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::core::Formula;
use crate::integration::AggregatedProverResult;
use crate::provers::ProofResult;

/// Hex-encoded SHA-256 cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for `(formula, axioms, prover_name, prover_config)`
    pub fn derive(
        formula: &Formula,
        axioms: &[Formula],
        prover_name: &str,
        prover_config: &BTreeMap<String, String>,
    ) -> Self {
        let mut axiom_strings: Vec<String> = axioms.iter().map(Formula::canonical).collect();
        axiom_strings.sort();

        let mut hasher = Sha256::new();
        feed(&mut hasher, &formula.canonical());
        hasher.update((axiom_strings.len() as u64).to_le_bytes());
        for axiom in &axiom_strings {
            feed(&mut hasher, axiom);
        }
        feed(&mut hasher, prover_name);
        // BTreeMap iteration is already sorted by key
        hasher.update((prover_config.len() as u64).to_le_bytes());
        for (key, value) in prover_config {
            feed(&mut hasher, key);
            feed(&mut hasher, value);
        }

        let digest = hasher.finalize();
        CacheKey(digest.iter().map(|b| format!("{:02x}", b)).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Length-prefixed so that field boundaries are unambiguous
fn feed(hasher: &mut Sha256, field: &str) {
    hasher.update((field.len() as u64).to_le_bytes());
    hasher.update(field.as_bytes());
}

/// A value stored in the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CachedResult {
    /// One adapter's result
    Proof(ProofResult),
    /// A multi-prover verification
    Aggregate(AggregatedProverResult),
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_requests: u64,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub cache_size: usize,
    pub maxsize: usize,
}

/// Proof cache shared between adapters, routers and the integration layer.
///
/// Implementations must tolerate concurrent calls.
pub trait ProofCache: Send + Sync {
    fn get_key(&self, key: &CacheKey) -> Option<CachedResult>;

    fn set_key(&self, key: CacheKey, value: CachedResult);

    fn clear(&self);

    fn get_stats(&self) -> CacheStats;

    fn get(
        &self,
        formula: &Formula,
        axioms: &[Formula],
        prover_name: &str,
        prover_config: &BTreeMap<String, String>,
    ) -> Option<CachedResult> {
        self.get_key(&CacheKey::derive(formula, axioms, prover_name, prover_config))
    }

    fn set(
        &self,
        formula: &Formula,
        result: CachedResult,
        axioms: &[Formula],
        prover_name: &str,
        prover_config: &BTreeMap<String, String>,
    ) {
        self.set_key(
            CacheKey::derive(formula, axioms, prover_name, prover_config),
            result,
        )
    }
}

struct Entry {
    value: CachedResult,
    inserted: Instant,
    last_used: u64,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, Entry>,
    clock: u64,
    hits: u64,
    misses: u64,
}

/// In-process LRU cache with optional time-to-live
pub struct InMemoryProofCache {
    maxsize: usize,
    ttl: Option<Duration>,
    state: Mutex<CacheState>,
}

impl InMemoryProofCache {
    pub const DEFAULT_MAXSIZE: usize = 1000;

    pub fn new(maxsize: usize, ttl: Option<Duration>) -> Self {
        InMemoryProofCache {
            maxsize: maxsize.max(1),
            ttl,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn expired(&self, entry: &Entry) -> bool {
        self.ttl.map_or(false, |ttl| entry.inserted.elapsed() >= ttl)
    }
}

impl Default for InMemoryProofCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAXSIZE, None)
    }
}

impl ProofCache for InMemoryProofCache {
    fn get_key(&self, key: &CacheKey) -> Option<CachedResult> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.clock += 1;
        let now = state.clock;

        let expired = match state.entries.get(key) {
            Some(entry) => self.expired(entry),
            None => {
                state.misses += 1;
                return None;
            }
        };
        if expired {
            debug!("Cache entry {} expired", key);
            state.entries.remove(key);
            state.misses += 1;
            return None;
        }

        state.hits += 1;
        let entry = state.entries.get_mut(key)?;
        entry.last_used = now;
        Some(entry.value.clone())
    }

    fn set_key(&self, key: CacheKey, value: CachedResult) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.clock += 1;
        let now = state.clock;

        if !state.entries.contains_key(&key) && state.entries.len() >= self.maxsize {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                debug!("Evicting least recently used cache entry {}", oldest);
                state.entries.remove(&oldest);
            }
        }

        state.entries.insert(
            key,
            Entry {
                value,
                inserted: Instant::now(),
                last_used: now,
            },
        );
    }

    fn clear(&self) {
        let mut state = self.state.lock();
        *state = CacheState::default();
    }

    fn get_stats(&self) -> CacheStats {
        let state = self.state.lock();
        let total_requests = state.hits + state.misses;
        CacheStats {
            total_requests,
            hits: state.hits,
            misses: state.misses,
            hit_rate: if total_requests == 0 {
                0.0
            } else {
                state.hits as f64 / total_requests as f64
            },
            cache_size: state.entries.len(),
            maxsize: self.maxsize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provers::ProverKind;
    use std::sync::Arc;

    fn atom(name: &str) -> Formula {
        Formula::atom(name)
    }

    fn proof(confidence: f64) -> CachedResult {
        CachedResult::Proof(ProofResult::proved(ProverKind::Z3, confidence, Duration::ZERO))
    }

    #[test]
    fn test_key_is_order_independent() {
        let mut config_a = BTreeMap::new();
        config_a.insert("timeout".to_string(), "5".to_string());
        config_a.insert("model".to_string(), "x".to_string());
        let mut config_b = BTreeMap::new();
        config_b.insert("model".to_string(), "x".to_string());
        config_b.insert("timeout".to_string(), "5".to_string());

        let a = CacheKey::derive(&atom("P"), &[atom("A"), atom("B")], "z3", &config_a);
        let b = CacheKey::derive(&atom("P"), &[atom("B"), atom("A")], "z3", &config_b);
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_key_distinguishes_inputs() {
        let empty = BTreeMap::new();
        let base = CacheKey::derive(&atom("P"), &[], "z3", &empty);
        assert_ne!(base, CacheKey::derive(&atom("Q"), &[], "z3", &empty));
        assert_ne!(base, CacheKey::derive(&atom("P"), &[atom("A")], "z3", &empty));
        assert_ne!(base, CacheKey::derive(&atom("P"), &[], "cvc5", &empty));
    }

    #[test]
    fn test_get_set_and_stats() {
        let cache = InMemoryProofCache::new(10, None);
        let config = BTreeMap::new();
        assert!(cache.get(&atom("P"), &[], "z3", &config).is_none());

        cache.set(&atom("P"), proof(0.95), &[], "z3", &config);
        assert_eq!(cache.get(&atom("P"), &[], "z3", &config), Some(proof(0.95)));

        let stats = cache.get_stats();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate, 0.5);
        assert_eq!(stats.cache_size, 1);
        assert_eq!(stats.maxsize, 10);
    }

    #[test]
    fn test_lru_eviction() {
        let cache = InMemoryProofCache::new(2, None);
        let config = BTreeMap::new();
        cache.set(&atom("A"), proof(0.1), &[], "z3", &config);
        cache.set(&atom("B"), proof(0.2), &[], "z3", &config);
        // Touch A so that B becomes least recently used
        assert!(cache.get(&atom("A"), &[], "z3", &config).is_some());
        cache.set(&atom("C"), proof(0.3), &[], "z3", &config);

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&atom("A"), &[], "z3", &config).is_some());
        assert!(cache.get(&atom("B"), &[], "z3", &config).is_none());
        assert!(cache.get(&atom("C"), &[], "z3", &config).is_some());
    }

    #[test]
    fn test_ttl_expiry_counts_as_miss() {
        let cache = InMemoryProofCache::new(10, Some(Duration::ZERO));
        let config = BTreeMap::new();
        cache.set(&atom("P"), proof(0.9), &[], "z3", &config);
        assert!(cache.get(&atom("P"), &[], "z3", &config).is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.get_stats().misses, 1);
    }

    #[test]
    fn test_clear_resets_everything() {
        let cache = InMemoryProofCache::default();
        let config = BTreeMap::new();
        cache.set(&atom("P"), proof(0.9), &[], "z3", &config);
        let _ = cache.get(&atom("P"), &[], "z3", &config);
        cache.clear();
        assert_eq!(cache.get_stats().total_requests, 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(InMemoryProofCache::new(64, None));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    let config = BTreeMap::new();
                    for j in 0..50 {
                        let f = Formula::atom(format!("P{}_{}", i, j % 4));
                        cache.set(&f, proof(0.5), &[], "native", &config);
                        let _ = cache.get(&f, &[], "native", &config);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let stats = cache.get_stats();
        assert_eq!(stats.total_requests, 400);
        assert_eq!(stats.cache_size, 32);
    }
}
