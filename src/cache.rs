//! Fact Cache - memoized fact table with explicit invalidation
//!
//! One instance is built at startup and shared (`Arc<FactCache>`) with every
//! consumer. Readers get an `Arc` snapshot of a fully built table; at most
//! one generation runs at a time, and a failed generation leaves an empty
//! table instead of a partial one.

use crate::generator::{FactGenerator, FactRecord, GenerationReport};
use crate::rng::SeededRng;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::{debug, info, warn};

pub type FactTable = Arc<Vec<FactRecord>>;

pub struct FactCache {
    generator: FactGenerator,
    /// Serializes generations; also owns the random stream so that a
    /// regeneration after `invalidate` continues it instead of restarting.
    rng: Mutex<SeededRng>,
    table: RwLock<Option<FactTable>>,
    last_report: RwLock<Option<GenerationReport>>,
}

impl std::fmt::Debug for FactCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactCache")
            .field("seed", &self.generator.config().seed)
            .field("cached", &self.is_cached())
            .finish_non_exhaustive()
    }
}

impl FactCache {
    pub fn new(generator: FactGenerator) -> Self {
        let rng = SeededRng::new(generator.config().seed);
        Self {
            generator,
            rng: Mutex::new(rng),
            table: RwLock::new(None),
            last_report: RwLock::new(None),
        }
    }

    pub fn generator(&self) -> &FactGenerator {
        &self.generator
    }

    /// The cached table, generating it on first access.
    pub fn get(&self) -> FactTable {
        if let Some(table) = self.cached() {
            return table;
        }

        let mut rng = self.lock_rng();
        // Another caller may have finished generating while we waited.
        if let Some(table) = self.cached() {
            debug!("Fact table generated by a concurrent caller");
            return table;
        }

        let table: FactTable = match self.generator.generate_with_report(&mut rng) {
            Ok((records, report)) => {
                *self.last_report.write().unwrap_or_else(|e| e.into_inner()) = Some(report);
                Arc::new(records)
            }
            Err(e) => {
                warn!("Fact generation failed, caching empty table: {}", e);
                Arc::new(Vec::new())
            }
        };

        *self.table.write().unwrap_or_else(|e| e.into_inner()) = Some(table.clone());
        table
    }

    /// Run [`FactCache::get`] on a blocking worker so async callers stay
    /// responsive during generation.
    pub async fn get_async(self: Arc<Self>) -> FactTable {
        let cache = self.clone();
        match tokio::task::spawn_blocking(move || cache.get()).await {
            Ok(table) => table,
            Err(e) => {
                warn!("Background generation task failed: {}", e);
                self.cached().unwrap_or_else(|| Arc::new(Vec::new()))
            }
        }
    }

    /// Drop the cached table; the next `get` regenerates it.
    pub fn invalidate(&self) {
        let mut table = self.table.write().unwrap_or_else(|e| e.into_inner());
        if table.take().is_some() {
            info!("Fact table invalidated");
        }
    }

    /// Reset the random stream to `seed` and invalidate, so the next `get`
    /// reproduces the table for that seed.
    pub fn reseed(&self, seed: u64) {
        let mut rng = self.lock_rng();
        rng.reseed(seed);
        drop(rng);
        self.invalidate();
    }

    pub fn is_cached(&self) -> bool {
        self.cached().is_some()
    }

    pub fn last_report(&self) -> Option<GenerationReport> {
        self.last_report.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn cached(&self) -> Option<FactTable> {
        self.table.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn lock_rng(&self) -> MutexGuard<'_, SeededRng> {
        self.rng.lock().unwrap_or_else(|e| e.into_inner())
    }
}
