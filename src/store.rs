use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::config::OrbitalParams;
use crate::sampler::SampleResult;

/// A complete cloud together with the parameters that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct CloudSnapshot {
    pub generation: u64,
    pub params: OrbitalParams,
    pub result: SampleResult,
}

/// Latest published cloud. Publishing swaps the whole snapshot at once, so a
/// reader sees either the previous cloud or the new one, never a mix.
#[derive(Debug, Default)]
pub struct CloudStore {
    latest: RwLock<Option<Arc<CloudSnapshot>>>,
}

impl CloudStore {
    pub fn new() -> Self {
        CloudStore::default()
    }

    /// Replaces the current cloud and returns the published snapshot.
    pub fn publish(&self, params: OrbitalParams, result: SampleResult) -> Arc<CloudSnapshot> {
        let mut latest = self
            .latest
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let generation = latest.as_ref().map_or(1, |s| s.generation + 1);
        let snapshot = Arc::new(CloudSnapshot {
            generation,
            params,
            result,
        });
        *latest = Some(Arc::clone(&snapshot));
        snapshot
    }

    pub fn current(&self) -> Option<Arc<CloudSnapshot>> {
        self.latest
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
