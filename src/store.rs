//! Keyed access to uploaded price series.
//!
//! An uploaded dataset holds one series per label (grade or type). The engine
//! only reads datasets by key; how they are uploaded, cached or expired
//! belongs to the implementor.

use crate::core::Series;
use crate::error::{ForecastError, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

/// Read access to stored price datasets.
pub trait DatasetStore: Send + Sync {
    /// Every series stored under `key`, sorted by label.
    ///
    /// Unknown or expired keys yield [`ForecastError::DatasetNotFound`].
    fn series_set(&self, key: &str) -> Result<Vec<Series>>;

    /// The primary series under `key`: the first one in label order.
    fn series(&self, key: &str) -> Result<Series> {
        self.series_set(key)?
            .into_iter()
            .next()
            .ok_or_else(|| ForecastError::DatasetNotFound(key.to_string()))
    }
}

type Dataset = BTreeMap<String, Series>;

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    datasets: RwLock<HashMap<String, Dataset>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a single-series dataset under `key`, returning the dataset it replaced.
    pub fn insert(&self, key: impl Into<String>, series: Series) -> Option<Vec<Series>> {
        self.insert_set(key, [series])
    }

    /// Store a dataset of several series under `key`.
    ///
    /// Series are keyed by [`Series::label_or_default`]; a later series replaces
    /// an earlier one with the same label.
    pub fn insert_set<I>(&self, key: impl Into<String>, series: I) -> Option<Vec<Series>>
    where
        I: IntoIterator<Item = Series>,
    {
        let dataset: Dataset = series
            .into_iter()
            .map(|s| (s.label_or_default().to_string(), s))
            .collect();
        self.write()
            .insert(key.into(), dataset)
            .map(|old| old.into_values().collect())
    }

    /// Remove the dataset under `key`.
    pub fn remove(&self, key: &str) -> Option<Vec<Series>> {
        self.write()
            .remove(key)
            .map(|old| old.into_values().collect())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    /// Labels of the dataset under `key`, in sorted order.
    pub fn labels(&self, key: &str) -> Option<Vec<String>> {
        self.read().get(key).map(|d| d.keys().cloned().collect())
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // Every write is a single map operation; poisoning is ignored.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Dataset>> {
        self.datasets.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Dataset>> {
        self.datasets.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl DatasetStore for InMemoryStore {
    fn series_set(&self, key: &str) -> Result<Vec<Series>> {
        match self.read().get(key) {
            Some(dataset) if !dataset.is_empty() => Ok(dataset.values().cloned().collect()),
            _ => Err(ForecastError::DatasetNotFound(key.to_string())),
        }
    }
}
