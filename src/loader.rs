//! Load a statistics table onto the feature index.
//!
//! A load runs fetch -> parse -> resolve -> widen range -> assign. Every load
//! and every clear bumps a generation counter; a payload that arrives for an
//! older generation is dropped instead of overwriting fresher state.

use crate::api::StatSource;
use crate::error::ChoroplethError;
use crate::features::{FeatureStore, STAT_PROPERTY};
use crate::models::{RegionKey, RowLayout, StatTable};
use crate::region::RegionKeyResolver;
use crate::stats::StatRange;
use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

/// Identifies one load cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A row whose region could not be found in the feature index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnresolvedRow {
    pub locality: String,
    pub country: String,
    pub value: f64,
}

/// Summary of an applied load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadOutcome {
    pub generation: u64,
    pub layout: RowLayout,
    /// `(region, value)` pairs written to the store, in row order.
    pub assignments: Vec<(RegionKey, f64)>,
    pub unresolved: Vec<UnresolvedRow>,
    /// Rows dropped during parsing (too few cells).
    pub skipped: usize,
    pub range: StatRange,
}

impl LoadOutcome {
    pub fn min(&self) -> f64 {
        self.range.min()
    }

    pub fn max(&self) -> f64 {
        self.range.max()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Applied(LoadOutcome),
    /// The ticket was superseded by a newer load or a clear.
    Discarded { ticket: LoadTicket, current: u64 },
}

impl LoadStatus {
    pub fn outcome(&self) -> Option<&LoadOutcome> {
        match self {
            LoadStatus::Applied(o) => Some(o),
            LoadStatus::Discarded { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatDataLoader {
    resolver: RegionKeyResolver,
    range: StatRange,
    generation: u64,
}

impl StatDataLoader {
    pub fn new(resolver: RegionKeyResolver) -> Self {
        Self {
            resolver,
            range: StatRange::new(),
            generation: 0,
        }
    }

    pub fn range(&self) -> &StatRange {
        &self.range
    }

    pub fn resolver(&self) -> &RegionKeyResolver {
        &self.resolver
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a new load cycle, invalidating any outstanding ticket.
    pub fn begin(&mut self) -> LoadTicket {
        self.generation += 1;
        LoadTicket {
            generation: self.generation,
        }
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Reset the range, unset every feature's value, and invalidate in-flight loads.
    pub fn clear<S: FeatureStore + ?Sized>(&mut self, store: &mut S) {
        self.range.reset();
        for id in store.ids() {
            store.remove_property(&id, STAT_PROPERTY);
        }
        self.generation += 1;
    }

    /// Apply a fetched payload for `ticket`.
    ///
    /// Nothing is mutated unless the ticket is current and the payload parses.
    /// Unresolved rows are skipped with a warning.
    pub fn apply<S: FeatureStore + ?Sized>(
        &mut self,
        ticket: LoadTicket,
        payload: &str,
        store: &mut S,
    ) -> Result<LoadStatus, ChoroplethError> {
        if !self.is_current(ticket) {
            log::info!(
                "discarding stale load (generation {} < {})",
                ticket.generation,
                self.generation
            );
            return Ok(LoadStatus::Discarded {
                ticket,
                current: self.generation,
            });
        }

        let table = StatTable::parse(payload)?;

        let mut assignments = Vec::with_capacity(table.rows.len());
        let mut unresolved = Vec::new();
        for row in &table.rows {
            match self.resolver.resolve(&row.locality, &row.country, &*store) {
                Ok(key) => assignments.push((key, row.value)),
                Err(e) => {
                    log::warn!("{}", e);
                    unresolved.push(UnresolvedRow {
                        locality: row.locality.clone(),
                        country: row.country.clone(),
                        value: row.value,
                    });
                }
            }
        }

        for (key, value) in &assignments {
            self.range.observe(*value);
            store.set_stat_value(key.as_str(), *value);
        }

        log::info!(
            "loaded {} regions ({} unresolved), range {}..{}",
            assignments.len(),
            unresolved.len(),
            self.range.min(),
            self.range.max()
        );

        Ok(LoadStatus::Applied(LoadOutcome {
            generation: ticket.generation,
            layout: table.layout,
            assignments,
            unresolved,
            skipped: table.skipped,
            range: self.range,
        }))
    }

    /// Fetch and apply in one blocking step.
    pub fn load<Src, S>(&mut self, source: &Src, source_ref: &str, store: &mut S) -> Result<LoadOutcome>
    where
        Src: StatSource + ?Sized,
        S: FeatureStore + ?Sized,
    {
        let ticket = self.begin();
        let payload = source
            .fetch(source_ref)
            .with_context(|| format!("fetch statistics from {}", source_ref))?;
        match self
            .apply(ticket, &payload, store)
            .with_context(|| format!("load statistics from {}", source_ref))?
        {
            LoadStatus::Applied(outcome) => Ok(outcome),
            LoadStatus::Discarded { .. } => bail!("load of {} was superseded", source_ref),
        }
    }

    /// Start a load whose fetch runs on a worker thread.
    ///
    /// The returned handle is polled from the owning thread; all state changes
    /// happen there, never on the worker.
    pub fn spawn_fetch<Src>(&mut self, source: Src, source_ref: &str) -> PendingLoad
    where
        Src: StatSource + Send + 'static,
    {
        let ticket = self.begin();
        let (tx, rx) = mpsc::channel();
        let worker_ref = source_ref.to_string();
        thread::spawn(move || {
            let result = source.fetch(&worker_ref);
            // The receiver may be gone if the load was abandoned.
            let _ = tx.send(result);
        });
        PendingLoad {
            ticket,
            source_ref: source_ref.to_string(),
            rx,
        }
    }
}

/// A load whose payload is still being fetched.
#[derive(Debug)]
pub struct PendingLoad {
    ticket: LoadTicket,
    source_ref: String,
    rx: Receiver<Result<String>>,
}

impl PendingLoad {
    pub fn ticket(&self) -> LoadTicket {
        self.ticket
    }

    pub fn source_ref(&self) -> &str {
        &self.source_ref
    }

    /// Non-blocking poll. `None` while the fetch is still running.
    pub fn try_finish<S: FeatureStore + ?Sized>(
        &self,
        loader: &mut StatDataLoader,
        store: &mut S,
    ) -> Option<Result<LoadStatus>> {
        match self.rx.try_recv() {
            Ok(fetched) => Some(self.complete(fetched, loader, store)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(anyhow!(
                "fetch worker for {} exited without a result",
                self.source_ref
            ))),
        }
    }

    /// Block until the fetch finishes, then apply it.
    pub fn wait<S: FeatureStore + ?Sized>(
        self,
        loader: &mut StatDataLoader,
        store: &mut S,
    ) -> Result<LoadStatus> {
        let fetched = self
            .rx
            .recv()
            .map_err(|_| anyhow!("fetch worker for {} exited without a result", self.source_ref))?;
        self.complete(fetched, loader, store)
    }

    fn complete<S: FeatureStore + ?Sized>(
        &self,
        fetched: Result<String>,
        loader: &mut StatDataLoader,
        store: &mut S,
    ) -> Result<LoadStatus> {
        if !loader.is_current(self.ticket) {
            return Ok(LoadStatus::Discarded {
                ticket: self.ticket,
                current: loader.generation(),
            });
        }
        let payload =
            fetched.with_context(|| format!("fetch statistics from {}", self.source_ref))?;
        loader
            .apply(self.ticket, &payload, store)
            .with_context(|| format!("load statistics from {}", self.source_ref))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::MemoryFeatureStore;
    use serde_json::Map;

    fn store(ids: &[&str]) -> MemoryFeatureStore {
        let mut s = MemoryFeatureStore::new();
        for id in ids {
            s.insert(*id, Map::new());
        }
        s
    }

    #[test]
    fn tickets_are_invalidated_by_begin_and_clear() {
        let mut loader = StatDataLoader::default();
        let mut s = store(&[]);
        let a = loader.begin();
        assert!(loader.is_current(a));
        let b = loader.begin();
        assert!(!loader.is_current(a));
        loader.clear(&mut s);
        assert!(!loader.is_current(b));
    }

    #[test]
    fn apply_assigns_and_widens() {
        let mut loader = StatDataLoader::default();
        let mut s = store(&["France", "Texas"]);
        let t = loader.begin();
        let status = loader
            .apply(t, r#"{"values":[["","France",3],["Austin, TX","US",9]]}"#, &mut s)
            .unwrap();
        let outcome = status.outcome().unwrap();
        assert_eq!(outcome.assignments.len(), 2);
        assert_eq!((outcome.min(), outcome.max()), (3.0, 9.0));
        assert_eq!(s.stat_value("Texas"), Some(9.0));
    }

    #[test]
    fn stale_ticket_changes_nothing() {
        let mut loader = StatDataLoader::default();
        let mut s = store(&["France"]);
        let old = loader.begin();
        let _new = loader.begin();
        let status = loader
            .apply(old, r#"{"values":[["","France",3]]}"#, &mut s)
            .unwrap();
        assert!(matches!(status, LoadStatus::Discarded { current: 2, .. }));
        assert_eq!(s.stat_value("France"), None);
        assert!(loader.range().is_empty());
    }
}
