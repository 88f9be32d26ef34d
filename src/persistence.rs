use crate::achievements::{self, Achievement};
use crate::corpus::{Difficulty, Language, Mode};
use crate::error::PersistenceError;
use crate::stats::TestResult;
use crate::telemetry::{summarize_keys, KeySummary, KeystrokeEvent, ReplayTrace, TelemetryBatch};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// A finished test together with the settings it ran under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    pub result: TestResult,
    pub difficulty: Difficulty,
    pub mode: Mode,
    pub language: Language,
    pub duration_secs: u32,
}

/// Best run for a (mode, duration) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalBest {
    pub mode: Mode,
    pub duration_secs: u32,
    pub wpm: u32,
    pub accuracy: u32,
}

/// Aggregate for a (mode, difficulty) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypePerformance {
    pub mode: Mode,
    pub difficulty: Difficulty,
    pub tests: u32,
    pub average_wpm: f64,
    pub average_accuracy: f64,
    pub best_wpm: u32,
}

impl TypePerformance {
    pub(crate) fn first(record: &TestRecord) -> Self {
        Self {
            mode: record.mode,
            difficulty: record.difficulty,
            tests: 1,
            average_wpm: record.result.wpm as f64,
            average_accuracy: record.result.accuracy as f64,
            best_wpm: record.result.wpm,
        }
    }

    /// Fold one more record into the running averages
    pub fn absorb(&mut self, record: &TestRecord) {
        let n = self.tests as f64;
        self.average_wpm = (self.average_wpm * n + record.result.wpm as f64) / (n + 1.0);
        self.average_accuracy =
            (self.average_accuracy * n + record.result.accuracy as f64) / (n + 1.0);
        self.best_wpm = self.best_wpm.max(record.result.wpm);
        self.tests += 1;
    }
}

/// Where finished tests and telemetry go. The engine calls these one-way
/// and only logs failures.
pub trait Persistence {
    fn add_test_result(&self, record: &TestRecord) -> Result<(), PersistenceError>;
    fn update_personal_bests(&self, record: &TestRecord) -> Result<(), PersistenceError>;
    fn update_performance_by_type(&self, record: &TestRecord) -> Result<(), PersistenceError>;
    fn batch_update_key_stats(&self, batch: &TelemetryBatch) -> Result<(), PersistenceError>;
    fn save_ghost_replay(&self, trace: &ReplayTrace) -> Result<(), PersistenceError>;
    fn get_achievements(&self) -> Result<Vec<Achievement>, PersistenceError>;
}

impl<P: Persistence + ?Sized> Persistence for Box<P> {
    fn add_test_result(&self, record: &TestRecord) -> Result<(), PersistenceError> {
        (**self).add_test_result(record)
    }
    fn update_personal_bests(&self, record: &TestRecord) -> Result<(), PersistenceError> {
        (**self).update_personal_bests(record)
    }
    fn update_performance_by_type(&self, record: &TestRecord) -> Result<(), PersistenceError> {
        (**self).update_performance_by_type(record)
    }
    fn batch_update_key_stats(&self, batch: &TelemetryBatch) -> Result<(), PersistenceError> {
        (**self).batch_update_key_stats(batch)
    }
    fn save_ghost_replay(&self, trace: &ReplayTrace) -> Result<(), PersistenceError> {
        (**self).save_ghost_replay(trace)
    }
    fn get_achievements(&self) -> Result<Vec<Achievement>, PersistenceError> {
        (**self).get_achievements()
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    results: Vec<TestRecord>,
    bests: HashMap<(Mode, u32), PersonalBest>,
    performance: HashMap<(Mode, Difficulty), TypePerformance>,
    key_events: Vec<KeystrokeEvent>,
    key_flushes: usize,
    replays: Vec<ReplayTrace>,
}

/// In-memory store. Clones share the same data, so a caller can keep a
/// handle to inspect what the engine wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> Vec<TestRecord> {
        self.state.lock().results.clone()
    }

    pub fn personal_best(&self, mode: Mode, duration_secs: u32) -> Option<PersonalBest> {
        self.state.lock().bests.get(&(mode, duration_secs)).cloned()
    }

    pub fn performance(&self, mode: Mode, difficulty: Difficulty) -> Option<TypePerformance> {
        self.state.lock().performance.get(&(mode, difficulty)).cloned()
    }

    /// Every keystroke event received across all flushes
    pub fn key_events(&self) -> Vec<KeystrokeEvent> {
        self.state.lock().key_events.clone()
    }

    /// Number of batches received
    pub fn key_flushes(&self) -> usize {
        self.state.lock().key_flushes
    }

    pub fn key_summaries(&self) -> Vec<KeySummary> {
        summarize_keys(&self.state.lock().key_events)
    }

    pub fn replays(&self) -> Vec<ReplayTrace> {
        self.state.lock().replays.clone()
    }
}

impl Persistence for MemoryStore {
    fn add_test_result(&self, record: &TestRecord) -> Result<(), PersistenceError> {
        self.state.lock().results.push(record.clone());
        Ok(())
    }

    fn update_personal_bests(&self, record: &TestRecord) -> Result<(), PersistenceError> {
        let mut state = self.state.lock();
        let key = (record.mode, record.duration_secs);
        let is_better = state
            .bests
            .get(&key)
            .map_or(true, |best| record.result.wpm > best.wpm);
        if is_better {
            state.bests.insert(
                key,
                PersonalBest {
                    mode: record.mode,
                    duration_secs: record.duration_secs,
                    wpm: record.result.wpm,
                    accuracy: record.result.accuracy,
                },
            );
        }
        Ok(())
    }

    fn update_performance_by_type(&self, record: &TestRecord) -> Result<(), PersistenceError> {
        self.state
            .lock()
            .performance
            .entry((record.mode, record.difficulty))
            .and_modify(|perf| perf.absorb(record))
            .or_insert_with(|| TypePerformance::first(record));
        Ok(())
    }

    fn batch_update_key_stats(&self, batch: &TelemetryBatch) -> Result<(), PersistenceError> {
        let mut state = self.state.lock();
        state.key_events.extend(batch.events.iter().cloned());
        state.key_flushes += 1;
        Ok(())
    }

    fn save_ghost_replay(&self, trace: &ReplayTrace) -> Result<(), PersistenceError> {
        self.state.lock().replays.push(trace.clone());
        Ok(())
    }

    fn get_achievements(&self) -> Result<Vec<Achievement>, PersistenceError> {
        Ok(achievements::evaluate(&self.state.lock().results))
    }
}
