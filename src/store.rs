use crate::achievements::{self, Achievement};
use crate::corpus::{Difficulty, Language, Mode};
use crate::error::PersistenceError;
use crate::persistence::{Persistence, PersonalBest, TestRecord, TypePerformance};
use crate::stats::TestResult;
use crate::telemetry::{KeySummary, ReplayTrace, TelemetryBatch};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::str::FromStr;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS test_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    wpm INTEGER NOT NULL,
    accuracy INTEGER NOT NULL,
    errors INTEGER NOT NULL,
    cpm INTEGER NOT NULL,
    gross_wpm INTEGER NOT NULL,
    net_wpm INTEGER NOT NULL,
    time_taken REAL NOT NULL,
    timestamp TEXT NOT NULL,
    difficulty TEXT NOT NULL,
    mode TEXT NOT NULL,
    language TEXT NOT NULL,
    duration_secs INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_test_results_timestamp ON test_results(timestamp);

CREATE TABLE IF NOT EXISTS personal_bests (
    mode TEXT NOT NULL,
    duration_secs INTEGER NOT NULL,
    wpm INTEGER NOT NULL,
    accuracy INTEGER NOT NULL,
    PRIMARY KEY (mode, duration_secs)
);

CREATE TABLE IF NOT EXISTS performance_by_type (
    mode TEXT NOT NULL,
    difficulty TEXT NOT NULL,
    tests INTEGER NOT NULL,
    average_wpm REAL NOT NULL,
    average_accuracy REAL NOT NULL,
    best_wpm INTEGER NOT NULL,
    PRIMARY KEY (mode, difficulty)
);

CREATE TABLE IF NOT EXISTS key_stats (
    character TEXT PRIMARY KEY,
    attempts INTEGER NOT NULL,
    misses INTEGER NOT NULL,
    total_latency_ms INTEGER NOT NULL,
    total_latency_sq REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS ghost_replays (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entries INTEGER NOT NULL,
    trace TEXT NOT NULL,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP
);
"#;

/// SQLite-backed store for results, bests, key statistics and replays
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path.as_ref())?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self, PersistenceError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, PersistenceError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Most recent results, newest first
    pub fn recent_results(&self, limit: usize) -> Result<Vec<TestRecord>, PersistenceError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT wpm, accuracy, errors, cpm, gross_wpm, net_wpm, time_taken, timestamp,
                   difficulty, mode, language, duration_secs
            FROM test_results
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )?;
        let rows = stmt.query_map([limit as i64], record_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn personal_bests(&self) -> Result<Vec<PersonalBest>, PersistenceError> {
        let mut stmt = self.conn.prepare(
            "SELECT mode, duration_secs, wpm, accuracy FROM personal_bests ORDER BY mode, duration_secs",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(PersonalBest {
                mode: parse_column(row, 0)?,
                duration_secs: row.get(1)?,
                wpm: row.get(2)?,
                accuracy: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn performance(
        &self,
        mode: Mode,
        difficulty: Difficulty,
    ) -> Result<Option<TypePerformance>, PersistenceError> {
        let perf = self
            .conn
            .query_row(
                r#"
                SELECT tests, average_wpm, average_accuracy, best_wpm
                FROM performance_by_type
                WHERE mode = ?1 AND difficulty = ?2
                "#,
                params![mode.to_string(), difficulty.to_string()],
                |row| {
                    Ok(TypePerformance {
                        mode,
                        difficulty,
                        tests: row.get(0)?,
                        average_wpm: row.get(1)?,
                        average_accuracy: row.get(2)?,
                        best_wpm: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(perf)
    }

    /// Per-key summaries over everything flushed so far
    pub fn key_summaries(&self) -> Result<Vec<KeySummary>, PersistenceError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT character, attempts, misses, total_latency_ms, total_latency_sq
            FROM key_stats
            WHERE attempts > 0
            ORDER BY character
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            let character: String = row.get(0)?;
            let attempts: i64 = row.get(1)?;
            let misses: i64 = row.get(2)?;
            let total: i64 = row.get(3)?;
            let total_sq: f64 = row.get(4)?;

            let n = attempts as f64;
            let mean = total as f64 / n;
            let variance = (total_sq / n - mean * mean).max(0.0);
            Ok(KeySummary {
                character: character.chars().next().unwrap_or('\0'),
                attempts: attempts as usize,
                misses: misses as usize,
                mean_latency_ms: mean,
                latency_std_dev_ms: variance.sqrt(),
                miss_rate: misses as f64 / n * 100.0,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Most recently saved ghost replay
    pub fn latest_replay(&self) -> Result<Option<ReplayTrace>, PersistenceError> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT trace FROM ghost_replays ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        json.map(|j| serde_json::from_str(&j).map_err(PersistenceError::from))
            .transpose()
    }

    fn all_results(&self) -> Result<Vec<TestRecord>, PersistenceError> {
        self.recent_results(i64::MAX as usize)
    }
}

impl Persistence for SqliteStore {
    fn add_test_result(&self, record: &TestRecord) -> Result<(), PersistenceError> {
        let r = &record.result;
        self.conn.execute(
            r#"
            INSERT INTO test_results
            (wpm, accuracy, errors, cpm, gross_wpm, net_wpm, time_taken, timestamp,
             difficulty, mode, language, duration_secs)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                r.wpm,
                r.accuracy,
                r.errors as i64,
                r.cpm,
                r.gross_wpm,
                r.net_wpm,
                r.time_taken,
                r.timestamp.to_rfc3339(),
                record.difficulty.to_string(),
                record.mode.to_string(),
                record.language.to_string(),
                record.duration_secs,
            ],
        )?;
        Ok(())
    }

    fn update_personal_bests(&self, record: &TestRecord) -> Result<(), PersistenceError> {
        self.conn.execute(
            r#"
            INSERT INTO personal_bests (mode, duration_secs, wpm, accuracy)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(mode, duration_secs) DO UPDATE SET
                wpm = excluded.wpm,
                accuracy = excluded.accuracy
            WHERE excluded.wpm > personal_bests.wpm
            "#,
            params![
                record.mode.to_string(),
                record.duration_secs,
                record.result.wpm,
                record.result.accuracy,
            ],
        )?;
        Ok(())
    }

    fn update_performance_by_type(&self, record: &TestRecord) -> Result<(), PersistenceError> {
        let updated = match self.performance(record.mode, record.difficulty)? {
            Some(mut perf) => {
                perf.absorb(record);
                perf
            }
            None => TypePerformance::first(record),
        };

        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO performance_by_type
            (mode, difficulty, tests, average_wpm, average_accuracy, best_wpm)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                updated.mode.to_string(),
                updated.difficulty.to_string(),
                updated.tests,
                updated.average_wpm,
                updated.average_accuracy,
                updated.best_wpm,
            ],
        )?;
        Ok(())
    }

    fn batch_update_key_stats(&self, batch: &TelemetryBatch) -> Result<(), PersistenceError> {
        let tx = self.conn.unchecked_transaction()?;
        for event in &batch.events {
            let latency = event.latency_ms as i64;
            tx.execute(
                r#"
                INSERT INTO key_stats (character, attempts, misses, total_latency_ms, total_latency_sq)
                VALUES (?1, 1, ?2, ?3, ?4)
                ON CONFLICT(character) DO UPDATE SET
                    attempts = attempts + 1,
                    misses = misses + excluded.misses,
                    total_latency_ms = total_latency_ms + excluded.total_latency_ms,
                    total_latency_sq = total_latency_sq + excluded.total_latency_sq
                "#,
                params![
                    event.expected.to_string(),
                    i64::from(!event.correct),
                    latency,
                    (latency * latency) as f64,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn save_ghost_replay(&self, trace: &ReplayTrace) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(trace)?;
        self.conn.execute(
            "INSERT INTO ghost_replays (entries, trace) VALUES (?1, ?2)",
            params![trace.len() as i64, json],
        )?;
        Ok(())
    }

    fn get_achievements(&self) -> Result<Vec<Achievement>, PersistenceError> {
        Ok(achievements::evaluate(&self.all_results()?))
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<TestRecord> {
    let timestamp: String = row.get(7)?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(TestRecord {
        result: TestResult {
            wpm: row.get(0)?,
            accuracy: row.get(1)?,
            errors: row.get::<_, i64>(2)? as usize,
            cpm: row.get(3)?,
            gross_wpm: row.get(4)?,
            net_wpm: row.get(5)?,
            time_taken: row.get(6)?,
            timestamp,
        },
        difficulty: parse_column::<Difficulty>(row, 8)?,
        mode: parse_column::<Mode>(row, 9)?,
        language: parse_column::<Language>(row, 10)?,
        duration_secs: row.get(11)?,
    })
}

fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = strum::ParseError>,
{
    let text: String = row.get(idx)?;
    T::from_str(&text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
