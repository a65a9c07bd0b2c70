use std::str::FromStr;
use std::sync::Mutex;

use chrono::{NaiveDate, Utc};
use coinsight_models::{AgentRun, ConsensusRun, SignalDaily};
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::error::StoreError;
use crate::{RunRecorder, SignalStore};

/// SQLite-backed store for agent runs, consensus runs and daily signals.
///
/// Opens the database in read-write mode with WAL journal so readers
/// (summary reports, alert checks) can run while the daily job writes.
/// `rusqlite::Connection` is not `Sync`, so access goes through a `Mutex`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

struct SignalRow {
    date: String,
    token: String,
    score: i64,
    risk: String,
    outlook: String,
    decision: String,
    confidence: f64,
    price_usd: String,
}

impl SignalRow {
    fn into_signal(self) -> Result<SignalDaily, StoreError> {
        let corrupt = |what: &str, e: String| StoreError::Corrupt(format!("{what}: {e}"));
        Ok(SignalDaily {
            date: NaiveDate::from_str(&self.date).map_err(|e| corrupt("date", e.to_string()))?,
            score: u8::try_from(self.score).map_err(|e| corrupt("score", e.to_string()))?,
            risk: self.risk.parse().map_err(|e| corrupt("risk", e))?,
            outlook: self.outlook.parse().map_err(|e| corrupt("outlook", e))?,
            decision: self.decision.parse().map_err(|e| corrupt("decision", e))?,
            confidence: self.confidence,
            price_usd: Decimal::from_str(&self.price_usd)
                .map_err(|e| corrupt("price_usd", e.to_string()))?,
            token: self.token,
        })
    }
}

impl SqliteStore {
    /// Open a read-write connection to the store database.
    /// Creates the schema if it doesn't exist. Enables WAL mode.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(coinsight_models::store_schema::STORE_DDL)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database for testing.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(coinsight_models::store_schema::STORE_DDL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("SQLite mutex poisoned: {e}")))?;
        f(&conn)
    }

    /// Count rows in a table. Used by tests and the CLI status output.
    pub fn count(&self, table: StoreTable) -> Result<usize, StoreError> {
        self.with_conn(|conn| {
            let sql = format!("SELECT COUNT(*) FROM {}", table.name());
            let count: usize = conn.query_row(&sql, [], |row| row.get(0))?;
            Ok(count)
        })
    }

    /// Most recent consensus runs for a token, newest first.
    pub fn consensus_runs_for(
        &self,
        token: &str,
        limit: usize,
    ) -> Result<Vec<ConsensusRun>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT id, token, decision, confidence, rationale_json, rounds, quorum, created_at \
                 FROM consensus_runs WHERE token = ?1 ORDER BY created_at DESC LIMIT ?2",
            )?;
            let raw = stmt
                .query_map(rusqlite::params![token, limit as i64], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, f64>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, u32>(5)?,
                        row.get::<_, f64>(6)?,
                        row.get::<_, String>(7)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            raw.into_iter()
                .map(
                    |(id, token, decision, confidence, rationale, rounds, quorum, created_at)| {
                        Ok(ConsensusRun {
                            id: id
                                .parse()
                                .map_err(|e| StoreError::Corrupt(format!("id: {e}")))?,
                            token,
                            decision: decision.parse().map_err(StoreError::Corrupt)?,
                            confidence,
                            rationale: serde_json::from_str(&rationale)?,
                            rounds,
                            quorum,
                            created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
                                .map_err(|e| StoreError::Corrupt(format!("created_at: {e}")))?
                                .with_timezone(&Utc),
                        })
                    },
                )
                .collect()
        })
    }
}

/// Tables owned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreTable {
    AgentRuns,
    ConsensusRuns,
    SignalDaily,
}

impl StoreTable {
    fn name(&self) -> &'static str {
        match self {
            StoreTable::AgentRuns => "agent_runs",
            StoreTable::ConsensusRuns => "consensus_runs",
            StoreTable::SignalDaily => "signal_daily",
        }
    }
}

fn insert_agent_run(conn: &Connection, run: &AgentRun) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO agent_runs \
         (id, token, agent, input_json, output_json, score, confidence, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            run.id.to_string(),
            run.token,
            run.agent.as_str(),
            serde_json::to_string(&run.input)?,
            serde_json::to_string(&run.opinion)?,
            run.score,
            run.confidence,
            run.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn insert_consensus_run(conn: &Connection, run: &ConsensusRun) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO consensus_runs \
         (id, token, decision, confidence, rationale_json, rounds, quorum, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            run.id.to_string(),
            run.token,
            run.decision.as_str(),
            run.confidence,
            serde_json::to_string(&run.rationale)?,
            run.rounds,
            run.quorum,
            run.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

impl RunRecorder for SqliteStore {
    fn record_debate(
        &self,
        agent_runs: &[AgentRun],
        consensus: &ConsensusRun,
    ) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            // dropped without commit on error, which rolls back
            let tx = conn.unchecked_transaction()?;
            for run in agent_runs {
                insert_agent_run(&tx, run)?;
            }
            insert_consensus_run(&tx, consensus)?;
            tx.commit()?;
            Ok(())
        })
    }
}

impl SignalStore for SqliteStore {
    fn upsert_signal(&self, signal: &SignalDaily) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO signal_daily \
                 (date, token, score, risk, outlook, decision, confidence, price_usd, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
                 ON CONFLICT(date, token) DO UPDATE SET \
                 score = excluded.score, risk = excluded.risk, outlook = excluded.outlook, \
                 decision = excluded.decision, confidence = excluded.confidence, \
                 price_usd = excluded.price_usd, updated_at = excluded.updated_at",
                rusqlite::params![
                    signal.date.to_string(),
                    signal.token,
                    signal.score,
                    signal.risk.as_str(),
                    signal.outlook.as_str(),
                    signal.decision.as_str(),
                    signal.confidence,
                    signal.price_usd.to_string(),
                    Utc::now().to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    fn signals_since(&self, since: NaiveDate) -> Result<Vec<SignalDaily>, StoreError> {
        let rows = self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT date, token, score, risk, outlook, decision, confidence, price_usd \
                 FROM signal_daily WHERE date >= ?1 ORDER BY date ASC, token ASC",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![since.to_string()], |row| {
                    Ok(SignalRow {
                        date: row.get(0)?,
                        token: row.get(1)?,
                        score: row.get(2)?,
                        risk: row.get(3)?,
                        outlook: row.get(4)?,
                        decision: row.get(5)?,
                        confidence: row.get(6)?,
                        price_usd: row.get(7)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        rows.into_iter().map(SignalRow::into_signal).collect()
    }
}
