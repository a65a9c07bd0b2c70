/// Tables for the durable engine outputs.
///
/// `signal_daily` holds at most one row per `(date, token)`; writers upsert.
pub const STORE_DDL: &str = "\
CREATE TABLE IF NOT EXISTS agent_runs (
    id          TEXT PRIMARY KEY,
    token       TEXT NOT NULL,
    agent       TEXT NOT NULL,
    input_json  TEXT NOT NULL,
    output_json TEXT NOT NULL,
    score       INTEGER,
    confidence  REAL NOT NULL,
    created_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_agent_runs_token ON agent_runs(token);

CREATE TABLE IF NOT EXISTS consensus_runs (
    id              TEXT PRIMARY KEY,
    token           TEXT NOT NULL,
    decision        TEXT NOT NULL,
    confidence      REAL NOT NULL,
    rationale_json  TEXT NOT NULL,
    rounds          INTEGER NOT NULL,
    quorum          REAL NOT NULL,
    created_at      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_consensus_runs_token ON consensus_runs(token);

CREATE TABLE IF NOT EXISTS signal_daily (
    date        TEXT NOT NULL,
    token       TEXT NOT NULL,
    score       INTEGER NOT NULL,
    risk        TEXT NOT NULL,
    outlook     TEXT NOT NULL,
    decision    TEXT NOT NULL,
    confidence  REAL NOT NULL,
    price_usd   TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    PRIMARY KEY (date, token)
);
CREATE INDEX IF NOT EXISTS idx_signal_daily_date ON signal_daily(date);
";
