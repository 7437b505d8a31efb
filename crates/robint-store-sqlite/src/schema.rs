//! SQL schema for the robotics intelligence SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Reference data: long-lived, keyed by unique name.

CREATE TABLE IF NOT EXISTS sectors (
    name        TEXT PRIMARY KEY,
    description TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS subcategories (
    sector      TEXT NOT NULL REFERENCES sectors(name),
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    PRIMARY KEY (sector, name)
);

CREATE TABLE IF NOT EXISTS dimensions (
    name        TEXT PRIMARY KEY,
    unit        TEXT,
    kind        TEXT NOT NULL,   -- 'numeric' | 'text' | 'structured'
    description TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS companies (
    name        TEXT PRIMARY KEY,
    sector      TEXT REFERENCES sectors(name),
    description TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS technologies (
    name        TEXT PRIMARY KEY,
    category    TEXT NOT NULL,
    maturity    TEXT NOT NULL,   -- 'emerging' | 'growing' | 'mature'
    description TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sources (
    source_id    TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    url          TEXT,
    source_type  TEXT NOT NULL,
    reliability  REAL NOT NULL,
    retrieved_at TEXT NOT NULL
);

-- Data points are never deleted; obsolescence is a status value.
-- The subject is a tagged union: kind + name, with the parent sector
-- populated only for subcategories.
CREATE TABLE IF NOT EXISTS data_points (
    point_id       TEXT PRIMARY KEY,
    dimension      TEXT NOT NULL REFERENCES dimensions(name),
    subject_kind   TEXT NOT NULL,  -- 'sector' | 'subcategory' | 'company' | 'technology'
    subject_sector TEXT,
    subject_name   TEXT NOT NULL,
    value_json     TEXT NOT NULL,  -- tagged Value JSON
    year           INTEGER NOT NULL,
    quarter        INTEGER,        -- derived for monthly rows
    month          INTEGER,
    confidence     TEXT NOT NULL DEFAULT 'medium',
    status         TEXT NOT NULL DEFAULT 'pending',
    source_id      TEXT REFERENCES sources(source_id),
    validated_by   TEXT,
    validated_at   TEXT,
    notes          TEXT,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

-- The audit ledger is strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS changes_log (
    entry_id      TEXT PRIMARY KEY,
    data_point_id TEXT NOT NULL REFERENCES data_points(point_id),
    kind          TEXT NOT NULL,  -- 'insert' | 'update' | 'status_change'
    before_json   TEXT,
    after_json    TEXT,
    actor         TEXT NOT NULL,
    reason        TEXT,
    recorded_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS data_points_dimension_idx ON data_points(dimension);
CREATE INDEX IF NOT EXISTS data_points_status_idx    ON data_points(status);
CREATE INDEX IF NOT EXISTS data_points_period_idx    ON data_points(year, quarter, month);
CREATE INDEX IF NOT EXISTS data_points_subject_idx   ON data_points(subject_kind, subject_name);
CREATE INDEX IF NOT EXISTS changes_log_point_idx     ON changes_log(data_point_id);
CREATE INDEX IF NOT EXISTS changes_log_recorded_idx  ON changes_log(recorded_at);

PRAGMA user_version = 1;
";
