//! Canonical SQLite schema for the stockpile store.
//!
//! - `items` is the name registry; names are unique and case-sensitive
//! - `ledger` holds one row per (actor, item) with a strictly positive quantity
//! - `recipes` maps each output item to its single input item and ratio
//! - `projects` / `requirements` describe collection goals
//! - `dashboards` binds one live status message per guild to a project
//! - `store_meta` tracks the applied schema version

/// Migration v1: registry, ledger, recipes and project tables.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS items (
    item_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE CHECK (length(trim(name)) > 0),
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS ledger (
    actor_id INTEGER NOT NULL,
    item_id INTEGER NOT NULL REFERENCES items(item_id),
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    updated_at_us INTEGER NOT NULL,
    PRIMARY KEY (actor_id, item_id)
);

CREATE TABLE IF NOT EXISTS recipes (
    output_item_id INTEGER PRIMARY KEY REFERENCES items(item_id),
    input_item_id INTEGER NOT NULL REFERENCES items(item_id),
    ratio INTEGER NOT NULL CHECK (ratio > 0),
    CHECK (output_item_id <> input_item_id)
);

CREATE TABLE IF NOT EXISTS projects (
    project_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE CHECK (length(trim(name)) > 0),
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS requirements (
    project_id INTEGER NOT NULL REFERENCES projects(project_id) ON DELETE CASCADE,
    item_id INTEGER NOT NULL REFERENCES items(item_id),
    target_amount INTEGER NOT NULL CHECK (target_amount >= 0),
    PRIMARY KEY (project_id, item_id)
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL
);

INSERT OR IGNORE INTO store_meta (id, schema_version) VALUES (1, 1);
";

/// Migration v2: read-path indexes and per-guild dashboard bindings.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_ledger_item_quantity
    ON ledger(item_id, quantity DESC);

CREATE INDEX IF NOT EXISTS idx_recipes_input
    ON recipes(input_item_id);

CREATE INDEX IF NOT EXISTS idx_requirements_item
    ON requirements(item_id);

CREATE TABLE IF NOT EXISTS dashboards (
    guild_id INTEGER PRIMARY KEY,
    channel_id INTEGER NOT NULL,
    message_id INTEGER NOT NULL,
    project_id INTEGER NOT NULL REFERENCES projects(project_id) ON DELETE CASCADE
);

UPDATE store_meta
SET schema_version = 2
WHERE id = 1;
";

/// Indexes expected by holder and global-total query paths.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_ledger_item_quantity",
    "idx_recipes_input",
    "idx_requirements_item",
];
