//! SQL DDL for the derived index.
//!
//! Defines the `entities`, `aliases`, `refs`, and `schema_meta` tables. All DDL
//! uses `IF NOT EXISTS` for idempotent initialization.
//!
//! `aliases` is keyed by `alias_key`, the Unicode-lowercased alias text, so
//! case folding is not limited to ASCII. `alias` keeps the text as written.

use rusqlite::Connection;

/// All schema DDL statements for the index tables.
const SCHEMA_SQL: &str = r#"
-- Canonical entities, keyed by a surrogate id so a rename never cascades
CREATE TABLE IF NOT EXISTS entities (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    type TEXT NOT NULL CHECK(type IN ('person','project','tool','repo','concept','org')),
    created TEXT NOT NULL,
    last_mentioned TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_entities_type ON entities(type);
CREATE INDEX IF NOT EXISTS idx_entities_last ON entities(last_mentioned DESC);
CREATE INDEX IF NOT EXISTS idx_entities_name ON entities(name COLLATE NOCASE);

-- Document mentions
CREATE TABLE IF NOT EXISTS refs (
    entity_id TEXT NOT NULL REFERENCES entities(id) ON DELETE CASCADE,
    doc_id TEXT NOT NULL,
    ts TEXT NOT NULL,
    PRIMARY KEY (entity_id, doc_id)
);

CREATE INDEX IF NOT EXISTS idx_refs_doc ON refs(doc_id);
CREATE INDEX IF NOT EXISTS idx_refs_ts ON refs(ts DESC);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Free-text forms that resolve to an entity; one alias key, one entity.
/// Shared with the migration that re-keys older alias tables.
pub(crate) const ALIASES_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS aliases (
    alias_key TEXT PRIMARY KEY,
    alias TEXT NOT NULL,
    entity_id TEXT NOT NULL REFERENCES entities(id) ON DELETE CASCADE,
    entity_type TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_aliases_entity ON aliases(entity_id);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute_batch(ALIASES_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_creates_all_tables() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert_eq!(tables, vec!["aliases", "entities", "refs", "schema_meta"]);
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap(); // second call should not error
    }

    #[test]
    fn alias_key_is_the_primary_key() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO entities (id, name, type, created, last_mentioned) VALUES ('e1', 'Émile', 'person', 't', 't')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO aliases (alias_key, alias, entity_id, entity_type) VALUES ('émile', 'Émile', 'e1', 'person')",
            [],
        )
        .unwrap();

        let dup = conn.execute(
            "INSERT INTO aliases (alias_key, alias, entity_id, entity_type) VALUES ('émile', 'ÉMILE', 'e1', 'person')",
            [],
        );
        assert!(dup.is_err());
    }
}
