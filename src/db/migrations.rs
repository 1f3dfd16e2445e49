//! Forward-only schema migration framework.
//!
//! Tracks the schema version in `schema_meta` and runs sequential migrations
//! to bring the database up to [`CURRENT_SCHEMA_VERSION`].

use rusqlite::{Connection, OptionalExtension};

/// The schema version that the current binary expects.
pub const CURRENT_SCHEMA_VERSION: u32 = 3;

/// Get the current schema version from the database.
pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'schema_version'",
        [],
        |row| {
            let val: String = row.get(0)?;
            Ok(val.parse::<u32>().unwrap_or(0))
        },
    )
}

/// Update the stored schema version.
fn update_schema_version(conn: &Connection, version: u32) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE schema_meta SET value = ?1 WHERE key = 'schema_version'",
        [version.to_string()],
    )?;
    Ok(())
}

/// Completion time of the last full rebuild, if one has run.
pub fn get_last_rebuild(conn: &Connection) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'last_rebuild_at'",
        [],
        |row| row.get::<_, String>(0),
    )
    .optional()
}

pub fn set_last_rebuild(conn: &Connection, at: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_meta (key, value) VALUES ('last_rebuild_at', ?1)",
        [at],
    )?;
    Ok(())
}

/// Run any pending forward-only migrations. Each migration runs in a transaction.
pub fn run_migrations(conn: &mut Connection) -> rusqlite::Result<()> {
    let mut version = get_schema_version(conn)?;
    tracing::debug!(schema_version = version, target = CURRENT_SCHEMA_VERSION, "checking migrations");

    while version < CURRENT_SCHEMA_VERSION {
        let next = version + 1;
        tracing::info!(from = version, to = next, "running migration");

        let tx = conn.transaction()?;
        match next {
            2 => migrate_v1_to_v2(&tx)?,
            3 => migrate_v2_to_v3(&tx)?,
            _ => {
                tracing::error!(version = next, "unknown migration target");
                break;
            }
        }
        update_schema_version(&tx, next)?;
        tx.commit()?;

        version = next;
    }

    Ok(())
}

/// Migration v1 → v2: composite index backing the recency order
/// (timestamp descending, then document id descending).
fn migrate_v1_to_v2(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("CREATE INDEX IF NOT EXISTS idx_refs_recency ON refs(ts DESC, doc_id DESC);")
}

/// Migration v2 → v3: re-key `aliases` by the Unicode-lowercased alias text.
///
/// Older tables used `COLLATE NOCASE`, which folds ASCII only. Rows whose keys
/// collide after the wider fold keep the first one written.
fn migrate_v2_to_v3(conn: &Connection) -> rusqlite::Result<()> {
    let has_key: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM pragma_table_info('aliases') WHERE name = 'alias_key'",
        [],
        |row| row.get(0),
    )?;
    if has_key {
        return Ok(());
    }

    let rows: Vec<(String, String, String)> = conn
        .prepare("SELECT alias, entity_id, entity_type FROM aliases ORDER BY rowid")?
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    conn.execute_batch("DROP TABLE aliases;")?;
    conn.execute_batch(crate::db::schema::ALIASES_SQL)?;

    let mut insert = conn.prepare(
        "INSERT OR IGNORE INTO aliases (alias_key, alias, entity_id, entity_type) \
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    let mut dropped = 0usize;
    for (alias, entity_id, entity_type) in &rows {
        let key = crate::index::alias_key(alias);
        if insert.execute(rusqlite::params![key, alias, entity_id, entity_type])? == 0 {
            tracing::warn!(alias = %alias, entity_id = %entity_id, "alias collides after case folding, dropped");
            dropped += 1;
        }
    }
    tracing::info!(aliases = rows.len() - dropped, dropped, "aliases re-keyed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", "ON").unwrap();
        crate::db::schema::init_schema(&conn).unwrap();
        conn
    }

    fn has_index(conn: &Connection, name: &str) -> bool {
        conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'index' AND name = ?1",
            [name],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn get_schema_version_returns_1_on_fresh_db() {
        let conn = test_db();
        assert_eq!(get_schema_version(&conn).unwrap(), 1);
    }

    #[test]
    fn run_migrations_upgrades_to_current() {
        let mut conn = test_db();
        run_migrations(&mut conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn migration_v1_to_v2_adds_recency_index() {
        let mut conn = test_db();
        assert!(!has_index(&conn, "idx_refs_recency"));

        run_migrations(&mut conn).unwrap();

        assert!(has_index(&conn, "idx_refs_recency"));
    }

    #[test]
    fn migration_v2_to_v3_rekeys_nocase_aliases() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", "ON").unwrap();
        conn.execute_batch(
            "CREATE TABLE entities (id TEXT PRIMARY KEY, name TEXT NOT NULL, type TEXT NOT NULL, \
                 created TEXT NOT NULL, last_mentioned TEXT NOT NULL);
             CREATE TABLE aliases (alias TEXT PRIMARY KEY COLLATE NOCASE, \
                 entity_id TEXT NOT NULL REFERENCES entities(id) ON DELETE CASCADE, \
                 entity_type TEXT NOT NULL);
             CREATE TABLE refs (entity_id TEXT NOT NULL, doc_id TEXT NOT NULL, ts TEXT NOT NULL, \
                 PRIMARY KEY (entity_id, doc_id));
             CREATE TABLE schema_meta (key TEXT PRIMARY KEY, value TEXT NOT NULL);
             INSERT INTO schema_meta VALUES ('schema_version', '2');
             INSERT INTO entities VALUES ('a', 'émile', 'person', 't', 't');
             INSERT INTO entities VALUES ('b', 'Bob', 'person', 't', 't');
             INSERT INTO aliases VALUES ('émile', 'a', 'person');
             INSERT INTO aliases VALUES ('Bob', 'b', 'person');
             INSERT INTO aliases VALUES ('ÉMILE', 'b', 'person');",
        )
        .unwrap();

        run_migrations(&mut conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), 3);

        let owner: String = conn
            .query_row("SELECT entity_id FROM aliases WHERE alias_key = 'émile'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(owner, "a");
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM aliases", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
        assert!(has_index(&conn, "idx_aliases_entity"));
    }

    #[test]
    fn migrations_are_idempotent() {
        let mut conn = test_db();
        run_migrations(&mut conn).unwrap();
        run_migrations(&mut conn).unwrap(); // second call should not error
        assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn set_and_get_last_rebuild() {
        let conn = test_db();
        assert!(get_last_rebuild(&conn).unwrap().is_none());

        set_last_rebuild(&conn, "2025-12-24T10:00:00Z").unwrap();
        assert_eq!(
            get_last_rebuild(&conn).unwrap(),
            Some("2025-12-24T10:00:00Z".to_string())
        );
    }
}
