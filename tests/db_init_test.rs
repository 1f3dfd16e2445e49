use spellbook::db;
use tempfile::TempDir;

#[test]
fn open_creates_new_db_at_nonexistent_path() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("knowledge").join("index.db");

    // Should not exist yet
    assert!(!db_path.exists());

    let conn = db::open_database(&db_path).unwrap();

    // Should have been created
    assert!(db_path.exists());

    // Should be functional
    for table in ["entities", "aliases", "refs"] {
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}

#[test]
fn health_check_passes_on_valid_db() {
    let conn = db::open_memory_database().unwrap();

    let report = db::check_database_health(&conn).unwrap();
    assert!(report.integrity_ok);
    assert_eq!(report.schema_version, db::migrations::CURRENT_SCHEMA_VERSION);
    assert_eq!(report.entity_count, 0);
    assert_eq!(report.alias_count, 0);
    assert_eq!(report.ref_count, 0);
}

#[test]
fn busy_timeout_is_set() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("test.db");

    let conn = db::open_database(&db_path).unwrap();

    let timeout: i64 = conn
        .pragma_query_value(None, "busy_timeout", |row| row.get(0))
        .unwrap();
    assert_eq!(timeout, 5000);
}

#[test]
fn reopen_preserves_contents() {
    let tmp = TempDir::new().unwrap();
    let db_path = tmp.path().join("index.db");

    {
        let mut conn = db::open_database(&db_path).unwrap();
        spellbook::index::entities::upsert_entity(
            &mut conn,
            "Sam",
            spellbook::archive::EntityType::Person,
            chrono::Utc::now(),
        )
        .unwrap();
        db::close_database(conn).unwrap();
    }

    let conn = db::open_database(&db_path).unwrap();
    assert!(spellbook::index::aliases::resolve(&conn, "sam").unwrap().is_some());
}
