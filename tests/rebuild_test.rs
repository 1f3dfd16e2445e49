mod helpers;

use helpers::{count, dec, test_db, test_vault, write_doc, write_raw};
use spellbook::archive::EntityType::{Concept, Person, Project, Tool};
use spellbook::index::aliases::{add_alias, resolve};
use spellbook::index::entities::index_document;
use spellbook::index::rebuild::{rebuild, snapshot, verify_index};
use std::path::Path;

fn seed(store: &spellbook::archive::DocumentStore) {
    write_doc(store, "2025-12-20/001", dec(20, 9), &[("Sam", Person), ("rust", Tool)]);
    write_doc(store, "2025-12-21/001", dec(21, 14), &[("spellbook", Project), ("sam", Person)]);
    write_doc(store, "2025-12-24/001", dec(24, 8), &[("Rust", Tool), ("sqlite", Tool)]);
    write_doc(store, "2025-12-24/002", dec(24, 17), &[("Sam", Person), ("entity resolution", Concept)]);
}

#[test]
fn rebuilding_twice_gives_the_same_index() {
    let (_tmp, store) = test_vault();
    seed(&store);
    let mut conn = test_db();

    rebuild(&mut conn, &store).unwrap();
    let first = snapshot(&conn).unwrap();
    rebuild(&mut conn, &store).unwrap();
    let second = snapshot(&conn).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.entities.len(), 5);
    assert_eq!(first.refs.len(), 8);
}

#[test]
fn rebuild_equals_incremental_writes() {
    let (_tmp, store) = test_vault();
    seed(&store);

    let mut incremental = test_db();
    for id in store.list_ids().unwrap() {
        let doc = store.load(id).unwrap();
        index_document(&mut incremental, &doc).unwrap();
    }

    let mut rebuilt = test_db();
    rebuild(&mut rebuilt, &store).unwrap();

    assert_eq!(snapshot(&incremental).unwrap(), snapshot(&rebuilt).unwrap());
}

#[test]
fn out_of_order_incremental_writes_still_match_rebuild() {
    let (_tmp, store) = test_vault();
    // Same spelling everywhere: the first spelling seen becomes the display name.
    write_doc(&store, "2025-12-20/001", dec(20, 9), &[("Sam", Person), ("rust", Tool)]);
    write_doc(&store, "2025-12-22/001", dec(22, 9), &[("Sam", Person)]);
    write_doc(&store, "2025-12-24/001", dec(24, 9), &[("rust", Tool), ("sqlite", Tool)]);

    let mut incremental = test_db();
    let mut ids = store.list_ids().unwrap();
    ids.reverse();
    for id in ids {
        index_document(&mut incremental, &store.load(id).unwrap()).unwrap();
    }

    let mut rebuilt = test_db();
    rebuild(&mut rebuilt, &store).unwrap();

    assert_eq!(snapshot(&incremental).unwrap(), snapshot(&rebuilt).unwrap());
}

#[test]
fn one_corrupt_file_is_skipped_and_the_rest_indexed() {
    let (_tmp, store) = test_vault();
    seed(&store);
    write_doc(&store, "2025-12-25/001", dec(25, 9), &[("Sam", Person)]);
    write_raw(
        &store,
        Path::new("log/2025-12-25/002.md"),
        "---\ntype: insight\nts: [unclosed\n---\nbroken\n",
    );

    let mut conn = test_db();
    let report = rebuild(&mut conn, &store).unwrap();

    assert_eq!(report.files_seen, 6);
    assert_eq!(report.documents_indexed, 5);
    assert_eq!(report.skipped_count(), 1);
    assert!(report.skipped[0].path.ends_with("2025-12-25/002.md"));
}

#[test]
fn four_valid_one_malformed() {
    let (_tmp, store) = test_vault();
    seed(&store);
    write_raw(&store, Path::new("log/2025-12-22/001.md"), "no front matter at all\n");

    let mut conn = test_db();
    let report = rebuild(&mut conn, &store).unwrap();

    assert_eq!(report.documents_indexed, 4);
    assert_eq!(report.skipped_count(), 1);
    let distinct_docs: i64 = conn
        .query_row("SELECT COUNT(DISTINCT doc_id) FROM refs", [], |row| row.get(0))
        .unwrap();
    assert_eq!(distinct_docs, 4);
}

#[test]
fn stray_markdown_is_reported_not_indexed() {
    let (_tmp, store) = test_vault();
    seed(&store);
    write_raw(&store, Path::new("log/notes.md"), "---\ntype: insight\nts: 2025-12-20\n---\n");

    let mut conn = test_db();
    let report = rebuild(&mut conn, &store).unwrap();
    assert_eq!(report.documents_indexed, 4);
    assert_eq!(report.skipped_count(), 1);
}

#[test]
fn rebuild_drops_manual_aliases_and_verify_reports_them() {
    let (_tmp, store) = test_vault();
    seed(&store);
    let mut conn = test_db();
    rebuild(&mut conn, &store).unwrap();
    assert!(verify_index(&conn, &store).unwrap().is_clean());

    let sam = resolve(&conn, "Sam").unwrap().unwrap();
    add_alias(&conn, "S.", &sam.id).unwrap();

    let drift = verify_index(&conn, &store).unwrap();
    assert!(!drift.is_clean());
    assert_eq!(drift.aliases.only_in_index.len(), 1);
    assert!(drift.aliases.only_in_documents.is_empty());

    rebuild(&mut conn, &store).unwrap();
    assert!(resolve(&conn, "S.").unwrap().is_none());
    assert!(verify_index(&conn, &store).unwrap().is_clean());
}

#[test]
fn empty_archive_rebuilds_to_empty_index() {
    let (_tmp, store) = test_vault();
    let mut conn = test_db();

    let report = rebuild(&mut conn, &store).unwrap();
    assert_eq!(report.files_seen, 0);
    assert_eq!(count(&conn, "entities"), 0);
    assert_eq!(count(&conn, "refs"), 0);
}
