mod helpers;

use helpers::{dec, doc_id, test_db, test_vault, write_doc, write_raw};
use std::path::Path;
use spellbook::archive::EntityType::{Person, Tool};
use spellbook::index::aliases::resolve;
use spellbook::index::entities::{add_ref, upsert_entity};
use spellbook::index::query::{
    cross_reference, docs_in_time_range, docs_mentioning_all, docs_of_entity, keyword_search,
    lookup,
};
use spellbook::index::rebuild::rebuild;

#[test]
fn docs_of_entity_is_most_recent_first() {
    let mut conn = test_db();
    let e = upsert_entity(&mut conn, "Sam", Person, dec(20, 0)).unwrap().entity;

    // D3 shares D2's timestamp; the later sequence number wins the tie.
    add_ref(&conn, &e.id, doc_id("2025-12-24/001"), dec(24, 0)).unwrap();
    add_ref(&conn, &e.id, doc_id("2025-12-20/001"), dec(20, 0)).unwrap();
    add_ref(&conn, &e.id, doc_id("2025-12-24/002"), dec(24, 0)).unwrap();

    let order: Vec<String> = docs_of_entity(&conn, &e.id)
        .unwrap()
        .into_iter()
        .map(|d| d.doc_id.to_string())
        .collect();
    assert_eq!(order, vec!["2025-12-24/002", "2025-12-24/001", "2025-12-20/001"]);
}

#[test]
fn docs_mentioning_all_is_the_intersection() {
    let mut conn = test_db();
    let e1 = upsert_entity(&mut conn, "Sam", Person, dec(20, 0)).unwrap().entity;
    let e2 = upsert_entity(&mut conn, "rust", Tool, dec(20, 0)).unwrap().entity;

    for (day, id) in [(20, "2025-12-20/001"), (21, "2025-12-21/001"), (22, "2025-12-22/001")] {
        add_ref(&conn, &e1.id, doc_id(id), dec(day, 0)).unwrap();
    }
    for (day, id) in [(21, "2025-12-21/001"), (22, "2025-12-22/001"), (23, "2025-12-23/001")] {
        add_ref(&conn, &e2.id, doc_id(id), dec(day, 0)).unwrap();
    }

    let docs: Vec<String> = docs_mentioning_all(&conn, &[e1.id.clone(), e2.id.clone()])
        .unwrap()
        .into_iter()
        .map(|d| d.doc_id.to_string())
        .collect();
    assert_eq!(docs, vec!["2025-12-22/001", "2025-12-21/001"]);

    // Duplicate ids do not change the answer
    let again = docs_mentioning_all(&conn, &[e1.id.clone(), e2.id.clone(), e1.id.clone()]).unwrap();
    assert_eq!(again.len(), 2);
}

#[test]
fn lookup_and_cross_reference_resolve_aliases() {
    let (_tmp, store) = test_vault();
    write_doc(&store, "2025-12-20/001", dec(20, 9), &[("Sam", Person), ("rust", Tool)]);
    write_doc(&store, "2025-12-21/001", dec(21, 9), &[("sam", Person)]);
    write_doc(&store, "2025-12-24/001", dec(24, 9), &[("SAM", Person), ("Rust", Tool)]);

    let mut conn = test_db();
    rebuild(&mut conn, &store).unwrap();

    let found = lookup(&conn, "sAm").unwrap().unwrap();
    assert_eq!(found.entity.name, "Sam");
    assert_eq!(found.docs.len(), 3);
    assert_eq!(found.entity.created, dec(20, 9));
    assert_eq!(found.entity.last_mentioned, dec(24, 9));
    assert!(lookup(&conn, "nobody").unwrap().is_none());

    let xref = cross_reference(&conn, &["sam", "RUST"]).unwrap();
    assert!(xref.unresolved.is_empty());
    let docs: Vec<String> = xref.docs.iter().map(|d| d.doc_id.to_string()).collect();
    assert_eq!(docs, vec!["2025-12-24/001", "2025-12-20/001"]);
}

#[test]
fn time_range_covers_rebuilt_documents() {
    let (_tmp, store) = test_vault();
    write_doc(&store, "2025-12-20/001", dec(20, 9), &[("Sam", Person)]);
    write_doc(&store, "2025-12-24/001", dec(24, 9), &[("Sam", Person), ("rust", Tool)]);
    write_doc(&store, "2025-12-26/001", dec(26, 9), &[("rust", Tool)]);

    let mut conn = test_db();
    rebuild(&mut conn, &store).unwrap();

    let docs: Vec<String> = docs_in_time_range(&conn, dec(21, 0), dec(27, 0))
        .unwrap()
        .into_iter()
        .map(|d| d.doc_id.to_string())
        .collect();
    assert_eq!(docs, vec!["2025-12-26/001", "2025-12-24/001"]);

    assert!(docs_in_time_range(&conn, dec(27, 0), dec(21, 0)).unwrap_err().is_validation());
}

#[test]
fn keyword_search_scans_content_newest_first() {
    let (_tmp, store) = test_vault();
    write_doc(&store, "2025-12-20/001", dec(20, 9), &[("Sam", Person)]);
    write_doc(&store, "2025-12-24/001", dec(24, 9), &[("rust", Tool)]);

    let hits = keyword_search(&store, "BODY OF", None, 10).unwrap();
    let ids: Vec<String> = hits.iter().map(|h| h.doc_id.to_string()).collect();
    assert_eq!(ids, vec!["2025-12-24/001", "2025-12-20/001"]);
    assert_eq!(hits[0].line, "Body of 2025-12-24/001.");

    let windowed = keyword_search(&store, "body", Some((dec(21, 0), dec(31, 0))), 10).unwrap();
    assert_eq!(windowed.len(), 1);

    let limited = keyword_search(&store, "body", None, 1).unwrap();
    assert_eq!(limited.len(), 1);

    assert!(keyword_search(&store, "  ", None, 10).unwrap_err().is_validation());
    assert!(keyword_search(&store, "absent", None, 10).unwrap().is_empty());
}

#[test]
fn keyword_search_skips_file_that_is_not_utf8() {
    let (_tmp, store) = test_vault();
    write_doc(&store, "2025-12-20/001", dec(20, 9), &[("Sam", Person)]);
    write_doc(&store, "2025-12-24/001", dec(24, 9), &[("rust", Tool)]);
    write_raw(&store, Path::new("log/2025-12-22/001.md"), [0xffu8, 0xfe, 0x00, 0x78]);

    let hits = keyword_search(&store, "body", None, 10).unwrap();
    let ids: Vec<String> = hits.iter().map(|h| h.doc_id.to_string()).collect();
    assert_eq!(ids, vec!["2025-12-24/001", "2025-12-20/001"]);
}

#[test]
fn resolve_unknown_is_none_not_error() {
    let conn = test_db();
    assert!(resolve(&conn, "ghost").unwrap().is_none());
    let xref = cross_reference(&conn, &["ghost"]).unwrap();
    assert_eq!(xref.unresolved, vec!["ghost"]);
    assert!(xref.docs.is_empty());
}
