// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

fn cloud_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         CREATE TABLE vm_instance (id INTEGER PRIMARY KEY, name TEXT);
         CREATE TABLE nics (
             id INTEGER,
             instance_id INTEGER,
             ip4_address TEXT,
             legacy_flag INTEGER,
             CONSTRAINT pk_nics PRIMARY KEY (id),
             CONSTRAINT fk_nics__instance_id FOREIGN KEY (instance_id) REFERENCES vm_instance(id)
         );
         CREATE INDEX i_nics__ip4_address ON nics(ip4_address);
         INSERT INTO vm_instance VALUES (1, 'vm-1');
         INSERT INTO nics VALUES (1, 1, '10.0.0.1', 0);",
    )
    .unwrap();
    conn
}

#[test]
fn column_probe() {
    let conn = cloud_db();
    assert!(column_exists(&conn, "nics", "ip4_address").unwrap());
    assert!(column_exists(&conn, "nics", "IP4_ADDRESS").unwrap());
    assert!(!column_exists(&conn, "nics", "mac_address").unwrap());
    assert!(!column_exists(&conn, "ghost", "id").unwrap());
}

#[test]
fn table_and_index_probes() {
    let conn = cloud_db();
    assert!(table_exists(&conn, "nics").unwrap());
    assert!(!table_exists(&conn, "ghost").unwrap());
    assert!(index_exists(&conn, "i_nics__ip4_address").unwrap());
    assert!(!index_exists(&conn, "i_missing").unwrap());
}

#[test]
fn drop_column_twice_is_noop_second_time() {
    let conn = cloud_db();
    assert!(drop_column_if_exists(&conn, "nics", "legacy_flag").unwrap());
    assert!(!drop_column_if_exists(&conn, "nics", "legacy_flag").unwrap());
    assert!(!column_exists(&conn, "nics", "legacy_flag").unwrap());
}

#[test]
fn drop_column_on_missing_table_is_absent() {
    let conn = cloud_db();
    assert!(!drop_column_if_exists(&conn, "ghost", "id").unwrap());
}

#[yare::parameterized(
    index       = { "i_nics__ip4_address",  KeyKind::Index },
    foreign_key = { "fk_nics__instance_id", KeyKind::ForeignKey },
)]
fn drop_key_twice_never_raises(key: &str, kind: KeyKind) {
    let conn = cloud_db();
    assert!(drop_key_if_exists(&conn, "nics", key, kind).unwrap());
    assert!(!drop_key_if_exists(&conn, "nics", key, kind).unwrap());
}

#[test]
fn dropped_foreign_key_no_longer_enforced() {
    let conn = cloud_db();
    drop_key_if_exists(&conn, "nics", "fk_nics__instance_id", KeyKind::ForeignKey).unwrap();

    conn.execute("INSERT INTO nics VALUES (2, 42, '10.0.0.2', 0)", [])
        .unwrap();
    // Index and rows survive the rebuild
    assert!(index_exists(&conn, "i_nics__ip4_address").unwrap());
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM nics", [], |r| r.get(0))
        .unwrap();
    assert_eq!(rows, 2);
}

fn foreign_key_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM pragma_foreign_key_list(?1)",
        [table],
        |r| r.get(0),
    )
    .unwrap()
}

#[test]
fn foreign_key_drop_survives_dependent_views_and_triggers() {
    let conn = cloud_db();
    conn.execute_batch(
        "CREATE VIEW v_nics AS SELECT id, ip4_address FROM nics;
         CREATE TRIGGER vm_cleanup AFTER DELETE ON vm_instance
         BEGIN DELETE FROM nics WHERE instance_id = OLD.id; END;",
    )
    .unwrap();

    assert!(
        drop_key_if_exists(&conn, "nics", "fk_nics__instance_id", KeyKind::ForeignKey).unwrap()
    );
    assert_eq!(foreign_key_count(&conn, "nics"), 0);

    let through_view: i64 = conn
        .query_row("SELECT COUNT(*) FROM v_nics", [], |r| r.get(0))
        .unwrap();
    assert_eq!(through_view, 1);
    conn.execute("DELETE FROM vm_instance WHERE id = 1", []).unwrap();
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM nics", [], |r| r.get(0))
        .unwrap();
    assert_eq!(rows, 0);
}

#[test]
fn primary_key_drop_survives_dependent_views() {
    let conn = cloud_db();
    conn.execute_batch("CREATE VIEW v_nics AS SELECT id FROM nics;")
        .unwrap();
    assert!(drop_primary_key_if_exists(&conn, "nics").unwrap());
    assert!(table_exists(&conn, "nics").unwrap());
}

#[test]
fn foreign_key_drop_tolerates_commented_definition() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE p (id INTEGER PRIMARY KEY);
         CREATE TABLE c (
             id INTEGER,
             pid INTEGER, -- parent's id
             CONSTRAINT fk_c_p FOREIGN KEY (pid) REFERENCES p(id)
         );",
    )
    .unwrap();

    assert!(drop_key_if_exists(&conn, "c", "fk_c_p", KeyKind::ForeignKey).unwrap());
    assert_eq!(foreign_key_count(&conn, "c"), 0);
}

#[test]
fn foreign_key_drop_inside_caller_transaction() {
    let conn = cloud_db();
    conn.execute_batch("BEGIN").unwrap();

    assert!(
        drop_key_if_exists(&conn, "nics", "fk_nics__instance_id", KeyKind::ForeignKey).unwrap()
    );
    assert!(!conn.is_autocommit(), "caller's transaction must stay open");
    conn.execute_batch("COMMIT").unwrap();

    assert_eq!(foreign_key_count(&conn, "nics"), 0);
    assert!(index_exists(&conn, "i_nics__ip4_address").unwrap());
}

#[test]
fn caller_rollback_undoes_rebuild() {
    let conn = cloud_db();
    conn.execute_batch("BEGIN").unwrap();
    assert!(drop_primary_key_if_exists(&conn, "nics").unwrap());
    conn.execute_batch("ROLLBACK").unwrap();

    let pk_columns: i64 = conn
        .query_row("SELECT COUNT(*) FROM pragma_table_info('nics') WHERE pk > 0", [], |r| r.get(0))
        .unwrap();
    assert_eq!(pk_columns, 1);
    assert_eq!(foreign_key_count(&conn, "nics"), 1);
}

#[test]
fn index_of_another_table_is_left_alone() {
    let conn = cloud_db();
    let dropped =
        drop_key_if_exists(&conn, "vm_instance", "i_nics__ip4_address", KeyKind::Index).unwrap();
    assert!(!dropped);
    assert!(index_exists(&conn, "i_nics__ip4_address").unwrap());
}

#[test]
fn drop_key_on_missing_table_is_absent() {
    let conn = cloud_db();
    assert!(!drop_key_if_exists(&conn, "ghost", "fk_x", KeyKind::ForeignKey).unwrap());
    assert!(!drop_key_if_exists(&conn, "ghost", "i_x", KeyKind::Index).unwrap());
}

#[test]
fn drop_primary_key_twice_never_raises() {
    let conn = cloud_db();
    assert!(drop_primary_key_if_exists(&conn, "nics").unwrap());
    assert!(!drop_primary_key_if_exists(&conn, "nics").unwrap());

    // Duplicate ids are accepted once the key is gone
    conn.execute("INSERT INTO nics VALUES (1, 1, '10.0.0.9', 0)", [])
        .unwrap();
}

#[test]
fn drop_primary_key_on_missing_table_is_absent() {
    let conn = cloud_db();
    assert!(!drop_primary_key_if_exists(&conn, "ghost").unwrap());
}

#[test]
fn constraint_index_drop_is_unexpected() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("CREATE TABLE t (a TEXT UNIQUE)").unwrap();

    let err = drop_key_if_exists(&conn, "t", "sqlite_autoindex_t_1", KeyKind::Index).unwrap_err();
    assert!(matches!(err, StatementError::Unexpected { .. }), "got {err:?}");
}

#[test]
fn read_only_database_propagates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ro.db");
    Connection::open(&path)
        .unwrap()
        .execute_batch("CREATE TABLE t (a INTEGER, b INTEGER)")
        .unwrap();
    let conn =
        Connection::open_with_flags(&path, rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY).unwrap();

    let err = drop_column_if_exists(&conn, "t", "b").unwrap_err();
    match err {
        StatementError::Unexpected { context, .. } => assert_eq!(context, "drop column t.b"),
        other => panic!("unexpected error: {other:?}"),
    }
}
