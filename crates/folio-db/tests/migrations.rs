//! Migration engine behaviour against real database files.

use std::path::Path;

use folio_db::migrations::{read_version, registry, Migration, Migrator, SCHEMA_VERSION};
use folio_db::schema::{
    live_columns, live_tables, ColumnDef, IndexDef, OnDelete, SchemaOp, SqlType, TableDef,
};
use folio_db::{Database, DbConfig, DbError};
use sqlx::SqlitePool;

async fn open(path: &Path, run_migrations: bool) -> Database {
    Database::new(DbConfig::new(path).run_migrations(run_migrations))
        .await
        .unwrap()
}

async fn version(pool: &SqlitePool) -> u32 {
    let mut conn = pool.acquire().await.unwrap();
    read_version(&mut conn).await.unwrap()
}

async fn columns(pool: &SqlitePool, table: &str) -> Vec<String> {
    let mut conn = pool.acquire().await.unwrap();
    live_columns(&mut conn, table).await.unwrap()
}

/// Everything in sqlite_master plus the stored version.
async fn snapshot(pool: &SqlitePool) -> (u32, Vec<(String, String, Option<String>)>) {
    let rows = sqlx::query_as::<_, (String, String, Option<String>)>(
        "SELECT type, name, sql FROM sqlite_master ORDER BY type, name",
    )
    .fetch_all(pool)
    .await
    .unwrap();
    (version(pool).await, rows)
}

async fn assert_matches_schema(pool: &SqlitePool, migrator: &Migrator, at: u32) {
    let expected = migrator.schema_at(at).unwrap();
    let mut conn = pool.acquire().await.unwrap();
    let live = live_tables(&mut conn).await.unwrap();

    let live_names: Vec<&String> = live.keys().collect();
    let expected_names: Vec<&String> = expected.tables().map(|t| &t.name).collect();
    assert_eq!(live_names, expected_names);

    for table in expected.tables() {
        assert_eq!(live[&table.name], table.column_names(), "table {}", table.name);
    }
}

#[tokio::test]
async fn new_file_starts_at_zero_and_reaches_latest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("folio.db");

    let db = open(&path, false).await;
    assert_eq!(version(db.pool()).await, 0);

    let report = db.run_migrations().await.unwrap();
    assert_eq!(report.from, 0);
    assert_eq!(report.to, SCHEMA_VERSION);
    assert_eq!(report.applied, vec![1, 2, 3, 4]);
    assert_eq!(version(db.pool()).await, SCHEMA_VERSION);

    assert_matches_schema(db.pool(), &registry().unwrap(), SCHEMA_VERSION).await;
}

#[tokio::test]
async fn every_starting_version_reaches_latest_in_order() {
    let migrator = registry().unwrap();

    for start in 0..SCHEMA_VERSION {
        let dir = tempfile::tempdir().unwrap();
        let db = open(&dir.path().join("folio.db"), false).await;

        migrator.migrate_to(db.pool(), start).await.unwrap();
        assert_eq!(version(db.pool()).await, start);
        assert_matches_schema(db.pool(), &migrator, start).await;

        let report = migrator.migrate(db.pool()).await.unwrap();
        assert_eq!(report.from, start);
        assert_eq!(report.applied, ((start + 1)..=SCHEMA_VERSION).collect::<Vec<_>>());
        assert_eq!(version(db.pool()).await, SCHEMA_VERSION);
        assert_matches_schema(db.pool(), &migrator, SCHEMA_VERSION).await;

        db.close().await;
    }
}

#[tokio::test]
async fn reopening_migrated_database_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("folio.db");

    let db = open(&path, true).await;
    let before = snapshot(db.pool()).await;
    db.close().await;

    let db = open(&path, true).await;
    let after = snapshot(db.pool()).await;
    assert_eq!(before, after);

    let report = db.run_migrations().await.unwrap();
    assert!(report.applied.is_empty());
    assert_eq!(report.from, SCHEMA_VERSION);
    assert_eq!(snapshot(db.pool()).await, before);
}

#[tokio::test]
async fn version_3_to_4_drops_valuation_columns_and_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let db = open(&dir.path().join("folio.db"), false).await;
    let migrator = registry().unwrap();

    migrator.migrate_to(db.pool(), 3).await.unwrap();
    assert_eq!(
        columns(db.pool(), "asset_holdings").await,
        vec![
            "id",
            "brokerageId",
            "quantity",
            "averageCost",
            "investedValue",
            "currentValue"
        ]
    );

    sqlx::query("INSERT INTO brokerages (id, name) VALUES (1, 'XYZ Corp'), (2, 'Degiro')")
        .execute(db.pool())
        .await
        .unwrap();
    sqlx::query(
        r#"INSERT INTO asset_holdings (id, "brokerageId", quantity, "averageCost", "investedValue", "currentValue")
           VALUES (10, 1, 5.0, 100.0, 500.0, 650.0),
                  (11, 2, 1.5, 20.0, 30.0, 28.5),
                  (17, 1, NULL, NULL, NULL, NULL)"#,
    )
    .execute(db.pool())
    .await
    .unwrap();

    let report = migrator.migrate(db.pool()).await.unwrap();
    assert_eq!(report.applied, vec![4]);
    assert_eq!(version(db.pool()).await, 4);

    assert_eq!(
        columns(db.pool(), "asset_holdings").await,
        vec!["id", "brokerageId"]
    );

    let rows = sqlx::query_as::<_, (i64, i64)>(
        r#"SELECT id, "brokerageId" FROM asset_holdings ORDER BY id"#,
    )
    .fetch_all(db.pool())
    .await
    .unwrap();
    assert_eq!(rows, vec![(10, 1), (11, 2), (17, 1)]);

    // Rebuild keeps the index, the foreign key and the id sequence
    let index: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = 'idx_asset_holdings_brokerage'",
    )
    .fetch_one(db.pool())
    .await
    .unwrap();
    assert_eq!(index, 1);

    let fk = sqlx::query("DELETE FROM brokerages WHERE id = 1")
        .execute(db.pool())
        .await;
    assert!(fk.is_err());

    let next = db
        .holdings()
        .insert(folio_core::EntityId::new(2).unwrap())
        .await
        .unwrap();
    assert!(next.get() > 17);

    let scratch: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE name LIKE '%__rebuild'",
    )
    .fetch_one(db.pool())
    .await
    .unwrap();
    assert_eq!(scratch, 0);
}

#[tokio::test]
async fn column_drop_does_not_reuse_deleted_ids() {
    let dir = tempfile::tempdir().unwrap();
    let db = open(&dir.path().join("folio.db"), false).await;
    let migrator = registry().unwrap();

    migrator.migrate_to(db.pool(), 3).await.unwrap();
    sqlx::query("INSERT INTO brokerages (name) VALUES ('XYZ Corp')")
        .execute(db.pool())
        .await
        .unwrap();
    for _ in 0..3 {
        sqlx::query(r#"INSERT INTO asset_holdings ("brokerageId") VALUES (1)"#)
            .execute(db.pool())
            .await
            .unwrap();
    }

    // The highest id is gone before the rebuild, so only the counter remembers it
    sqlx::query("DELETE FROM asset_holdings WHERE id = 3")
        .execute(db.pool())
        .await
        .unwrap();

    migrator.migrate(db.pool()).await.unwrap();

    let next = db
        .holdings()
        .insert(folio_core::EntityId::new(1).unwrap())
        .await
        .unwrap();
    assert_eq!(next.get(), 4);

    let sequences: Vec<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_sequence ORDER BY name")
            .fetch_all(db.pool())
            .await
            .unwrap();
    assert_eq!(sequences, vec!["asset_holdings", "brokerages"]);
}

#[tokio::test]
async fn unexpected_from_shape_fails_and_keeps_version() {
    let dir = tempfile::tempdir().unwrap();
    let db = open(&dir.path().join("folio.db"), false).await;
    let migrator = registry().unwrap();

    migrator.migrate_to(db.pool(), 3).await.unwrap();
    sqlx::query("ALTER TABLE asset_holdings ADD COLUMN rogue TEXT")
        .execute(db.pool())
        .await
        .unwrap();

    let err = migrator.migrate(db.pool()).await.unwrap_err();
    assert!(matches!(err, DbError::MigrationFailed { version: 4, .. }));
    assert!(err.is_fatal());

    assert_eq!(version(db.pool()).await, 3);
    assert!(columns(db.pool(), "asset_holdings")
        .await
        .contains(&"quantity".to_string()));
}

#[tokio::test]
async fn existing_table_blocks_create_step() {
    let dir = tempfile::tempdir().unwrap();
    let db = open(&dir.path().join("folio.db"), false).await;

    sqlx::query("CREATE TABLE brokerages (id INTEGER PRIMARY KEY, label TEXT)")
        .execute(db.pool())
        .await
        .unwrap();

    let err = db.run_migrations().await.unwrap_err();
    assert!(matches!(err, DbError::MigrationFailed { version: 1, .. }));
    assert_eq!(version(db.pool()).await, 0);
}

#[tokio::test]
async fn failing_step_rolls_back_and_earlier_steps_stay() {
    let dir = tempfile::tempdir().unwrap();
    let db = open(&dir.path().join("scratch.db"), false).await;

    let migrator = Migrator::new(vec![
        Migration::new(
            1,
            "create items",
            vec![SchemaOp::CreateTable(TableDef::new(
                "items",
                vec![ColumnDef::id("id"), ColumnDef::new("code", SqlType::Text)],
            ))],
        ),
        Migration::new(
            2,
            "add note, make code unique",
            vec![
                SchemaOp::add_column("items", ColumnDef::new("note", SqlType::Text)),
                SchemaOp::CreateIndex(IndexDef::new("ux_items_code", "items", &["code"]).unique()),
            ],
        ),
    ])
    .unwrap();

    migrator.migrate_to(db.pool(), 1).await.unwrap();
    sqlx::query("INSERT INTO items (code) VALUES ('dup'), ('dup')")
        .execute(db.pool())
        .await
        .unwrap();

    let err = migrator.migrate(db.pool()).await.unwrap_err();
    assert!(matches!(err, DbError::MigrationFailed { version: 2, .. }));

    // The ADD COLUMN that ran before the failing index was rolled back too
    assert_eq!(version(db.pool()).await, 1);
    assert_eq!(columns(db.pool(), "items").await, vec!["id", "code"]);

    // Foreign keys are enforced again on the pooled connection
    let fk: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(fk, 1);
}

#[tokio::test]
async fn orphaned_rows_fail_the_step_and_name_the_table() {
    let dir = tempfile::tempdir().unwrap();
    // One connection, so the PRAGMA below applies to every query
    let db = Database::new(
        DbConfig::new(dir.path().join("scratch.db"))
            .max_connections(1)
            .run_migrations(false),
    )
    .await
    .unwrap();

    let migrator = Migrator::new(vec![
        Migration::new(
            1,
            "create parents and children",
            vec![
                SchemaOp::CreateTable(TableDef::new("parents", vec![ColumnDef::id("id")])),
                SchemaOp::CreateTable(TableDef::new(
                    "children",
                    vec![
                        ColumnDef::id("id"),
                        ColumnDef::new("parentId", SqlType::Integer).references(
                            "parents",
                            "id",
                            OnDelete::Restrict,
                        ),
                    ],
                )),
            ],
        ),
        Migration::new(
            2,
            "add note",
            vec![SchemaOp::add_column(
                "children",
                ColumnDef::new("note", SqlType::Text),
            )],
        ),
    ])
    .unwrap();

    migrator.migrate_to(db.pool(), 1).await.unwrap();
    for sql in [
        "PRAGMA foreign_keys = OFF",
        r#"INSERT INTO children ("parentId") VALUES (99)"#,
        "PRAGMA foreign_keys = ON",
    ] {
        sqlx::query(sql).execute(db.pool()).await.unwrap();
    }

    let err = migrator.migrate(db.pool()).await.unwrap_err();
    match err {
        DbError::MigrationFailed { version, reason } => {
            assert_eq!(version, 2);
            assert!(reason.contains("children"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(version(db.pool()).await, 1);
}

#[tokio::test]
async fn newer_database_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("folio.db");

    let db = open(&path, true).await;
    sqlx::query(&format!("PRAGMA user_version = {}", SCHEMA_VERSION + 1))
        .execute(db.pool())
        .await
        .unwrap();
    db.close().await;

    let err = Database::new(DbConfig::new(&path)).await.unwrap_err();
    assert!(matches!(err, DbError::MigrationFailed { .. }));
}

#[tokio::test]
async fn downgrade_and_unknown_targets_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let db = open(&dir.path().join("folio.db"), true).await;
    let migrator = registry().unwrap();

    let err = migrator.migrate_to(db.pool(), 2).await.unwrap_err();
    assert!(matches!(err, DbError::MigrationFailed { .. }));

    let err = migrator
        .migrate_to(db.pool(), SCHEMA_VERSION + 1)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::MigrationFailed { .. }));

    assert_eq!(version(db.pool()).await, SCHEMA_VERSION);
}
