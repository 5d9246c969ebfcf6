//! # Schema Description
//!
//! An explicit, in-memory description of the tables Folio stores, plus the
//! declarative operations migrations are written in.
//!
//! ## How The Schema Is Known
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Schema = fold(migrations)                              │
//! │                                                                         │
//! │  Schema::default()  (version 0, no tables)                             │
//! │       │  v1: CreateTable brokerages                                    │
//! │       ▼                                                                 │
//! │  Schema@1                                                              │
//! │       │  v2: CreateTable asset_holdings, CreateIndex                   │
//! │       ▼                                                                 │
//! │  Schema@2                                                              │
//! │       │  v3: AddColumn investedValue, AddColumn currentValue           │
//! │       ▼                                                                 │
//! │  Schema@3                                                              │
//! │       │  v4: DropColumns quantity, averageCost, investedValue, ...     │
//! │       ▼                                                                 │
//! │  Schema@4  ← what repositories read and write                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no hand-maintained "current schema": the shape at any version is
//! derived by applying [`SchemaOp`]s in order. The same fold gives each
//! migration step its expected "from" shape, which is checked against the
//! live database before the step runs.
//!
//! ## Dropping Columns
//! SQLite's native `DROP COLUMN` refuses indexed, key and foreign-key
//! columns, so [`SchemaOp::DropColumns`] always rebuilds the table:
//!
//! ```text
//! CREATE TABLE "t__rebuild" (<surviving columns>)
//! INSERT INTO "t__rebuild" (<surviving>) SELECT <surviving> FROM "t"
//! copy sqlite_sequence row of "t" to "t__rebuild"   (AUTOINCREMENT only)
//! DROP TABLE "t"
//! ALTER TABLE "t__rebuild" RENAME TO "t"
//! CREATE INDEX ... (every surviving index on "t")
//! ```

use sqlx::SqliteConnection;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{DbResult, SchemaError};

// =============================================================================
// Table Names
// =============================================================================

/// Table holding [`folio_core::Brokerage`] rows.
pub const BROKERAGES: &str = "brokerages";

/// Table holding [`folio_core::AssetHolding`] rows.
pub const ASSET_HOLDINGS: &str = "asset_holdings";

/// Suffix of the scratch table used while rebuilding.
const REBUILD_SUFFIX: &str = "__rebuild";

/// Quotes an SQL identifier.
pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quotes an SQL string literal.
fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

// =============================================================================
// Column
// =============================================================================

/// SQLite storage class of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Real,
    Text,
    Blob,
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Text => "TEXT",
            SqlType::Blob => "BLOB",
        };
        f.write_str(name)
    }
}

/// Action taken on the child row when its parent is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    Restrict,
    Cascade,
    SetNull,
}

impl fmt::Display for OnDelete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self {
            OnDelete::Restrict => "RESTRICT",
            OnDelete::Cascade => "CASCADE",
            OnDelete::SetNull => "SET NULL",
        };
        f.write_str(action)
    }
}

/// A `REFERENCES` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyDef {
    pub table: String,
    pub column: String,
    pub on_delete: OnDelete,
}

/// A single named, typed column.
///
/// ## Example
/// ```rust
/// use folio_db::schema::{ColumnDef, OnDelete, SqlType};
///
/// let col = ColumnDef::new("brokerageId", SqlType::Integer)
///     .not_null()
///     .references("brokerages", "id", OnDelete::Restrict);
/// assert_eq!(
///     col.to_sql(),
///     r#""brokerageId" INTEGER NOT NULL REFERENCES "brokerages"("id") ON DELETE RESTRICT"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub sql_type: SqlType,
    pub primary_key: bool,
    pub not_null: bool,
    /// Raw SQL literal used as `DEFAULT`.
    pub default: Option<String>,
    pub references: Option<ForeignKeyDef>,
}

impl ColumnDef {
    /// Creates a nullable column without constraints.
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        ColumnDef {
            name: name.into(),
            sql_type,
            primary_key: false,
            not_null: false,
            default: None,
            references: None,
        }
    }

    /// `INTEGER PRIMARY KEY AUTOINCREMENT`: ids are assigned by the store,
    /// start at 1 and are never reused.
    pub fn id(name: impl Into<String>) -> Self {
        ColumnDef {
            primary_key: true,
            ..ColumnDef::new(name, SqlType::Integer)
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn default_sql(mut self, literal: impl Into<String>) -> Self {
        self.default = Some(literal.into());
        self
    }

    pub fn references(
        mut self,
        table: impl Into<String>,
        column: impl Into<String>,
        on_delete: OnDelete,
    ) -> Self {
        self.references = Some(ForeignKeyDef {
            table: table.into(),
            column: column.into(),
            on_delete,
        });
        self
    }

    /// Renders the column definition as used in `CREATE TABLE` and
    /// `ALTER TABLE ... ADD COLUMN`.
    pub fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", quote_ident(&self.name), self.sql_type);
        if self.primary_key {
            sql.push_str(" PRIMARY KEY AUTOINCREMENT");
        }
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        if let Some(fk) = &self.references {
            sql.push_str(&format!(
                " REFERENCES {}({}) ON DELETE {}",
                quote_ident(&fk.table),
                quote_ident(&fk.column),
                fk.on_delete
            ));
        }
        sql
    }
}

// =============================================================================
// Table / Index
// =============================================================================

/// A table: stable name plus ordered columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        TableDef {
            name: name.into(),
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// True when the table has an `AUTOINCREMENT` key and therefore a row
    /// in `sqlite_sequence` once anything was inserted.
    pub fn has_autoincrement(&self) -> bool {
        self.columns.iter().any(|c| c.primary_key)
    }

    /// `CREATE TABLE` statement for this definition, under `as_name`.
    fn create_sql(&self, as_name: &str) -> String {
        let columns: Vec<String> = self.columns.iter().map(ColumnDef::to_sql).collect();
        format!(
            "CREATE TABLE {} ({})",
            quote_ident(as_name),
            columns.join(", ")
        )
    }
}

/// A secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

impl IndexDef {
    pub fn new(
        name: impl Into<String>,
        table: impl Into<String>,
        columns: &[&str],
    ) -> Self {
        IndexDef {
            name: name.into(),
            table: table.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    fn create_sql(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(|c| quote_ident(c)).collect();
        format!(
            "CREATE {}INDEX {} ON {} ({})",
            if self.unique { "UNIQUE " } else { "" },
            quote_ident(&self.name),
            quote_ident(&self.table),
            columns.join(", ")
        )
    }
}

// =============================================================================
// Operations
// =============================================================================

/// A declarative schema transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaOp {
    CreateTable(TableDef),
    AddColumn { table: String, column: ColumnDef },
    /// Removes columns by rebuilding the table. Indexes that cover a dropped
    /// column are dropped with it; the rest are recreated.
    DropColumns { table: String, columns: Vec<String> },
    CreateIndex(IndexDef),
}

impl SchemaOp {
    pub fn add_column(table: &str, column: ColumnDef) -> Self {
        SchemaOp::AddColumn {
            table: table.to_string(),
            column,
        }
    }

    pub fn drop_columns(table: &str, columns: &[&str]) -> Self {
        SchemaOp::DropColumns {
            table: table.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Name of the table this operation changes.
    pub fn table(&self) -> &str {
        match self {
            SchemaOp::CreateTable(def) => &def.name,
            SchemaOp::AddColumn { table, .. } | SchemaOp::DropColumns { table, .. } => table,
            SchemaOp::CreateIndex(index) => &index.table,
        }
    }

    /// SQL that brings a database to `after`, where `after` is the result of
    /// [`Schema::apply`] for this operation.
    pub fn statements(&self, after: &Schema) -> Vec<String> {
        match self {
            SchemaOp::CreateTable(def) => vec![def.create_sql(&def.name)],

            SchemaOp::AddColumn { table, column } => vec![format!(
                "ALTER TABLE {} ADD COLUMN {}",
                quote_ident(table),
                column.to_sql()
            )],

            SchemaOp::DropColumns { table, .. } => {
                let Some(new) = after.table(table) else {
                    return Vec::new();
                };

                let scratch = format!("{table}{REBUILD_SUFFIX}");
                let surviving: Vec<String> =
                    new.columns.iter().map(|c| quote_ident(&c.name)).collect();
                let surviving = surviving.join(", ");

                let mut sql = vec![
                    new.create_sql(&scratch),
                    format!(
                        "INSERT INTO {} ({surviving}) SELECT {surviving} FROM {}",
                        quote_ident(&scratch),
                        quote_ident(table)
                    ),
                ];

                // DROP TABLE deletes the old counter; without carrying it
                // over, ids of rows deleted earlier would be handed out again
                if new.has_autoincrement() {
                    sql.push(format!(
                        "DELETE FROM sqlite_sequence WHERE name = {}",
                        quote_literal(&scratch)
                    ));
                    sql.push(format!(
                        "INSERT INTO sqlite_sequence (name, seq) SELECT {}, seq FROM sqlite_sequence WHERE name = {}",
                        quote_literal(&scratch),
                        quote_literal(table)
                    ));
                }

                sql.push(format!("DROP TABLE {}", quote_ident(table)));
                sql.push(format!(
                    "ALTER TABLE {} RENAME TO {}",
                    quote_ident(&scratch),
                    quote_ident(table)
                ));
                sql.extend(after.indexes_on(table).map(IndexDef::create_sql));
                sql
            }

            SchemaOp::CreateIndex(index) => vec![index.create_sql()],
        }
    }
}

// =============================================================================
// Schema
// =============================================================================

/// The full set of tables and indexes at one schema version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    tables: BTreeMap<String, TableDef>,
    indexes: BTreeMap<String, IndexDef>,
}

impl Schema {
    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.get(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableDef> {
        self.tables.values()
    }

    pub fn index(&self, name: &str) -> Option<&IndexDef> {
        self.indexes.get(name)
    }

    pub fn indexes_on<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a IndexDef> + 'a {
        self.indexes.values().filter(move |i| i.table == table)
    }

    /// Returns the schema that results from applying `op`.
    ///
    /// Fails when the operation does not fit this shape: creating an
    /// existing table, adding an existing column, dropping a missing or
    /// primary-key column, indexing a missing column.
    pub fn apply(&self, op: &SchemaOp) -> Result<Schema, SchemaError> {
        let mut next = self.clone();

        match op {
            SchemaOp::CreateTable(def) => {
                if next.tables.contains_key(&def.name) {
                    return Err(SchemaError::TableExists(def.name.clone()));
                }
                if def.columns.is_empty() {
                    return Err(SchemaError::NoColumns(def.name.clone()));
                }
                next.tables.insert(def.name.clone(), def.clone());
            }

            SchemaOp::AddColumn { table, column } => {
                let def = next
                    .tables
                    .get_mut(table)
                    .ok_or_else(|| SchemaError::TableMissing(table.clone()))?;
                if def.column(&column.name).is_some() {
                    return Err(SchemaError::ColumnExists {
                        table: table.clone(),
                        column: column.name.clone(),
                    });
                }
                if column.primary_key {
                    return Err(SchemaError::PrimaryKey {
                        table: table.clone(),
                        column: column.name.clone(),
                    });
                }
                if column.not_null && column.default.is_none() {
                    return Err(SchemaError::NotNullWithoutDefault {
                        table: table.clone(),
                        column: column.name.clone(),
                    });
                }
                def.columns.push(column.clone());
            }

            SchemaOp::DropColumns { table, columns } => {
                let def = next
                    .tables
                    .get_mut(table)
                    .ok_or_else(|| SchemaError::TableMissing(table.clone()))?;
                if columns.is_empty() {
                    return Err(SchemaError::NothingToDrop(table.clone()));
                }
                for name in columns {
                    let column = def.column(name).ok_or_else(|| SchemaError::ColumnMissing {
                        table: table.clone(),
                        column: name.clone(),
                    })?;
                    if column.primary_key {
                        return Err(SchemaError::PrimaryKey {
                            table: table.clone(),
                            column: name.clone(),
                        });
                    }
                }
                def.columns.retain(|c| !columns.contains(&c.name));
                if def.columns.is_empty() {
                    return Err(SchemaError::NoColumns(table.clone()));
                }
                next.indexes.retain(|_, index| {
                    index.table != *table || !index.columns.iter().any(|c| columns.contains(c))
                });
            }

            SchemaOp::CreateIndex(index) => {
                if next.indexes.contains_key(&index.name) {
                    return Err(SchemaError::IndexExists(index.name.clone()));
                }
                let def = next
                    .tables
                    .get(&index.table)
                    .ok_or_else(|| SchemaError::TableMissing(index.table.clone()))?;
                if let Some(missing) = index.columns.iter().find(|c| def.column(c).is_none()) {
                    return Err(SchemaError::ColumnMissing {
                        table: index.table.clone(),
                        column: missing.clone(),
                    });
                }
                next.indexes.insert(index.name.clone(), index.clone());
            }
        }

        Ok(next)
    }
}

// =============================================================================
// Live Introspection
// =============================================================================

/// Column names of `table` in the live database, in declaration order.
/// Empty when the table does not exist.
pub async fn live_columns(conn: &mut SqliteConnection, table: &str) -> DbResult<Vec<String>> {
    let columns = sqlx::query_scalar::<_, String>(
        "SELECT name FROM pragma_table_info(?1) ORDER BY cid",
    )
    .bind(table)
    .fetch_all(&mut *conn)
    .await?;

    Ok(columns)
}

/// Returns true if an index with this name exists.
pub async fn live_index_exists(conn: &mut SqliteConnection, name: &str) -> DbResult<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = ?1",
    )
    .bind(name)
    .fetch_one(&mut *conn)
    .await?;

    Ok(count > 0)
}

/// All user tables and their columns, keyed by table name.
pub async fn live_tables(conn: &mut SqliteConnection) -> DbResult<BTreeMap<String, Vec<String>>> {
    let names = sqlx::query_scalar::<_, String>(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(&mut *conn)
    .await?;

    let mut tables = BTreeMap::new();
    for name in names {
        let columns = live_columns(conn, &name).await?;
        tables.insert(name, columns);
    }

    Ok(tables)
}

// =============================================================================
// Unit Tests
// =============================================================================
