//! Schema introspection for the campaign database.

use crate::db::Database;
use crate::{Error, Result};
use rusqlite::params;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub primary_key: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKey {
    pub column: String,
    pub references_table: String,
    pub references_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexInfo {
    pub name: String,
    pub definition: String,
    pub unique: bool,
}

/// Everything known about one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    pub name: String,
    pub row_count: i64,
    pub columns: Vec<ColumnInfo>,
    pub foreign_keys: Vec<ForeignKey>,
    pub indexes: Vec<IndexInfo>,
}

/// Reads table structure through `sqlite_master` and the table pragmas.
pub struct SchemaTool<'a> {
    db: &'a Database,
}

impl<'a> SchemaTool<'a> {
    /// Create the tool, failing if the database does not answer.
    pub fn new(db: &'a Database) -> Result<Self> {
        if !db.test_connection() {
            return Err(Error::Connection {
                path: db.path().to_path_buf(),
                reason: "Failed to connect to the database. Please check your connection settings."
                    .to_string(),
            });
        }
        Ok(Self { db })
    }

    /// User tables, sorted by name.
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )?;
        let tables = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tables)
    }

    /// Columns, foreign keys, indexes and row count of `table`.
    pub fn describe(&self, table: &str) -> Result<TableSchema> {
        if !self.list_tables()?.iter().any(|t| t == table) {
            return Err(Error::NotFound(format!("Table '{}' does not exist", table)));
        }
        let conn = self.db.connection();

        let mut stmt = conn.prepare(
            "SELECT name, type, \"notnull\", dflt_value, pk
             FROM pragma_table_info(?1) ORDER BY cid",
        )?;
        let columns = stmt
            .query_map(params![table], |row| {
                Ok(ColumnInfo {
                    name: row.get(0)?,
                    data_type: row.get(1)?,
                    nullable: row.get::<_, i64>(2)? == 0,
                    default: row.get(3)?,
                    primary_key: row.get::<_, i64>(4)? > 0,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let indexes = {
            let mut stmt = conn.prepare(
                "SELECT il.name, il.\"unique\", m.sql
                 FROM pragma_index_list(?1) AS il
                 LEFT JOIN sqlite_master AS m ON m.type = 'index' AND m.name = il.name
                 ORDER BY il.name",
            )?;
            let indexes = stmt
                .query_map(params![table], |row| {
                    Ok(IndexInfo {
                        name: row.get(0)?,
                        unique: row.get::<_, i64>(1)? != 0,
                        definition: row
                            .get::<_, Option<String>>(2)?
                            .unwrap_or_else(|| "(automatic)".to_string()),
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            indexes
        };

        let row_count = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_identifier(table)),
            [],
            |row| row.get(0),
        )?;

        Ok(TableSchema {
            name: table.to_string(),
            row_count,
            columns,
            foreign_keys: self.foreign_keys(table)?,
            indexes,
        })
    }

    /// Foreign keys of every table that has any, keyed by table name.
    pub fn relationships(&self) -> Result<BTreeMap<String, Vec<ForeignKey>>> {
        let mut relationships = BTreeMap::new();
        for table in self.list_tables()? {
            let keys = self.foreign_keys(&table)?;
            if !keys.is_empty() {
                relationships.insert(table, keys);
            }
        }
        Ok(relationships)
    }

    fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKey>> {
        let mut stmt = self.db.connection().prepare(
            "SELECT \"from\", \"table\", \"to\"
             FROM pragma_foreign_key_list(?1) ORDER BY \"from\", seq",
        )?;
        let keys = stmt
            .query_map(params![table], |row| {
                Ok(ForeignKey {
                    column: row.get(0)?,
                    references_table: row.get(1)?,
                    // NULL when the key targets the parent's primary key implicitly
                    references_column: row
                        .get::<_, Option<String>>(2)?
                        .unwrap_or_else(|| "rowid".to_string()),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(keys)
    }

    /// Markdown description of one table. Errors are rendered into the text.
    pub fn format_table_schema(&self, table: &str) -> String {
        match self.describe(table) {
            Ok(schema) => render_table_schema(&schema),
            Err(e) => format!("Error retrieving schema for table '{}': {}", table, e),
        }
    }

    /// Markdown overview of every table and relationship.
    pub fn schema_summary(&self) -> String {
        self.try_schema_summary()
            .unwrap_or_else(|e| format!("Error generating schema summary: {}", e))
    }

    fn try_schema_summary(&self) -> Result<String> {
        let tables = self.list_tables()?;
        let relationships = self.relationships()?;

        let mut output = String::from("# Database Schema Summary\n\n");
        output.push_str(&format!("## Tables ({})\n\n", tables.len()));
        for table in &tables {
            let row_count = self.describe(table)?.row_count;
            output.push_str(&format!("- **{}** ({} rows)\n", table, row_count));
        }

        output.push_str("\n## Relationships\n\n");
        for (table, keys) in &relationships {
            output.push_str(&format!("### {}\n\n", table));
            for key in keys {
                output.push_str(&format!(
                    "- {}.{} → {}.{}\n",
                    table, key.column, key.references_table, key.references_column
                ));
            }
        }
        Ok(output)
    }
}

fn render_table_schema(schema: &TableSchema) -> String {
    let mut output = format!("# Table: {}\n\n", schema.name);
    output.push_str(&format!("Row count: {}\n\n", schema.row_count));

    output.push_str("## Columns\n\n");
    output.push_str("| Column | Type | Nullable | Default | Description |\n");
    output.push_str("|--------|------|----------|---------|-------------|\n");
    for column in &schema.columns {
        output.push_str(&format!(
            "| {} | {} | {} | {} | |\n",
            column.name,
            column.data_type,
            if column.nullable { "YES" } else { "NO" },
            column.default.as_deref().unwrap_or("")
        ));
    }

    let primary_key: Vec<&str> = schema
        .columns
        .iter()
        .filter(|c| c.primary_key)
        .map(|c| c.name.as_str())
        .collect();
    if !primary_key.is_empty() || !schema.foreign_keys.is_empty() {
        output.push_str("\n## Constraints\n\n");
        output.push_str("| Name | Type | Column | References |\n");
        output.push_str("|------|------|--------|------------|\n");
        for column in &primary_key {
            output.push_str(&format!(
                "| {}_pkey | PRIMARY KEY | {} | |\n",
                schema.name, column
            ));
        }
        for key in &schema.foreign_keys {
            output.push_str(&format!(
                "| {}_{}_fkey | FOREIGN KEY | {} | {}({}) |\n",
                schema.name, key.column, key.column, key.references_table, key.references_column
            ));
        }
    }

    if !schema.indexes.is_empty() {
        output.push_str("\n## Indexes\n\n");
        output.push_str("| Name | Definition |\n");
        output.push_str("|------|------------|\n");
        for index in &schema.indexes {
            output.push_str(&format!("| {} | {} |\n", index.name, index.definition));
        }
    }

    output
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
