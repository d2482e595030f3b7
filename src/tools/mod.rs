//! Tools the agent crew calls while investigating.
//!
//! - `sql` - Run statements and describe the rows they return
//! - `schema` - Table, column, key and index introspection
//! - `summarizer` - Generative summaries of query results

pub mod schema;
pub mod sql;
pub mod summarizer;

pub use schema::{SchemaTool, TableSchema};
pub use sql::{QueryOutcome, SqlTool};
pub use summarizer::SummarizerTool;
