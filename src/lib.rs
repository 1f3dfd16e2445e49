//! Entity index and retrieval for a personal knowledge archive.
//!
//! The archive is a directory of dated markdown documents
//! (`knowledge/log/<YYYY-MM-DD>/<NNN>.md`), each with YAML front matter naming
//! the entities it mentions. Spellbook keeps a derived SQLite index over those
//! mentions so an agent can answer "which documents mention X", "what happened
//! between these dates" and "where do X and Y meet" without reading the archive.
//!
//! The documents are the source of truth. The index can be thrown away and
//! rebuilt from them at any time; a rebuild yields the same index as having
//! archived every document one by one.
//!
//! # Architecture
//!
//! - **Documents**: markdown + YAML front matter, one file per document
//! - **Index**: SQLite (WAL) with three tables: `entities`, `aliases`, `refs`
//! - **Resolution**: case-insensitive alias lookup to canonical entities
//! - **Transport**: CLI, and a read-only MCP server over stdio
//!
//! # Modules
//!
//! - [`config`]: configuration loading from TOML files and environment variables
//! - [`db`]: SQLite initialization, schema, migrations, and health checks
//! - [`archive`]: document identifiers, front matter, and the document store
//! - [`index`]: entity index, alias resolver, rebuild engine, and query layer
//! - [`ingest`]: incremental write path from document store to index
//! - [`error`]: the error type shared by index and store operations

pub mod archive;
pub mod config;
pub mod db;
pub mod error;
pub mod index;
pub mod ingest;
