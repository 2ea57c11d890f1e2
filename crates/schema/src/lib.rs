//! Schema model consumed by destination drivers
//!
//! A [`Table`] is a named set of [`Columns`] plus an optional primary key.
//! Columns accumulate every data type they have been observed with; the
//! effective type is the lazily-resolved common ancestor of those
//! occurrences. [`Table::diff`] computes the strictly-additive change set a
//! driver needs to apply (`CREATE TABLE IF NOT EXISTS` / `ALTER ADD COLUMN`
//! / recreate the PK constraint) — never a destructive rewrite.

mod processor;
mod table;

pub use processor::infer_table;
pub use table::{Column, Columns, SchemaError, Table};
