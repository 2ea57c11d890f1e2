//! Data type lattice for schema inference
//!
//! Destinations evolve their tables additively: a column that has seen both
//! integers and floats is widened to float, anything mixed with a string is
//! widened to string. This crate defines the type set, convertibility rules
//! and common-ancestor resolution that drive those decisions.
//!
//! # Lattice
//!
//! ```text
//!          STRING
//!         /      \
//!    FLOAT64   TIMESTAMP
//!       |
//!     INT64
//! ```
//!
//! `UNKNOWN` sits below everything and is convertible to any type.

mod datatype;

pub use datatype::{
    DataType, TypingError, common_ancestor, is_convertible, reformat_value,
};
