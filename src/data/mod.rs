//! Data layer: schema, table operations, and file collaborators.
//!
//! Architecture:
//! ```text
//!  .csv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → Dataset (raw text cells)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────────┐
//!   │ model         │  Schema (name → position, kind), Dataset
//!   └──────────────┘
//!        │
//!        ├──────────────┬──────────────┬──────────────┐
//!        ▼              ▼              ▼              ▼
//!   ┌─────────┐   ┌──────────┐   ┌─────────┐   ┌──────────┐
//!   │ filter  │   │ summary  │   │  sort   │   │ augment  │
//!   └─────────┘   └──────────┘   └─────────┘   └──────────┘
//!    matching      describe,      stable        duplicate /
//!    rows          unique, chart  merge sort    synthesise
//!                  series
//! ```

pub mod augment;
pub mod filter;
pub mod loader;
pub mod model;
pub mod sort;
pub mod summary;
