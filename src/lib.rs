//! In-memory engine for the penguin measurement table.
//!
//! A [`Dataset`] of raw text rows is interpreted through a fixed [`Schema`];
//! the operations in [`data`] filter, summarise, sort and augment it, and
//! [`command::Session`] drives them from tokenised commands.

pub mod command;
pub mod data;
pub mod error;

pub use command::{Command, Outcome, Session};
pub use data::model::{Column, ColumnKind, Dataset, Row, Schema};
pub use error::{EngineError, Result};
