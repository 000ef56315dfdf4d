//! Core types for the docload workload generator.
//!
//! This crate defines the data model shared by every other docload crate:
//!
//! - [`CollectionName`] - validated collection identifier
//! - [`IdLong`] / [`ObjectId`] - numeric generation ids and the 12-byte
//!   storage identity they hash to
//! - [`Value`] / [`Document`] - generated document content

pub mod collection;
pub mod document;
pub mod id;
pub mod values;

pub use collection::{CollectionName, CollectionNameError};
pub use document::{Document, DocumentError, ID_FIELD};
pub use id::{IdLong, ObjectId};
pub use values::Value;
