//! Core DTD scanning primitives
//!
//! - Scanner: byte scanner with push-back frames for parameter entities
//! - Entities: parameter-entity table and character-reference literals
//! - Encoding: UTF-16 detection and conversion to UTF-8
//! - Error: the crate error type

pub mod encoding;
pub mod entities;
pub mod error;
pub mod scanner;

pub use error::{DtdError, Result};
