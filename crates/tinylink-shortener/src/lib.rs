//! The tinylink short-code registry.
//!
//! [`Registry`] owns the record set and implements
//! [`Shortener`](tinylink_core::Shortener) on top of an injected
//! [`Store`](tinylink_core::Store), [`Generator`](tinylink_generator::Generator)
//! and [`Clock`](tinylink_core::Clock). Core types are re-exported from
//! `tinylink_core`.

pub mod registry;

pub use registry::{Registry, RegistrySettings};
pub use tinylink_core::{
    Created, Resolution, ShortCode, ShortLinkRecord, ShortenRequest, Shortener, ShortenerError,
    StorageError, Summary, ValidationError,
};
