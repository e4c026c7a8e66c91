//! Core types and traits for the tinylink short-code registry.
//!
//! This crate holds the domain model shared by the generator, the storage
//! adapters and the registry itself: short codes, link records, the clock
//! abstraction, the persistence contract and the error taxonomy.

pub mod clock;
pub mod error;
pub mod record;
pub mod shortcode;
pub mod shortener;
pub mod store;
pub mod summary;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ShortenerError, StorageError, ValidationError, ValidationErrors};
pub use record::{LinkId, ShortLinkRecord};
pub use shortcode::ShortCode;
pub use shortener::{Created, Resolution, ShortenRequest, Shortener, Validity};
pub use store::Store;
pub use summary::Summary;
