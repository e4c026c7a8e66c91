use crate::error::StorageError;
use crate::record::ShortLinkRecord;
use async_trait::async_trait;

/// Result type for persistence operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Durable home for the full record set.
///
/// The registry loads from a store once when it opens and saves the whole
/// set after every successful create. Stores never see partial updates.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Loads every stored record.
    ///
    /// Returns an empty set when nothing has been stored yet.
    async fn load(&self) -> Result<Vec<ShortLinkRecord>>;

    /// Replaces the stored set with `records`.
    async fn save(&self, records: &[ShortLinkRecord]) -> Result<()>;
}
