use crate::record::ShortLinkRecord;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Aggregate counts over a record set at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub active: usize,
    pub expired: usize,
}

impl Summary {
    /// Partitions `records` by liveness at `now`.
    ///
    /// Every record is judged against the same `now`, so
    /// `total == active + expired` always holds.
    pub fn of<'a, I>(records: I, now: Timestamp) -> Self
    where
        I: IntoIterator<Item = &'a ShortLinkRecord>,
    {
        records
            .into_iter()
            .fold(Self::default(), |mut summary, record| {
                summary.total += 1;
                if record.is_expired_at(now) {
                    summary.expired += 1;
                } else {
                    summary.active += 1;
                }
                summary
            })
    }
}
