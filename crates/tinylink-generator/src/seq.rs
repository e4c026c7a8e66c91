use crate::{Generator, ALPHABET};
use std::sync::atomic::{AtomicU64, Ordering};
use tinylink_core::shortcode::GENERATED_LENGTH;
use tinylink_core::ShortCode;

/// Number of distinct six-character codes over [`ALPHABET`].
pub const CODE_SPACE: u64 = 62u64.pow(GENERATED_LENGTH as u32);

/// A deterministic generator walking the code space in order.
///
/// The counter is rendered in base 62 over [`ALPHABET`], most significant
/// digit first, so counter 0 is `aaaaaa` and counter 1 is `aaaaab`. The
/// counter wraps after [`CODE_SPACE`] codes.
///
/// Codes it hands out are unique within one instance until it wraps, but a
/// registry reopened from disk starts from the same offset again; collisions
/// with loaded codes are resolved by the registry's retry loop.
#[derive(Debug)]
pub struct SeqGenerator {
    counter: AtomicU64,
}

impl Clone for SeqGenerator {
    fn clone(&self) -> Self {
        Self {
            counter: AtomicU64::new(self.counter.load(Ordering::SeqCst)),
        }
    }
}

impl SeqGenerator {
    pub fn new() -> Self {
        Self::with_offset(0)
    }

    /// Creates a generator starting from a specific counter value.
    ///
    /// Useful for resuming from a known state or distributing
    /// counter ranges across nodes.
    pub fn with_offset(offset: u64) -> Self {
        Self {
            counter: AtomicU64::new(offset),
        }
    }

    fn encode(mut value: u64) -> String {
        let mut buf = [ALPHABET[0]; GENERATED_LENGTH];
        for slot in buf.iter_mut().rev() {
            *slot = ALPHABET[(value % 62) as usize];
            value /= 62;
        }
        buf.iter().map(|&b| b as char).collect()
    }
}

impl Default for SeqGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for SeqGenerator {
    fn generate(&self) -> ShortCode {
        let count = self.counter.fetch_add(1, Ordering::SeqCst);
        ShortCode::new_unchecked(Self::encode(count % CODE_SPACE))
    }
}
