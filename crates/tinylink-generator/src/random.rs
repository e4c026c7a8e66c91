use crate::{Generator, ALPHABET};
use rand::Rng;
use tinylink_core::shortcode::GENERATED_LENGTH;
use tinylink_core::ShortCode;

/// Draws each character uniformly from [`ALPHABET`] using the thread-local
/// RNG.
///
/// Codes are identifiers, not secrets, so no cryptographic guarantees are
/// made. With 62^6 possible codes collisions are rare but not impossible;
/// the registry retries when one happens.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomGenerator;

impl RandomGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for RandomGenerator {
    fn generate(&self) -> ShortCode {
        let mut rng = rand::rng();
        let code: String = (0..GENERATED_LENGTH)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect();
        ShortCode::new_unchecked(code)
    }
}
