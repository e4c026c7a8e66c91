use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use tinylink_core::{
    Clock, Created, Resolution, ShortCode, ShortLinkRecord, ShortenRequest, Shortener,
    ShortenerError, StorageError, Store, Summary, ValidationError, ValidationErrors,
};
use tinylink_generator::Generator;
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};
use typed_builder::TypedBuilder;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 16;

/// Tuning knobs for a [`Registry`].
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct RegistrySettings {
    /// How many generated candidates to try before giving up with
    /// [`ShortenerError::CodeSpaceExhausted`].
    #[builder(default = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// The short-code registry.
///
/// Owns every [`ShortLinkRecord`] keyed by its short code and handles:
/// - validation of create requests, reporting all problems at once
/// - short code generation with bounded retry on collision
/// - liveness classification against the injected clock
/// - flushing the full record set to the store after each create
///
/// Creates hold the write lock from the uniqueness check through the insert,
/// so two creates can never claim the same code. Lookups only take the read
/// lock. Flushes are serialized separately and always write the newest
/// snapshot, so a slow flush can never overwrite a newer one.
///
/// Codes are never released: an expired record keeps its code reserved.
///
/// Share one instance per process, e.g. behind an `Arc`.
pub struct Registry<S, G, C> {
    records: RwLock<HashMap<ShortCode, ShortLinkRecord>>,
    flush_lock: Mutex<()>,
    store: S,
    generator: G,
    clock: C,
    settings: RegistrySettings,
}

impl<S: Store, G: Generator, C: Clock> Registry<S, G, C> {
    /// Opens a registry, loading whatever `store` already holds.
    ///
    /// Fails if the store cannot be read or holds the same code twice.
    pub async fn open(
        store: S,
        generator: G,
        clock: C,
        settings: RegistrySettings,
    ) -> Result<Self, StorageError> {
        let loaded = store.load().await?;

        let mut records = HashMap::with_capacity(loaded.len());
        for record in loaded {
            let code = record.short_code().clone();
            if records.insert(code.clone(), record).is_some() {
                return Err(StorageError::InvalidData(format!(
                    "short code stored more than once: {code}"
                )));
            }
        }

        info!(count = records.len(), "opened short link registry");

        Ok(Self {
            records: RwLock::new(records),
            flush_lock: Mutex::new(()),
            store,
            generator,
            clock,
            settings,
        })
    }

    /// Number of registered records, expired ones included.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// The registry's notion of the current time.
    pub fn now(&self) -> jiff::Timestamp {
        self.clock.now()
    }

    /// Validates `request` against the current record set and inserts the
    /// resulting record. Must run under the write lock.
    fn insert(
        &self,
        records: &mut HashMap<ShortCode, ShortLinkRecord>,
        request: &ShortenRequest,
    ) -> Result<ShortLinkRecord, ShortenerError> {
        let checked = request.check(|code| records.contains_key(code))?;

        let code = match checked.custom_code {
            Some(code) => code,
            None => self.unused_code(records)?,
        };

        let created_at = self.clock.now();
        let record = checked
            .validity
            .expiry_from(created_at)
            .and_then(|expires_at| {
                ShortLinkRecord::new(code.clone(), checked.original_url, created_at, expires_at)
            })
            .ok_or_else(|| {
                ValidationErrors::single(ValidationError::InvalidValidity(
                    checked.validity.minutes(),
                ))
            })?;

        records.insert(code, record.clone());
        Ok(record)
    }

    /// Draws candidates until one is not in `records`.
    fn unused_code(
        &self,
        records: &HashMap<ShortCode, ShortLinkRecord>,
    ) -> Result<ShortCode, ShortenerError> {
        let attempts = self.settings.max_attempts;

        for attempt in 1..=attempts {
            let candidate = self.generator.generate();
            if !records.contains_key(&candidate) {
                return Ok(candidate);
            }
            trace!(code = %candidate, attempt, "generated short code is taken, retrying");
        }

        warn!(attempts, "no unused short code found");
        Err(ShortenerError::CodeSpaceExhausted { attempts })
    }

    /// Saves the current record set.
    ///
    /// The snapshot is taken after acquiring the flush lock, so whichever
    /// flush runs last writes every record inserted before it.
    async fn flush(&self) -> Result<(), StorageError> {
        let _guard = self.flush_lock.lock().await;
        let snapshot = self.records();

        let result = self.store.save(&snapshot).await;
        if let Err(err) = &result {
            warn!(error = %err, count = snapshot.len(), "failed to flush short links");
        }
        result
    }
}

#[async_trait]
impl<S: Store, G: Generator, C: Clock> Shortener for Registry<S, G, C> {
    async fn create(&self, request: ShortenRequest) -> Result<Created, ShortenerError> {
        let record = {
            let mut records = self.records.write();
            self.insert(&mut records, &request)?
        };

        info!(
            code = %record.short_code(),
            url = %record.original_url(),
            expires_at = %record.expires_at(),
            "created short link"
        );

        let flush = self.flush().await;
        Ok(Created { record, flush })
    }

    fn resolve(&self, code: &str) -> Resolution {
        let record = self.records.read().get(code).cloned();
        let resolution = Resolution::at(record, self.clock.now());

        match &resolution {
            Resolution::Active(record) => {
                debug!(code, url = %record.original_url(), "resolved short code")
            }
            Resolution::Expired(record) => {
                debug!(code, expires_at = %record.expires_at(), "short code has expired")
            }
            Resolution::NotFound => trace!(code, "short code not found"),
        }

        resolution
    }

    fn exists(&self, code: &str) -> bool {
        self.records.read().contains_key(code)
    }

    fn records(&self) -> Vec<ShortLinkRecord> {
        let mut records: Vec<_> = self.records.read().values().cloned().collect();
        records.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| a.short_code().cmp(b.short_code()))
        });
        records
    }

    fn summarize(&self) -> Summary {
        let records = self.records.read();
        Summary::of(records.values(), self.clock.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::{SignedDuration, Timestamp};
    use tinylink_core::ManualClock;
    use tinylink_generator::SeqGenerator;
    use tinylink_storage::InMemoryStore;

    /// Always proposes the same code.
    struct FixedGenerator(&'static str);

    impl Generator for FixedGenerator {
        fn generate(&self) -> ShortCode {
            ShortCode::new_unchecked(self.0)
        }
    }

    fn t0() -> Timestamp {
        Timestamp::from_second(1_700_000_000).unwrap()
    }

    fn stored(code: &str, url: &str) -> ShortLinkRecord {
        ShortLinkRecord::new(
            ShortCode::new(code).unwrap(),
            url,
            t0(),
            t0() + SignedDuration::from_mins(30),
        )
        .unwrap()
    }

    async fn registry_with<G: Generator>(
        store: InMemoryStore,
        generator: G,
    ) -> (Registry<InMemoryStore, G, ManualClock>, ManualClock) {
        let clock = ManualClock::new(t0());
        let registry = Registry::open(store, generator, clock.clone(), RegistrySettings::default())
            .await
            .unwrap();
        (registry, clock)
    }

    async fn test_registry() -> (
        Registry<InMemoryStore, SeqGenerator, ManualClock>,
        ManualClock,
        InMemoryStore,
    ) {
        let store = InMemoryStore::new();
        let (registry, clock) = registry_with(store.clone(), SeqGenerator::new()).await;
        (registry, clock, store)
    }

    #[tokio::test]
    async fn create_with_generated_code() {
        let (registry, _, store) = test_registry().await;

        let created = registry
            .create(ShortenRequest::new("https://example.com"))
            .await
            .unwrap();

        assert!(created.flush.is_ok());
        assert_eq!(created.record.short_code().as_str(), "aaaaaa");
        assert_eq!(created.record.original_url(), "https://example.com");
        assert_eq!(created.record.created_at(), t0());
        assert_eq!(
            created.record.expires_at(),
            t0() + SignedDuration::from_mins(30)
        );
        assert_eq!(store.records(), vec![created.record]);
    }

    #[tokio::test]
    async fn create_with_custom_code() {
        let (registry, _, _) = test_registry().await;

        let created = registry
            .create(
                ShortenRequest::new("https://example.com")
                    .with_custom_code("abc")
                    .with_validity_minutes(30),
            )
            .await
            .unwrap();

        assert_eq!(created.record.short_code().as_str(), "abc");
        assert_eq!(
            created.record.expires_at(),
            t0() + SignedDuration::from_mins(30)
        );
    }

    #[tokio::test]
    async fn duplicate_custom_code_fails() {
        let (registry, _, store) = test_registry().await;

        registry
            .create(
                ShortenRequest::new("https://example.com")
                    .with_custom_code("abc")
                    .with_validity_minutes(30),
            )
            .await
            .unwrap();

        let err = registry
            .create(
                ShortenRequest::new("https://x.com")
                    .with_custom_code("abc")
                    .with_validity_minutes(10),
            )
            .await
            .unwrap_err();

        assert_eq!(
            err.validation_errors(),
            &[ValidationError::CodeAlreadyExists("abc".to_string())]
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn invalid_url_fails() {
        let (registry, _, _) = test_registry().await;

        let err = registry
            .create(ShortenRequest::new("not-a-url").with_validity_minutes(30))
            .await
            .unwrap_err();

        let errors = err.validation_errors();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ValidationError::InvalidUrl { .. }));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn zero_validity_fails() {
        let (registry, _, store) = test_registry().await;

        let err = registry
            .create(ShortenRequest::new("https://a.com").with_validity_minutes(0))
            .await
            .unwrap_err();

        assert_eq!(
            err.validation_errors(),
            &[ValidationError::InvalidValidity(0)]
        );
        assert!(registry.is_empty());
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn all_problems_reported_together() {
        let (registry, _, _) = test_registry().await;
        registry
            .create(ShortenRequest::new("https://example.com").with_custom_code("abc"))
            .await
            .unwrap();

        let err = registry
            .create(
                ShortenRequest::new("not-a-url")
                    .with_custom_code("abc")
                    .with_validity_minutes(10_081),
            )
            .await
            .unwrap_err();

        let errors = err.validation_errors();
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], ValidationError::InvalidUrl { .. }));
        assert_eq!(
            errors[1],
            ValidationError::CodeAlreadyExists("abc".to_string())
        );
        assert_eq!(errors[2], ValidationError::InvalidValidity(10_081));
    }

    #[tokio::test]
    async fn malformed_custom_code_reports_format_and_length() {
        let (registry, _, _) = test_registry().await;

        let err = registry
            .create(ShortenRequest::new("https://example.com").with_custom_code("a-"))
            .await
            .unwrap_err();

        assert_eq!(
            err.validation_errors(),
            &[
                ValidationError::InvalidCodeFormat("a-".to_string()),
                ValidationError::InvalidCodeLength(2),
            ]
        );
    }

    #[tokio::test]
    async fn resolve_active_expired_and_missing() {
        let (registry, clock, _) = test_registry().await;
        registry
            .create(
                ShortenRequest::new("https://example.com")
                    .with_custom_code("abc")
                    .with_validity_minutes(1),
            )
            .await
            .unwrap();

        let resolution = registry.resolve("abc");
        assert!(resolution.is_active());
        assert_eq!(resolution.redirect_url(), Some("https://example.com"));

        // still active at exactly expires_at
        clock.advance(SignedDuration::from_mins(1));
        assert!(registry.resolve("abc").is_active());

        clock.advance(SignedDuration::from_nanos(1));
        match registry.resolve("abc") {
            Resolution::Expired(record) => assert_eq!(record.original_url(), "https://example.com"),
            other => panic!("expected expired, got {other:?}"),
        }

        assert_eq!(registry.resolve("nonexistent"), Resolution::NotFound);
        assert_eq!(registry.resolve("not a code!"), Resolution::NotFound);
    }

    #[tokio::test]
    async fn expired_codes_stay_reserved() {
        let (registry, clock, _) = test_registry().await;
        registry
            .create(
                ShortenRequest::new("https://example.com")
                    .with_custom_code("abc")
                    .with_validity_minutes(5),
            )
            .await
            .unwrap();

        clock.advance(SignedDuration::from_hours(1));
        assert!(registry.exists("abc"));

        let err = registry
            .create(ShortenRequest::new("https://other.com").with_custom_code("abc"))
            .await
            .unwrap_err();
        assert_eq!(
            err.validation_errors(),
            &[ValidationError::CodeAlreadyExists("abc".to_string())]
        );
    }

    #[tokio::test]
    async fn exists_checks() {
        let (registry, _, _) = test_registry().await;
        assert!(!registry.exists("abc"));

        registry
            .create(ShortenRequest::new("https://example.com").with_custom_code("abc"))
            .await
            .unwrap();

        assert!(registry.exists("abc"));
        assert!(!registry.exists("ABC"));
    }

    #[tokio::test]
    async fn generated_code_skips_taken_codes() {
        let store = InMemoryStore::with_records(vec![
            stored("aaaaaa", "https://one.example"),
            stored("aaaaab", "https://two.example"),
        ]);
        let (registry, _) = registry_with(store, SeqGenerator::new()).await;

        let created = registry
            .create(ShortenRequest::new("https://three.example"))
            .await
            .unwrap();

        assert_eq!(created.record.short_code().as_str(), "aaaaac");
    }

    #[tokio::test]
    async fn retry_bound_yields_code_space_exhausted() {
        let store = InMemoryStore::with_records(vec![stored("aaaaaa", "https://one.example")]);
        let clock = ManualClock::new(t0());
        let registry = Registry::open(
            store.clone(),
            FixedGenerator("aaaaaa"),
            clock,
            RegistrySettings::builder().max_attempts(3).build(),
        )
        .await
        .unwrap();

        let err = registry
            .create(ShortenRequest::new("https://two.example"))
            .await
            .unwrap_err();

        assert_eq!(err, ShortenerError::CodeSpaceExhausted { attempts: 3 });
        assert_eq!(registry.len(), 1);
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn failed_flush_does_not_fail_create() {
        let (registry, _, store) = test_registry().await;
        store.set_failing(true);

        let created = registry
            .create(ShortenRequest::new("https://example.com").with_custom_code("abc"))
            .await
            .unwrap();

        assert!(matches!(created.flush, Err(StorageError::Unavailable(_))));
        assert!(registry.resolve("abc").is_active());

        // the next successful flush catches up
        store.set_failing(false);
        registry
            .create(ShortenRequest::new("https://example.com").with_custom_code("def"))
            .await
            .unwrap();
        assert_eq!(store.records().len(), 2);
    }

    #[tokio::test]
    async fn open_loads_prior_state() {
        let store = InMemoryStore::with_records(vec![stored("abc", "https://example.com")]);
        let (registry, _) = registry_with(store, SeqGenerator::new()).await;

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.resolve("abc").redirect_url(),
            Some("https://example.com")
        );
    }

    #[tokio::test]
    async fn open_rejects_duplicate_codes() {
        let store = InMemoryStore::with_records(vec![
            stored("abc", "https://one.example"),
            stored("abc", "https://two.example"),
        ]);

        let result = Registry::open(
            store,
            SeqGenerator::new(),
            ManualClock::new(t0()),
            RegistrySettings::default(),
        )
        .await;

        assert!(matches!(result, Err(StorageError::InvalidData(_))));
    }

    #[tokio::test]
    async fn summarize_counts_by_liveness() {
        let (registry, clock, _) = test_registry().await;

        for minutes in [1, 2, 3, 60, 120] {
            registry
                .create(ShortenRequest::new("https://example.com").with_validity_minutes(minutes))
                .await
                .unwrap();
        }

        assert_eq!(
            registry.summarize(),
            Summary {
                total: 5,
                active: 5,
                expired: 0,
            }
        );

        clock.advance(SignedDuration::from_mins(10));
        assert_eq!(
            registry.summarize(),
            Summary {
                total: 5,
                active: 2,
                expired: 3,
            }
        );
    }

    #[tokio::test]
    async fn records_are_newest_first() {
        let (registry, clock, _) = test_registry().await;

        for code in ["first", "second", "third"] {
            registry
                .create(ShortenRequest::new("https://example.com").with_custom_code(code))
                .await
                .unwrap();
            clock.advance(SignedDuration::from_secs(1));
        }

        let codes: Vec<_> = registry
            .records()
            .iter()
            .map(|r| r.short_code().to_string())
            .collect();
        assert_eq!(codes, ["third", "second", "first"]);
    }

    #[tokio::test]
    async fn registry_is_usable_as_trait_object() {
        let (registry, _, _) = test_registry().await;
        let shortener: &dyn Shortener = &registry;

        let created = shortener
            .create(ShortenRequest::new("https://example.com"))
            .await
            .unwrap();
        assert!(shortener.exists(created.record.short_code().as_str()));
    }
}
