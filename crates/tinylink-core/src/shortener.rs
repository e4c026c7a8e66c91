use crate::error::{ShortenerError, StorageError, ValidationError, ValidationErrors};
use crate::record::ShortLinkRecord;
use crate::shortcode::ShortCode;
use crate::summary::Summary;
use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};

pub const MIN_VALIDITY_MINUTES: i64 = 1;
/// One week.
pub const MAX_VALIDITY_MINUTES: i64 = 10_080;
pub const DEFAULT_VALIDITY_MINUTES: i64 = 30;

/// How long a short code keeps resolving after it is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Validity(i64);

impl Validity {
    /// Accepts whole minutes in `[1, 10080]`.
    pub fn from_minutes(minutes: i64) -> Result<Self, ValidationError> {
        if (MIN_VALIDITY_MINUTES..=MAX_VALIDITY_MINUTES).contains(&minutes) {
            Ok(Self(minutes))
        } else {
            Err(ValidationError::InvalidValidity(minutes))
        }
    }

    pub fn minutes(self) -> i64 {
        self.0
    }

    pub fn as_duration(self) -> SignedDuration {
        SignedDuration::from_mins(self.0)
    }

    /// The instant a window opened at `start` closes, `None` if it would
    /// fall past the largest representable timestamp.
    pub fn expiry_from(self, start: Timestamp) -> Option<Timestamp> {
        start.checked_add(self.as_duration()).ok()
    }
}

impl Default for Validity {
    fn default() -> Self {
        Self(DEFAULT_VALIDITY_MINUTES)
    }
}

/// Parameters for creating a shortened URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortenRequest {
    /// The original URL to be shortened.
    pub original_url: String,
    /// Optional caller-chosen short code. An empty string counts as absent.
    pub custom_code: Option<String>,
    /// How many minutes the short code stays active.
    pub validity_minutes: i64,
}

/// A request whose stateless checks all passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedRequest {
    pub original_url: String,
    pub custom_code: Option<ShortCode>,
    pub validity: Validity,
}

impl ShortenRequest {
    /// A request for `original_url` with a generated code and the default
    /// validity of 30 minutes.
    pub fn new(original_url: impl Into<String>) -> Self {
        Self {
            original_url: original_url.into(),
            custom_code: None,
            validity_minutes: DEFAULT_VALIDITY_MINUTES,
        }
    }

    pub fn with_custom_code(mut self, code: impl Into<String>) -> Self {
        self.custom_code = Some(code.into());
        self
    }

    pub fn with_validity_minutes(mut self, minutes: i64) -> Self {
        self.validity_minutes = minutes;
        self
    }

    /// The custom code, if one was actually supplied.
    pub fn custom_code(&self) -> Option<&str> {
        self.custom_code.as_deref().filter(|code| !code.is_empty())
    }

    /// Runs every check on the request, collecting all problems in the order
    /// url, code format, code length, code uniqueness, validity.
    ///
    /// `is_taken` decides whether a well-formed custom code is already
    /// registered. Callers must hold the lock guarding their record set
    /// until the checked request is inserted.
    pub fn check(
        &self,
        is_taken: impl Fn(&ShortCode) -> bool,
    ) -> Result<CheckedRequest, ValidationErrors> {
        let mut errors = Vec::new();

        if let Err(e) = validate_url(&self.original_url) {
            errors.push(e);
        }

        let custom_code = match self.custom_code() {
            Some(code) => match ShortCode::new(code) {
                Ok(code) if is_taken(&code) => {
                    errors.push(ValidationError::CodeAlreadyExists(code.to_string()));
                    None
                }
                Ok(code) => Some(code),
                Err(invalid) => {
                    errors.extend(invalid.into_vec());
                    None
                }
            },
            None => None,
        };

        let validity = match Validity::from_minutes(self.validity_minutes) {
            Ok(validity) => Some(validity),
            Err(e) => {
                errors.push(e);
                None
            }
        };

        match (ValidationErrors::from_vec(errors), validity) {
            (None, Some(validity)) => Ok(CheckedRequest {
                original_url: self.original_url.clone(),
                custom_code,
                validity,
            }),
            (Some(errors), _) => Err(errors),
            // validity is only `None` after pushing an error
            (None, None) => Err(ValidationErrors::single(
                ValidationError::InvalidValidity(self.validity_minutes),
            )),
        }
    }
}

/// Checks that `url` is a syntactically well-formed absolute URL.
pub fn validate_url(url: &str) -> Result<(), ValidationError> {
    if url.is_empty() {
        return Err(ValidationError::InvalidUrl {
            url: String::new(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    url::Url::parse(url)
        .map(|_| ())
        .map_err(|e| ValidationError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })
}

/// The outcome of looking up a short code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The code exists and its validity window has not elapsed.
    Active(ShortLinkRecord),
    /// The code exists but can no longer be used for redirects.
    Expired(ShortLinkRecord),
    /// No record was ever registered under the code.
    NotFound,
}

impl Resolution {
    /// Classifies a looked-up record against `now`.
    pub fn at(record: Option<ShortLinkRecord>, now: Timestamp) -> Self {
        match record {
            Some(record) if record.is_expired_at(now) => Self::Expired(record),
            Some(record) => Self::Active(record),
            None => Self::NotFound,
        }
    }

    /// The destination to redirect to, only while the code is active.
    pub fn redirect_url(&self) -> Option<&str> {
        match self {
            Self::Active(record) => Some(record.original_url()),
            Self::Expired(_) | Self::NotFound => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }
}

/// A successfully registered short link.
#[derive(Debug)]
pub struct Created {
    /// The record as inserted.
    pub record: ShortLinkRecord,
    /// Whether the record set reached durable storage.
    ///
    /// A failed flush does not undo the create; the record stays registered
    /// in memory and the caller decides how loudly to report it.
    pub flush: Result<(), StorageError>,
}

/// The operations a short-code registry offers its callers.
#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Registers a new short link.
    ///
    /// Every validation problem is reported at once in
    /// [`ShortenerError::Invalid`].
    async fn create(&self, request: ShortenRequest) -> Result<Created, ShortenerError>;

    /// Looks up `code` and classifies it against the current time.
    fn resolve(&self, code: &str) -> Resolution;

    /// Whether `code` was ever registered, expired or not.
    fn exists(&self, code: &str) -> bool;

    /// A snapshot of every record, newest first.
    fn records(&self) -> Vec<ShortLinkRecord>;

    /// Counts records by liveness at a single instant.
    fn summarize(&self) -> Summary;
}
