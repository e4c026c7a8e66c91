use jiff::{SignedDuration, Timestamp};
use tinylink_core::{ShortCode, ShortLinkRecord};
use tinylink_storage::{JsonFileStore, StorageError, Store};

struct Fixture {
    _dir: tempfile::TempDir,
    store: JsonFileStore,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = JsonFileStore::new(dir.path().join("links.json"));
        Self { _dir: dir, store }
    }
}

fn record(code: &str, url: &str, created_at: Timestamp, minutes: i64) -> ShortLinkRecord {
    ShortLinkRecord::new(
        ShortCode::new(code).unwrap(),
        url,
        created_at,
        created_at + SignedDuration::from_mins(minutes),
    )
    .unwrap()
}

#[tokio::test]
async fn round_trip_preserves_every_field() {
    let fixture = Fixture::new();
    let base = Timestamp::from_nanosecond(1_700_000_000_123_456_789).unwrap();
    let records = vec![
        record("abc", "https://example.com", base, 30),
        record("Zz9Zz9", "https://example.com/a?b=c#d", base, 10_080),
        record("x".repeat(20).as_str(), "mailto:someone@example.com", base, 1),
    ];

    fixture.store.save(&records).await.unwrap();
    let loaded = fixture.store.load().await.unwrap();

    assert_eq!(loaded, records);
    for (loaded, original) in loaded.iter().zip(&records) {
        assert_eq!(loaded.id(), original.id());
        assert_eq!(loaded.created_at(), original.created_at());
        assert_eq!(loaded.expires_at(), original.expires_at());
    }
}

#[tokio::test]
async fn save_of_load_reproduces_file() {
    let fixture = Fixture::new();
    let base = Timestamp::from_second(1_700_000_000).unwrap();
    fixture
        .store
        .save(&[
            record("first1", "https://one.example", base, 5),
            record("second", "https://two.example", base, 60),
        ])
        .await
        .unwrap();
    let before = std::fs::read_to_string(fixture.store.path()).unwrap();

    let loaded = fixture.store.load().await.unwrap();
    fixture.store.save(&loaded).await.unwrap();

    let after = std::fs::read_to_string(fixture.store.path()).unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn later_save_replaces_earlier_one() {
    let fixture = Fixture::new();
    let base = Timestamp::from_second(1_700_000_000).unwrap();

    fixture
        .store
        .save(&[record("first1", "https://one.example", base, 5)])
        .await
        .unwrap();
    let replacement = vec![record("second", "https://two.example", base, 5)];
    fixture.store.save(&replacement).await.unwrap();

    assert_eq!(fixture.store.load().await.unwrap(), replacement);
}

#[tokio::test]
async fn inverted_window_in_file_is_rejected() {
    let fixture = Fixture::new();
    std::fs::write(
        fixture.store.path(),
        r#"[{
            "id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "original_url": "https://example.com",
            "short_code": "abc123",
            "created_at": "2024-01-01T00:30:00Z",
            "expires_at": "2024-01-01T00:30:00Z"
        }]"#,
    )
    .unwrap();

    let err = fixture.store.load().await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidData(_)));
}

#[tokio::test]
async fn unreadable_path_is_io_error() {
    let fixture = Fixture::new();
    // a directory where the file should be
    std::fs::create_dir(fixture.store.path()).unwrap();

    let err = fixture.store.load().await.unwrap_err();
    assert!(matches!(err, StorageError::Io(_)));
}
