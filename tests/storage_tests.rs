use catchpedia::{
    models::{Article, PendingArticle, PendingStatus, User},
    storage::{Catalog, JsonFileStorage, MemoryStorage, StorageError, StorageService},
};
use chrono::Utc;
use uuid::Uuid;

fn sample_catalog() -> Catalog {
    let now = Utc::now();
    Catalog {
        users: vec![User {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            display_name: Some("Angler".into()),
            password_hash: "$argon2id$v=19$placeholder".into(),
            created_at: now,
        }],
        articles: vec![Article {
            id: "bass-basics".into(),
            title: "Bass Basics".into(),
            category: "fish".into(),
            subcategory: "bass".into(),
            content: "<p>Largemouth.</p>".into(),
            tags: vec!["bass".into(), "beginner".into()],
            created_at: now,
            updated_at: now,
        }],
        pending_articles: vec![PendingArticle {
            id: "pike-tips-1700000000000".into(),
            title: "Pike Tips".into(),
            category: "fish".into(),
            author_name: "Angler".into(),
            author_email: "a@x.com".into(),
            submitted_at: now,
            status: PendingStatus::Pending,
            ..Default::default()
        }],
    }
}

#[cfg(test)]
mod file_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_loads_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("catalog.json"));

        let catalog = storage.load().await.unwrap();

        assert_eq!(catalog, Catalog::default());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("catalog.json"));
        let catalog = sample_catalog();

        storage.save(&catalog).await.unwrap();
        let loaded = storage.load().await.unwrap();

        assert_eq!(loaded, catalog);
    }

    #[tokio::test]
    async fn test_save_creates_parent_dirs_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data").join("catalog.json");
        let storage = JsonFileStorage::new(&path);

        storage.save(&sample_catalog()).await.unwrap();

        assert!(path.exists());
        let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("catalog.json")]);
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_document() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("catalog.json"));

        storage.save(&sample_catalog()).await.unwrap();
        storage.save(&Catalog::default()).await.unwrap();

        assert_eq!(storage.load().await.unwrap(), Catalog::default());
    }

    #[tokio::test]
    async fn test_leftover_temp_file_never_replaces_the_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let storage = JsonFileStorage::new(&path);
        let catalog = sample_catalog();
        storage.save(&catalog).await.unwrap();

        // A save cut short before its rename leaves only a partial temp file behind.
        let temp = dir.path().join("catalog.json.tmp");
        std::fs::write(&temp, "{ \"users\": [").unwrap();
        assert_eq!(storage.load().await.unwrap(), catalog);

        // The next save overwrites the leftover and commits a complete document.
        storage.save(&Catalog::default()).await.unwrap();
        assert!(!temp.exists());
        let raw = std::fs::read(&path).unwrap();
        let on_disk: Catalog = serde_json::from_slice(&raw).unwrap();
        assert_eq!(on_disk, Catalog::default());
    }

    #[tokio::test]
    async fn test_document_uses_camel_case_collections() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("catalog.json"));

        storage.save(&sample_catalog()).await.unwrap();
        let raw = std::fs::read_to_string(storage.path()).unwrap();

        assert!(raw.contains("\"pendingArticles\""));
        assert!(raw.contains("\"passwordHash\""));
        assert!(raw.contains("\"status\": \"pending\""));
    }

    #[tokio::test]
    async fn test_partial_document_fills_missing_collections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, r#"{"articles": []}"#).unwrap();

        let catalog = JsonFileStorage::new(&path).load().await.unwrap();

        assert!(catalog.users.is_empty());
        assert!(catalog.pending_articles.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_document_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = JsonFileStorage::new(&path).load().await;

        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }
}

#[cfg(test)]
mod memory_tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_save_then_load() {
        let storage = MemoryStorage::new();
        let catalog = sample_catalog();

        storage.save(&catalog).await.unwrap();

        assert_eq!(storage.load().await.unwrap(), catalog);
        assert_eq!(storage.snapshot().await, catalog);
    }

    #[tokio::test]
    async fn test_memory_with_catalog_is_preloaded() {
        let catalog = sample_catalog();
        let storage = MemoryStorage::with_catalog(catalog.clone());
        assert_eq!(storage.load().await.unwrap(), catalog);
    }

    #[tokio::test]
    async fn test_memory_failure() {
        let storage = MemoryStorage::new_failing();

        assert!(matches!(
            storage.load().await,
            Err(StorageError::Unavailable(msg)) if msg == "memory storage set to fail"
        ));
        assert!(storage.save(&sample_catalog()).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_previous_snapshot() {
        let storage = MemoryStorage::new();
        let catalog = sample_catalog();
        storage.save(&catalog).await.unwrap();

        storage.set_failing(true);
        assert!(storage.save(&Catalog::default()).await.is_err());
        storage.set_failing(false);

        assert_eq!(storage.snapshot().await, catalog);
    }
}
