use crate::{
    guess_content_type, LocalStorage, MemoryStorage, StorageBackend, StorageConfig, StorageError,
    StorageType,
};
use std::sync::Arc;
use tempfile::tempdir;

#[tokio::test]
async fn test_local_storage_store_and_retrieve() {
    let temp_dir = tempdir().unwrap();
    let storage = LocalStorage::new(temp_dir.path().to_path_buf());

    let test_data = b"\x89PNG fake image";
    let test_key = "cat.png";

    let info = storage.store(test_key, test_data, None).await.unwrap();
    assert_eq!(info.key, "cat.png");
    assert_eq!(info.size, test_data.len() as u64);
    assert_eq!(info.content_type, Some("image/png".to_string()));

    let retrieved = storage.retrieve(test_key).await.unwrap();
    assert_eq!(retrieved, test_data);

    assert!(storage.exists(test_key).await.unwrap());
    assert!(!storage.exists("dog.png").await.unwrap());
}

#[tokio::test]
async fn test_local_storage_overwrites_existing_key() {
    let temp_dir = tempdir().unwrap();
    let storage = LocalStorage::new(temp_dir.path().to_path_buf());

    storage.store("cat.png", b"first", None).await.unwrap();
    storage.store("cat.png", b"second", None).await.unwrap();

    assert_eq!(storage.retrieve("cat.png").await.unwrap(), b"second");
    assert_eq!(storage.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_local_storage_path_validation() {
    let temp_dir = tempdir().unwrap();
    let storage = LocalStorage::new(temp_dir.path().to_path_buf());

    let test_data = b"test";

    let result = storage.store("../outside.png", test_data, None).await;
    assert!(matches!(result, Err(StorageError::InvalidPath(_))));

    let result = storage.store("./test/../outside.png", test_data, None).await;
    assert!(matches!(result, Err(StorageError::InvalidPath(_))));

    let result = storage.store("", test_data, None).await;
    assert!(matches!(result, Err(StorageError::InvalidPath(_))));

    let result = storage.store("nested/photo.jpg", test_data, None).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_local_storage_allows_dots_inside_names() {
    let temp_dir = tempdir().unwrap();
    let storage = LocalStorage::new(temp_dir.path().to_path_buf());

    storage.store("a..b.png", b"dots", None).await.unwrap();
    storage.store("albums/holiday..beach.png", b"beach", None).await.unwrap();

    assert_eq!(storage.retrieve("a..b.png").await.unwrap(), b"dots");
    assert_eq!(
        storage.retrieve("albums/holiday..beach.png").await.unwrap(),
        b"beach"
    );

    for key in ["a/../b.png", "./b.png", "albums/.."] {
        let result = storage.store(key, b"x", None).await;
        assert!(
            matches!(result, Err(StorageError::InvalidPath(_))),
            "{} should be rejected",
            key
        );
    }
}

#[tokio::test]
async fn test_local_storage_missing_dotted_key_is_not_found() {
    let temp_dir = tempdir().unwrap();
    let storage = LocalStorage::new(temp_dir.path().to_path_buf());

    assert!(!storage.exists("ghost..png").await.unwrap());
    assert!(matches!(
        storage.retrieve("ghost..png").await,
        Err(StorageError::NotFound(_))
    ));
    assert!(matches!(
        storage.metadata("ghost..png").await,
        Err(StorageError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_local_storage_list_is_sorted_and_recursive() {
    let temp_dir = tempdir().unwrap();
    let storage = LocalStorage::new(temp_dir.path().to_path_buf());

    storage.store("zebra.gif", b"z", None).await.unwrap();
    storage.store("albums/beach.jpg", b"bb", None).await.unwrap();
    storage
        .store("apple_description.json", b"{}", Some("application/json"))
        .await
        .unwrap();

    let keys: Vec<String> = storage
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|info| info.key)
        .collect();

    assert_eq!(
        keys,
        vec!["albums/beach.jpg", "apple_description.json", "zebra.gif"]
    );
}

#[tokio::test]
async fn test_local_storage_list_missing_base_dir() {
    let temp_dir = tempdir().unwrap();
    let storage = LocalStorage::new(temp_dir.path().join("not-created-yet"));

    assert!(storage.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_local_storage_metadata() {
    let temp_dir = tempdir().unwrap();
    let storage = LocalStorage::new(temp_dir.path().to_path_buf());

    storage.store("photo.JPEG", b"1234", None).await.unwrap();

    let info = storage.metadata("photo.JPEG").await.unwrap();
    assert_eq!(info.size, 4);
    assert_eq!(info.content_type.as_deref(), Some("image/jpeg"));

    let missing = storage.metadata("nope.png").await;
    assert!(matches!(missing, Err(StorageError::NotFound(_))));
}

#[tokio::test]
async fn test_local_storage_retrieve_nonexistent() {
    let temp_dir = tempdir().unwrap();
    let storage = LocalStorage::new(temp_dir.path().to_path_buf());

    let result = storage.retrieve("nonexistent.png").await;
    assert!(result.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_memory_storage_keeps_declared_content_type() {
    let storage = MemoryStorage::new();

    storage
        .store("scan.png", b"not really a png", Some("image/x-custom"))
        .await
        .unwrap();
    storage.store("plain.gif", b"gif", None).await.unwrap();

    let info = storage.metadata("scan.png").await.unwrap();
    assert_eq!(info.content_type.as_deref(), Some("image/x-custom"));

    let info = storage.metadata("plain.gif").await.unwrap();
    assert_eq!(info.content_type.as_deref(), Some("image/gif"));
}

#[tokio::test]
async fn test_memory_storage_lists_in_key_order() {
    let storage = MemoryStorage::new();

    for key in ["b.png", "a.png", "a_description.json"] {
        storage.store(key, key.as_bytes(), None).await.unwrap();
    }

    let keys: Vec<String> = storage
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|info| info.key)
        .collect();
    assert_eq!(keys, vec!["a.png", "a_description.json", "b.png"]);
    assert_eq!(storage.len().await, 3);
}

#[tokio::test]
async fn test_memory_storage_missing_key() {
    let storage = MemoryStorage::new();

    assert!(storage.is_empty().await);
    assert!(!storage.exists("ghost.png").await.unwrap());
    assert!(storage.retrieve("ghost.png").await.unwrap_err().is_not_found());
}

#[test]
fn test_guess_content_type() {
    assert_eq!(guess_content_type("a.jpg"), "image/jpeg");
    assert_eq!(guess_content_type("a.JPEG"), "image/jpeg");
    assert_eq!(guess_content_type("a.png"), "image/png");
    assert_eq!(guess_content_type("a.gif"), "image/gif");
    assert_eq!(guess_content_type("a_description.json"), "application/json");
    assert_eq!(guess_content_type("archive.xyz"), "application/octet-stream");
    assert_eq!(guess_content_type("no-extension"), "application/octet-stream");
}

#[tokio::test]
async fn test_storage_config_create_local_backend() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("photos");
    let config = StorageConfig::new(StorageType::Local { path: path.clone() });

    let backend = config.create_backend().await.unwrap();
    assert!(path.exists());

    backend.store("cat.png", b"meow", None).await.unwrap();
    assert!(path.join("cat.png").exists());
}

#[tokio::test]
async fn test_storage_config_create_memory_backend() {
    let config = StorageConfig::new(StorageType::Memory);
    let backend = config.create_backend().await.unwrap();

    backend.store("cat.png", b"meow", None).await.unwrap();
    assert!(backend.exists("cat.png").await.unwrap());
}

#[cfg(feature = "s3")]
#[tokio::test]
async fn test_s3_storage_key_validation() {
    use crate::S3Storage;

    let config = aws_sdk_s3::config::Builder::new()
        .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
        .region(aws_sdk_s3::config::Region::new("us-east-1"))
        .endpoint_url("http://localhost:9000")
        .build();
    let client = aws_sdk_s3::Client::from_conf(config);
    let storage = S3Storage::new(client, "test-bucket".to_string(), "us-east-1".to_string());

    let result = storage.store("../outside.png", b"test", None).await;
    assert!(matches!(result, Err(StorageError::InvalidPath(_))));

    let result = storage.store("", b"test", None).await;
    assert!(matches!(result, Err(StorageError::InvalidPath(_))));
}

#[tokio::test]
async fn test_local_storage_concurrent_writes() {
    let temp_dir = tempdir().unwrap();
    let storage = Arc::new(LocalStorage::new(temp_dir.path().to_path_buf()));

    let mut handles = vec![];
    for i in 0..10 {
        let storage = storage.clone();
        handles.push(tokio::spawn(async move {
            let data = format!("image {}", i).into_bytes();
            let key = format!("batch/photo_{}.png", i);
            storage.store(&key, &data, None).await.unwrap();
            assert_eq!(storage.retrieve(&key).await.unwrap(), data);
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(storage.list().await.unwrap().len(), 10);
}
