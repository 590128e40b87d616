use std::sync::Arc;
use url_shortener::domain::deletion_worker::{DeletionPool, PoolSettings, PoolState};
use url_shortener::domain::entities::NewUrl;
use url_shortener::domain::repositories::{StorageError, UrlRepository};
use url_shortener::infrastructure::persistence::{FileUrlRepository, MemoryUrlRepository};

async fn seed(repo: &dyn UrlRepository, owner: &str, count: usize) -> Vec<String> {
    let mut keys = Vec::with_capacity(count);
    for i in 0..count {
        let key = format!("{owner}-K{i}");
        repo.save(NewUrl::new(
            key.clone(),
            format!("https://example.com/{owner}/{i}"),
            owner,
        ))
        .await
        .unwrap();
        keys.push(key);
    }
    keys
}

#[tokio::test]
async fn test_drain_deletes_every_submitted_key() {
    let repo = Arc::new(MemoryUrlRepository::new());
    let keys = seed(repo.as_ref(), "u1", 5).await;

    let mut pool = DeletionPool::new(repo.clone(), PoolSettings::new(2, 3));
    let queue = pool.start().unwrap();
    queue.submit_all("u1", keys.clone()).unwrap();

    let report = pool.stop().await.unwrap();

    assert_eq!(pool.state(), PoolState::Stopped);
    assert_eq!(report.total_items(), 5);
    assert_eq!(report.total_deleted(), 5);
    assert!(report.workers.iter().any(|w| w.items % 3 != 0));

    for key in &keys {
        assert!(matches!(repo.get(key).await, Err(StorageError::Deleted)));
    }
    assert!(repo.list_by_owner("u1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_foreign_keys_are_skipped() {
    let repo = Arc::new(MemoryUrlRepository::new());
    let mine = seed(repo.as_ref(), "u1", 3).await;
    let theirs = seed(repo.as_ref(), "u2", 3).await;

    let mut pool = DeletionPool::new(repo.clone(), PoolSettings::new(3, 2));
    let queue = pool.start().unwrap();
    queue
        .submit_all("u1", mine.iter().chain(&theirs).cloned())
        .unwrap();

    let report = pool.stop().await.unwrap();

    assert_eq!(report.total_items(), 6);
    assert_eq!(report.total_deleted(), 3);
    assert_eq!(report.failed_batches(), 0);
    assert_eq!(repo.list_by_owner("u2").await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_drain_persists_tombstones() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("urls.json");

    {
        let repo = Arc::new(FileUrlRepository::open(&path).unwrap());
        let keys = seed(repo.as_ref(), "u1", 4).await;

        let mut pool = DeletionPool::new(repo.clone(), PoolSettings::new(2, 10));
        let queue = pool.start().unwrap();
        queue.submit_all("u1", keys[..3].to_vec()).unwrap();
        pool.stop().await.unwrap();
    }

    let reopened = FileUrlRepository::open(&path).unwrap();
    let stats = reopened.stats().await;

    assert_eq!(stats.records, 4);
    assert_eq!(stats.deleted, 3);
    assert_eq!(reopened.list_by_owner("u1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_pool_restarts_after_stop() {
    let repo = Arc::new(MemoryUrlRepository::new());
    let keys = seed(repo.as_ref(), "u1", 2).await;

    let mut pool = DeletionPool::new(repo.clone(), PoolSettings::new(1, 1));

    let first = pool.start().unwrap();
    first.submit("u1", &keys[0]).unwrap();
    pool.stop().await.unwrap();

    let second = pool.start().unwrap();
    assert!(first.is_closed());
    second.submit("u1", &keys[1]).unwrap();
    let report = pool.stop().await.unwrap();

    assert_eq!(report.total_deleted(), 1);
    assert!(repo.list_by_owner("u1").await.unwrap().is_empty());
}
