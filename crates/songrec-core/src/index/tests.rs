//! Tests for the fingerprint index

use super::*;
use async_trait::async_trait;
use bson::{doc, Bson, Document};
use songrec_db::{MemoryStore, StoreError, UniqueIndex};

fn memory_index() -> (Arc<MemoryStore>, FingerprintIndex) {
    let store = Arc::new(MemoryStore::new());
    let index = FingerprintIndex::new(store.clone());
    (store, index)
}

fn single(address: FingerprintAddress, couples: Vec<Couple>) -> HashMap<FingerprintAddress, Vec<Couple>> {
    HashMap::from([(address, couples)])
}

/// Memory store that refuses writes to one address and cannot read back
/// another
struct FaultyStore {
    inner: MemoryStore,
    rejected: Option<FingerprintAddress>,
    unreadable: Option<FingerprintAddress>,
}

impl FaultyStore {
    fn new(rejected: Option<FingerprintAddress>, unreadable: Option<FingerprintAddress>) -> Self {
        Self {
            inner: MemoryStore::new(),
            rejected,
            unreadable,
        }
    }
}

#[async_trait]
impl DocumentStore for FaultyStore {
    async fn push_upsert(
        &self,
        collection: &str,
        id: Bson,
        field: &str,
        items: Vec<Bson>,
    ) -> songrec_db::Result<()> {
        if self.rejected.is_some_and(|address| id == models::id_key(address)) {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        self.inner.push_upsert(collection, id, field, items).await
    }

    async fn insert_one(&self, collection: &str, document: Document) -> songrec_db::Result<()> {
        self.inner.insert_one(collection, document).await
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> songrec_db::Result<Option<Document>> {
        if self.unreadable.is_some_and(|address| filter.value == models::id_key(address)) {
            return Err(StoreError::InvalidDocument {
                collection: collection.to_string(),
                reason: "expected an object, found Array".to_string(),
            });
        }
        self.inner.find_one(collection, filter).await
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> songrec_db::Result<u64> {
        self.inner.delete_one(collection, filter).await
    }

    async fn count(&self, collection: &str) -> songrec_db::Result<u64> {
        self.inner.count(collection).await
    }

    async fn create_unique_index(&self, collection: &str, index: &UniqueIndex) -> songrec_db::Result<()> {
        self.inner.create_unique_index(collection, index).await
    }

    async fn drop_collection(&self, collection: &str) -> songrec_db::Result<()> {
        self.inner.drop_collection(collection).await
    }
}

#[tokio::test]
async fn test_successive_stores_append_in_order() {
    let (_, index) = memory_index();
    let c1 = Couple::new(100, 1);
    let c2 = Couple::new(250, 2);

    index.store_fingerprints(&single(0xABCD, vec![c1])).await.unwrap();
    index.store_fingerprints(&single(0xABCD, vec![c2])).await.unwrap();

    let result = index.get_couples(&[0xABCD]).await.unwrap();
    assert_eq!(result.get(&0xABCD), Some(&vec![c1, c2]));
}

#[tokio::test]
async fn test_unknown_address_is_absent() {
    let (_, index) = memory_index();
    index
        .store_fingerprints(&single(1, vec![Couple::new(5, 9)]))
        .await
        .unwrap();

    let result = index.get_couples(&[1, 2]).await.unwrap();
    assert!(result.contains_key(&1));
    assert!(!result.contains_key(&2));

    let empty = index.get_couples(&[42]).await.unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn test_duplicate_couples_are_kept() {
    let (_, index) = memory_index();
    let couple = Couple::new(10, 3);
    index
        .store_fingerprints(&single(7, vec![couple, couple]))
        .await
        .unwrap();
    index.store_fingerprints(&single(7, vec![couple])).await.unwrap();

    let result = index.get_couples(&[7]).await.unwrap();
    assert_eq!(result[&7], vec![couple; 3]);
}

#[tokio::test]
async fn test_many_addresses_in_one_call() {
    let (store, index) = memory_index();
    let fingerprints: HashMap<FingerprintAddress, Vec<Couple>> = (0..50u32)
        .map(|address| (address, vec![Couple::new(address * 10, 1), Couple::new(address * 10 + 1, 2)]))
        .collect();
    index.store_fingerprints(&fingerprints).await.unwrap();

    assert_eq!(store.count(FINGERPRINTS_COLLECTION).await.unwrap(), 50);
    let addresses: Vec<FingerprintAddress> = (0..50).collect();
    let result = index.get_couples(&addresses).await.unwrap();
    assert_eq!(result, fingerprints);
}

#[tokio::test]
async fn test_repeated_query_addresses() {
    let (_, index) = memory_index();
    index
        .store_fingerprints(&single(3, vec![Couple::new(1, 1)]))
        .await
        .unwrap();
    let result = index.get_couples(&[3, 3, 3]).await.unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[&3].len(), 1);
}

#[tokio::test]
async fn test_empty_couple_list_creates_no_bucket() {
    let (store, index) = memory_index();
    index.store_fingerprints(&single(11, Vec::new())).await.unwrap();
    assert_eq!(store.count(FINGERPRINTS_COLLECTION).await.unwrap(), 0);
    assert!(index.get_couples(&[11]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_address_extremes() {
    let (_, index) = memory_index();
    let couple = Couple::new(u32::MAX, u32::MAX);
    index
        .store_fingerprints(&HashMap::from([(0, vec![couple]), (u32::MAX, vec![couple])]))
        .await
        .unwrap();
    let result = index.get_couples(&[0, u32::MAX]).await.unwrap();
    assert_eq!(result[&0], vec![couple]);
    assert_eq!(result[&u32::MAX], vec![couple]);
}

#[tokio::test]
async fn test_corrupt_bucket_fails_whole_call() {
    let (store, index) = memory_index();
    index
        .store_fingerprints(&single(1, vec![Couple::new(5, 5)]))
        .await
        .unwrap();
    store
        .insert_one(
            FINGERPRINTS_COLLECTION,
            doc! { "_id": models::id_key(2), "couples": [{ "anchorTimeMs": "late", "songID": 1i64 }] },
        )
        .await
        .unwrap();

    let err = index.get_couples(&[1, 2]).await.unwrap_err();
    assert!(matches!(err, IndexError::CorruptRecord { address: 2, .. }));
}

#[tokio::test]
async fn test_bucket_without_couples_is_corrupt() {
    let (store, index) = memory_index();
    store
        .insert_one(FINGERPRINTS_COLLECTION, doc! { "_id": models::id_key(8) })
        .await
        .unwrap();
    let err = index.get_couples(&[8]).await.unwrap_err();
    assert!(matches!(err, IndexError::CorruptRecord { address: 8, .. }));
}

#[tokio::test]
async fn test_store_failure_names_address_and_keeps_prior_writes() {
    let store = Arc::new(FaultyStore::new(Some(13), None));
    let index = FingerprintIndex::new(store.clone());

    index
        .store_fingerprints(&single(12, vec![Couple::new(1, 1)]))
        .await
        .unwrap();
    let err = index
        .store_fingerprints(&single(13, vec![Couple::new(2, 2)]))
        .await
        .unwrap_err();
    assert!(matches!(err, IndexError::Store { address: 13, .. }));
    assert!(err.to_string().contains("13"));

    let result = index.get_couples(&[12, 13]).await.unwrap();
    assert_eq!(result[&12], vec![Couple::new(1, 1)]);
    assert!(!result.contains_key(&13));
}

#[tokio::test]
async fn test_unreadable_bucket_is_corrupt_not_a_fetch_error() {
    let store = Arc::new(FaultyStore::new(None, Some(21)));
    let index = FingerprintIndex::new(store.clone());
    index
        .store_fingerprints(&HashMap::from([
            (20, vec![Couple::new(1, 1)]),
            (21, vec![Couple::new(2, 2)]),
        ]))
        .await
        .unwrap();

    let err = index.get_couples(&[20, 21]).await.unwrap_err();
    match err {
        IndexError::CorruptRecord { address, reason } => {
            assert_eq!(address, 21);
            assert!(reason.contains("Array"));
        }
        other => panic!("expected CorruptRecord, got {:?}", other),
    }
    assert_eq!(index.get_couples(&[20]).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_drop_all() {
    let (store, index) = memory_index();
    index
        .store_fingerprints(&HashMap::from([
            (1, vec![Couple::new(1, 1)]),
            (2, vec![Couple::new(2, 2)]),
        ]))
        .await
        .unwrap();
    index.drop_all().await.unwrap();

    assert_eq!(store.count(FINGERPRINTS_COLLECTION).await.unwrap(), 0);
    assert!(index.get_couples(&[1, 2]).await.unwrap().is_empty());

    // Dropping an already empty index is fine
    index.drop_all().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_appends_are_not_lost() {
    const WRITERS: u32 = 16;
    const COUPLES_PER_WRITER: u32 = 25;
    const ROUNDS: u32 = 10;
    const ADDRESS: FingerprintAddress = 0xFEED;

    for round in 0..ROUNDS {
        let (_, index) = memory_index();
        let index = Arc::new(index);

        let handles: Vec<_> = (0..WRITERS)
            .map(|writer| {
                let index = index.clone();
                tokio::spawn(async move {
                    for n in 0..COUPLES_PER_WRITER {
                        let couple = Couple::new(n, writer);
                        index
                            .store_fingerprints(&single(ADDRESS, vec![couple]))
                            .await
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let result = index.get_couples(&[ADDRESS]).await.unwrap();
        let bucket = &result[&ADDRESS];
        assert_eq!(
            bucket.len() as u32,
            WRITERS * COUPLES_PER_WRITER,
            "lost appends in round {}",
            round
        );
        for writer in 0..WRITERS {
            // Each writer's own couples stay in the order it appended them
            let mine: Vec<u32> = bucket
                .iter()
                .filter(|c| c.song_id == writer)
                .map(|c| c.anchor_time_ms)
                .collect();
            assert_eq!(mine, (0..COUPLES_PER_WRITER).collect::<Vec<_>>());
        }
    }
}
