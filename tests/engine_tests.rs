use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use likewise_api::{
    error::{AppError, AppResult},
    models::{TitleId, TitleSummary, TitleType, UserId, SLOT_CAPACITY},
    services::{
        LibraryOracle, MemorySlotStore, RecommendationService, SlotStore, TitleCatalog,
    },
};

struct StaticLibrary {
    entries: HashSet<(String, String)>,
}

impl StaticLibrary {
    fn with_entries(entries: &[(&str, &str)]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|(user, title)| (user.to_string(), title.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl LibraryOracle for StaticLibrary {
    async fn owns_title(&self, user: &UserId, title: &TitleId) -> AppResult<bool> {
        Ok(self
            .entries
            .contains(&(user.as_str().to_string(), title.as_str().to_string())))
    }
}

/// Catalog that knows every title
struct OpenCatalog;

#[async_trait]
impl TitleCatalog for OpenCatalog {
    async fn get(&self, title: &TitleId) -> AppResult<Option<TitleSummary>> {
        Ok(Some(TitleSummary {
            id: title.clone(),
            title: format!("Title {}", title),
            title_type: TitleType::Movie,
            release_year: Some(2020),
        }))
    }
}

fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

fn title(id: &str) -> TitleId {
    TitleId::new(id).unwrap()
}

fn service_for(entries: &[(&str, &str)]) -> (Arc<RecommendationService>, Arc<MemorySlotStore>) {
    let store = Arc::new(MemorySlotStore::new());
    let service = Arc::new(RecommendationService::new(
        store.clone(),
        Arc::new(StaticLibrary::with_entries(entries)),
        Arc::new(OpenCatalog),
    ));
    (service, store)
}

async fn assert_invariants(store: &MemorySlotStore, owner: &UserId, target: &TitleId) {
    if let Some(record) = store.find(owner, target).await.unwrap() {
        assert!(record.slots().is_left_packed(), "slots have a gap");
        assert!(
            record.slots().len() > 0,
            "empty record observed as present"
        );
        let titles: HashSet<&str> = record
            .slots()
            .occupied()
            .map(|entry| entry.title.as_str())
            .collect();
        assert_eq!(
            titles.len(),
            record.slots().len(),
            "duplicate titles within one record"
        );
    }
}

#[tokio::test]
async fn test_owner_can_add_and_count_reflects_it() {
    let (service, store) = service_for(&[("alice", "tt100")]);

    service
        .add_recommendation(&user("alice"), &title("tt100"), &title("tt1"), None)
        .await
        .unwrap();

    assert_eq!(
        service
            .count_for_user(&user("alice"), &title("tt100"))
            .await
            .unwrap(),
        1
    );
    assert_invariants(&store, &user("alice"), &title("tt100")).await;
}

#[tokio::test]
async fn test_non_owner_is_denied() {
    let (service, _) = service_for(&[("alice", "tt100")]);

    let result = service
        .add_recommendation(&user("bob"), &title("tt100"), &title("tt1"), None)
        .await;

    assert!(matches!(result, Err(AppError::PermissionDenied(_))));
}

#[tokio::test]
async fn test_invariants_hold_across_mixed_mutations() {
    let (service, store) = service_for(&[("alice", "tt100")]);
    let alice = user("alice");
    let target = title("tt100");

    for id in ["tt1", "tt2", "tt3"] {
        service
            .add_recommendation(&alice, &target, &title(id), None)
            .await
            .unwrap();
        assert_invariants(&store, &alice, &target).await;
    }

    service
        .remove_recommendation(&alice, &target, &title("tt2"))
        .await
        .unwrap();
    assert_invariants(&store, &alice, &target).await;

    service
        .add_recommendation(&alice, &target, &title("tt4"), None)
        .await
        .unwrap();
    assert_invariants(&store, &alice, &target).await;

    let record = store.find(&alice, &target).await.unwrap().unwrap();
    let titles: Vec<&str> = record
        .slots()
        .occupied()
        .map(|entry| entry.title.as_str())
        .collect();
    assert_eq!(titles, vec!["tt1", "tt3", "tt4"]);
}

#[tokio::test]
async fn test_duplicate_law() {
    let (service, store) = service_for(&[("alice", "tt100")]);

    service
        .add_recommendation(&user("alice"), &title("tt100"), &title("tt1"), None)
        .await
        .unwrap();
    let second = service
        .add_recommendation(&user("alice"), &title("tt100"), &title("tt1"), None)
        .await;

    assert!(matches!(second, Err(AppError::DuplicateRecommendation(_))));
    let record = store
        .find(&user("alice"), &title("tt100"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.slots().len(), 1);
}

#[tokio::test]
async fn test_capacity_law() {
    let (service, store) = service_for(&[("alice", "tt100")]);

    for id in ["tt1", "tt2", "tt3"] {
        service
            .add_recommendation(&user("alice"), &title("tt100"), &title(id), None)
            .await
            .unwrap();
    }
    let fourth = service
        .add_recommendation(&user("alice"), &title("tt100"), &title("tt4"), None)
        .await;

    assert!(matches!(fourth, Err(AppError::CapacityExceeded)));
    let record = store
        .find(&user("alice"), &title("tt100"))
        .await
        .unwrap()
        .unwrap();
    let titles: Vec<&str> = record
        .slots()
        .occupied()
        .map(|entry| entry.title.as_str())
        .collect();
    assert_eq!(titles, vec!["tt1", "tt2", "tt3"]);
}

#[tokio::test]
async fn test_round_trip_restores_prior_state() {
    let (service, store) = service_for(&[("alice", "tt100")]);
    let alice = user("alice");
    let target = title("tt100");

    service
        .add_recommendation(&alice, &target, &title("tt1"), Some("pairing".to_string()))
        .await
        .unwrap();
    let before = store.find(&alice, &target).await.unwrap().unwrap();

    service
        .add_recommendation(&alice, &target, &title("tt2"), None)
        .await
        .unwrap();
    service
        .remove_recommendation(&alice, &target, &title("tt2"))
        .await
        .unwrap();

    let after = store.find(&alice, &target).await.unwrap().unwrap();
    assert_eq!(after.slots(), before.slots());
}

#[tokio::test]
async fn test_removing_only_slot_leaves_no_record() {
    let (service, store) = service_for(&[("alice", "tt100")]);

    service
        .add_recommendation(&user("alice"), &title("tt100"), &title("tt1"), None)
        .await
        .unwrap();
    service
        .remove_recommendation(&user("alice"), &title("tt100"), &title("tt1"))
        .await
        .unwrap();

    assert!(store
        .find(&user("alice"), &title("tt100"))
        .await
        .unwrap()
        .is_none());
    assert_eq!(
        service
            .count_for_user(&user("alice"), &title("tt100"))
            .await
            .unwrap(),
        0
    );

    let repeat = service
        .remove_recommendation(&user("alice"), &title("tt100"), &title("tt1"))
        .await;
    assert!(matches!(repeat, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_list_spans_all_owners_of_a_target() {
    let (service, _) = service_for(&[("alice", "tt100"), ("bob", "tt100")]);

    service
        .add_recommendation(&user("alice"), &title("tt100"), &title("tt1"), None)
        .await
        .unwrap();
    service
        .add_recommendation(&user("bob"), &title("tt100"), &title("tt2"), None)
        .await
        .unwrap();

    let views = service.list_for_target(&title("tt100")).await.unwrap();
    assert_eq!(views.len(), 2);
    let recommenders: HashSet<&str> = views
        .iter()
        .map(|view| view.recommended_by.as_str())
        .collect();
    assert_eq!(recommenders, HashSet::from(["alice", "bob"]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_within_capacity_all_succeed() {
    let (service, store) = service_for(&[("alice", "tt100")]);

    let mut handles = Vec::new();
    for id in ["tt1", "tt2", "tt3"] {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .add_recommendation(&user("alice"), &title("tt100"), &title(id), None)
                .await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }
    assert_eq!(succeeded, 3, "a concurrent add was lost");

    let record = store
        .find(&user("alice"), &title("tt100"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.slots().len(), 3);
    assert!(record.slots().is_left_packed());
    let titles: HashSet<&str> = record
        .slots()
        .occupied()
        .map(|entry| entry.title.as_str())
        .collect();
    assert_eq!(titles, HashSet::from(["tt1", "tt2", "tt3"]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_beyond_capacity_fill_exactly_three_slots() {
    let (service, store) = service_for(&[("alice", "tt100")]);

    let ids = ["tt1", "tt2", "tt3", "tt4", "tt5", "tt6"];
    let mut handles = Vec::new();
    for id in ids {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service
                .add_recommendation(&user("alice"), &title("tt100"), &title(id), None)
                .await
        }));
    }

    let mut succeeded = 0;
    let mut capacity_failures = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(AppError::CapacityExceeded) => capacity_failures += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!(succeeded, SLOT_CAPACITY);
    assert_eq!(capacity_failures, ids.len() - SLOT_CAPACITY);

    let record = store
        .find(&user("alice"), &title("tt100"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.slots().len(), SLOT_CAPACITY);
    assert!(record.slots().is_left_packed());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_and_removes_never_corrupt_a_record() {
    let (service, store) = service_for(&[("alice", "tt100")]);
    let alice = user("alice");
    let target = title("tt100");

    service
        .add_recommendation(&alice, &target, &title("tt1"), None)
        .await
        .unwrap();

    let adder = {
        let service = service.clone();
        tokio::spawn(async move {
            for id in ["tt2", "tt3", "tt4"] {
                let _ = service
                    .add_recommendation(&user("alice"), &title("tt100"), &title(id), None)
                    .await;
            }
        })
    };
    let remover = {
        let service = service.clone();
        tokio::spawn(async move {
            for id in ["tt1", "tt2", "tt3"] {
                let _ = service
                    .remove_recommendation(&user("alice"), &title("tt100"), &title(id))
                    .await;
            }
        })
    };

    adder.await.unwrap();
    remover.await.unwrap();

    assert_invariants(&store, &alice, &target).await;
}
