//! Integration tests for async single-flight population

use keygate_async::{CachePopulator, CacheStore, LockRegistry, MemoryStore, StoreOptions};
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
struct Report {
    total: u32,
}

fn isolated<T>() -> (CachePopulator<Arc<MemoryStore<T>>>, Arc<MemoryStore<T>>) {
    let store = Arc::new(MemoryStore::new());
    let populator = CachePopulator::with_registry(Arc::new(LockRegistry::new()), Arc::clone(&store));
    (populator, store)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_report_scenario_generates_once() {
    let (populator, store) = isolated::<Report>();
    let calls = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let populator = populator.clone();
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                populator
                    .retrieve_async(
                        "report-2024",
                        || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(100)).await;
                            Ok::<_, Infallible>(Report { total: 42 })
                        },
                        &StoreOptions::new(),
                    )
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut results = Vec::new();
    for task in tasks {
        results.push(task.await.unwrap());
    }
    let elapsed = start.elapsed();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(results.iter().all(|r| *r == Report { total: 42 }));
    assert_eq!(
        store.try_get("report-2024").unwrap(),
        Some(Report { total: 42 })
    );
    assert!(elapsed < Duration::from_millis(600), "took {:?}", elapsed);
}

#[tokio::test]
async fn test_tasks_on_one_thread_share_generation() {
    // Current-thread runtime: waiting must suspend, not block
    let (populator, _store) = isolated::<u32>();
    let calls = Arc::new(AtomicUsize::new(0));

    let lookups = (0..8).map(|_| {
        let populator = populator.clone();
        let calls = Arc::clone(&calls);
        async move {
            populator
                .retrieve_async(
                    "hot",
                    || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(30)).await;
                        Ok::<_, Infallible>(5)
                    },
                    &StoreOptions::new(),
                )
                .await
                .unwrap()
        }
    });

    let mut handles = Vec::new();
    for lookup in lookups {
        handles.push(tokio::spawn(lookup));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 5);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_waiter_rereads_after_permit() {
    let (populator, store) = isolated::<u32>();
    let calls = Arc::new(AtomicUsize::new(0));

    let semaphore = populator.registry().semaphore_for("k").unwrap();
    let permit = semaphore.acquire().await.unwrap();

    let waiter = {
        let populator = populator.clone();
        let calls = Arc::clone(&calls);
        tokio::spawn(async move {
            populator
                .retrieve_async(
                    "k",
                    || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, Infallible>(0)
                    },
                    &StoreOptions::new(),
                )
                .await
        })
    };

    // Let the waiter miss and queue on the permit
    tokio::time::sleep(Duration::from_millis(50)).await;
    store.set("k", 7, &StoreOptions::new()).unwrap();
    drop(permit);

    assert_eq!(waiter.await.unwrap().unwrap(), 7);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failures_are_not_cached() {
    let (populator, store) = isolated::<String>();
    let attempts = Arc::new(AtomicUsize::new(0));

    for round in 1..=3 {
        let attempts = Arc::clone(&attempts);
        let result = populator
            .retrieve_async(
                "config",
                || async move {
                    let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    if attempt < 3 {
                        Err(format!("attempt {} failed", attempt))
                    } else {
                        Ok("loaded".to_string())
                    }
                },
                &StoreOptions::new(),
            )
            .await;

        if round < 3 {
            assert!(result.unwrap_err().is_generator());
            assert_eq!(store.try_get("config").unwrap(), None);
        } else {
            assert_eq!(result.unwrap(), "loaded");
        }
    }
    assert_eq!(store.try_get("config").unwrap(), Some("loaded".to_string()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_different_keys_generate_in_parallel() {
    // Each generation returns its own start/end window
    let (populator, _store) = isolated::<(Instant, Instant)>();

    let generate = |key: &'static str| {
        let populator = populator.clone();
        tokio::spawn(async move {
            populator
                .retrieve_async(
                    key,
                    || async {
                        let started = Instant::now();
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok::<_, Infallible>((started, Instant::now()))
                    },
                    &StoreOptions::new(),
                )
                .await
                .unwrap()
        })
    };

    let a = generate("key-a");
    let b = generate("key-b");
    let (a_start, a_end) = a.await.unwrap();
    let (b_start, b_end) = b.await.unwrap();
    assert!(a_start < b_end && b_start < a_end, "generations did not overlap");
}

#[tokio::test]
async fn test_post_generate_seen_only_by_generating_caller() {
    let (populator, store) = isolated::<u32>();
    let options = StoreOptions::new();

    let first = populator
        .retrieve_async_with("n", || async { Ok::<_, Infallible>(21) }, &options, |n| n * 2)
        .await
        .unwrap();
    let second = populator
        .retrieve_async_with("n", || async { Ok::<_, Infallible>(0) }, &options, |n| n * 2)
        .await
        .unwrap();

    assert_eq!(first, 42);
    assert_eq!(second, 21);
    assert_eq!(store.try_get("n").unwrap(), Some(21));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dropped_lookup_releases_permit() {
    let (populator, store) = isolated::<u32>();

    let stuck = {
        let populator = populator.clone();
        tokio::spawn(async move {
            populator
                .retrieve_async(
                    "slow",
                    || async {
                        tokio::time::sleep(Duration::from_secs(30)).await;
                        Ok::<_, Infallible>(1)
                    },
                    &StoreOptions::new(),
                )
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    let semaphore = populator.registry().semaphore_for("slow").unwrap();
    assert_eq!(semaphore.available_permits(), 0);

    stuck.abort();
    assert!(stuck.await.unwrap_err().is_cancelled());
    assert_eq!(semaphore.available_permits(), 1);
    assert_eq!(store.try_get("slow").unwrap(), None);

    let value = tokio::time::timeout(
        Duration::from_secs(1),
        populator.retrieve_async(
            "slow",
            || async { Ok::<_, Infallible>(2) },
            &StoreOptions::new(),
        ),
    )
    .await
    .expect("lookup after cancellation should not wait")
    .unwrap();
    assert_eq!(value, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_run_exclusive_async_serializes_same_key() {
    let registry = Arc::new(LockRegistry::new());
    let inside = Arc::new(AtomicUsize::new(0));
    let max_inside = Arc::new(AtomicUsize::new(0));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            tokio::spawn(async move {
                registry
                    .run_exclusive_async("ledger", || async {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        inside.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await
                    .unwrap();
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }
    assert_eq!(max_inside.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_run_exclusive_async_propagates_action_error() {
    let registry = LockRegistry::new();
    let outcome: Result<u32, String> = registry
        .run_exclusive_async("job", || async { Err("disk full".to_string()) })
        .await
        .unwrap();

    assert_eq!(outcome, Err("disk full".to_string()));
    assert_eq!(registry.semaphore_for("job").unwrap().available_permits(), 1);
}
