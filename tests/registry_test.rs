use std::sync::Arc;
use std::time::Duration;

use tokio_test::{assert_err, assert_ok, block_on};

use phalanx::aggregator::{Aggregator, HitsQuery};
use phalanx::clock::ManualClock;
use phalanx::config::AggregatorConfig;
use phalanx::model::{Hit, HitGroup};
use phalanx::node::MockNodeClient;
use phalanx::search::{SearchContext, SearchKey, SearchRegistry, UseCache};

const A: &str = "http://node-a";
const B: &str = "http://node-b";

fn hits(prefix: &str, count: i64) -> Vec<Hit> {
    (0..count)
        .map(|i| Hit::new(format!("{prefix}{}", i / 3), i, i + 1))
        .collect()
}

fn context(clock: Arc<ManualClock>) -> (SearchContext, Arc<MockNodeClient>) {
    let client = Arc::new(
        MockNodeClient::new()
            .with_hits(A, hits("a", 40))
            .with_hits(B, hits("b", 25)),
    );
    let config = AggregatorConfig::new([A, B]).with_cache_max_age(Duration::from_secs(60));
    (
        SearchContext::new(config, client.clone()).with_clock(clock),
        client,
    )
}

#[test]
fn test_equal_keys_share_one_search() {
    let (context, client) = context(Arc::new(ManualClock::new()));
    let registry = SearchRegistry::new(context);

    let key = SearchKey::new("corpus", "[lemma=\"be\"]").with_sort("hitposition");
    let first = registry.get(key.clone(), UseCache::Yes, 10).unwrap();
    let page = assert_ok!(block_on(first.window(0, 10)));
    assert_eq!(page.summary.number_of_hits, 65);

    // A structurally equal key built separately finds the same search
    let same = registry
        .get(
            SearchKey::new("corpus", "[lemma=\"be\"]").with_sort("hitposition"),
            UseCache::Yes,
            10,
        )
        .unwrap();
    assert!(Arc::ptr_eq(&first, &same));

    let requests = client.page_requests(A) + client.page_requests(B);
    let again = assert_ok!(block_on(same.window(0, 10)));
    assert_eq!(page.hits, again.hits);
    assert_eq!(client.page_requests(A) + client.page_requests(B), requests);
}

#[test]
fn test_bypass_discards_all_cached_searches() {
    let (context, _) = context(Arc::new(ManualClock::new()));
    let registry = SearchRegistry::new(context);

    for patt in ["\"a\"", "\"b\"", "\"c\""] {
        registry.get(SearchKey::new("corpus", patt), UseCache::Yes, 20).unwrap();
    }
    assert_eq!(registry.len(), 3);

    let fresh = registry
        .get(SearchKey::new("corpus", "\"a\""), UseCache::No, 20)
        .unwrap();
    assert!(registry.is_empty());
    let results = assert_ok!(block_on(fresh.window(0, 100)));
    assert_eq!(results.summary.actual_window_size, 65);
}

#[test]
fn test_idle_search_is_rebuilt() {
    let clock = Arc::new(ManualClock::new());
    let (context, _) = context(clock.clone());
    let registry = SearchRegistry::new(context);
    let key = SearchKey::new("corpus", "\"a\"");
    let other = SearchKey::new("corpus", "\"b\"");

    let first = registry.get(key.clone(), UseCache::Yes, 20).unwrap();
    clock.advance(Duration::from_secs(30));
    let touched = registry.get(key.clone(), UseCache::Yes, 20).unwrap();
    assert!(Arc::ptr_eq(&first, &touched));

    // Asking again after a long pause keeps the search and its buffered hits
    clock.advance(Duration::from_secs(90));
    assert!(Arc::ptr_eq(&first, &registry.get(key.clone(), UseCache::Yes, 20).unwrap()));

    // Idle past the maximum age while another search is requested: evicted
    clock.advance(Duration::from_secs(61));
    registry.get(other, UseCache::Yes, 20).unwrap();
    assert_eq!(registry.len(), 1);

    let rebuilt = registry.get(key, UseCache::Yes, 20).unwrap();
    assert!(!Arc::ptr_eq(&first, &rebuilt));
    assert_eq!(registry.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_windows_agree() {
    let (context, _) = context(Arc::new(ManualClock::new()));
    let registry = Arc::new(SearchRegistry::new(context));
    let key = SearchKey::new("corpus", "\"x\"");

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            let key = key.clone();
            tokio::spawn(async move {
                let search = registry.get(key, UseCache::Yes, 20)?;
                search.window(i * 5, 30).await
            })
        })
        .collect();

    let mut windows = Vec::new();
    for task in tasks {
        windows.push(task.await.unwrap().unwrap());
    }
    assert_eq!(registry.len(), 1);

    let whole = registry
        .get(key, UseCache::Yes, 20)
        .unwrap()
        .window(0, 65)
        .await
        .unwrap()
        .hits
        .unwrap();
    for (i, window) in windows.iter().enumerate() {
        let first = i * 5;
        let end = (first + 30).min(whole.len());
        assert_eq!(window.hits.as_deref(), Some(&whole[first..end]));
    }
}

#[test]
fn test_aggregator_grouped_and_plain_requests() {
    let client = Arc::new(
        MockNodeClient::new()
            .with_hits(A, hits("a", 6))
            .with_hits(B, hits("b", 3))
            .with_groups(A, vec![HitGroup::new("noun", 4, 2), HitGroup::new("verb", 2, 1)])
            .with_groups(B, vec![HitGroup::new("verb", 3, 1)]),
    );
    let aggregator = Aggregator::with_context(SearchContext::new(AggregatorConfig::new([A, B]), client));

    let grouped = SearchKey::new("corpus", "[]").with_group("hit:pos").with_sort("identity");
    let results = assert_ok!(block_on(aggregator.hits(HitsQuery::new(grouped.clone(), 10))));
    let groups: Vec<(String, i64)> = results
        .hit_groups
        .unwrap()
        .into_iter()
        .map(|g| (g.identity, g.size))
        .collect();
    assert_eq!(groups, [("noun".to_string(), 4), ("verb".to_string(), 5)]);
    assert!(!results.summary.window_has_next);

    let bad_sort = grouped.with_sort("bogus");
    assert_err!(block_on(aggregator.hits(HitsQuery::new(bad_sort, 10))));

    let results = assert_ok!(block_on(
        aggregator.hits(HitsQuery::new(SearchKey::new("corpus", "[]"), 4).with_first(6))
    ));
    assert_eq!(results.summary.actual_window_size, 3);
    assert!(results.summary.window_has_previous);
}
