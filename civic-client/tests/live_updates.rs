// civic-client/tests/live_updates.rs
// Push updates flowing into the query cache and the toast feed

use std::sync::Arc;

use civic_client::cache::{ISSUES_KEY, query_key};
use civic_client::{ClientConfig, ClientError, IssueTracker, QueryCache};

fn tracker_with_cache() -> (IssueTracker, Arc<QueryCache>) {
    let cache = Arc::new(QueryCache::new());
    let tracker = IssueTracker::new(ClientConfig::default(), Arc::clone(&cache));
    (tracker, cache)
}

#[tokio::test]
async fn test_update_marks_every_issue_query_stale() {
    let (tracker, cache) = tracker_with_cache();
    cache.set(query_key(&["issues"]), &vec!["a"]).unwrap();
    cache.set(query_key(&["issues", "officer", "open"]), &vec!["b"]).unwrap();
    cache.set(query_key(&["profile"]), &"me").unwrap();
    let mut invalidated = cache.subscribe();

    tracker
        .ingest(r#"{"type":"ISSUE_UPDATED","data":{"_id":"i1","status":"in-progress"}}"#)
        .unwrap();

    assert_eq!(invalidated.recv().await.unwrap(), query_key(&[ISSUES_KEY]));
    assert!(cache.is_stale(&query_key(&["issues"])));
    assert!(cache.is_stale(&query_key(&["issues", "officer", "open"])));
    assert!(!cache.is_stale(&query_key(&["profile"])));

    let refetched: Vec<String> = cache
        .get_or_fetch(query_key(&["issues"]), || async {
            Ok::<_, ClientError>(vec!["a".to_string(), "c".to_string()])
        })
        .await
        .unwrap();
    assert_eq!(refetched.len(), 2);
}

#[tokio::test]
async fn test_each_event_kind_raises_one_notification() {
    let (tracker, cache) = tracker_with_cache();
    let mut toasts = tracker.subscribe_notifications();

    let messages = [
        r#"{"type":"ISSUE_CREATED","data":{"text":"Streetlight out"}}"#,
        r#"{"type":"ISSUE_UPDATED","data":{"status":"resolved"}}"#,
        r#"{"type":"ISSUE_UPVOTED","data":{"_id":"i1","upvotes":3}}"#,
    ];
    for message in messages {
        tracker.ingest(message).unwrap();
    }

    let titles: Vec<String> = (0..3).map(|_| toasts.try_recv().unwrap().title).collect();
    assert_eq!(titles, vec!["New Issue Reported", "Issue Updated", "Issue Upvoted"]);
    assert_eq!(cache.invalidation_count(), 3);

    // newest first
    let updates = tracker.updates();
    assert_eq!(updates[0].data["upvotes"], 3);
    assert_eq!(updates[2].data["text"], "Streetlight out");
}
