//! Watch live issue updates
//!
//! Connects to the push stream and prints a line per notification, plus the
//! dashboard counters refetched after each invalidation.
//!
//! Start the server first: cargo run -p civic-server
//!
//! Run: cargo run -p civic-client --example watch_updates -- [BASE_URL]

use std::sync::Arc;

use civic_client::cache::{ISSUES_KEY, query_key};
use civic_client::dashboard::DashboardStats;
use civic_client::{
    ClientConfig, ClientError, ConnectionState, IssueApi, IssueTracker, NetworkHttpClient, QueryCache,
};
use shared::models::{Issue, IssueQuery};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,civic_client=debug".into()),
        )
        .init();

    let base_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://localhost:5000".to_string());
    let config = ClientConfig::new(base_url);
    println!("Watching {}", config.base_url);

    let http = NetworkHttpClient::new(&config)?;
    let issues = IssueApi::new(http);
    let cache = Arc::new(QueryCache::new());

    let mut tracker = IssueTracker::new(config, Arc::clone(&cache));
    let mut notifications = tracker.subscribe_notifications();
    let mut state = tracker.watch_state();
    tracker.start()?;

    let key = query_key(&[ISSUES_KEY]);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *state.borrow_and_update();
                if current == ConnectionState::Open {
                    println!("Connected");
                }
            }
            received = notifications.recv() => {
                let Ok(notification) = received else { continue };
                println!("[{}] {}", notification.title, notification.description);

                let query = IssueQuery { limit: Some(100), ..IssueQuery::default() };
                let list: Vec<Issue> = cache
                    .get_or_fetch(key.clone(), || async {
                        Ok::<_, ClientError>(issues.list(&query).await?.issues)
                    })
                    .await?;
                let stats = DashboardStats::from_issues(&list);
                println!(
                    "  total={} pending={} in_progress={} resolved={} high={}",
                    stats.total, stats.pending, stats.in_progress, stats.resolved, stats.high_priority
                );
            }
        }
    }

    tracker.stop();
    println!("Received {} updates", tracker.updates().len());
    Ok(())
}
