#![allow(dead_code)]

use std::sync::Arc;

use rules_console::config::ApiConfig;
use rules_console::stub::{self, Store};
use rules_console::{Backend, NotificationQueue, Notifier};

/// Start a seeded stub on a free port and build a backend pointing at it.
pub async fn seeded_backend() -> Backend {
    backend_for(Store::seeded()).await
}

pub async fn backend_for(store: Store) -> Backend {
    let (addr, _handle) = stub::spawn("127.0.0.1:0".parse().unwrap(), store)
        .await
        .expect("bind stub backend");
    Backend::new(&ApiConfig {
        base_url: format!("http://{}/api", addr),
        ..ApiConfig::default()
    })
}

/// Backend on a port nothing listens on.
pub fn offline_backend() -> Backend {
    Backend::new(&ApiConfig {
        base_url: "http://127.0.0.1:9/api".to_string(),
        execute_timeout_secs: 2,
        evaluate_timeout_secs: 2,
    })
}

pub fn queue() -> (Arc<NotificationQueue>, Arc<dyn Notifier>) {
    let queue = Arc::new(NotificationQueue::new(20));
    let notifier: Arc<dyn Notifier> = queue.clone();
    (queue, notifier)
}

pub fn messages(queue: &NotificationQueue) -> Vec<String> {
    queue.snapshot().into_iter().map(|n| n.message).collect()
}
