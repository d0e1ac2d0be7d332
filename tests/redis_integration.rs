//! Integration tests against a real Redis.
//!
//! Ignored by default. Run with a disposable Redis:
//!
//! ```text
//! REDIS_URL=redis://127.0.0.1:6379 cargo test --test redis_integration -- --ignored
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use messenger_fanout::adapters::{RedisNotificationBridge, RedisPresenceDirectory};
use messenger_fanout::domain::foundation::UserId;
use messenger_fanout::ports::{EnvelopeHandler, InstanceId, NotificationBridge, PresenceDirectory};

// =============================================================================
// Test Infrastructure
// =============================================================================

const TIMEOUT: Duration = Duration::from_secs(2);

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
}

async fn client_and_conn() -> (redis::Client, redis::aio::MultiplexedConnection) {
    let client = redis::Client::open(redis_url()).unwrap();
    let conn = client.get_multiplexed_tokio_connection().await.unwrap();
    (client, conn)
}

async fn directory(ttl_secs: u64) -> RedisPresenceDirectory {
    let (_, conn) = client_and_conn().await;
    RedisPresenceDirectory::new(conn, ttl_secs, TIMEOUT)
}

struct Forward(mpsc::UnboundedSender<String>);

#[async_trait]
impl EnvelopeHandler for Forward {
    async fn on_envelope(&self, raw: String) {
        let _ = self.0.send(raw);
    }

    fn name(&self) -> &'static str {
        "Forward"
    }
}

// =============================================================================
// Presence directory
// =============================================================================

#[tokio::test]
#[ignore = "requires Redis"]
async fn owner_round_trip_and_batch_lookup() {
    let presence = directory(60).await;
    let (a, b, offline) = (UserId::new(), UserId::new(), UserId::new());
    let node_a = InstanceId::new("it-node-a");
    let node_b = InstanceId::new("it-node-b");

    presence.set_owner(&a, &node_a).await.unwrap();
    presence.set_owner(&b, &node_b).await.unwrap();

    assert_eq!(presence.get_owner(&a).await.unwrap(), Some(node_a.clone()));
    assert_eq!(presence.get_owner(&offline).await.unwrap(), None);

    let owners = presence.get_owners(&[a, b, offline]).await.unwrap();
    assert_eq!(owners.len(), 2);
    assert_eq!(owners[&a], node_a);
    assert_eq!(owners[&b], node_b);
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn remove_only_deletes_own_claim() {
    let presence = directory(60).await;
    let user = UserId::new();
    let old = InstanceId::new("it-old");
    let new = InstanceId::new("it-new");

    presence.set_owner(&user, &old).await.unwrap();
    presence.set_owner(&user, &new).await.unwrap();

    assert!(!presence.remove_owner(&user, &old).await.unwrap());
    assert_eq!(presence.get_owner(&user).await.unwrap(), Some(new.clone()));

    assert!(presence.remove_owner(&user, &new).await.unwrap());
    assert_eq!(presence.get_owner(&user).await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn refresh_respects_other_owner_and_recreates_expired_entry() {
    let presence = directory(60).await;
    let user = UserId::new();
    let mine = InstanceId::new("it-mine");
    let theirs = InstanceId::new("it-theirs");

    presence.set_owner(&user, &theirs).await.unwrap();
    assert!(!presence.refresh_owner(&user, &mine).await.unwrap());
    assert_eq!(presence.get_owner(&user).await.unwrap(), Some(theirs.clone()));

    presence.remove_owner(&user, &theirs).await.unwrap();
    assert!(presence.refresh_owner(&user, &mine).await.unwrap());
    assert_eq!(presence.get_owner(&user).await.unwrap(), Some(mine));
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn entries_expire_after_ttl() {
    let presence = directory(1).await;
    let user = UserId::new();
    presence.set_owner(&user, &InstanceId::new("it-ttl")).await.unwrap();

    tokio::time::sleep(Duration::from_millis(2100)).await;

    assert_eq!(presence.get_owner(&user).await.unwrap(), None);
}

// =============================================================================
// Pub/sub bridge
// =============================================================================

#[tokio::test]
#[ignore = "requires Redis"]
async fn published_envelope_reaches_subscriber() {
    let (client, conn) = client_and_conn().await;
    let shutdown = CancellationToken::new();
    let bridge = RedisNotificationBridge::new(client, conn, TIMEOUT, shutdown.clone());
    let topic = format!("notifications:it-{}", UserId::new());

    let (tx, mut rx) = mpsc::unbounded_channel();
    bridge.subscribe(&topic, Arc::new(Forward(tx))).await.unwrap();
    bridge.publish(&topic, "{\"hello\":1}").await.unwrap();

    let received = tokio::time::timeout(TIMEOUT, rx.recv()).await.unwrap();
    assert_eq!(received.as_deref(), Some("{\"hello\":1}"));

    shutdown.cancel();
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn publish_without_subscribers_succeeds() {
    let (client, conn) = client_and_conn().await;
    let bridge = RedisNotificationBridge::new(client, conn, TIMEOUT, CancellationToken::new());

    assert!(bridge.publish("notifications:it-nobody", "{}").await.is_ok());
}
