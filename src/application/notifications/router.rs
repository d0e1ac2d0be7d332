//! Notification router - fan-out of one payload to many users across the fleet.
//!
//! # Algorithm
//!
//! ```text
//! recipients ──dedupe──► local registry hit? ──yes──► local send (one per user)
//!                               │
//!                               no
//!                               ▼
//!                      presence directory (one batched lookup)
//!                               │
//!             ┌─────────────────┼───────────────────────┐
//!             ▼                 ▼                       ▼
//!        no entry       owner == this instance    owner == other instance
//!         (drop)        (stale entry, drop)       group by owner
//!                                                       │
//!                                                       ▼
//!                                       one envelope per owner → bridge publish
//! ```
//!
//! The registry is checked before the directory: a user connected here is
//! always delivered locally, even while the directory still names another
//! instance, and the router never publishes to its own topic.
//!
//! On the receiving side the router is also the bridge's [`EnvelopeHandler`]:
//! envelopes arriving on this instance's topic are delivered to whichever of
//! their recipients are still connected here.
//!
//! Delivery is best-effort and at most once per recipient per call. No error
//! is ever returned to the caller; infrastructure failures are logged and the
//! affected recipients are treated as offline.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use crate::domain::foundation::UserId;
use crate::domain::messaging::{NotificationEnvelope, NotificationPayload};
use crate::ports::{
    BridgeError, ConnectionHandle, EnvelopeHandler, InstanceId, NotificationBridge, Notifier,
    PresenceDirectory,
};

use super::ConnectionRegistry;

/// Outcome counters of one fan-out or one inbound envelope.
///
/// Purely informational; it is logged and used by tests, never treated
/// as an error channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutReport {
    /// Local sends that the transport accepted.
    pub delivered_locally: usize,
    /// Local sends that failed (closed or backlogged socket).
    pub failed_locally: usize,
    /// Recipients placed into a remote instance group.
    pub routed_remotely: usize,
    /// Envelopes accepted by the bridge.
    pub envelopes_published: usize,
    /// Envelopes the bridge rejected (their recipients are lost).
    pub envelopes_failed: usize,
    /// Recipients that were offline, unresolvable or stale.
    pub dropped: usize,
}

/// Routes notifications to local sockets or to the owning instance.
pub struct NotificationRouter {
    instance_id: InstanceId,
    connections: Arc<ConnectionRegistry>,
    presence: Arc<dyn PresenceDirectory>,
    bridge: Arc<dyn NotificationBridge>,
    listening: AtomicBool,
}

impl NotificationRouter {
    pub fn new(
        instance_id: InstanceId,
        connections: Arc<ConnectionRegistry>,
        presence: Arc<dyn PresenceDirectory>,
        bridge: Arc<dyn NotificationBridge>,
    ) -> Self {
        Self {
            instance_id,
            connections,
            presence,
            bridge,
            listening: AtomicBool::new(false),
        }
    }

    pub fn instance_id(&self) -> &InstanceId {
        &self.instance_id
    }

    /// Subscribe this router to its own instance topic.
    ///
    /// Only the first call subscribes; later calls are ignored so an instance
    /// never ends up with two listeners on its topic.
    pub async fn listen(self: &Arc<Self>) -> Result<(), BridgeError> {
        if self.listening.swap(true, Ordering::SeqCst) {
            tracing::warn!(instance_id = %self.instance_id, "Notification listener already running");
            return Ok(());
        }

        let topic = self.instance_id.notification_topic();
        let handler: Arc<dyn EnvelopeHandler> = self.clone();
        if let Err(e) = self.bridge.subscribe(&topic, handler).await {
            self.listening.store(false, Ordering::SeqCst);
            return Err(e);
        }

        tracing::info!(instance_id = %self.instance_id, topic = %topic, "Listening for routed notifications");
        Ok(())
    }

    /// Deliver `payload` to every online user in `recipients`.
    pub async fn fan_out(&self, recipients: &[UserId], payload: &NotificationPayload) -> FanOutReport {
        let mut report = FanOutReport::default();
        let mut seen = HashSet::with_capacity(recipients.len());
        let mut local = Vec::new();
        let mut unresolved = Vec::new();

        for user_id in recipients {
            if !seen.insert(*user_id) {
                continue;
            }
            match self.connections.get(user_id).await {
                Some(handle) => local.push((*user_id, handle)),
                None => unresolved.push(*user_id),
            }
        }

        let groups = self.group_by_owner(&unresolved, &mut report).await;
        report.routed_remotely = groups.values().map(Vec::len).sum();

        let ((delivered, failed), (published, rejected)) =
            tokio::join!(self.send_local(local, payload), self.publish_groups(groups, payload));
        report.delivered_locally = delivered;
        report.failed_locally = failed;
        report.envelopes_published = published;
        report.envelopes_failed = rejected;

        tracing::debug!(
            recipients = seen.len(),
            delivered_locally = report.delivered_locally,
            failed_locally = report.failed_locally,
            routed_remotely = report.routed_remotely,
            envelopes = report.envelopes_published,
            dropped = report.dropped,
            "Fan-out complete"
        );

        report
    }

    /// Deliver an envelope received from the bridge to local connections.
    ///
    /// Recipients that disconnected in the meantime are dropped; nothing is
    /// re-routed or bounced back to the sender instance.
    pub async fn deliver_envelope(&self, raw: &str) -> FanOutReport {
        let mut report = FanOutReport::default();

        let (recipients, payload) = match NotificationEnvelope::decode(raw).and_then(|e| e.into_parts()) {
            Ok(parts) => parts,
            Err(e) => {
                tracing::warn!(instance_id = %self.instance_id, error = %e, "Discarding undecodable notification envelope");
                return report;
            }
        };

        let mut seen = HashSet::with_capacity(recipients.len());
        let mut local = Vec::new();
        for user_id in recipients {
            if !seen.insert(user_id) {
                continue;
            }
            match self.connections.get(&user_id).await {
                Some(handle) => local.push((user_id, handle)),
                None => report.dropped += 1,
            }
        }

        let (delivered, failed) = self.send_local(local, &payload).await;
        report.delivered_locally = delivered;
        report.failed_locally = failed;

        tracing::debug!(
            delivered = report.delivered_locally,
            failed = report.failed_locally,
            dropped = report.dropped,
            "Routed envelope delivered"
        );

        report
    }

    /// Resolve owners of users not connected here and group them by instance.
    async fn group_by_owner(
        &self,
        users: &[UserId],
        report: &mut FanOutReport,
    ) -> BTreeMap<InstanceId, Vec<UserId>> {
        let mut groups: BTreeMap<InstanceId, Vec<UserId>> = BTreeMap::new();
        if users.is_empty() {
            return groups;
        }

        let owners = match self.presence.get_owners(users).await {
            Ok(owners) => owners,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    unresolved = users.len(),
                    "Presence directory unavailable, delivering to local recipients only"
                );
                report.dropped += users.len();
                return groups;
            }
        };

        for user_id in users {
            match owners.get(user_id) {
                Some(owner) if *owner == self.instance_id => {
                    tracing::debug!(user_id = %user_id, "Ignoring stale presence entry for this instance");
                    report.dropped += 1;
                }
                Some(owner) => groups.entry(owner.clone()).or_default().push(*user_id),
                None => report.dropped += 1,
            }
        }

        groups
    }

    /// One send per local recipient, run concurrently; failures are isolated.
    async fn send_local(
        &self,
        recipients: Vec<(UserId, Arc<dyn ConnectionHandle>)>,
        payload: &NotificationPayload,
    ) -> (usize, usize) {
        let sends = recipients.into_iter().map(|(user_id, handle)| async move {
            let result = handle.send(payload).await;
            if let Err(e) = &result {
                tracing::debug!(
                    user_id = %user_id,
                    connection_id = %handle.connection_id(),
                    error = %e,
                    "Local notification send failed"
                );
            }
            result.is_ok()
        });

        let results = join_all(sends).await;
        let delivered = results.iter().filter(|ok| **ok).count();
        (delivered, results.len() - delivered)
    }

    /// Publish one envelope per owning instance.
    async fn publish_groups(
        &self,
        groups: BTreeMap<InstanceId, Vec<UserId>>,
        payload: &NotificationPayload,
    ) -> (usize, usize) {
        let publishes = groups.into_iter().map(|(owner, recipients)| async move {
            let count = recipients.len();
            let encoded = match NotificationEnvelope::new(recipients, payload).encode() {
                Ok(encoded) => encoded,
                Err(e) => {
                    tracing::error!(owner = %owner, error = %e, "Failed to encode notification envelope");
                    return false;
                }
            };

            match self.bridge.publish(&owner.notification_topic(), &encoded).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(owner = %owner, recipients = count, error = %e, "Dropping notification envelope");
                    false
                }
            }
        });

        let results = join_all(publishes).await;
        let published = results.iter().filter(|ok| **ok).count();
        (published, results.len() - published)
    }
}

#[async_trait]
impl Notifier for NotificationRouter {
    async fn notify(&self, recipients: Vec<UserId>, payload: NotificationPayload) {
        self.fan_out(&recipients, &payload).await;
    }
}

#[async_trait]
impl EnvelopeHandler for NotificationRouter {
    async fn on_envelope(&self, raw: String) {
        self.deliver_envelope(&raw).await;
    }

    fn name(&self) -> &'static str {
        "NotificationRouter"
    }
}
