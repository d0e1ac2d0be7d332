//! Notification fan-out server.
//!
//! Wires Redis presence and pub/sub, the channel membership reader, the
//! notification router, the event ingress and the WebSocket transport, then
//! serves until SIGINT/SIGTERM.

use std::error::Error;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use messenger_fanout::adapters::http::{app_router, AppState, EventIngress};
use messenger_fanout::adapters::{
    InMemoryChannelMembership, InMemoryEventBus, PostgresChannelMembership, RedisNotificationBridge,
    RedisPresenceDirectory, WebSocketState,
};
use messenger_fanout::application::notifications::{
    BackgroundNotifier, ChannelEventNotifier, ConnectionLifecycle, ConnectionRegistry,
    NotificationRouter,
};
use messenger_fanout::config::{AppConfig, DatabaseConfig};
use messenger_fanout::domain::messaging::NotificationKind;
use messenger_fanout::ports::{ChannelMembershipReader, NotificationBridge, PresenceDirectory};

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Spawns a task that cancels `cancel_token` on SIGTERM/SIGINT.
fn setup_shutdown_signal(cancel_token: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
            }
            _ = terminate => {
                tracing::info!("Received SIGTERM, initiating graceful shutdown...");
            }
        }

        cancel_token.cancel();
    });
}

async fn membership_reader(
    database: Option<&DatabaseConfig>,
) -> Result<Arc<dyn ChannelMembershipReader>, sqlx::Error> {
    match database {
        Some(db) => {
            let pool = db.pool_options().connect(&db.url).await?;
            tracing::info!("Channel membership backed by PostgreSQL");
            Ok(Arc::new(PostgresChannelMembership::new(pool)))
        }
        None => {
            tracing::warn!("No database configured, channel membership served from memory");
            Ok(Arc::new(InMemoryChannelMembership::new()))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config);

    let instance_id = config.server.instance_id();
    tracing::info!(instance_id = %instance_id, environment = ?config.server.environment, "Starting notification fan-out");

    let shutdown = CancellationToken::new();
    setup_shutdown_signal(shutdown.clone());

    // Redis: one multiplexed connection for commands, pub/sub opens its own
    let redis_client = redis::Client::open(config.redis.url.as_str())?;
    let redis_conn = redis_client.get_multiplexed_tokio_connection().await?;

    let presence: Arc<dyn PresenceDirectory> = Arc::new(RedisPresenceDirectory::new(
        redis_conn.clone(),
        config.notifications.presence_ttl_secs,
        config.redis.timeout(),
    ));
    let bridge: Arc<dyn NotificationBridge> = Arc::new(RedisNotificationBridge::new(
        redis_client,
        redis_conn,
        config.redis.timeout(),
        shutdown.clone(),
    ));
    let members = membership_reader(config.database.as_ref()).await?;

    let registry = Arc::new(ConnectionRegistry::new());
    let router = Arc::new(NotificationRouter::new(
        instance_id.clone(),
        registry.clone(),
        presence.clone(),
        bridge,
    ));
    router.listen().await?;

    let lifecycle = Arc::new(ConnectionLifecycle::new(instance_id.clone(), registry, presence));

    // In-flight deliveries get a grace period after the server stops
    let delivery_cutoff = CancellationToken::new();
    let notifier = Arc::new(BackgroundNotifier::new(router.clone(), delivery_cutoff.clone()));

    let event_bus = Arc::new(InMemoryEventBus::new());
    ChannelEventNotifier::register_all(members, notifier.clone(), event_bus.as_ref());
    for kind in NotificationKind::ALL {
        tracing::debug!(
            event_type = kind.source_event_type(),
            handlers = event_bus.handler_count(kind.source_event_type()),
            "Event subscription ready"
        );
    }

    let state = WebSocketState::new(
        lifecycle.clone(),
        config.notifications.outbound_buffer,
        config.notifications.heartbeat_interval(),
    );
    let app = app_router(AppState {
        websocket: state,
        events: EventIngress::new(event_bus),
    });

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening for connections");

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
        .await?;

    shutdown.cancel();
    lifecycle.shutdown().await;
    notifier.drain(config.server.shutdown_grace()).await;
    delivery_cutoff.cancel();

    tracing::info!(instance_id = %instance_id, "Shutdown complete");
    Ok(())
}
