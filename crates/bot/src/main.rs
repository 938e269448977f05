use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dinebot_bot::config::{BotConfig, UpdateMode};
use dinebot_bot::context::BotContext;
use dinebot_bot::dispatcher::SessionDispatcher;
use dinebot_bot::effects::EffectRunner;
use dinebot_bot::maintenance::MaintenanceReporter;
use dinebot_bot::notifications::NotificationRouter;
use dinebot_bot::router::UpdateRouter;
use dinebot_bot::routes;
use dinebot_bot::state::AppState;
use dinebot_core::clock::{Clock, SystemClock};
use dinebot_core::memory::InMemoryRepository;
use dinebot_core::repository::Repository;
use dinebot_core::transport::Transport;
use dinebot_telegram::{BotApi, TelegramTransport, UpdatePoller};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "dinebot_bot=debug,dinebot_telegram=info,tower_http=info".into()
    });
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // --- Configuration ---
    let config = BotConfig::from_env().context("Invalid configuration")?;
    tracing::info!(
        mode = ?config.update_mode,
        staff_chat = config.settings.staff_chat_id,
        offset = %config.settings.utc_offset,
        "Loaded bot configuration"
    );

    // --- Store ---
    let (repo, pool): (Arc<dyn Repository>, Option<dinebot_db::DbPool>) = match &config.database_url {
        Some(database_url) => {
            let pool = dinebot_db::create_pool(database_url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Database connection pool created");

            dinebot_db::health_check(&pool)
                .await
                .context("Database health check failed")?;
            tracing::info!("Database health check passed");

            dinebot_db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");

            (Arc::new(dinebot_db::PgStore::new(pool.clone())), Some(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store");
            (Arc::new(InMemoryRepository::new()), None)
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    repo.ensure_admin(config.settings.developer_id, clock.now())
        .await
        .context("Failed to bootstrap the developer account")?;

    // --- Telegram ---
    let api = Arc::new(BotApi::new(&config.telegram_token));
    let me = api.get_me().await.context("Telegram getMe failed")?;
    tracing::info!(bot_id = me.id, username = ?me.username, "Connected to Telegram");
    let transport: Arc<dyn Transport> = Arc::new(TelegramTransport::new(Arc::clone(&api), me.id));

    // --- Event bus ---
    let event_bus = Arc::new(dinebot_events::EventBus::default());
    let notification_router =
        NotificationRouter::new(Arc::clone(&transport), config.settings.clone());
    let router_handle = tokio::spawn(notification_router.run(event_bus.subscribe()));
    tracing::info!("Notification router started");

    // --- Dispatcher ---
    let ctx = Arc::new(BotContext::new(repo, clock, config.settings.clone()));
    let dispatcher = SessionDispatcher::new(
        UpdateRouter::new(ctx),
        EffectRunner::new(Arc::clone(&transport), Arc::clone(&event_bus)),
        MaintenanceReporter::new(Arc::clone(&transport), config.settings.developer_id),
    )
    .with_idle_timeout(Duration::from_secs(config.session_idle_minutes * 60));

    // --- Updates ---
    match config.update_mode {
        UpdateMode::Polling => {
            let cancel = CancellationToken::new();
            let poller = UpdatePoller::new(Arc::clone(&api), config.poll_timeout_secs);
            let poll_dispatcher = dispatcher.clone();
            let poll_cancel = cancel.clone();
            let poll_handle = tokio::spawn(async move {
                poller
                    .run(poll_cancel, move |inbound| poll_dispatcher.dispatch(inbound))
                    .await;
            });

            shutdown_signal().await;
            cancel.cancel();
            let _ = tokio::time::timeout(Duration::from_secs(5), poll_handle).await;
        }
        UpdateMode::Webhook => {
            let state = AppState {
                dispatcher: dispatcher.clone(),
                pool,
                webhook_secret: config.webhook_secret.as_deref().map(Arc::from),
            };

            let host: IpAddr = config.host.parse().context("Invalid HOST address")?;
            let addr = SocketAddr::new(host, config.port);
            tracing::info!(%addr, "Starting webhook listener");

            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .context("Failed to bind to address")?;
            axum::serve(listener, routes::app(state))
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("Server error")?;
        }
    }

    // --- Post-shutdown cleanup ---
    tracing::info!("Stopped receiving updates, cleaning up");

    dispatcher.shutdown().await;

    // Dropping every EventBus handle closes the channel and stops the router.
    drop(dispatcher);
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), router_handle).await;
    tracing::info!("Notification router stopped");

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
