use std::sync::Arc;

use anyhow::Context;
use tokio::{net::TcpListener, signal, sync::mpsc};
use tracing::{info, warn};

use workorder_api::{
    app_router,
    config::{init_tracing, load_config},
    db,
    directory::{DbDirectory, DirectoryService},
    events::{process_events, EventSender},
    services::{
        notifications::{
            LogOnlyDispatcher, MessageDispatcher, NotificationCoordinator, WebhookDispatcher,
        },
        work_orders::{LifecyclePolicy, WorkOrderService},
    },
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;
    init_tracing(config.log_level(), config.log_json);

    info!(environment = %config.environment, "starting work order service");

    let db = Arc::new(
        db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?,
    );

    if config.auto_migrate {
        db::run_migrations(&db)
            .await
            .context("failed to run migrations")?;
    }

    let (tx, rx) = mpsc::channel(1024);
    let event_sender = EventSender::new(tx);
    tokio::spawn(process_events(rx));

    let dispatcher: Arc<dyn MessageDispatcher> = match &config.dispatcher_webhook_url {
        Some(url) => {
            info!(%url, "using webhook notification dispatcher");
            Arc::new(WebhookDispatcher::new(url.clone()))
        }
        None => {
            warn!("no dispatcher webhook configured; notifications will be logged only");
            Arc::new(LogOnlyDispatcher)
        }
    };

    let directory: Arc<dyn DirectoryService> = Arc::new(DbDirectory::new(Arc::clone(&db)));
    let notifier = Arc::new(NotificationCoordinator::new(
        Arc::clone(&db),
        Arc::clone(&directory),
        dispatcher,
    ));
    let work_orders = Arc::new(WorkOrderService::new(
        Arc::clone(&db),
        Arc::clone(&directory),
        notifier,
        Some(Arc::new(event_sender.clone())),
        LifecyclePolicy {
            supervisor_create_bypass: config.supervisor_create_bypass,
        },
    ));

    let addr = config.server_addr();
    let state = AppState {
        db,
        config,
        event_sender,
        work_orders,
        directory,
    };

    let app = app_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
