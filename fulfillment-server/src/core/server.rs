//! Server Implementation
//!
//! HTTP 服务器启动和管理

use crate::api;
use crate::core::tasks::BackgroundTasks;
use crate::core::{Config, ServerState};

/// HTTP Server
pub struct Server {
    config: Config,
    state: ServerState,
    tasks: BackgroundTasks,
}

impl Server {
    /// Initialise state and the notification worker
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let mut tasks = BackgroundTasks::new();
        let state = ServerState::initialize(&config, &mut tasks).await?;
        Ok(Self {
            config,
            state,
            tasks,
        })
    }

    pub fn state(&self) -> &ServerState {
        &self.state
    }

    /// Serve until Ctrl-C, then stop the background tasks
    pub async fn run(self) -> anyhow::Result<()> {
        let Self {
            config,
            state,
            mut tasks,
        } = self;

        state.start_background_tasks(&mut tasks);
        tasks.log_summary();

        let app = api::build_app(&state);

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.http_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Fulfillment server listening on http://{}", addr);

        let shutdown = tasks.shutdown_token();
        let serve_result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => tracing::info!("Shutting down..."),
                    _ = shutdown.cancelled() => {}
                }
            })
            .await;

        tasks.shutdown().await;
        serve_result?;
        Ok(())
    }
}
