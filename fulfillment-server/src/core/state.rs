use std::sync::Arc;

use crate::auth::JwtService;
use crate::core::Config;
use crate::core::tasks::{BackgroundTasks, TaskKind};
use crate::db::DbService;
use crate::db::repository::{OrderRepository, OrderStore, VoucherRepository, VoucherStore};
use crate::notification::{
    LogDispatcher, NotificationDispatcher, NotificationWorker, QueuedDispatcher, WebhookDispatcher,
};
use crate::orders::{BatchOperationCoordinator, OrderStatusMachine, PickupValidator};
use crate::utils::{AppError, AppResult};
use crate::vouchers::{ExpirationSweepScheduler, VoucherLifecycleManager};

/// 服务器状态 - 持有所有服务的共享引用
///
/// 组件内部都是 `Arc`，clone 成本极低。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | db | SQLite 连接池 |
/// | jwt_service | JWT 认证服务 |
/// | notifier | 通知分发 (生产环境为队列) |
/// | orders | 订单存储 (读取/列表) |
/// | status_machine | 订单状态机 |
/// | batch | 批量状态更新 |
/// | pickup | 取货码校验 |
/// | vouchers | 券生命周期 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub jwt_service: Arc<JwtService>,
    pub notifier: Arc<dyn NotificationDispatcher>,
    pub orders: Arc<dyn OrderStore>,
    pub status_machine: OrderStatusMachine,
    pub batch: BatchOperationCoordinator,
    pub pickup: PickupValidator,
    pub vouchers: VoucherLifecycleManager,
}

impl ServerState {
    /// Wire every component over one database and one dispatcher
    pub fn from_parts(
        config: Config,
        db: DbService,
        jwt_service: Arc<JwtService>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        let orders: Arc<dyn OrderStore> = Arc::new(OrderRepository::new(db.pool.clone()));
        let voucher_store: Arc<dyn VoucherStore> =
            Arc::new(VoucherRepository::new(db.pool.clone()));

        let status_machine = OrderStatusMachine::new(orders.clone(), notifier.clone());
        let batch = BatchOperationCoordinator::new(status_machine.clone(), config.batch_concurrency);
        let pickup = PickupValidator::new(orders.clone());
        let vouchers = VoucherLifecycleManager::new(voucher_store, notifier.clone());

        Self {
            config,
            db,
            jwt_service,
            notifier,
            orders,
            status_machine,
            batch,
            pickup,
            vouchers,
        }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录
    /// 2. 数据库 (迁移)
    /// 3. 通知分发：webhook 或日志，外面包一层队列，队列 Worker 注册到 `tasks`
    /// 4. 各组件
    pub async fn initialize(config: &Config, tasks: &mut BackgroundTasks) -> AppResult<Self> {
        config.ensure_work_dir().map_err(|e| {
            AppError::with_message(
                shared::ErrorCode::ConfigError,
                format!("Failed to create work directory {}: {}", config.work_dir, e),
            )
        })?;

        let db = DbService::new(&config.database_url).await?;

        let delivery: Arc<dyn NotificationDispatcher> = match &config.notification_webhook_url {
            Some(url) => {
                let webhook = WebhookDispatcher::new(url.clone(), config.notification_timeout())
                    .map_err(|e| {
                        AppError::with_message(
                            shared::ErrorCode::ConfigError,
                            format!("Invalid notification webhook: {}", e),
                        )
                    })?;
                tracing::info!(url = %url, "Notifications delivered by webhook");
                Arc::new(webhook)
            }
            None => {
                tracing::info!("No NOTIFICATION_WEBHOOK_URL, notifications go to the log");
                Arc::new(LogDispatcher)
            }
        };

        let (queue, rx) = QueuedDispatcher::new(
            config.notification_queue_size,
            config.notification_timeout(),
        );
        let worker = NotificationWorker::new(delivery);
        let shutdown = tasks.shutdown_token();
        tasks.spawn("notification_worker", TaskKind::Worker, worker.run(rx, shutdown));

        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        Ok(Self::from_parts(config.clone(), db, jwt_service, Arc::new(queue)))
    }

    /// 启动定时任务
    ///
    /// - 券过期提醒 (每日 `EXPIRATION_SWEEP_HOUR`，业务时区)
    pub fn start_background_tasks(&self, tasks: &mut BackgroundTasks) {
        let scheduler = ExpirationSweepScheduler::new(
            self.vouchers.clone(),
            tasks.shutdown_token(),
            self.config.tz(),
            self.config.expiration_sweep_hour,
        );
        tasks.spawn("expiration_sweep", TaskKind::Periodic, scheduler.run());
    }

    /// 获取 JWT 服务
    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }
}
