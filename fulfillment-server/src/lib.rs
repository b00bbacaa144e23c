//! Fulfillment Server - 订单履约与券核销服务
//!
//! # 架构概述
//!
//! - **订单** (`orders`): 状态机、取消退款计算、取货码校验、批量操作
//! - **券** (`vouchers`): 校验、一次性核销、过期提醒调度
//! - **通知** (`notification`): 日志 / webhook 分发，队列化、尽力而为
//! - **数据库** (`db`): SQLite (sqlx) 存储与仓储
//! - **认证** (`auth`): JWT
//! - **HTTP API** (`api`): 会员与后台路由
//!
//! # 模块结构
//!
//! ```text
//! fulfillment-server/src/
//! ├── core/          # 配置、状态、服务器、后台任务
//! ├── auth/          # JWT 认证、中间件
//! ├── api/           # HTTP 路由和处理器
//! ├── utils/         # 日志、时间、校验
//! ├── db/            # 数据库层
//! ├── notification/  # 通知分发
//! ├── orders/        # 订单履约
//! └── vouchers/      # 券生命周期
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod notification;
pub mod orders;
pub mod utils;
pub mod vouchers;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use orders::{BatchOperationCoordinator, OrderStatusMachine, PickupValidator};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use vouchers::{ExpirationSweepScheduler, VoucherLifecycleManager};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 进程级初始化: `.env`、日志
///
/// 必须在 [`Config::from_env`] 之前调用，配置加载时的告警才能进日志。
pub fn setup_environment() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into());
    let log_dir = std::env::var("LOG_DIR").ok().filter(|d| !d.trim().is_empty());
    if let Some(dir) = &log_dir {
        std::fs::create_dir_all(dir)?;
    }
    init_logger_with_file(&log_level, log_dir.as_deref());
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    ____        __  _____ ____
   / __/_  __  / / / __(_) / /___ ___  ___  ____  / /_
  / /_/ / / / / / / /_/ / / / __ `__ \/ _ \/ __ \/ __/
 / __/ /_/ / / / / __/ / / / / / / / /  __/ / / / /_
/_/  \__,_/_/_/ /_/ /_/_/_/_/ /_/ /_/\___/_/ /_/\__/
    "#
    );
}
