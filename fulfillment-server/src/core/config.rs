use std::path::PathBuf;

use chrono_tz::Tz;

use crate::auth::JwtConfig;

/// 服务器配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖 (启动时先加载 `.env`)：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库、日志) |
/// | DATABASE_URL | sqlite://{WORK_DIR}/fulfillment.db | SQLite 数据库 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (未设置) | 滚动日志目录 |
/// | BUSINESS_TIMEZONE | America/Sao_Paulo | 业务时区 (日期过滤、过期提醒) |
/// | EXPIRATION_SWEEP_HOUR | 9 | 每日过期提醒的整点 (0-23) |
/// | NOTIFICATION_WEBHOOK_URL | (未设置) | 通知 webhook，未设置时只写日志 |
/// | NOTIFICATION_TIMEOUT_MS | 5000 | webhook 请求超时 |
/// | NOTIFICATION_QUEUE_SIZE | 1024 | 通知队列容量 |
/// | BATCH_CONCURRENCY | 8 | 批量操作并发数 |
/// | MAX_BATCH_SIZE | 100 | 单次批量请求的最大订单数 |
///
/// JWT 相关变量见 [`JwtConfig::from_env`]。
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/fulfillment HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录
    pub work_dir: String,
    pub database_url: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_dir: Option<String>,
    /// 业务时区
    pub business_timezone: Tz,
    /// 每日过期提醒的整点
    pub expiration_sweep_hour: u32,
    pub notification_webhook_url: Option<String>,
    pub notification_timeout_ms: u64,
    pub notification_queue_size: usize,
    /// 批量操作并发数
    pub batch_concurrency: usize,
    /// 单次批量请求的最大订单数
    pub max_batch_size: usize,
    /// JWT 认证配置
    pub jwt: JwtConfig,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置或无法解析，使用默认值
    pub fn from_env() -> Self {
        let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into());
        let database_url = env_opt("DATABASE_URL").unwrap_or_else(|| {
            format!(
                "sqlite://{}",
                PathBuf::from(&work_dir).join("fulfillment.db").display()
            )
        });

        let business_timezone = match std::env::var("BUSINESS_TIMEZONE") {
            Ok(name) => name.parse::<Tz>().unwrap_or_else(|_| {
                tracing::warn!(timezone = %name, "Unknown BUSINESS_TIMEZONE, using America/Sao_Paulo");
                chrono_tz::America::Sao_Paulo
            }),
            Err(_) => chrono_tz::America::Sao_Paulo,
        };

        let mut expiration_sweep_hour: u32 = env_or("EXPIRATION_SWEEP_HOUR", 9);
        if expiration_sweep_hour > 23 {
            tracing::warn!(
                hour = expiration_sweep_hour,
                "EXPIRATION_SWEEP_HOUR out of range, clamping to 23"
            );
            expiration_sweep_hour = 23;
        }

        Self {
            work_dir,
            database_url,
            http_port: env_or("HTTP_PORT", 3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: env_opt("LOG_DIR"),
            business_timezone,
            expiration_sweep_hour,
            notification_webhook_url: env_opt("NOTIFICATION_WEBHOOK_URL"),
            notification_timeout_ms: env_or("NOTIFICATION_TIMEOUT_MS", 5000),
            notification_queue_size: env_or::<usize>("NOTIFICATION_QUEUE_SIZE", 1024).max(1),
            batch_concurrency: env_or::<usize>("BATCH_CONCURRENCY", 8).max(1),
            max_batch_size: env_or::<usize>("MAX_BATCH_SIZE", 100).max(1),
            jwt: JwtConfig::from_env(),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(
        work_dir: impl Into<String>,
        database_url: impl Into<String>,
        http_port: u16,
    ) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.database_url = database_url.into();
        config.http_port = http_port;
        config
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 业务时区
    pub fn tz(&self) -> Tz {
        self.business_timezone
    }

    pub fn notification_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.notification_timeout_ms)
    }

    /// 确保工作目录存在
    pub fn ensure_work_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.work_dir)?;
        if let Some(dir) = &self.log_dir {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        // Variables that are never set by the test harness
        assert_eq!(env_or("FULFILLMENT_TEST_UNSET_PORT", 3000u16), 3000);
        unsafe { std::env::set_var("FULFILLMENT_TEST_BAD_PORT", "not-a-port") };
        assert_eq!(env_or("FULFILLMENT_TEST_BAD_PORT", 3000u16), 3000);
        unsafe { std::env::set_var("FULFILLMENT_TEST_GOOD_PORT", " 8080 ") };
        assert_eq!(env_or("FULFILLMENT_TEST_GOOD_PORT", 3000u16), 8080);
    }

    #[test]
    fn test_empty_optional_is_none() {
        unsafe { std::env::set_var("FULFILLMENT_TEST_EMPTY", "  ") };
        assert_eq!(env_opt("FULFILLMENT_TEST_EMPTY"), None);
    }

    #[test]
    fn test_with_overrides() {
        let config = Config::with_overrides("/tmp/x", "sqlite::memory:", 0);
        assert_eq!(config.work_dir, "/tmp/x");
        assert_eq!(config.database_url, "sqlite::memory:");
        assert!(config.expiration_sweep_hour <= 23);
        assert!(config.batch_concurrency >= 1);
    }
}
