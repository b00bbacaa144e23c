//! 过期提醒调度器
//!
//! 每天在 `EXPIRATION_SWEEP_HOUR` (业务时区) 触发一次到期提醒。
//! 失败只记日志并等待次日，不会中断循环。

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use futures::FutureExt;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::VoucherLifecycleManager;

/// 过期提醒调度器
///
/// 注册为 `TaskKind::Periodic`，在 `start_background_tasks()` 中启动。
#[derive(Clone)]
pub struct ExpirationSweepScheduler {
    vouchers: VoucherLifecycleManager,
    shutdown: CancellationToken,
    tz: Tz,
    fire_at: NaiveTime,
    /// 单次执行期间持有
    running: Arc<Mutex<()>>,
}

impl ExpirationSweepScheduler {
    pub fn new(
        vouchers: VoucherLifecycleManager,
        shutdown: CancellationToken,
        tz: Tz,
        hour: u32,
    ) -> Self {
        let fire_at = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
        Self {
            vouchers,
            shutdown,
            tz,
            fire_at,
            running: Arc::new(Mutex::new(())),
        }
    }

    /// 主循环
    pub async fn run(self) {
        tracing::info!(fire_at = %self.fire_at, tz = %self.tz, "Expiration sweep scheduler started");

        loop {
            let sleep_duration = duration_until_next(self.fire_at, self.tz, Utc::now());
            tracing::info!(
                "Next expiration sweep in {} minutes",
                sleep_duration.as_secs() / 60
            );

            tokio::select! {
                _ = tokio::time::sleep(sleep_duration) => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Expiration sweep scheduler received shutdown signal");
                    return;
                }
            }

            self.run_once().await;
        }
    }

    /// 执行一次。失败或上一次仍在运行时返回 `None`
    pub async fn run_once(&self) -> Option<usize> {
        let Ok(_guard) = self.running.try_lock() else {
            tracing::warn!("Expiration sweep still running, skipping this firing");
            return None;
        };

        tracing::info!("Running voucher expiration sweep");
        match AssertUnwindSafe(self.vouchers.send_expiration_warnings())
            .catch_unwind()
            .await
        {
            Ok(Ok(count)) => {
                tracing::info!(count, "Expiration warnings sent");
                Some(count)
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Expiration sweep failed");
                None
            }
            Err(_) => {
                tracing::error!("Expiration sweep panicked");
                None
            }
        }
    }
}

/// 从 `now` 到 `tz` 中下一个 `fire_at` 时刻的间隔
fn duration_until_next(fire_at: NaiveTime, tz: Tz, now: DateTime<Utc>) -> std::time::Duration {
    let now = now.with_timezone(&tz);
    let today = now.date_naive();

    let target_date = if now.time() >= fire_at {
        today + chrono::Duration::days(1)
    } else {
        today
    };

    let target = target_date
        .and_time(fire_at)
        .and_local_timezone(tz)
        .earliest()
        .unwrap_or_else(|| {
            // 夏令时跳变：当天不存在该时刻
            (target_date.and_time(fire_at) + chrono::Duration::hours(1))
                .and_local_timezone(tz)
                .latest()
                .unwrap_or(now + chrono::Duration::hours(1))
        });

    target
        .signed_duration_since(now)
        .to_std()
        .ok()
        .filter(|d| !d.is_zero())
        .unwrap_or(std::time::Duration::from_secs(60))
}
