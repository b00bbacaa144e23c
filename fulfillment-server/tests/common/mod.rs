//! Shared fixtures: in-memory database, notification doubles, seed orders

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fulfillment_server::auth::{JwtConfig, JwtService};
use fulfillment_server::db::DbService;
use fulfillment_server::db::repository::{NewOrder, NewOrderItem, OrderRepository};
use fulfillment_server::notification::{NotificationDispatcher, NotifyError};
use fulfillment_server::{Config, ServerState};
use rust_decimal::Decimal;
use shared::models::{
    NewNotification, NotificationKind, Order, OrderSource, PaymentBreakdown, PickupInfo,
};

pub const JWT_SECRET: &str = "integration-test-secret-key-0123456789abcdef";

/// Keeps every notification it is handed
#[derive(Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<NewNotification>>,
}

impl RecordingDispatcher {
    pub fn sent(&self) -> Vec<NewNotification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count_of(&self, kind: NotificationKind) -> usize {
        self.sent().iter().filter(|n| n.kind == kind).count()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn create(&self, notification: NewNotification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

/// Rejects every notification
#[derive(Default)]
pub struct FailingDispatcher;

#[async_trait]
impl NotificationDispatcher for FailingDispatcher {
    async fn create(&self, _notification: NewNotification) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("gateway down".into()))
    }
}

pub struct TestEnv {
    pub state: ServerState,
    pub repo: OrderRepository,
}

/// Fresh in-memory database wired to `notifier`
pub async fn env_with(notifier: Arc<dyn NotificationDispatcher>) -> TestEnv {
    let db = DbService::in_memory().await.expect("in-memory database");
    let repo = OrderRepository::new(db.pool.clone());

    let mut config = Config::with_overrides("./target/test-data", "sqlite::memory:", 0);
    config.business_timezone = chrono_tz::America::Sao_Paulo;
    config.batch_concurrency = 4;
    config.max_batch_size = 5;
    config.jwt = JwtConfig::with_secret(JWT_SECRET);

    let jwt = Arc::new(JwtService::with_config(config.jwt.clone()));
    let state = ServerState::from_parts(config, db, jwt, notifier);
    TestEnv { state, repo }
}

pub async fn env() -> (TestEnv, Arc<RecordingDispatcher>) {
    let recorder = Arc::new(RecordingDispatcher::default());
    let env = env_with(recorder.clone()).await;
    (env, recorder)
}

fn next_code(prefix: &str) -> String {
    static SEQ: AtomicU32 = AtomicU32::new(1);
    format!("{}-{:05}", prefix, SEQ.fetch_add(1, Ordering::Relaxed))
}

pub fn money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Order builder with sensible defaults
pub struct OrderSeed {
    pub user_id: i64,
    pub source: OrderSource,
    pub payment: PaymentBreakdown,
    pub pickup_code: Option<String>,
    pub items: Vec<NewOrderItem>,
}

impl OrderSeed {
    pub fn for_user(user_id: i64) -> Self {
        Self {
            user_id,
            source: OrderSource::App,
            payment: PaymentBreakdown {
                points_used: 300,
                money_paid: money(4590),
                cashback_earned: money(230),
            },
            pickup_code: None,
            items: vec![
                NewOrderItem::regular("Açaí 500ml", 2, money(1895)),
                NewOrderItem::regular("Pão de queijo", 1, money(800)),
            ],
        }
    }

    pub fn with_items(mut self, items: Vec<NewOrderItem>) -> Self {
        self.items = items;
        self
    }

    pub fn with_source(mut self, source: OrderSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_pickup_code(mut self, code: &str) -> Self {
        self.pickup_code = Some(code.to_string());
        self
    }

    pub async fn insert(self, repo: &OrderRepository) -> Order {
        repo.insert_order(NewOrder {
            code: next_code("PED"),
            user_id: self.user_id,
            source: self.source,
            payment: self.payment,
            pickup: PickupInfo {
                pickup_code: self.pickup_code,
                location: Some("Loja Centro".into()),
                scheduled_at: None,
            },
            items: self.items,
        })
        .await
        .expect("insert order")
    }
}

/// A single-voucher order for `user_id`
pub async fn voucher_order(
    repo: &OrderRepository,
    user_id: i64,
    expires_at: Option<i64>,
) -> (Order, String) {
    let code = next_code("VCH");
    let order = OrderSeed::for_user(user_id)
        .with_items(vec![NewOrderItem::voucher("Café grátis", &code, expires_at)])
        .insert(repo)
        .await;
    (order, code)
}

pub fn days(n: i64) -> i64 {
    n * shared::util::DAY_MILLIS
}
