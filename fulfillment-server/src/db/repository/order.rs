//! Order Repository

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{
    ActorRole, ItemType, Order, OrderItem, OrderSource, OrderStatus, OrderSummary,
    PaymentBreakdown, PickupInfo, TimelineEntry,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::{OrderFilter, OrderStore, RepoError, RepoResult, from_cents, to_cents};

const ORDER_SELECT: &str = "SELECT id, code, user_id, status, source, points_used, money_paid_cents, cashback_cents, pickup_code, pickup_location, pickup_scheduled_at, created_at, updated_at FROM orders";

pub(crate) const ITEM_COLUMNS: &str = "i.id, i.order_id, i.product_name, i.product_image, i.item_type, i.quantity, i.unit_price_cents, i.unit_points, i.voucher_code, i.voucher_used, i.voucher_used_at, i.voucher_used_by, i.voucher_expires_at, i.created_at";

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    code: String,
    user_id: i64,
    status: String,
    source: String,
    points_used: i64,
    money_paid_cents: i64,
    cashback_cents: i64,
    pickup_code: Option<String>,
    pickup_location: Option<String>,
    pickup_scheduled_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl OrderRow {
    fn payment(&self) -> PaymentBreakdown {
        PaymentBreakdown {
            points_used: self.points_used,
            money_paid: from_cents(self.money_paid_cents),
            cashback_earned: from_cents(self.cashback_cents),
        }
    }

    fn into_order(self, items: Vec<OrderItem>, timeline: Vec<TimelineEntry>) -> RepoResult<Order> {
        Ok(Order {
            payment: self.payment(),
            status: parse_status(&self.status)?,
            source: parse_source(&self.source)?,
            id: self.id,
            code: self.code,
            user_id: self.user_id,
            pickup: PickupInfo {
                pickup_code: self.pickup_code,
                location: self.pickup_location,
                scheduled_at: self.pickup_scheduled_at,
            },
            items,
            timeline,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderSummaryRow {
    #[sqlx(flatten)]
    order: OrderRow,
    items_count: i64,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ItemRow {
    id: i64,
    order_id: i64,
    product_name: String,
    product_image: Option<String>,
    item_type: String,
    quantity: i32,
    unit_price_cents: i64,
    unit_points: i64,
    voucher_code: Option<String>,
    voucher_used: bool,
    voucher_used_at: Option<i64>,
    voucher_used_by: Option<i64>,
    voucher_expires_at: Option<i64>,
    created_at: i64,
}

impl TryFrom<ItemRow> for OrderItem {
    type Error = RepoError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        Ok(OrderItem {
            item_type: row
                .item_type
                .parse::<ItemType>()
                .map_err(RepoError::Database)?,
            id: row.id,
            order_id: row.order_id,
            product_name: row.product_name,
            product_image: row.product_image,
            quantity: row.quantity,
            unit_price: from_cents(row.unit_price_cents),
            unit_points: row.unit_points,
            voucher_code: row.voucher_code,
            voucher_used: row.voucher_used,
            voucher_used_at: row.voucher_used_at,
            voucher_used_by: row.voucher_used_by,
            voucher_expires_at: row.voucher_expires_at,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TimelineRow {
    status: String,
    actor_id: Option<i64>,
    actor_role: String,
    notes: Option<String>,
    created_at: i64,
}

impl TryFrom<TimelineRow> for TimelineEntry {
    type Error = RepoError;

    fn try_from(row: TimelineRow) -> Result<Self, Self::Error> {
        Ok(TimelineEntry {
            status: parse_status(&row.status)?,
            actor_id: row.actor_id,
            actor_role: row
                .actor_role
                .parse::<ActorRole>()
                .map_err(RepoError::Database)?,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

pub(crate) fn parse_status(value: &str) -> RepoResult<OrderStatus> {
    value.parse().map_err(RepoError::Database)
}

fn parse_source(value: &str) -> RepoResult<OrderSource> {
    value.parse().map_err(RepoError::Database)
}

// =============================================================================
// Placement input
// =============================================================================

/// Order as handed over by the placement flow
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub code: String,
    pub user_id: i64,
    pub source: OrderSource,
    pub payment: PaymentBreakdown,
    pub pickup: PickupInfo,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_name: String,
    pub product_image: Option<String>,
    pub item_type: ItemType,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub unit_points: i64,
    pub voucher_code: Option<String>,
    pub voucher_expires_at: Option<i64>,
}

impl NewOrderItem {
    pub fn regular(product_name: impl Into<String>, quantity: i32, unit_price: Decimal) -> Self {
        Self {
            product_name: product_name.into(),
            product_image: None,
            item_type: ItemType::Regular,
            quantity,
            unit_price,
            unit_points: 0,
            voucher_code: None,
            voucher_expires_at: None,
        }
    }

    pub fn voucher(
        product_name: impl Into<String>,
        voucher_code: impl Into<String>,
        voucher_expires_at: Option<i64>,
    ) -> Self {
        Self {
            product_name: product_name.into(),
            product_image: None,
            item_type: ItemType::Voucher,
            quantity: 1,
            unit_price: Decimal::ZERO,
            unit_points: 0,
            voucher_code: Some(voucher_code.into()),
            voucher_expires_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

#[derive(Clone, Debug)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a freshly placed order in PENDING with its items and first
    /// timeline entry, in one transaction.
    pub async fn insert_order(&self, data: NewOrder) -> RepoResult<Order> {
        if data.code.trim().is_empty() {
            return Err(RepoError::Validation("Order code is required".into()));
        }
        for item in &data.items {
            if item.quantity <= 0 {
                return Err(RepoError::Validation(format!(
                    "Invalid quantity for {}",
                    item.product_name
                )));
            }
            if item.item_type == ItemType::Voucher && item.voucher_code.is_none() {
                return Err(RepoError::Validation(format!(
                    "Voucher item {} has no voucher code",
                    item.product_name
                )));
            }
        }

        let now = shared::util::now_millis();
        let id = shared::util::snowflake_id();
        let code = shared::util::normalize_code(&data.code);
        let pickup_code = data
            .pickup
            .pickup_code
            .as_deref()
            .map(shared::util::normalize_code);

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders (id, code, user_id, status, source, points_used, money_paid_cents, cashback_cents, pickup_code, pickup_location, pickup_scheduled_at, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)",
        )
        .bind(id)
        .bind(&code)
        .bind(data.user_id)
        .bind(OrderStatus::Pending.as_str())
        .bind(data.source.as_str())
        .bind(data.payment.points_used)
        .bind(to_cents(data.payment.money_paid)?)
        .bind(to_cents(data.payment.cashback_earned)?)
        .bind(&pickup_code)
        .bind(&data.pickup.location)
        .bind(data.pickup.scheduled_at)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for item in &data.items {
            sqlx::query(
                "INSERT INTO order_item (id, order_id, product_name, product_image, item_type, quantity, unit_price_cents, unit_points, voucher_code, voucher_expires_at, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )
            .bind(shared::util::snowflake_id())
            .bind(id)
            .bind(&item.product_name)
            .bind(&item.product_image)
            .bind(item.item_type.as_str())
            .bind(item.quantity)
            .bind(to_cents(item.unit_price)?)
            .bind(item.unit_points)
            .bind(item.voucher_code.as_deref().map(shared::util::normalize_code))
            .bind(item.voucher_expires_at)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "INSERT INTO order_timeline (order_id, status, actor_id, actor_role, notes, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(id)
        .bind(OrderStatus::Pending.as_str())
        .bind(data.user_id)
        .bind(ActorRole::Member.as_str())
        .bind("Order placed")
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(order_id = id, code = %code, user_id = data.user_id, "Order inserted");

        self.find_order(id)
            .await?
            .ok_or_else(|| RepoError::Database(format!("Failed to read back order {id}")))
    }

    async fn load(&self, row: OrderRow) -> RepoResult<Order> {
        let items = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_item i WHERE i.order_id = ? ORDER BY i.created_at, i.id"
        ))
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(OrderItem::try_from)
        .collect::<RepoResult<Vec<_>>>()?;

        let timeline = sqlx::query_as::<_, TimelineRow>(
            "SELECT status, actor_id, actor_role, notes, created_at FROM order_timeline WHERE order_id = ? ORDER BY id",
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(TimelineEntry::try_from)
        .collect::<RepoResult<Vec<_>>>()?;

        row.into_order(items, timeline)
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &OrderFilter) {
    builder.push(" WHERE 1 = 1");
    if let Some(status) = filter.status {
        builder.push(" AND o.status = ").push_bind(status.as_str());
    }
    if let Some(source) = filter.source {
        builder.push(" AND o.source = ").push_bind(source.as_str());
    }
    if let Some(user_id) = filter.user_id {
        builder.push(" AND o.user_id = ").push_bind(user_id);
    }
    if let Some(from) = filter.created_from {
        builder.push(" AND o.created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.created_to {
        builder.push(" AND o.created_at < ").push_bind(to);
    }
}

#[async_trait]
impl OrderStore for OrderRepository {
    async fn find_order(&self, id: i64) -> RepoResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{ORDER_SELECT} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(self.load(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_order_by_code(&self, code: &str) -> RepoResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "{ORDER_SELECT} WHERE code = ?1 OR pickup_code = ?1 LIMIT 1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(Some(self.load(row).await?)),
            None => Ok(None),
        }
    }

    async fn list_orders(&self, filter: &OrderFilter) -> RepoResult<(Vec<OrderSummary>, u64)> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM orders o");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Sqlite>::new(
            "SELECT o.id, o.code, o.user_id, o.status, o.source, o.points_used, o.money_paid_cents, o.cashback_cents, o.pickup_code, o.pickup_location, o.pickup_scheduled_at, o.created_at, o.updated_at, COALESCE((SELECT SUM(i.quantity) FROM order_item i WHERE i.order_id = o.id), 0) AS items_count FROM orders o",
        );
        push_filters(&mut select, filter);
        select
            .push(" ORDER BY o.created_at DESC, o.id DESC LIMIT ")
            .push_bind(i64::from(filter.limit))
            .push(" OFFSET ")
            .push_bind(filter.offset());

        let rows: Vec<OrderSummaryRow> = select.build_query_as().fetch_all(&self.pool).await?;
        let summaries = rows
            .into_iter()
            .map(|row| {
                let order = row.order;
                Ok(OrderSummary {
                    payment: order.payment(),
                    status: parse_status(&order.status)?,
                    source: parse_source(&order.source)?,
                    id: order.id,
                    code: order.code,
                    user_id: order.user_id,
                    items_count: row.items_count,
                    created_at: order.created_at,
                    updated_at: order.updated_at,
                })
            })
            .collect::<RepoResult<Vec<_>>>()?;

        Ok((summaries, u64::try_from(total).unwrap_or_default()))
    }

    async fn transition_status(
        &self,
        id: i64,
        from: OrderStatus,
        to: OrderStatus,
        entry: &TimelineEntry,
    ) -> RepoResult<bool> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
        )
        .bind(to.as_str())
        .bind(entry.created_at)
        .bind(id)
        .bind(from.as_str())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO order_timeline (order_id, status, actor_id, actor_role, notes, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(id)
        .bind(entry.status.as_str())
        .bind(entry.actor_id)
        .bind(entry.actor_role.as_str())
        .bind(&entry.notes)
        .bind(entry.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}
