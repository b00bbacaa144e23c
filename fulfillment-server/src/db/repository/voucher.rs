//! Voucher Repository
//!
//! Vouchers are `order_item` rows of type VOUCHER, always read joined with
//! their parent order.

use async_trait::async_trait;
use shared::models::{ItemType, OrderItem, OrderStatus, Voucher, VoucherOrderRef};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::order::{ITEM_COLUMNS, ItemRow, parse_status};
use super::{RepoResult, VoucherQuery, VoucherStore};

#[derive(Debug, sqlx::FromRow)]
struct VoucherRow {
    #[sqlx(flatten)]
    item: ItemRow,
    order_code: String,
    order_user_id: i64,
    order_status: String,
}

impl VoucherRow {
    fn into_voucher(self) -> RepoResult<Voucher> {
        let status = parse_status(&self.order_status)?;
        let item = OrderItem::try_from(self.item)?;
        Ok(Voucher {
            order: VoucherOrderRef {
                id: item.order_id,
                code: self.order_code,
                user_id: self.order_user_id,
                status,
            },
            item,
        })
    }
}

fn voucher_select() -> String {
    format!(
        "SELECT {ITEM_COLUMNS}, o.code AS order_code, o.user_id AS order_user_id, o.status AS order_status FROM order_item i JOIN orders o ON o.id = i.order_id WHERE i.item_type = '{}'",
        ItemType::Voucher.as_str()
    )
}

#[derive(Clone, Debug)]
pub struct VoucherRepository {
    pool: SqlitePool,
}

impl VoucherRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoucherStore for VoucherRepository {
    async fn find_voucher_by_code(&self, code: &str) -> RepoResult<Option<Voucher>> {
        let sql = format!("{} AND i.voucher_code = ?", voucher_select());
        let row = sqlx::query_as::<_, VoucherRow>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        row.map(VoucherRow::into_voucher).transpose()
    }

    async fn list_vouchers(&self, query: &VoucherQuery) -> RepoResult<Vec<Voucher>> {
        let mut builder = QueryBuilder::<Sqlite>::new(voucher_select());
        if let Some(owner_id) = query.owner_id {
            builder.push(" AND o.user_id = ").push_bind(owner_id);
        }
        if let Some(used) = query.used {
            builder.push(" AND i.voucher_used = ").push_bind(used);
        }
        if let Some(at) = query.not_expired_at {
            builder
                .push(" AND (i.voucher_expires_at IS NULL OR i.voucher_expires_at >= ")
                .push_bind(at)
                .push(")");
        }
        if let Some((after, until)) = query.expiring_within {
            builder
                .push(" AND i.voucher_expires_at IS NOT NULL AND i.voucher_expires_at > ")
                .push_bind(after)
                .push(" AND i.voucher_expires_at <= ")
                .push_bind(until);
        }
        if query.exclude_cancelled {
            builder
                .push(" AND o.status <> ")
                .push_bind(OrderStatus::Cancelled.as_str());
        }
        builder.push(" ORDER BY i.created_at DESC, i.id DESC");

        let rows: Vec<VoucherRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(VoucherRow::into_voucher).collect()
    }

    async fn list_order_vouchers(&self, order_id: i64) -> RepoResult<Vec<Voucher>> {
        let sql = format!("{} AND i.order_id = ? ORDER BY i.created_at, i.id", voucher_select());
        let rows = sqlx::query_as::<_, VoucherRow>(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(VoucherRow::into_voucher).collect()
    }

    async fn mark_voucher_used(
        &self,
        code: &str,
        used_at: i64,
        used_by: Option<i64>,
    ) -> RepoResult<bool> {
        let result = sqlx::query(
            "UPDATE order_item SET voucher_used = 1, voucher_used_at = ?1, voucher_used_by = ?2 \
             WHERE voucher_code = ?3 AND item_type = 'VOUCHER' AND voucher_used = 0 \
             AND (voucher_expires_at IS NULL OR voucher_expires_at >= ?1) \
             AND order_id IN (SELECT id FROM orders WHERE status <> 'CANCELLED')",
        )
        .bind(used_at)
        .bind(used_by)
        .bind(code)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
