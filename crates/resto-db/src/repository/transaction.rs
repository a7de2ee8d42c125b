//! # Transaction Repository
//!
//! Database operations for transactions and their items.
//!
//! ## Transaction Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Transaction Lifecycle                             │
//! │                                                                         │
//! │  1. CHECKOUT (inside WriteTx)                                          │
//! │     └── insert() → transaction + items, both pending                   │
//! │                                                                         │
//! │  2. PAYMENT                                                            │
//! │     ├── confirm_cash_paid()     WHERE payment_status = 'pending'       │
//! │     └── apply_gateway_status()  WHERE payment_status = 'pending'       │
//! │                                                                         │
//! │  3. FULFILLMENT                                                        │
//! │     └── update_order_status()   WHERE order_status = <observed>        │
//! │                                                                         │
//! │  4. LEDGER READS (settlement, reports)                                 │
//! │     └── ledger() / expected_cash() / sales_rows()                      │
//! │         completed + paid, created_at in [start, end)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every state change is a single conditional `UPDATE`; the boolean result
//! says whether the row was still in the observed state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteConnection;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use resto_core::report::SaleRow;
use resto_core::{OrderStatus, PaymentStatus, Transaction, TransactionItem};

const TRANSACTION_COLUMNS: &str = "id, customer_name, customer_phone, customer_email, order_type, \
    table_number, promo_code, discount_cents, subtotal_cents, tax_cents, total_cents, \
    payment_method, payment_status, order_status, expired_at, closed_by_user_id, notes, \
    created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, transaction_id, menu_id, menu_name, menu_price_cents, quantity, subtotal_cents, created_at";

/// Which closed transactions a ledger read covers.
///
/// Closed means `order_status = completed` and `payment_status = paid`.
#[derive(Debug, Clone)]
pub struct LedgerFilter {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Only transactions closed by this user.
    pub closed_by: Option<String>,
    /// Only cash transactions.
    pub cash_only: bool,
}

impl LedgerFilter {
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        LedgerFilter {
            start,
            end,
            closed_by: None,
            cash_only: false,
        }
    }

    pub fn closed_by(mut self, user_id: Option<String>) -> Self {
        self.closed_by = user_id;
        self
    }

    pub fn cash_only(mut self) -> Self {
        self.cash_only = true;
        self
    }
}

/// Repository for transaction database operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Inserts a transaction and all of its items on an open write
    /// transaction. Nothing becomes visible until the caller commits.
    pub async fn insert(conn: &mut SqliteConnection, tx: &Transaction) -> DbResult<()> {
        debug!(id = %tx.id, items = tx.items.len(), total = tx.total_cents, "Inserting transaction");

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, customer_name, customer_phone, customer_email, order_type,
                table_number, promo_code, discount_cents, subtotal_cents, tax_cents,
                total_cents, payment_method, payment_status, order_status, expired_at,
                closed_by_user_id, notes, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15,
                ?16, ?17, ?18, ?19
            )
            "#,
        )
        .bind(&tx.id)
        .bind(&tx.customer_name)
        .bind(&tx.customer_phone)
        .bind(&tx.customer_email)
        .bind(tx.order_type)
        .bind(tx.table_number)
        .bind(&tx.promo_code)
        .bind(tx.discount_cents)
        .bind(tx.subtotal_cents)
        .bind(tx.tax_cents)
        .bind(tx.total_cents)
        .bind(tx.payment_method)
        .bind(tx.payment_status)
        .bind(tx.order_status)
        .bind(tx.expired_at)
        .bind(&tx.closed_by_user_id)
        .bind(&tx.notes)
        .bind(tx.created_at)
        .bind(tx.updated_at)
        .execute(&mut *conn)
        .await?;

        for item in &tx.items {
            sqlx::query(
                r#"
                INSERT INTO transaction_items (
                    id, transaction_id, menu_id, menu_name, menu_price_cents,
                    quantity, subtotal_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&item.id)
            .bind(&item.transaction_id)
            .bind(&item.menu_id)
            .bind(&item.menu_name)
            .bind(item.menu_price_cents)
            .bind(item.quantity)
            .bind(item.subtotal_cents)
            .bind(item.created_at)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a transaction with its items.
    pub async fn get(&self, id: &str) -> DbResult<Option<Transaction>> {
        let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1");
        let Some(mut tx) = sqlx::query_as::<_, Transaction>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        tx.items = self.items_of(id).await?;
        Ok(Some(tx))
    }

    /// Gets a transaction without loading items.
    pub async fn get_header(&self, id: &str) -> DbResult<Option<Transaction>> {
        let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1");
        let tx = sqlx::query_as::<_, Transaction>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tx)
    }

    pub async fn items_of(&self, transaction_id: &str) -> DbResult<Vec<TransactionItem>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM transaction_items WHERE transaction_id = ?1 ORDER BY created_at, rowid"
        );
        let items = sqlx::query_as::<_, TransactionItem>(&sql)
            .bind(transaction_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    /// Lists transactions newest first, items included.
    pub async fn list(&self, limit: u32, offset: u32) -> DbResult<Vec<Transaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions ORDER BY created_at DESC, rowid DESC LIMIT ?1 OFFSET ?2"
        );
        let mut transactions = sqlx::query_as::<_, Transaction>(&sql)
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
            .await?;

        if transactions.is_empty() {
            return Ok(transactions);
        }

        let placeholders = vec!["?"; transactions.len()].join(", ");
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM transaction_items WHERE transaction_id IN ({placeholders}) \
             ORDER BY created_at, rowid"
        );
        let mut query = sqlx::query_as::<_, TransactionItem>(&sql);
        for tx in &transactions {
            query = query.bind(&tx.id);
        }

        let mut by_tx: HashMap<String, Vec<TransactionItem>> = HashMap::new();
        for item in query.fetch_all(&self.pool).await? {
            by_tx.entry(item.transaction_id.clone()).or_default().push(item);
        }
        for tx in &mut transactions {
            tx.items = by_tx.remove(&tx.id).unwrap_or_default();
        }

        Ok(transactions)
    }

    // =========================================================================
    // State Changes
    // =========================================================================

    /// Moves `order_status` from `from` to `to` if it is still `from`.
    ///
    /// When `closer` is given it becomes `closed_by_user_id`.
    pub async fn update_order_status(
        &self,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
        closer: Option<&str>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE transactions SET
                order_status = ?3,
                closed_by_user_id = COALESCE(?4, closed_by_user_id),
                updated_at = ?5
            WHERE id = ?1 AND order_status = ?2
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(closer)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Marks a pending cash payment as paid and records the cashier.
    pub async fn confirm_cash_paid(&self, id: &str, cashier_id: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE transactions SET
                payment_status = 'paid',
                closed_by_user_id = ?2,
                updated_at = ?3
            WHERE id = ?1
              AND payment_method = 'cash'
              AND payment_status = 'pending'
              AND order_status != 'cancelled'
            "#,
        )
        .bind(id)
        .bind(cashier_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Applies a gateway notification while payment is still pending.
    ///
    /// A cancelled order keeps `order_status = 'cancelled'`; only the
    /// payment status is recorded so the captured money can be refunded.
    pub async fn apply_gateway_status(
        &self,
        id: &str,
        payment: PaymentStatus,
        order: OrderStatus,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE transactions SET
                payment_status = ?2,
                order_status = CASE WHEN order_status = 'cancelled' THEN 'cancelled' ELSE ?3 END,
                updated_at = ?4
            WHERE id = ?1 AND payment_status = 'pending'
            "#,
        )
        .bind(id)
        .bind(payment)
        .bind(order)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Ledger Reads
    // =========================================================================

    /// Closed transactions matching `filter`, oldest first (items not loaded).
    pub async fn ledger(&self, filter: &LedgerFilter) -> DbResult<Vec<Transaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions \
             WHERE order_status = 'completed' AND payment_status = 'paid' \
               AND created_at >= ?1 AND created_at < ?2 \
               AND (?3 IS NULL OR closed_by_user_id = ?3) \
               AND (?4 = 0 OR payment_method = 'cash') \
             ORDER BY created_at, rowid"
        );
        let rows = sqlx::query_as::<_, Transaction>(&sql)
            .bind(filter.start)
            .bind(filter.end)
            .bind(filter.closed_by.as_deref())
            .bind(filter.cash_only)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Σ total over closed cash transactions `cashier_id` closed in `[start, end)`.
    pub async fn expected_cash(
        &self,
        cashier_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(total_cents)
            FROM transactions
            WHERE order_status = 'completed'
              AND payment_status = 'paid'
              AND payment_method = 'cash'
              AND closed_by_user_id = ?1
              AND created_at >= ?2
              AND created_at < ?3
            "#,
        )
        .bind(cashier_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    /// `(created_at, total)` of closed transactions in `[start, end)`, for charts.
    pub async fn sales_rows(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> DbResult<Vec<SaleRow>> {
        let rows: Vec<(DateTime<Utc>, i64)> = sqlx::query_as(
            r#"
            SELECT created_at, total_cents
            FROM transactions
            WHERE order_status = 'completed'
              AND payment_status = 'paid'
              AND created_at >= ?1
              AND created_at < ?2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(created_at, total_cents)| SaleRow {
                created_at,
                total_cents,
            })
            .collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{memory_db, seed_menu, seed_user};
    use crate::{Database, DbError};
    use chrono::{Duration, TimeZone};
    use resto_core::{Menu, OrderType, PaymentMethod, Role};
    use uuid::Uuid;

    fn transaction(menu: &Menu, qty: i64, method: PaymentMethod, created_at: DateTime<Utc>) -> Transaction {
        let id = Uuid::new_v4().to_string();
        let subtotal = menu.price_cents * qty;
        let tax = (subtotal + 5) / 10;
        Transaction {
            id: id.clone(),
            customer_name: "Budi".into(),
            customer_phone: "08123456789".into(),
            customer_email: None,
            order_type: OrderType::TakeAway,
            table_number: None,
            promo_code: None,
            discount_cents: 0,
            subtotal_cents: subtotal,
            tax_cents: tax,
            total_cents: subtotal + tax,
            payment_method: method,
            payment_status: PaymentStatus::Pending,
            order_status: OrderStatus::Pending,
            expired_at: None,
            closed_by_user_id: None,
            notes: None,
            items: vec![TransactionItem {
                id: Uuid::new_v4().to_string(),
                transaction_id: id,
                menu_id: menu.id.clone(),
                menu_name: menu.name.clone(),
                menu_price_cents: menu.price_cents,
                quantity: qty,
                subtotal_cents: subtotal,
                created_at,
            }],
            created_at,
            updated_at: created_at,
        }
    }

    async fn store(db: &Database, tx: &Transaction) {
        let mut w = db.begin_write().await.unwrap();
        TransactionRepository::insert(w.conn().unwrap(), tx).await.unwrap();
        w.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_and_read_back_with_items() {
        let db = memory_db().await;
        let menu = seed_menu(&db, "Nasi Goreng", 2_500_000, true).await;
        let tx = transaction(&menu, 2, PaymentMethod::Cash, Utc::now());
        store(&db, &tx).await;

        let stored = db.transactions().get(&tx.id).await.unwrap().unwrap();
        assert_eq!(stored.total_cents, tx.total_cents);
        assert_eq!(stored.items.len(), 1);
        assert_eq!(stored.items[0].menu_price_cents, 2_500_000);
        assert_eq!(stored.payment_method, PaymentMethod::Cash);
        assert!(db.transactions().get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rolled_back_insert_leaves_nothing() {
        let db = memory_db().await;
        let menu = seed_menu(&db, "Soto", 2_000_000, true).await;
        let tx = transaction(&menu, 1, PaymentMethod::EWallet, Utc::now());

        let mut w = db.begin_write().await.unwrap();
        TransactionRepository::insert(w.conn().unwrap(), &tx).await.unwrap();
        w.rollback().await.unwrap();

        assert!(db.transactions().get(&tx.id).await.unwrap().is_none());
        assert!(db.transactions().items_of(&tx.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dine_in_without_table_violates_check() {
        let db = memory_db().await;
        let menu = seed_menu(&db, "Soto", 2_000_000, true).await;
        let mut tx = transaction(&menu, 1, PaymentMethod::Cash, Utc::now());
        tx.order_type = OrderType::DineIn;

        let mut w = db.begin_write().await.unwrap();
        let err = TransactionRepository::insert(w.conn().unwrap(), &tx).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
        w.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn test_list_newest_first_with_items() {
        let db = memory_db().await;
        let menu = seed_menu(&db, "Bakso", 1_500_000, true).await;
        let older = transaction(&menu, 1, PaymentMethod::Cash, Utc::now() - Duration::hours(2));
        let newer = transaction(&menu, 3, PaymentMethod::Cash, Utc::now());
        store(&db, &older).await;
        store(&db, &newer).await;

        let list = db.transactions().list(50, 0).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, newer.id);
        assert_eq!(list[0].items[0].quantity, 3);
        assert_eq!(list[1].items.len(), 1);

        let page = db.transactions().list(1, 1).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, older.id);
        assert_eq!(page[0].items.len(), 1);
        assert!(db.transactions().list(10, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_conditional_order_update() {
        let db = memory_db().await;
        let kasir = seed_user(&db, "Siti", Role::Kasir).await;
        let menu = seed_menu(&db, "Bakso", 1_500_000, true).await;
        let tx = transaction(&menu, 1, PaymentMethod::Cash, Utc::now());
        store(&db, &tx).await;

        let repo = db.transactions();
        assert!(repo
            .update_order_status(&tx.id, OrderStatus::Pending, OrderStatus::Cooking, None)
            .await
            .unwrap());
        // Stale observation.
        assert!(!repo
            .update_order_status(&tx.id, OrderStatus::Pending, OrderStatus::Cancelled, None)
            .await
            .unwrap());
        assert!(repo
            .update_order_status(&tx.id, OrderStatus::Cooking, OrderStatus::Ready, Some(&kasir.id))
            .await
            .unwrap());

        let stored = repo.get_header(&tx.id).await.unwrap().unwrap();
        assert_eq!(stored.order_status, OrderStatus::Ready);
        assert_eq!(stored.closed_by_user_id.as_deref(), Some(kasir.id.as_str()));
    }

    #[tokio::test]
    async fn test_cash_confirmation_only_once() {
        let db = memory_db().await;
        let kasir = seed_user(&db, "Siti", Role::Kasir).await;
        let menu = seed_menu(&db, "Bakso", 1_500_000, true).await;
        let cash = transaction(&menu, 1, PaymentMethod::Cash, Utc::now());
        let card = transaction(&menu, 1, PaymentMethod::CreditCard, Utc::now());
        store(&db, &cash).await;
        store(&db, &card).await;

        let repo = db.transactions();
        assert!(repo.confirm_cash_paid(&cash.id, &kasir.id).await.unwrap());
        assert!(!repo.confirm_cash_paid(&cash.id, &kasir.id).await.unwrap());
        assert!(!repo.confirm_cash_paid(&card.id, &kasir.id).await.unwrap());

        let stored = repo.get_header(&cash.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Paid);
        assert_eq!(stored.closed_by_user_id, Some(kasir.id));
    }

    #[tokio::test]
    async fn test_gateway_status_is_monotonic() {
        let db = memory_db().await;
        let menu = seed_menu(&db, "Bakso", 1_500_000, true).await;
        let tx = transaction(&menu, 1, PaymentMethod::EWallet, Utc::now());
        store(&db, &tx).await;

        let repo = db.transactions();
        assert!(repo
            .apply_gateway_status(&tx.id, PaymentStatus::Paid, OrderStatus::Completed)
            .await
            .unwrap());
        assert!(!repo
            .apply_gateway_status(&tx.id, PaymentStatus::Pending, OrderStatus::Pending)
            .await
            .unwrap());

        let stored = repo.get_header(&tx.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Paid);
        assert_eq!(stored.order_status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn test_gateway_status_keeps_cancelled_order() {
        let db = memory_db().await;
        let menu = seed_menu(&db, "Bakso", 1_500_000, true).await;
        let tx = transaction(&menu, 1, PaymentMethod::EWallet, Utc::now());
        store(&db, &tx).await;

        let repo = db.transactions();
        assert!(repo
            .update_order_status(&tx.id, OrderStatus::Pending, OrderStatus::Cancelled, None)
            .await
            .unwrap());
        assert!(repo
            .apply_gateway_status(&tx.id, PaymentStatus::Paid, OrderStatus::Completed)
            .await
            .unwrap());

        let stored = repo.get_header(&tx.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Paid);
        assert_eq!(stored.order_status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_ledger_and_expected_cash_window() {
        let db = memory_db().await;
        let siti = seed_user(&db, "Siti", Role::Kasir).await;
        let andi = seed_user(&db, "Andi", Role::Kasir).await;
        let menu = seed_menu(&db, "Bakso", 1_000_000, true).await;
        let day = Utc.with_ymd_and_hms(2026, 1, 30, 0, 0, 0).unwrap();

        let in_day = transaction(&menu, 1, PaymentMethod::Cash, day + Duration::hours(10));
        let other_cashier = transaction(&menu, 2, PaymentMethod::Cash, day + Duration::hours(11));
        let next_day = transaction(&menu, 1, PaymentMethod::Cash, day + Duration::days(1));
        let non_cash = transaction(&menu, 1, PaymentMethod::DebitCard, day + Duration::hours(12));
        let unpaid = transaction(&menu, 5, PaymentMethod::Cash, day + Duration::hours(13));
        for tx in [&in_day, &other_cashier, &next_day, &non_cash, &unpaid] {
            store(&db, tx).await;
        }

        let repo = db.transactions();
        for (tx, who) in [(&in_day, &siti), (&other_cashier, &andi), (&next_day, &siti)] {
            repo.confirm_cash_paid(&tx.id, &who.id).await.unwrap();
        }
        repo.apply_gateway_status(&non_cash.id, PaymentStatus::Paid, OrderStatus::Completed)
            .await
            .unwrap();
        for tx in [&in_day, &other_cashier, &next_day, &unpaid] {
            for (from, to) in [
                (OrderStatus::Pending, OrderStatus::Cooking),
                (OrderStatus::Cooking, OrderStatus::Ready),
                (OrderStatus::Ready, OrderStatus::Completed),
            ] {
                repo.update_order_status(&tx.id, from, to, None).await.unwrap();
            }
        }

        let end = day + Duration::days(1);
        assert_eq!(repo.expected_cash(&siti.id, day, end).await.unwrap(), in_day.total_cents);
        assert_eq!(repo.expected_cash(&andi.id, day, end).await.unwrap(), other_cashier.total_cents);

        let all = repo.ledger(&LedgerFilter::between(day, end)).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec![in_day.id.as_str(), other_cashier.id.as_str(), non_cash.id.as_str()]);

        let siti_only = repo
            .ledger(&LedgerFilter::between(day, end).closed_by(Some(siti.id.clone())))
            .await
            .unwrap();
        assert_eq!(siti_only.len(), 1);

        let cash = repo.ledger(&LedgerFilter::between(day, end).cash_only()).await.unwrap();
        assert_eq!(cash.len(), 2);

        assert_eq!(repo.sales_rows(day, end).await.unwrap().len(), 3);
    }
}
