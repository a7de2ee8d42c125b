//! # Settlement Repository
//!
//! End-of-day cash declarations, one per (date, cashier).
//!
//! ## Guard
//! The `UNIQUE(date, user_id)` index is the only thing that makes a second
//! settlement impossible; callers may pre-check with [`SettlementRepository::get`]
//! but must still handle [`DbError::UniqueViolation`] from
//! [`SettlementRepository::insert`].

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use resto_core::Settlement;

const SETTLEMENT_COLUMNS: &str =
    "id, date, user_id, expected_cash_cents, actual_cash_cents, discrepancy_cents, notes, created_at";

/// A cashier relevant to a settlement date, with the cash they should hold.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CloserRow {
    pub user_id: String,
    /// `None` when the id no longer resolves to a user.
    pub user_name: Option<String>,
    pub expected_cash_cents: i64,
}

#[derive(Debug, Clone)]
pub struct SettlementRepository {
    pool: SqlitePool,
}

impl SettlementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettlementRepository { pool }
    }

    pub async fn get(&self, date: NaiveDate, user_id: &str) -> DbResult<Option<Settlement>> {
        let sql = format!("SELECT {SETTLEMENT_COLUMNS} FROM settlements WHERE date = ?1 AND user_id = ?2");
        let settlement = sqlx::query_as::<_, Settlement>(&sql)
            .bind(date)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(settlement)
    }

    /// All settlements declared for a date.
    pub async fn list_by_date(&self, date: NaiveDate) -> DbResult<Vec<Settlement>> {
        let sql = format!("SELECT {SETTLEMENT_COLUMNS} FROM settlements WHERE date = ?1");
        let settlements = sqlx::query_as::<_, Settlement>(&sql)
            .bind(date)
            .fetch_all(&self.pool)
            .await?;
        Ok(settlements)
    }

    pub async fn insert(&self, settlement: &Settlement) -> DbResult<()> {
        debug!(
            date = %settlement.date,
            user_id = %settlement.user_id,
            discrepancy = settlement.discrepancy_cents,
            "Inserting settlement"
        );

        sqlx::query(
            r#"
            INSERT INTO settlements (
                id, date, user_id, expected_cash_cents, actual_cash_cents,
                discrepancy_cents, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&settlement.id)
        .bind(settlement.date)
        .bind(&settlement.user_id)
        .bind(settlement.expected_cash_cents)
        .bind(settlement.actual_cash_cents)
        .bind(settlement.discrepancy_cents)
        .bind(&settlement.notes)
        .bind(settlement.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Cashiers who closed qualifying cash transactions in `[start, end)`,
    /// unioned with cashiers already holding a settlement for `date`.
    ///
    /// Qualifying means `completed` + `paid` + `cash`. Cashiers present only
    /// through their settlement get `expected_cash_cents = 0`.
    pub async fn closers_for_date(
        &self,
        date: NaiveDate,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<CloserRow>> {
        let rows = sqlx::query_as::<_, CloserRow>(
            r#"
            WITH closers AS (
                SELECT closed_by_user_id AS user_id, SUM(total_cents) AS expected
                FROM transactions
                WHERE order_status = 'completed'
                  AND payment_status = 'paid'
                  AND payment_method = 'cash'
                  AND closed_by_user_id IS NOT NULL
                  AND created_at >= ?1
                  AND created_at < ?2
                GROUP BY closed_by_user_id
            ),
            ids AS (
                SELECT user_id FROM closers
                UNION
                SELECT user_id FROM settlements WHERE date = ?3
            )
            SELECT
                ids.user_id AS user_id,
                u.name AS user_name,
                COALESCE(c.expected, 0) AS expected_cash_cents
            FROM ids
            LEFT JOIN closers c ON c.user_id = ids.user_id
            LEFT JOIN users u ON u.id = ids.user_id
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
