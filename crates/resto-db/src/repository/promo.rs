//! # Promo Repository
//!
//! Database operations for promo codes.
//!
//! ## Consumption
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  checkout WriteTx (BEGIN IMMEDIATE)                                    │
//! │                                                                         │
//! │  try_consume:                                                          │
//! │    UPDATE promos SET usage_count = usage_count + 1                     │
//! │    WHERE id = ? AND is_active = 1                                      │
//! │      AND (usage_limit = 0 OR usage_count < usage_limit)                │
//! │           │                                                             │
//! │           ├── 0 rows ──► limit reached, checkout aborts                │
//! │           ▼                                                             │
//! │  deactivate_if_exhausted:                                              │
//! │    UPDATE promos SET is_active = 0                                     │
//! │    WHERE id = ? AND usage_limit > 0 AND usage_count >= usage_limit     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  COMMIT (or ROLLBACK: the use is given back)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The counter is never read, incremented and written back in Rust.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteConnection;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use resto_core::Promo;

const PROMO_COLUMNS: &str = "id, code, description, kind, value, min_purchase_cents, \
    max_discount_cents, usage_limit, usage_count, is_active, start_date, end_date, \
    created_at, updated_at";

/// Repository for promo database operations.
#[derive(Debug, Clone)]
pub struct PromoRepository {
    pool: SqlitePool,
}

impl PromoRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PromoRepository { pool }
    }

    /// Inserts a promo. The code must already be uppercased; a live
    /// duplicate fails with [`DbError::UniqueViolation`].
    pub async fn insert(&self, promo: &Promo) -> DbResult<()> {
        debug!(id = %promo.id, code = %promo.code, "Inserting promo");

        sqlx::query(
            r#"
            INSERT INTO promos (
                id, code, description, kind, value,
                min_purchase_cents, max_discount_cents, usage_limit, usage_count,
                is_active, start_date, end_date, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&promo.id)
        .bind(&promo.code)
        .bind(&promo.description)
        .bind(promo.kind)
        .bind(promo.value)
        .bind(promo.min_purchase_cents)
        .bind(promo.max_discount_cents)
        .bind(promo.usage_limit)
        .bind(promo.usage_count)
        .bind(promo.is_active)
        .bind(promo.start_date)
        .bind(promo.end_date)
        .bind(promo.created_at)
        .bind(promo.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists live promos, newest first.
    pub async fn list(&self) -> DbResult<Vec<Promo>> {
        let sql = format!(
            "SELECT {PROMO_COLUMNS} FROM promos WHERE deleted_at IS NULL ORDER BY created_at DESC"
        );
        let promos = sqlx::query_as::<_, Promo>(&sql).fetch_all(&self.pool).await?;
        Ok(promos)
    }

    /// Active promos whose window contains `now`, ending soonest first.
    pub async fn list_active(&self, now: DateTime<Utc>) -> DbResult<Vec<Promo>> {
        let sql = format!(
            "SELECT {PROMO_COLUMNS} FROM promos \
             WHERE deleted_at IS NULL AND is_active = 1 AND start_date <= ?1 AND end_date >= ?1 \
             ORDER BY end_date"
        );
        let promos = sqlx::query_as::<_, Promo>(&sql)
            .bind(now)
            .fetch_all(&self.pool)
            .await?;
        Ok(promos)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Promo>> {
        let sql = format!("SELECT {PROMO_COLUMNS} FROM promos WHERE id = ?1 AND deleted_at IS NULL");
        let promo = sqlx::query_as::<_, Promo>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(promo)
    }

    /// Case-insensitive lookup among live promos.
    pub async fn find_by_code(&self, code: &str) -> DbResult<Option<Promo>> {
        let mut conn = self.pool.acquire().await?;
        Self::find_by_code_on(&mut conn, code).await
    }

    /// Same as [`find_by_code`](Self::find_by_code) on an open write transaction.
    pub async fn find_by_code_on(conn: &mut SqliteConnection, code: &str) -> DbResult<Option<Promo>> {
        let sql = format!(
            "SELECT {PROMO_COLUMNS} FROM promos WHERE code = ?1 AND deleted_at IS NULL"
        );
        let promo = sqlx::query_as::<_, Promo>(&sql)
            .bind(code.trim().to_ascii_uppercase())
            .fetch_optional(&mut *conn)
            .await?;
        Ok(promo)
    }

    /// Whether a live promo other than `except_id` already uses `code`.
    pub async fn code_taken(&self, code: &str, except_id: Option<&str>) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM promos WHERE code = ?1 AND deleted_at IS NULL AND id != COALESCE(?2, '')",
        )
        .bind(code.trim().to_ascii_uppercase())
        .bind(except_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    /// Writes the editable fields of a promo. `usage_count` is left to the
    /// database; a promo whose new limit is already reached is deactivated.
    pub async fn update(&self, promo: &Promo) -> DbResult<()> {
        debug!(id = %promo.id, code = %promo.code, "Updating promo");

        let result = sqlx::query(
            r#"
            UPDATE promos SET
                code = ?2,
                description = ?3,
                kind = ?4,
                value = ?5,
                min_purchase_cents = ?6,
                max_discount_cents = ?7,
                usage_limit = ?8,
                is_active = CASE
                    WHEN ?8 > 0 AND usage_count >= ?8 THEN 0
                    ELSE ?9
                END,
                start_date = ?10,
                end_date = ?11,
                updated_at = ?12
            WHERE id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(&promo.id)
        .bind(&promo.code)
        .bind(&promo.description)
        .bind(promo.kind)
        .bind(promo.value)
        .bind(promo.min_purchase_cents)
        .bind(promo.max_discount_cents)
        .bind(promo.usage_limit)
        .bind(promo.is_active)
        .bind(promo.start_date)
        .bind(promo.end_date)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Promo", &promo.id));
        }

        Ok(())
    }

    /// Soft-deletes a promo; its code becomes reusable.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE promos SET deleted_at = ?2, updated_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Promo", id));
        }

        Ok(())
    }

    /// Consumes one use of a promo inside the checkout transaction.
    ///
    /// Returns `false` when the promo is inactive or its limit is reached;
    /// nothing was written in that case.
    pub async fn try_consume(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE promos SET usage_count = usage_count + 1
            WHERE id = ?1
              AND is_active = 1
              AND deleted_at IS NULL
              AND (usage_limit = 0 OR usage_count < usage_limit)
            "#,
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Flips `is_active` off once the limit is reached. Returns whether it did.
    pub async fn deactivate_if_exhausted(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE promos SET is_active = 0
            WHERE id = ?1 AND is_active = 1 AND usage_limit > 0 AND usage_count >= usage_limit
            "#,
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;

        let deactivated = result.rows_affected() == 1;
        if deactivated {
            info!(promo_id = %id, "Promo reached its usage limit and was deactivated");
        }
        Ok(deactivated)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{file_db, memory_db};
    use chrono::Duration;
    use resto_core::PromoKind;
    use uuid::Uuid;

    fn promo(code: &str, usage_limit: i64) -> Promo {
        let now = Utc::now();
        Promo {
            id: Uuid::new_v4().to_string(),
            code: code.to_string(),
            description: None,
            kind: PromoKind::Percentage,
            value: 10,
            min_purchase_cents: 0,
            max_discount_cents: 0,
            usage_limit,
            usage_count: 0,
            is_active: true,
            start_date: now - Duration::days(1),
            end_date: now + Duration::days(1),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_code_lookup_is_case_insensitive() {
        let db = memory_db().await;
        let p = promo("HEMAT10", 0);
        db.promos().insert(&p).await.unwrap();

        let found = db.promos().find_by_code(" hemat10 ").await.unwrap().unwrap();
        assert_eq!(found.id, p.id);
        assert!(db.promos().code_taken("Hemat10", None).await.unwrap());
        assert!(!db.promos().code_taken("HEMAT10", Some(&p.id)).await.unwrap());
    }

    #[tokio::test]
    async fn test_soft_delete_frees_code() {
        let db = memory_db().await;
        let first = promo("LEBARAN", 0);
        db.promos().insert(&first).await.unwrap();
        assert!(matches!(
            db.promos().insert(&promo("LEBARAN", 0)).await,
            Err(DbError::UniqueViolation { .. })
        ));

        db.promos().soft_delete(&first.id).await.unwrap();
        assert!(db.promos().find_by_code("LEBARAN").await.unwrap().is_none());
        db.promos().insert(&promo("LEBARAN", 0)).await.unwrap();
    }

    #[tokio::test]
    async fn test_consume_until_exhausted() {
        let db = memory_db().await;
        let p = promo("DUAKALI", 2);
        db.promos().insert(&p).await.unwrap();

        for _ in 0..2 {
            let mut tx = db.begin_write().await.unwrap();
            assert!(PromoRepository::try_consume(tx.conn().unwrap(), &p.id).await.unwrap());
            PromoRepository::deactivate_if_exhausted(tx.conn().unwrap(), &p.id).await.unwrap();
            tx.commit().await.unwrap();
        }

        let stored = db.promos().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(stored.usage_count, 2);
        assert!(!stored.is_active);

        let mut tx = db.begin_write().await.unwrap();
        assert!(!PromoRepository::try_consume(tx.conn().unwrap(), &p.id).await.unwrap());
        tx.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn test_rolled_back_consume_is_returned() {
        let db = memory_db().await;
        let p = promo("SEKALI", 1);
        db.promos().insert(&p).await.unwrap();

        let mut tx = db.begin_write().await.unwrap();
        assert!(PromoRepository::try_consume(tx.conn().unwrap(), &p.id).await.unwrap());
        tx.rollback().await.unwrap();

        let stored = db.promos().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(stored.usage_count, 0);
        assert!(stored.is_active);
    }

    #[tokio::test]
    async fn test_update_lowering_limit_to_count_deactivates() {
        let db = memory_db().await;
        let mut p = promo("TURUN", 5);
        db.promos().insert(&p).await.unwrap();

        let mut tx = db.begin_write().await.unwrap();
        PromoRepository::try_consume(tx.conn().unwrap(), &p.id).await.unwrap();
        tx.commit().await.unwrap();

        p.usage_limit = 1;
        db.promos().update(&p).await.unwrap();
        let stored = db.promos().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(stored.usage_count, 1);
        assert!(!stored.is_active);
    }

    #[tokio::test]
    async fn test_list_active_respects_window_and_flag() {
        let db = memory_db().await;
        let live = promo("LIVE", 0);
        let mut off = promo("OFF", 0);
        off.is_active = false;
        let mut future = promo("FUTURE", 0);
        future.start_date = Utc::now() + Duration::days(2);
        future.end_date = Utc::now() + Duration::days(3);
        for p in [&live, &off, &future] {
            db.promos().insert(p).await.unwrap();
        }

        let active = db.promos().list_active(Utc::now()).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].code, "LIVE");
        assert_eq!(db.promos().list().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_consume_respects_limit() {
        let db = file_db().await;
        let p = promo("REBUTAN", 3);
        db.promos().insert(&p).await.unwrap();

        let tasks = (0..10).map(|_| {
            let db = db.clone();
            let id = p.id.clone();
            tokio::spawn(async move {
                let mut tx = db.begin_write().await.unwrap();
                let ok = PromoRepository::try_consume(tx.conn().unwrap(), &id).await.unwrap();
                PromoRepository::deactivate_if_exhausted(tx.conn().unwrap(), &id).await.unwrap();
                tx.commit().await.unwrap();
                ok
            })
        });

        let results = futures::future::join_all(tasks).await;
        let successes = results.into_iter().filter(|r| *r.as_ref().unwrap()).count();
        assert_eq!(successes, 3);

        let stored = db.promos().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(stored.usage_count, 3);
        assert!(!stored.is_active);
    }
}
