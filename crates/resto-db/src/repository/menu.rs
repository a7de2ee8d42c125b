//! # Menu Repository
//!
//! Database operations for menus.
//!
//! ## Key Operations
//! - CRUD for the admin catalog (soft delete)
//! - Public listing of available menus
//! - Checkout lookup on the open write transaction, so the price read is
//!   the price committed with the order

use chrono::Utc;
use sqlx::sqlite::SqliteConnection;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use resto_core::Menu;

const MENU_COLUMNS: &str =
    "id, name, description, price_cents, is_available, category_id, created_at, updated_at";

/// Repository for menu database operations.
#[derive(Debug, Clone)]
pub struct MenuRepository {
    pool: SqlitePool,
}

impl MenuRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MenuRepository { pool }
    }

    /// Lists every live menu, available or not (admin view).
    pub async fn list(&self) -> DbResult<Vec<Menu>> {
        let sql = format!("SELECT {MENU_COLUMNS} FROM menus WHERE deleted_at IS NULL ORDER BY name");
        let menus = sqlx::query_as::<_, Menu>(&sql).fetch_all(&self.pool).await?;
        Ok(menus)
    }

    /// Lists menus guests may order.
    pub async fn list_available(&self) -> DbResult<Vec<Menu>> {
        let sql = format!(
            "SELECT {MENU_COLUMNS} FROM menus WHERE deleted_at IS NULL AND is_available = 1 ORDER BY name"
        );
        let menus = sqlx::query_as::<_, Menu>(&sql).fetch_all(&self.pool).await?;
        Ok(menus)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Menu>> {
        let sql = format!("SELECT {MENU_COLUMNS} FROM menus WHERE id = ?1 AND deleted_at IS NULL");
        let menu = sqlx::query_as::<_, Menu>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(menu)
    }

    pub async fn insert(&self, menu: &Menu) -> DbResult<()> {
        debug!(id = %menu.id, name = %menu.name, "Inserting menu");

        sqlx::query(
            r#"
            INSERT INTO menus (
                id, name, description, price_cents, is_available,
                category_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&menu.id)
        .bind(&menu.name)
        .bind(&menu.description)
        .bind(menu.price_cents)
        .bind(menu.is_available)
        .bind(&menu.category_id)
        .bind(menu.created_at)
        .bind(menu.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Replaces the editable fields of a live menu.
    pub async fn update(&self, menu: &Menu) -> DbResult<()> {
        debug!(id = %menu.id, "Updating menu");

        let result = sqlx::query(
            r#"
            UPDATE menus SET
                name = ?2,
                description = ?3,
                price_cents = ?4,
                is_available = ?5,
                category_id = ?6,
                updated_at = ?7
            WHERE id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(&menu.id)
        .bind(&menu.name)
        .bind(&menu.description)
        .bind(menu.price_cents)
        .bind(menu.is_available)
        .bind(&menu.category_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Menu", &menu.id));
        }

        Ok(())
    }

    /// Soft-deletes a menu. Past transaction items keep their snapshot.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE menus SET deleted_at = ?2, updated_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Menu", id));
        }

        Ok(())
    }

    /// Looks a menu up on an open write transaction.
    ///
    /// Deleted menus are not returned; availability is left to the caller.
    pub async fn find_for_checkout(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Menu>> {
        let sql = format!("SELECT {MENU_COLUMNS} FROM menus WHERE id = ?1 AND deleted_at IS NULL");
        let menu = sqlx::query_as::<_, Menu>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(menu)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM menus WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
