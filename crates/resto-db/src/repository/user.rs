//! # User Repository
//!
//! Staff accounts. Emails are stored lowercased and unique.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use resto_core::{Role, User};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn insert(&self, user: &User) -> DbResult<()> {
        debug!(id = %user.id, role = %user.role, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email.trim().to_ascii_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Lists users, optionally restricted to one role, ordered by name.
    pub async fn list(&self, role: Option<Role>) -> DbResult<Vec<User>> {
        let users = match role {
            Some(role) => {
                let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE role = ?1 ORDER BY name");
                sqlx::query_as::<_, User>(&sql)
                    .bind(role)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY name");
                sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?
            }
        };
        Ok(users)
    }

    /// Display names for a set of ids. Unknown ids are absent from the result.
    pub async fn names_by_ids(&self, ids: &[String]) -> DbResult<Vec<(String, String)>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("SELECT id, name FROM users WHERE id IN ({placeholders})");
        let mut query = sqlx::query_as::<_, (String, String)>(&sql);
        for id in ids {
            query = query.bind(id);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    pub async fn update_password(&self, id: &str, password_hash: &str) -> DbResult<()> {
        debug!(id = %id, "Updating password");

        let result = sqlx::query("UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(password_hash)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    /// Hard-deletes a user. Fails with a foreign key violation while any
    /// transaction or settlement still references the account.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting user");

        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::{memory_db, seed_user};
    use crate::DbError;
    use resto_core::Role;

    #[tokio::test]
    async fn test_lookup_and_role_filter() {
        let db = memory_db().await;
        let siti = seed_user(&db, "Siti", Role::Kasir).await;
        seed_user(&db, "Andi", Role::Kasir).await;
        seed_user(&db, "Joko", Role::Koki).await;

        let found = db.users().get_by_email("  SITI@resto.test ").await.unwrap().unwrap();
        assert_eq!(found.id, siti.id);
        assert_eq!(found.role, Role::Kasir);

        let kasir: Vec<String> = db
            .users()
            .list(Some(Role::Kasir))
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(kasir, vec!["Andi", "Siti"]);
        assert_eq!(db.users().list(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = memory_db().await;
        let user = seed_user(&db, "Siti", Role::Kasir).await;
        let mut copy = user.clone();
        copy.id = "other".into();
        assert!(matches!(db.users().insert(&copy).await, Err(DbError::UniqueViolation { .. })));
    }

    #[tokio::test]
    async fn test_update_password_and_delete() {
        let db = memory_db().await;
        let siti = seed_user(&db, "Siti", Role::Kasir).await;

        db.users().update_password(&siti.id, "new-hash").await.unwrap();
        let stored = db.users().get_by_id(&siti.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "new-hash");
        assert!(stored.updated_at >= siti.updated_at);

        db.users().delete(&siti.id).await.unwrap();
        assert!(db.users().get_by_id(&siti.id).await.unwrap().is_none());
        assert!(matches!(db.users().delete(&siti.id).await, Err(DbError::NotFound { .. })));
        assert!(matches!(
            db.users().update_password("ghost", "x").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_names_by_ids_skips_unknown() {
        let db = memory_db().await;
        let siti = seed_user(&db, "Siti", Role::Kasir).await;
        let names = db
            .users()
            .names_by_ids(&[siti.id.clone(), "ghost".to_string()])
            .await
            .unwrap();
        assert_eq!(names, vec![(siti.id, "Siti".to_string())]);
        assert!(db.users().names_by_ids(&[]).await.unwrap().is_empty());
    }
}
