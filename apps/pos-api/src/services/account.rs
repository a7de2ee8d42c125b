//! Logins and staff accounts.
//!
//! Failed logins never say whether the email exists.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use resto_core::validation::{validate_email, validate_password, validate_required};
use resto_core::{CoreError, Role, User, ValidationError};
use resto_db::{Database, DbError};

use crate::auth::{hash_password, verify_password, JwtManager};
use crate::error::{ApiResult, ServiceResult};

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

pub async fn login(db: &Database, jwt: &JwtManager, req: LoginRequest) -> ApiResult<LoginResponse> {
    let email = req.email.trim().to_ascii_lowercase();
    if email.is_empty() || req.password.is_empty() {
        return Err(CoreError::InvalidCredentials.into());
    }

    let user = match db.users().get_by_email(&email).await? {
        Some(user) if verify_password(&req.password, &user.password_hash) => user,
        _ => {
            warn!(email = %email, "Login failed");
            return Err(CoreError::InvalidCredentials.into());
        }
    };

    let token = jwt.issue(&user)?;
    info!(user_id = %user.id, role = %user.role, "User logged in");
    Ok(LoginResponse { token, user })
}

pub async fn me(db: &Database, user_id: &str) -> ServiceResult<User> {
    db.users()
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| CoreError::UserNotFound(user_id.to_string()).into())
}

/// Creates a staff account. Admin only; the route enforces that.
pub async fn register(db: &Database, req: RegisterRequest) -> ApiResult<User> {
    let name = validate_required("name", &req.name, 100)?;
    let email = validate_email(&req.email)?;
    validate_password(&req.password)?;
    let role = Role::parse(&req.role).ok_or_else(|| ValidationError::InvalidFormat {
        field: "role".to_string(),
        reason: "must be one of admin, kasir, koki".to_string(),
    })?;

    if db.users().get_by_email(&email).await?.is_some() {
        return Err(CoreError::EmailAlreadyExists(email).into());
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        name,
        email,
        password_hash: hash_password(&req.password)?,
        role,
        created_at: now,
        updated_at: now,
    };

    match db.users().insert(&user).await {
        Ok(()) => {}
        Err(e) if e.is_unique_violation_on("users") => {
            return Err(CoreError::EmailAlreadyExists(user.email).into())
        }
        Err(e) => return Err(e.into()),
    }

    info!(user_id = %user.id, role = %user.role, "User registered");
    Ok(user)
}

pub async fn list_cashiers(db: &Database) -> ServiceResult<Vec<User>> {
    Ok(db.users().list(Some(Role::Kasir)).await?)
}

/// Replaces the caller's own password after checking the current one.
pub async fn change_password(db: &Database, user_id: &str, req: ChangePasswordRequest) -> ApiResult<()> {
    validate_password(&req.new_password)?;

    let user = me(db, user_id).await?;
    if !verify_password(&req.old_password, &user.password_hash) {
        warn!(user_id = %user.id, "Password change rejected");
        return Err(CoreError::InvalidOldPassword.into());
    }

    db.users()
        .update_password(&user.id, &hash_password(&req.new_password)?)
        .await?;

    info!(user_id = %user.id, "Password changed");
    Ok(())
}

/// Deletes a staff account. Admins are never deleted, and neither is anyone
/// the ledger still points at.
pub async fn delete_user(db: &Database, user_id: &str) -> ServiceResult<()> {
    let user = me(db, user_id).await?;
    if user.role == Role::Admin {
        return Err(CoreError::AdminNotDeletable(user.id).into());
    }

    match db.users().delete(&user.id).await {
        Ok(()) => {}
        Err(DbError::ForeignKeyViolation { .. }) => return Err(CoreError::UserHasHistory(user.id).into()),
        Err(DbError::NotFound { .. }) => return Err(CoreError::UserNotFound(user.id).into()),
        Err(e) => return Err(e.into()),
    }

    info!(user_id = %user.id, role = %user.role, "User deleted");
    Ok(())
}
