//! Menu and category administration.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use resto_core::validation::{validate_amount_cents, validate_required};
use resto_core::{Category, CoreError, Menu};
use resto_db::{Database, DbError};

use crate::error::ServiceResult;

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MenuRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    #[serde(default = "default_available")]
    pub is_available: bool,
    pub category_id: String,
}

fn default_available() -> bool {
    true
}

// =============================================================================
// Categories
// =============================================================================

pub async fn list_categories(db: &Database) -> ServiceResult<Vec<Category>> {
    Ok(db.categories().list().await?)
}

pub async fn create_category(db: &Database, req: CategoryRequest) -> ServiceResult<Category> {
    let name = validate_required("name", &req.name, 100)?;
    if db.categories().get_by_name(&name).await?.is_some() {
        return Err(CoreError::CategoryExists(name).into());
    }

    let now = Utc::now();
    let category = Category {
        id: Uuid::new_v4().to_string(),
        name,
        created_at: now,
        updated_at: now,
    };
    match db.categories().insert(&category).await {
        Ok(()) => {}
        Err(e) if e.is_unique_violation_on("categories") => {
            return Err(CoreError::CategoryExists(category.name).into())
        }
        Err(e) => return Err(e.into()),
    }

    info!(id = %category.id, name = %category.name, "Category created");
    Ok(category)
}

// =============================================================================
// Menus
// =============================================================================

/// Every live menu, available or not.
pub async fn list_menus(db: &Database) -> ServiceResult<Vec<Menu>> {
    Ok(db.menus().list().await?)
}

/// What guests may order.
pub async fn list_available_menus(db: &Database) -> ServiceResult<Vec<Menu>> {
    Ok(db.menus().list_available().await?)
}

struct MenuFields {
    name: String,
    description: Option<String>,
    price_cents: i64,
    is_available: bool,
    category_id: String,
}

async fn check_menu(db: &Database, req: MenuRequest) -> ServiceResult<MenuFields> {
    let name = validate_required("name", &req.name, 100)?;
    validate_amount_cents("price_cents", req.price_cents)?;
    let category_id = validate_required("category_id", &req.category_id, 64)?;

    if db.categories().get_by_id(&category_id).await?.is_none() {
        return Err(CoreError::CategoryNotFound(category_id).into());
    }

    Ok(MenuFields {
        name,
        description: req.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
        price_cents: req.price_cents,
        is_available: req.is_available,
        category_id,
    })
}

pub async fn create_menu(db: &Database, req: MenuRequest) -> ServiceResult<Menu> {
    let fields = check_menu(db, req).await?;
    let now = Utc::now();
    let menu = Menu {
        id: Uuid::new_v4().to_string(),
        name: fields.name,
        description: fields.description,
        price_cents: fields.price_cents,
        is_available: fields.is_available,
        category_id: fields.category_id,
        created_at: now,
        updated_at: now,
    };
    db.menus().insert(&menu).await?;

    info!(id = %menu.id, name = %menu.name, price_cents = menu.price_cents, "Menu created");
    Ok(menu)
}

/// Replaces a menu's editable fields. Past orders keep their snapshot.
pub async fn update_menu(db: &Database, id: &str, req: MenuRequest) -> ServiceResult<Menu> {
    let mut menu = db
        .menus()
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::MenuNotFound(id.to_string()))?;

    let fields = check_menu(db, req).await?;
    menu.name = fields.name;
    menu.description = fields.description;
    menu.price_cents = fields.price_cents;
    menu.is_available = fields.is_available;
    menu.category_id = fields.category_id;
    menu.updated_at = Utc::now();

    match db.menus().update(&menu).await {
        Ok(()) => {}
        Err(DbError::NotFound { .. }) => return Err(CoreError::MenuNotFound(id.to_string()).into()),
        Err(e) => return Err(e.into()),
    }

    info!(id = %menu.id, price_cents = menu.price_cents, available = menu.is_available, "Menu updated");
    Ok(menu)
}

pub async fn delete_menu(db: &Database, id: &str) -> ServiceResult<()> {
    match db.menus().soft_delete(id).await {
        Ok(()) => {
            info!(id = %id, "Menu deleted");
            Ok(())
        }
        Err(DbError::NotFound { .. }) => Err(CoreError::MenuNotFound(id.to_string()).into()),
        Err(e) => Err(e.into()),
    }
}
