//! Promo administration and public promo reads.
//!
//! Codes are stored uppercased and are unique among live (non-deleted)
//! promos. Validation here never consumes a use; only checkout does.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use resto_core::pricing::apply_promo;
use resto_core::validation::{normalize_promo_code, validate_amount_cents};
use resto_core::{CoreError, Money, Promo, PromoKind, ValidationError};
use resto_db::{Database, DbError};

use crate::error::{ServiceError, ServiceResult};

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePromoRequest {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    pub kind: PromoKind,
    pub value: i64,
    #[serde(default)]
    pub min_purchase_cents: i64,
    #[serde(default)]
    pub max_discount_cents: i64,
    #[serde(default)]
    pub usage_limit: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

/// Partial update; absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromoPatch {
    pub code: Option<String>,
    /// An empty string clears the description.
    pub description: Option<String>,
    pub kind: Option<PromoKind>,
    pub value: Option<i64>,
    pub min_purchase_cents: Option<i64>,
    pub max_discount_cents: Option<i64>,
    pub usage_limit: Option<i64>,
    pub is_active: Option<bool>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidatePromoRequest {
    pub code: String,
    pub subtotal_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromoQuote {
    pub code: String,
    pub discount_cents: i64,
    pub subtotal_cents: i64,
    pub final_subtotal_cents: i64,
}

fn check_rules(promo: &Promo) -> ServiceResult<()> {
    validate_amount_cents("value", promo.value)?;
    validate_amount_cents("min_purchase_cents", promo.min_purchase_cents)?;
    validate_amount_cents("max_discount_cents", promo.max_discount_cents)?;
    validate_amount_cents("usage_limit", promo.usage_limit)?;

    if promo.kind == PromoKind::Percentage && !(1..=100).contains(&promo.value) {
        return Err(ValidationError::OutOfRange {
            field: "value".to_string(),
            min: 1,
            max: 100,
        }
        .into());
    }
    if promo.end_date < promo.start_date {
        return Err(ValidationError::InvalidFormat {
            field: "end_date".to_string(),
            reason: "must not be before start_date".to_string(),
        }
        .into());
    }
    Ok(())
}

fn clean_description(description: Option<String>) -> Option<String> {
    description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty())
}

fn duplicate_or(err: DbError, code: &str) -> ServiceError {
    if err.is_unique_violation_on("promos") {
        CoreError::PromoCodeExists(code.to_string()).into()
    } else {
        err.into()
    }
}

pub async fn create_promo(db: &Database, req: CreatePromoRequest) -> ServiceResult<Promo> {
    let code = normalize_promo_code(&req.code)?;
    let now = Utc::now();
    let promo = Promo {
        id: Uuid::new_v4().to_string(),
        code: code.clone(),
        description: clean_description(req.description),
        kind: req.kind,
        value: req.value,
        min_purchase_cents: req.min_purchase_cents,
        max_discount_cents: req.max_discount_cents,
        usage_limit: req.usage_limit,
        usage_count: 0,
        is_active: req.is_active,
        start_date: req.start_date,
        end_date: req.end_date,
        created_at: now,
        updated_at: now,
    };
    check_rules(&promo)?;

    if db.promos().code_taken(&code, None).await? {
        return Err(CoreError::PromoCodeExists(code).into());
    }
    db.promos().insert(&promo).await.map_err(|e| duplicate_or(e, &code))?;

    info!(id = %promo.id, code = %promo.code, "Promo created");
    Ok(promo)
}

pub async fn list_promos(db: &Database) -> ServiceResult<Vec<Promo>> {
    Ok(db.promos().list().await?)
}

pub async fn get_promo(db: &Database, id: &str) -> ServiceResult<Promo> {
    db.promos()
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::PromoNotFound(id.to_string()).into())
}

pub async fn update_promo(db: &Database, id: &str, patch: PromoPatch) -> ServiceResult<Promo> {
    let mut promo = get_promo(db, id).await?;

    if let Some(code) = patch.code {
        let code = normalize_promo_code(&code)?;
        if code != promo.code && db.promos().code_taken(&code, Some(id)).await? {
            return Err(CoreError::PromoCodeExists(code).into());
        }
        promo.code = code;
    }
    if let Some(description) = patch.description {
        promo.description = clean_description(Some(description));
    }
    if let Some(kind) = patch.kind {
        promo.kind = kind;
    }
    if let Some(value) = patch.value {
        promo.value = value;
    }
    if let Some(min) = patch.min_purchase_cents {
        promo.min_purchase_cents = min;
    }
    if let Some(max) = patch.max_discount_cents {
        promo.max_discount_cents = max;
    }
    if let Some(limit) = patch.usage_limit {
        promo.usage_limit = limit;
    }
    if let Some(active) = patch.is_active {
        promo.is_active = active;
    }
    if let Some(start) = patch.start_date {
        promo.start_date = start;
    }
    if let Some(end) = patch.end_date {
        promo.end_date = end;
    }
    check_rules(&promo)?;

    let code = promo.code.clone();
    db.promos().update(&promo).await.map_err(|e| duplicate_or(e, &code))?;

    info!(id = %id, code = %code, "Promo updated");
    get_promo(db, id).await
}

pub async fn delete_promo(db: &Database, id: &str) -> ServiceResult<()> {
    match db.promos().soft_delete(id).await {
        Ok(()) => {
            info!(id = %id, "Promo deleted");
            Ok(())
        }
        Err(DbError::NotFound { .. }) => Err(CoreError::PromoNotFound(id.to_string()).into()),
        Err(e) => Err(e.into()),
    }
}

pub async fn list_active_promos(db: &Database) -> ServiceResult<Vec<Promo>> {
    Ok(db.promos().list_active(Utc::now()).await?)
}

/// Quotes a promo against a subtotal without consuming a use.
pub async fn validate_promo(db: &Database, req: ValidatePromoRequest) -> ServiceResult<PromoQuote> {
    let code = normalize_promo_code(&req.code)?;
    validate_amount_cents("subtotal_cents", req.subtotal_cents)?;

    let found = db.promos().find_by_code(&code).await?;
    let subtotal = Money::from_cents(req.subtotal_cents);
    let applied = apply_promo(&code, found.as_ref(), subtotal, Utc::now())?;

    Ok(PromoQuote {
        code: applied.code,
        discount_cents: applied.discount.cents(),
        subtotal_cents: subtotal.cents(),
        final_subtotal_cents: (subtotal - applied.discount).cents(),
    })
}
