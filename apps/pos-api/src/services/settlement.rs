//! # Cash Settlement
//!
//! End-of-day reconciliation of the cash each cashier holds.
//!
//! ```text
//! expected = Σ total_cents  where completed + paid + cash
//!                             and closed_by_user_id = cashier
//!                             and created_at in [date, date+1) UTC
//!
//! discrepancy = actual - expected        (stored once, never updated)
//! ```
//!
//! The pre-check only fails fast; `UNIQUE(date, user_id)` decides races.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use resto_core::report::{day_bounds, UNKNOWN_USER_NAME};
use resto_core::validation::{parse_date, validate_amount_cents};
use resto_core::{CoreError, Settlement};
use resto_db::Database;

use crate::error::ServiceResult;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSettlementRequest {
    pub date: String,
    pub actual_cash_cents: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A cashier's position for one date.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementView {
    pub date: NaiveDate,
    pub expected_cash_cents: i64,
    pub settlement: Option<Settlement>,
}

/// One row of the admin status-by-date listing.
#[derive(Debug, Clone, Serialize)]
pub struct CashierSettlementStatus {
    pub user_id: String,
    pub user_name: String,
    pub expected_cash_cents: i64,
    pub settlement: Option<Settlement>,
}

pub async fn expected_cash(db: &Database, date: NaiveDate, cashier_id: &str) -> ServiceResult<i64> {
    let (start, end) = day_bounds(date);
    Ok(db.transactions().expected_cash(cashier_id, start, end).await?)
}

pub async fn get_settlement(db: &Database, raw_date: &str, cashier_id: &str) -> ServiceResult<SettlementView> {
    let date = parse_date(raw_date)?;
    let expected_cash_cents = expected_cash(db, date, cashier_id).await?;
    let settlement = db.settlements().get(date, cashier_id).await?;

    Ok(SettlementView {
        date,
        expected_cash_cents,
        settlement,
    })
}

/// Records `cashier_id`'s declared cash for a date. Write-once.
pub async fn create_settlement(
    db: &Database,
    cashier_id: &str,
    req: CreateSettlementRequest,
) -> ServiceResult<Settlement> {
    let date = parse_date(&req.date)?;
    validate_amount_cents("actual_cash_cents", req.actual_cash_cents)?;

    let exists = || CoreError::SettlementAlreadyExists {
        date: date.to_string(),
        user_id: cashier_id.to_string(),
    };

    if db.settlements().get(date, cashier_id).await?.is_some() {
        return Err(exists().into());
    }

    let expected = expected_cash(db, date, cashier_id).await?;
    let settlement = Settlement {
        id: Uuid::new_v4().to_string(),
        date,
        user_id: cashier_id.to_string(),
        expected_cash_cents: expected,
        actual_cash_cents: req.actual_cash_cents,
        discrepancy_cents: req.actual_cash_cents - expected,
        notes: req.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        created_at: Utc::now(),
    };

    match db.settlements().insert(&settlement).await {
        Ok(()) => {}
        Err(e) if e.is_unique_violation_on("settlements") => return Err(exists().into()),
        Err(e) => return Err(e.into()),
    }

    info!(
        user_id = %cashier_id,
        date = %date,
        expected_cents = expected,
        actual_cents = settlement.actual_cash_cents,
        discrepancy_cents = settlement.discrepancy_cents,
        "Settlement recorded"
    );
    Ok(settlement)
}

/// Every cashier with closed cash sales or a settlement on the date.
pub async fn status_by_date(db: &Database, raw_date: &str) -> ServiceResult<Vec<CashierSettlementStatus>> {
    let date = parse_date(raw_date)?;
    let (start, end) = day_bounds(date);

    let closers = db.settlements().closers_for_date(date, start, end).await?;
    let mut settlements = db.settlements().list_by_date(date).await?;

    let mut rows: Vec<CashierSettlementStatus> = closers
        .into_iter()
        .map(|closer| {
            let settlement = settlements
                .iter()
                .position(|s| s.user_id == closer.user_id)
                .map(|i| settlements.swap_remove(i));
            CashierSettlementStatus {
                user_name: closer.user_name.unwrap_or_else(|| UNKNOWN_USER_NAME.to_string()),
                user_id: closer.user_id,
                expected_cash_cents: closer.expected_cash_cents,
                settlement,
            }
        })
        .collect();

    rows.sort_by(|a, b| a.user_name.cmp(&b.user_name).then_with(|| a.user_id.cmp(&b.user_id)));
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::services::test_support::{file_db, insert_closed, memory_db, seed_user};
    use chrono::TimeZone;
    use futures::future::join_all;
    use resto_core::{PaymentMethod, Role};

    const DATE: &str = "2026-01-30";

    async fn closed(db: &Database, closer: &str, method: PaymentMethod, total: i64, hour: u32) {
        let at = Utc.with_ymd_and_hms(2026, 1, 30, hour, 0, 0).unwrap();
        insert_closed(db, Some(closer), method, total, at).await;
    }

    fn declare(actual: i64) -> CreateSettlementRequest {
        CreateSettlementRequest {
            date: DATE.to_string(),
            actual_cash_cents: actual,
            notes: Some("  ".into()),
        }
    }

    #[tokio::test]
    async fn test_discrepancy_and_once_only() {
        let db = memory_db().await;
        let siti = seed_user(&db, "Siti", Role::Kasir).await;
        closed(&db, &siti.id, PaymentMethod::Cash, 1_100_000, 9).await;
        closed(&db, &siti.id, PaymentMethod::Cash, 2_200_000, 23).await;
        closed(&db, &siti.id, PaymentMethod::EWallet, 5_500_000, 12).await;

        let view = get_settlement(&db, DATE, &siti.id).await.unwrap();
        assert_eq!(view.expected_cash_cents, 3_300_000);
        assert!(view.settlement.is_none());

        let s = create_settlement(&db, &siti.id, declare(3_250_000)).await.unwrap();
        assert_eq!(s.expected_cash_cents, 3_300_000);
        assert_eq!(s.discrepancy_cents, -50_000);
        assert_eq!(s.notes, None);

        let err = create_settlement(&db, &siti.id, declare(3_300_000)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::SettlementAlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_validation() {
        let db = memory_db().await;
        let err = get_settlement(&db, "30-01-2026", "u").await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::Validation(_))));

        let err = create_settlement(&db, "u", declare(-1)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_concurrent_creation_yields_one() {
        let db = file_db().await;
        let siti = seed_user(&db, "Siti", Role::Kasir).await;
        closed(&db, &siti.id, PaymentMethod::Cash, 1_100_000, 10).await;

        let tasks = (0..8).map(|i| {
            let db = db.clone();
            let id = siti.id.clone();
            tokio::spawn(async move { create_settlement(&db, &id, declare(1_000_000 + i)).await })
        });
        let results = join_all(tasks).await;

        let ok = results.iter().filter(|r| matches!(r, Ok(Ok(_)))).count();
        let dup = results
            .iter()
            .filter(|r| matches!(r, Ok(Err(ServiceError::Core(CoreError::SettlementAlreadyExists { .. })))))
            .count();
        assert_eq!(ok, 1);
        assert_eq!(dup, 7);
    }

    #[tokio::test]
    async fn test_status_by_date_unions_closers_and_settlements() {
        let db = memory_db().await;
        let budi = seed_user(&db, "Budi", Role::Kasir).await;
        let ani = seed_user(&db, "Ani", Role::Kasir).await;
        let citra = seed_user(&db, "Citra", Role::Kasir).await;

        closed(&db, &budi.id, PaymentMethod::Cash, 1_100_000, 8).await;
        closed(&db, &ani.id, PaymentMethod::Cash, 2_200_000, 8).await;
        // Citra declared cash but closed nothing in cash.
        create_settlement(&db, &citra.id, declare(0)).await.unwrap();
        create_settlement(&db, &ani.id, declare(2_200_000)).await.unwrap();

        let rows = status_by_date(&db, DATE).await.unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.user_name.as_str()).collect();
        assert_eq!(names, ["Ani", "Budi", "Citra"]);

        assert_eq!(rows[0].expected_cash_cents, 2_200_000);
        assert_eq!(rows[0].settlement.as_ref().unwrap().discrepancy_cents, 0);
        assert!(rows[1].settlement.is_none());
        assert_eq!(rows[2].expected_cash_cents, 0);
        assert!(rows[2].settlement.is_some());
    }
}
