//! Read-only reporting over the closed-transaction ledger.

use std::collections::{BTreeSet, HashMap};

use chrono::{Duration, NaiveDate};

use resto_core::report::{self, DailyReport, ReportCharts, SaleRow};
use resto_core::validation::parse_date;
use resto_core::Role;
use resto_db::{Database, LedgerFilter};

use crate::error::ServiceResult;

/// Daily summary plus itemized list.
///
/// A cashier only ever sees their own closings; `cashier_filter` is
/// honoured for admins.
pub async fn report_by_date(
    db: &Database,
    caller_role: Role,
    caller_id: &str,
    raw_date: &str,
    cashier_filter: Option<String>,
) -> ServiceResult<DailyReport> {
    let date = parse_date(raw_date)?;
    let closed_by = match caller_role {
        Role::Kasir => Some(caller_id.to_string()),
        _ => cashier_filter.filter(|c| !c.trim().is_empty()),
    };

    let (start, end) = report::day_bounds(date);
    let rows = db
        .transactions()
        .ledger(&LedgerFilter::between(start, end).closed_by(closed_by))
        .await?;

    let closer_ids: Vec<String> = rows
        .iter()
        .filter_map(|tx| tx.closed_by_user_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let names: HashMap<String, String> = db.users().names_by_ids(&closer_ids).await?.into_iter().collect();

    Ok(DailyReport {
        summary: report::summarize(date, &rows),
        items: report::itemize(&rows, &names),
    })
}

/// Zero-filled daily and monthly sales series ending at `today`.
pub async fn charts(
    db: &Database,
    today: NaiveDate,
    days: Option<u32>,
    months: Option<u32>,
) -> ServiceResult<ReportCharts> {
    let days = report::clamp_days(days);
    let months = report::clamp_months(months);

    let from = report::daily_start(today, days).min(report::monthly_start(today, months));
    let (start, _) = report::day_bounds(from);
    let (end, _) = report::day_bounds(today + Duration::days(1));

    let rows: Vec<SaleRow> = db.transactions().sales_rows(start, end).await?;

    Ok(ReportCharts {
        daily: report::daily_series(&rows, today, days),
        monthly: report::monthly_series(&rows, today, months),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{insert_closed, memory_db, seed_user};
    use chrono::{TimeZone, Utc};
    use resto_core::report::UNKNOWN_USER_NAME;
    use resto_core::PaymentMethod;

    #[tokio::test]
    async fn test_report_scoped_to_cashier() {
        let db = memory_db().await;
        let siti = seed_user(&db, "Siti", Role::Kasir).await;
        let budi = seed_user(&db, "Budi", Role::Kasir).await;
        let admin = seed_user(&db, "Admin", Role::Admin).await;
        let at = |h| Utc.with_ymd_and_hms(2026, 1, 30, h, 0, 0).unwrap();

        insert_closed(&db, Some(siti.id.as_str()), PaymentMethod::Cash, 1_100_000, at(14)).await;
        insert_closed(&db, Some(siti.id.as_str()), PaymentMethod::EWallet, 2_200_000, at(9)).await;
        insert_closed(&db, Some(budi.id.as_str()), PaymentMethod::Cash, 3_300_000, at(10)).await;
        insert_closed(&db, None, PaymentMethod::CreditCard, 4_400_000, at(11)).await;

        // Cashier asking for someone else still gets their own rows.
        let own = report_by_date(&db, Role::Kasir, &siti.id, "2026-01-30", Some(budi.id.clone()))
            .await
            .unwrap();
        assert_eq!(own.summary.total_transactions, 2);
        assert_eq!(own.summary.total_cash_cents, 1_100_000);
        assert_eq!(own.summary.total_non_cash_cents, 2_200_000);
        assert_eq!(own.items[0].total_cents, 2_200_000);
        assert_eq!(own.items[0].closed_by_user_name, "Siti");

        let all = report_by_date(&db, Role::Admin, &admin.id, "2026-01-30", None).await.unwrap();
        assert_eq!(all.summary.total_transactions, 4);
        assert_eq!(all.summary.total_sales_cents, 11_000_000);
        assert!(all.items.iter().any(|i| i.closed_by_user_name == UNKNOWN_USER_NAME));

        let budi_only = report_by_date(&db, Role::Admin, &admin.id, "2026-01-30", Some(budi.id.clone()))
            .await
            .unwrap();
        assert_eq!(budi_only.summary.total_sales_cents, 3_300_000);

        let other_day = report_by_date(&db, Role::Admin, &admin.id, "2026-01-31", None).await.unwrap();
        assert_eq!(other_day.summary.total_transactions, 0);
    }

    #[tokio::test]
    async fn test_charts_are_zero_filled() {
        let db = memory_db().await;
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();

        insert_closed(&db, None, PaymentMethod::Cash, 1_100_000, Utc.with_ymd_and_hms(2026, 3, 9, 8, 0, 0).unwrap()).await;
        insert_closed(&db, None, PaymentMethod::Cash, 2_200_000, Utc.with_ymd_and_hms(2026, 3, 10, 23, 0, 0).unwrap()).await;
        insert_closed(&db, None, PaymentMethod::Cash, 3_300_000, Utc.with_ymd_and_hms(2026, 1, 2, 8, 0, 0).unwrap()).await;

        let series = charts(&db, today, Some(3), Some(3)).await.unwrap();
        assert_eq!(series.daily.len(), 3);
        assert_eq!(series.daily[0].key, "2026-03-08");
        assert_eq!(series.daily[0].total_sales_cents, 0);
        assert_eq!(series.daily[1].total_sales_cents, 1_100_000);
        assert_eq!(series.daily[2].total_sales_cents, 2_200_000);

        let keys: Vec<&str> = series.monthly.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, ["2026-01", "2026-02", "2026-03"]);
        assert_eq!(series.monthly[0].total_transactions, 1);
        assert_eq!(series.monthly[1].total_transactions, 0);
        assert_eq!(series.monthly[2].total_sales_cents, 3_300_000);

        let clamped = charts(&db, today, Some(0), Some(500)).await.unwrap();
        assert_eq!(clamped.daily.len(), 1);
        assert_eq!(clamped.monthly.len(), 24);
    }
}
