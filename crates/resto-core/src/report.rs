//! # Reporting Aggregator
//!
//! Read-only rollups over the closed-transaction ledger. The database layer
//! fetches qualifying rows (`completed` + `paid`); this module folds them.
//!
//! ## Series Windows
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  daily   (days = 7)     today-6 ─ today-5 ─ ... ─ today                 │
//! │                         "2026-01-24"          "2026-01-30"              │
//! │                                                                         │
//! │  monthly (months = 6)   2025-08 ─ 2025-09 ─ ... ─ 2026-01               │
//! │                                                                         │
//! │  Every bucket is present, empty ones carry zeros, keys ascend.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{OrderType, PaymentMethod, Transaction};

/// Placeholder shown when a closer cannot be resolved to a user.
pub const UNKNOWN_USER_NAME: &str = "-";

pub const DEFAULT_CHART_DAYS: u32 = 7;
pub const MAX_CHART_DAYS: u32 = 90;
pub const DEFAULT_CHART_MONTHS: u32 = 6;
pub const MAX_CHART_MONTHS: u32 = 24;

// =============================================================================
// Daily Report
// =============================================================================

/// Totals for one day of closed transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailySummary {
    pub date: String,
    pub total_transactions: i64,
    pub total_sales_cents: i64,
    pub total_cash_cents: i64,
    pub total_non_cash_cents: i64,
    pub total_discount_cents: i64,
    pub total_tax_cents: i64,
}

/// One closed transaction in the itemized report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReportItem {
    pub id: String,
    pub customer_name: String,
    pub order_type: OrderType,
    pub payment_method: PaymentMethod,
    pub total_cents: i64,
    pub closed_by_user_id: Option<String>,
    pub closed_by_user_name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailyReport {
    pub summary: DailySummary,
    pub items: Vec<ReportItem>,
}

/// Folds qualifying transactions into a summary.
pub fn summarize(date: NaiveDate, rows: &[Transaction]) -> DailySummary {
    let mut summary = DailySummary {
        date: date.format("%Y-%m-%d").to_string(),
        total_transactions: 0,
        total_sales_cents: 0,
        total_cash_cents: 0,
        total_non_cash_cents: 0,
        total_discount_cents: 0,
        total_tax_cents: 0,
    };

    for tx in rows {
        summary.total_transactions += 1;
        summary.total_sales_cents += tx.total_cents;
        if tx.payment_method.is_cash() {
            summary.total_cash_cents += tx.total_cents;
        } else {
            summary.total_non_cash_cents += tx.total_cents;
        }
        summary.total_discount_cents += tx.discount_cents;
        summary.total_tax_cents += tx.tax_cents;
    }

    summary
}

/// Builds the itemized list, oldest first.
///
/// `names` maps user id to display name; closers missing from it (or
/// orders without a closer) show [`UNKNOWN_USER_NAME`].
pub fn itemize(rows: &[Transaction], names: &HashMap<String, String>) -> Vec<ReportItem> {
    let mut items: Vec<ReportItem> = rows
        .iter()
        .map(|tx| ReportItem {
            id: tx.id.clone(),
            customer_name: tx.customer_name.clone(),
            order_type: tx.order_type,
            payment_method: tx.payment_method,
            total_cents: tx.total_cents,
            closed_by_user_id: tx.closed_by_user_id.clone(),
            closed_by_user_name: tx
                .closed_by_user_id
                .as_ref()
                .and_then(|id| names.get(id))
                .cloned()
                .unwrap_or_else(|| UNKNOWN_USER_NAME.to_string()),
            created_at: tx.created_at,
        })
        .collect();

    items.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    items
}

/// `[date 00:00, date+1 00:00)` in UTC.
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(chrono::NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

// =============================================================================
// Chart Series
// =============================================================================

/// A single bucket in a chart series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChartPoint {
    pub key: String,
    pub total_sales_cents: i64,
    pub total_transactions: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReportCharts {
    pub daily: Vec<ChartPoint>,
    pub monthly: Vec<ChartPoint>,
}

/// A qualifying row reduced to what charts need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleRow {
    pub created_at: DateTime<Utc>,
    pub total_cents: i64,
}

impl From<&Transaction> for SaleRow {
    fn from(tx: &Transaction) -> Self {
        SaleRow {
            created_at: tx.created_at,
            total_cents: tx.total_cents,
        }
    }
}

#[inline]
pub fn clamp_days(days: Option<u32>) -> u32 {
    days.unwrap_or(DEFAULT_CHART_DAYS).clamp(1, MAX_CHART_DAYS)
}

#[inline]
pub fn clamp_months(months: Option<u32>) -> u32 {
    months.unwrap_or(DEFAULT_CHART_MONTHS).clamp(1, MAX_CHART_MONTHS)
}

/// First day of the daily window for `days` points ending at `today`.
pub fn daily_start(today: NaiveDate, days: u32) -> NaiveDate {
    today - Duration::days(i64::from(days.saturating_sub(1)))
}

/// First day of the monthly window for `months` points ending at `today`'s month.
pub fn monthly_start(today: NaiveDate, months: u32) -> NaiveDate {
    let first = today.with_day(1).unwrap_or(today);
    first
        .checked_sub_months(Months::new(months.saturating_sub(1)))
        .unwrap_or(first)
}

/// Exactly `days` daily points ending at `today`.
pub fn daily_series(rows: &[SaleRow], today: NaiveDate, days: u32) -> Vec<ChartPoint> {
    let start = daily_start(today, days);
    let keys = start
        .iter_days()
        .take_while(|d| *d <= today)
        .map(|d| d.format("%Y-%m-%d").to_string());

    bucket(keys, rows, |row| row.created_at.date_naive().format("%Y-%m-%d").to_string())
}

/// Exactly `months` monthly points ending at `today`'s month.
pub fn monthly_series(rows: &[SaleRow], today: NaiveDate, months: u32) -> Vec<ChartPoint> {
    let start = monthly_start(today, months);
    let keys = (0..months).filter_map(move |offset| {
        start
            .checked_add_months(Months::new(offset))
            .map(|d| d.format("%Y-%m").to_string())
    });

    bucket(keys, rows, |row| row.created_at.format("%Y-%m").to_string())
}

fn bucket<K, F>(keys: K, rows: &[SaleRow], key_of: F) -> Vec<ChartPoint>
where
    K: Iterator<Item = String>,
    F: Fn(&SaleRow) -> String,
{
    let mut buckets: BTreeMap<String, (i64, i64)> = keys.map(|k| (k, (0, 0))).collect();

    for row in rows {
        if let Some((sales, count)) = buckets.get_mut(&key_of(row)) {
            *sales += row.total_cents;
            *count += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(key, (total_sales_cents, total_transactions))| ChartPoint {
            key,
            total_sales_cents,
            total_transactions,
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
