use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, Utc};
use sea_orm::ActiveEnum;
use uuid::Uuid;

use crate::{
    dto::reports::{
        ActiveUser, CancellationMetrics, CostMarginRow, Granularity, MonthlyCancellation,
        ProductSeasonality, SalesBucket,
    },
    entity::sea_orm_active_enums::OrderState,
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    routes::params::{
        CancellationQuery, CostMarginQuery, SalesByPeriodQuery, SeasonalityQuery,
    },
    state::AppState,
};

pub const DEFAULT_CANCELLATION_MONTHS: u32 = 3;
pub const MAX_CANCELLATION_MONTHS: u32 = 12;
pub const TOP_ACTIVE_USERS: usize = 5;

/// Midnight of `date` in the business offset, as a UTC instant.
pub fn local_midnight(date: NaiveDate, offset: FixedOffset) -> AppResult<DateTime<Utc>> {
    date.and_time(NaiveTime::MIN)
        .and_local_timezone(offset)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or(AppError::InvalidRange)
}

/// Half-open UTC range `[start, end)` covering whole local days.
pub fn day_range(
    start: NaiveDate,
    end: NaiveDate,
    offset: FixedOffset,
) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
    if start >= end {
        return Err(AppError::InvalidRange);
    }
    Ok((local_midnight(start, offset)?, local_midnight(end, offset)?))
}

pub fn period_key(at: DateTime<Utc>, offset: FixedOffset, granularity: Granularity) -> String {
    let local = at.with_timezone(&offset);
    match granularity {
        Granularity::Daily => local.format("%Y-%m-%d").to_string(),
        Granularity::Weekly => {
            let week = local.iso_week();
            format!("{}-W{:02}", week.year(), week.week())
        }
        Granularity::Monthly => local.format("%Y-%m").to_string(),
    }
}

/// Groups `(created_at, total)` pairs into sorted period buckets.
pub fn bucket_sales(
    orders: &[(DateTime<Utc>, i64)],
    offset: FixedOffset,
    granularity: Granularity,
) -> Vec<SalesBucket> {
    let mut buckets: BTreeMap<String, (i64, i64)> = BTreeMap::new();
    for (created_at, total) in orders {
        let entry = buckets
            .entry(period_key(*created_at, offset, granularity))
            .or_default();
        entry.0 += total;
        entry.1 += 1;
    }
    buckets
        .into_iter()
        .map(|(period, (total_sales, order_count))| SalesBucket {
            period,
            total_sales,
            order_count,
        })
        .collect()
}

/// Every product gets all twelve months, zero when nothing was sold.
pub fn seasonality(
    products: Vec<(Uuid, String)>,
    sales: &[(Uuid, DateTime<Utc>, i64)],
    offset: FixedOffset,
) -> Vec<ProductSeasonality> {
    let mut units: HashMap<(Uuid, u32), i64> = HashMap::new();
    for (product_id, sold_at, quantity) in sales {
        let month = sold_at.with_timezone(&offset).month();
        *units.entry((*product_id, month)).or_default() += quantity;
    }

    products
        .into_iter()
        .map(|(product_id, product_name)| ProductSeasonality {
            sales_by_month: (1..=12)
                .map(|month| {
                    let sold = units.get(&(product_id, month)).copied().unwrap_or(0);
                    (month, sold)
                })
                .collect(),
            product_id,
            product_name,
        })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Margin is measured on the sale price; a free product has no margin.
pub fn margin_pct(price: i64, purchase_cost: i64) -> f64 {
    if price == 0 {
        return 0.0;
    }
    round2((price - purchase_cost) as f64 / price as f64 * 100.0)
}

pub fn cost_margin_row(
    product_id: Uuid,
    name: String,
    price: i64,
    purchase_cost: Option<i64>,
    units_sold: i64,
) -> CostMarginRow {
    let cost = purchase_cost.unwrap_or(0);
    CostMarginRow {
        product_id,
        name,
        units_sold,
        cost_total: cost * units_sold,
        profit_total: (price - cost) * units_sold,
        margin_pct: margin_pct(price, cost),
    }
}

pub fn cancelled_pct(total: i64, cancelled: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(cancelled as f64 / total as f64 * 100.0)
}

pub fn validate_months(months: Option<u32>) -> AppResult<u32> {
    let months = months.unwrap_or(DEFAULT_CANCELLATION_MONTHS);
    if !(1..=MAX_CANCELLATION_MONTHS).contains(&months) {
        return Err(AppError::BadRequest(format!(
            "months must be between 1 and {MAX_CANCELLATION_MONTHS}"
        )));
    }
    Ok(months)
}

/// `(year, month)` pairs for the trailing window ending at `(year, month)`, oldest first.
pub fn trailing_months(year: i32, month: u32, months: u32) -> Vec<(i32, u32)> {
    let current = year * 12 + month as i32 - 1;
    (0..months as i32)
        .rev()
        .map(|back| {
            let index = current - back;
            (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
        })
        .collect()
}

/// Per-month cancellation history from `(created_at, cancelled)` pairs.
pub fn cancellation_history(
    orders: &[(DateTime<Utc>, bool)],
    now: DateTime<Utc>,
    offset: FixedOffset,
    months: u32,
) -> Vec<MonthlyCancellation> {
    let local_now = now.with_timezone(&offset);
    let mut counts: HashMap<(i32, u32), (i64, i64)> = HashMap::new();
    for (created_at, cancelled) in orders {
        let local = created_at.with_timezone(&offset);
        let entry = counts.entry((local.year(), local.month())).or_default();
        entry.0 += 1;
        if *cancelled {
            entry.1 += 1;
        }
    }

    trailing_months(local_now.year(), local_now.month(), months)
        .into_iter()
        .map(|(year, month)| {
            let (total_orders, cancelled_orders) =
                counts.get(&(year, month)).copied().unwrap_or((0, 0));
            MonthlyCancellation {
                month: format!("{year:04}-{month:02}"),
                total_orders,
                cancelled_orders,
                cancelled_pct: cancelled_pct(total_orders, cancelled_orders),
            }
        })
        .collect()
}

/// Most orders first, ties broken by ascending user id.
pub fn rank_active_users(mut users: Vec<ActiveUser>, limit: usize) -> Vec<ActiveUser> {
    users.sort_by(|a, b| {
        b.order_count
            .cmp(&a.order_count)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    users.truncate(limit);
    users
}

pub async fn sales_by_period(
    state: &AppState,
    user: &AuthUser,
    query: SalesByPeriodQuery,
) -> AppResult<ApiResponse<Vec<SalesBucket>>> {
    ensure_admin(user)?;
    let offset = state.config.report_offset();
    let (from, to) = day_range(query.start, query.end, offset)?;

    let rows: Vec<(DateTime<Utc>, i64)> = sqlx::query_as(
        r#"
        SELECT created_at, total
        FROM orders
        WHERE state = $1 AND created_at >= $2 AND created_at < $3
        "#,
    )
    .bind(OrderState::Delivered.to_value())
    .bind(from)
    .bind(to)
    .fetch_all(&state.pool)
    .await?;

    let buckets = bucket_sales(&rows, offset, query.granularity);
    Ok(ApiResponse::success("Sales by period", buckets, Some(Meta::empty())))
}

pub async fn product_seasonality(
    state: &AppState,
    user: &AuthUser,
    query: SeasonalityQuery,
) -> AppResult<ApiResponse<Vec<ProductSeasonality>>> {
    ensure_admin(user)?;
    let offset = state.config.report_offset();
    let start = NaiveDate::from_ymd_opt(query.year, 1, 1).ok_or(AppError::InvalidRange)?;
    let end = NaiveDate::from_ymd_opt(query.year + 1, 1, 1).ok_or(AppError::InvalidRange)?;
    let (from, to) = day_range(start, end, offset)?;

    let products: Vec<(Uuid, String)> =
        sqlx::query_as("SELECT id, name FROM products ORDER BY name, id")
            .fetch_all(&state.pool)
            .await?;

    let sales: Vec<(Uuid, DateTime<Utc>, i64)> = sqlx::query_as(
        r#"
        SELECT ol.product_id, o.created_at, ol.quantity::BIGINT
        FROM order_lines ol
        JOIN orders o ON o.id = ol.order_id
        WHERE o.state = $1 AND o.created_at >= $2 AND o.created_at < $3
        "#,
    )
    .bind(OrderState::Delivered.to_value())
    .bind(from)
    .bind(to)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Seasonality",
        seasonality(products, &sales, offset),
        Some(Meta::empty()),
    ))
}

#[derive(sqlx::FromRow)]
struct CostRow {
    id: Uuid,
    name: String,
    price: i64,
    purchase_cost: Option<i64>,
    units_sold: i64,
}

pub async fn cost_margin(
    state: &AppState,
    user: &AuthUser,
    query: CostMarginQuery,
) -> AppResult<ApiResponse<Vec<CostMarginRow>>> {
    ensure_admin(user)?;

    let rows = sqlx::query_as::<_, CostRow>(
        r#"
        SELECT p.id, p.name, p.price, p.purchase_cost,
               COALESCE(SUM(ol.quantity) FILTER (WHERE o.state = $1), 0)::BIGINT AS units_sold
        FROM products p
        LEFT JOIN order_lines ol ON ol.product_id = p.id
        LEFT JOIN orders o ON o.id = ol.order_id
        WHERE ($2::UUID IS NULL OR p.id = $2)
          AND ($3::UUID IS NULL OR p.category_id = $3)
        GROUP BY p.id, p.name, p.price, p.purchase_cost
        ORDER BY p.name, p.id
        "#,
    )
    .bind(OrderState::Delivered.to_value())
    .bind(query.product_id)
    .bind(query.category_id)
    .fetch_all(&state.pool)
    .await?;

    if query.product_id.is_some() && rows.is_empty() {
        return Err(AppError::NotFound);
    }

    let report = rows
        .into_iter()
        .map(|row| cost_margin_row(row.id, row.name, row.price, row.purchase_cost, row.units_sold))
        .collect();
    Ok(ApiResponse::success("Cost and margin", report, Some(Meta::empty())))
}

pub async fn cancellation_metrics(
    state: &AppState,
    user: &AuthUser,
    query: CancellationQuery,
) -> AppResult<ApiResponse<CancellationMetrics>> {
    ensure_admin(user)?;
    let months = validate_months(query.months)?;
    let offset = state.config.report_offset();
    let cancelled = OrderState::Cancelled.to_value();

    let (total_orders, cancelled_orders): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*), COUNT(*) FILTER (WHERE state = $1)
        FROM orders
        "#,
    )
    .bind(cancelled.as_str())
    .fetch_one(&state.pool)
    .await?;

    let now = Utc::now();
    let local_now = now.with_timezone(&offset);
    let (first_year, first_month) = trailing_months(local_now.year(), local_now.month(), months)
        .first()
        .copied()
        .unwrap_or((local_now.year(), local_now.month()));
    let window_start = NaiveDate::from_ymd_opt(first_year, first_month, 1)
        .ok_or(AppError::InvalidRange)
        .and_then(|date| local_midnight(date, offset))?;

    let rows: Vec<(DateTime<Utc>, bool)> = sqlx::query_as(
        r#"
        SELECT created_at, state = $1
        FROM orders
        WHERE created_at >= $2
        "#,
    )
    .bind(cancelled.as_str())
    .bind(window_start)
    .fetch_all(&state.pool)
    .await?;

    let metrics = CancellationMetrics {
        total_orders,
        cancelled_orders,
        cancelled_pct: cancelled_pct(total_orders, cancelled_orders),
        history: cancellation_history(&rows, now, offset, months),
    };
    Ok(ApiResponse::success("Cancellations", metrics, Some(Meta::empty())))
}

#[derive(sqlx::FromRow)]
struct UserOrderCount {
    id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    order_count: i64,
}

pub async fn most_active_users(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<Vec<ActiveUser>>> {
    ensure_admin(user)?;

    let rows = sqlx::query_as::<_, UserOrderCount>(
        r#"
        SELECT u.id, u.email, u.first_name, u.last_name, COUNT(o.id) AS order_count
        FROM users u
        JOIN orders o ON o.user_id = u.id
        GROUP BY u.id, u.email, u.first_name, u.last_name
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    let users = rows
        .into_iter()
        .map(|row| ActiveUser {
            user_id: row.id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            order_count: row.order_count,
        })
        .collect();

    Ok(ApiResponse::success(
        "Most active users",
        rank_active_users(users, TOP_ACTIVE_USERS),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn business() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_or_reversed_range_is_invalid() {
        let day = date(2025, 3, 10);
        assert!(matches!(day_range(day, day, business()), Err(AppError::InvalidRange)));
        assert!(matches!(
            day_range(date(2025, 3, 11), day, business()),
            Err(AppError::InvalidRange)
        ));
    }

    #[test]
    fn day_range_starts_at_local_midnight() {
        let (from, to) = day_range(date(2025, 3, 10), date(2025, 3, 11), business()).unwrap();
        assert_eq!(from, utc(2025, 3, 10, 3));
        assert_eq!(to, utc(2025, 3, 11, 3));
    }

    #[test]
    fn late_utc_orders_fall_on_the_previous_local_day() {
        // 01:00 UTC is 22:00 of the previous day at UTC-3.
        let orders = [(utc(2025, 3, 11, 1), 500), (utc(2025, 3, 10, 15), 250)];
        let buckets = bucket_sales(&orders, business(), Granularity::Daily);
        assert_eq!(
            buckets,
            vec![SalesBucket {
                period: "2025-03-10".into(),
                total_sales: 750,
                order_count: 2,
            }]
        );
    }

    #[test]
    fn weekly_and_monthly_keys() {
        let at = utc(2025, 1, 1, 12);
        assert_eq!(period_key(at, business(), Granularity::Weekly), "2025-W01");
        assert_eq!(period_key(at, business(), Granularity::Monthly), "2025-01");
        // 2024-12-30 belongs to ISO week 1 of 2025.
        assert_eq!(
            period_key(utc(2024, 12, 30, 12), business(), Granularity::Weekly),
            "2025-W01"
        );
    }

    #[test]
    fn buckets_are_sorted_by_period() {
        let orders = [
            (utc(2025, 5, 2, 12), 10),
            (utc(2025, 2, 2, 12), 20),
            (utc(2025, 5, 20, 12), 30),
        ];
        let periods: Vec<_> = bucket_sales(&orders, business(), Granularity::Monthly)
            .into_iter()
            .map(|bucket| (bucket.period, bucket.total_sales, bucket.order_count))
            .collect();
        assert_eq!(
            periods,
            vec![("2025-02".to_string(), 20, 1), ("2025-05".to_string(), 40, 2)]
        );
    }

    #[test]
    fn seasonality_fills_every_month() {
        let laptop = Uuid::new_v4();
        let mouse = Uuid::new_v4();
        let sales = [
            (laptop, utc(2025, 3, 5, 12), 2),
            (laptop, utc(2025, 3, 20, 12), 1),
            (laptop, utc(2025, 7, 1, 12), 4),
        ];
        let report = seasonality(
            vec![(laptop, "Laptop".into()), (mouse, "Mouse".into())],
            &sales,
            business(),
        );

        assert_eq!(report.len(), 2);
        assert_eq!(report[0].sales_by_month.len(), 12);
        assert_eq!(report[0].sales_by_month[&3], 3);
        assert_eq!(report[0].sales_by_month[&7], 4);
        assert_eq!(report[0].sales_by_month[&1], 0);
        assert!(report[1].sales_by_month.values().all(|units| *units == 0));
    }

    #[test]
    fn laptop_margin_scenario() {
        let row = cost_margin_row(Uuid::new_v4(), "Laptop".into(), 1000, Some(700), 2);
        assert_eq!(row.cost_total, 1400);
        assert_eq!(row.profit_total, 600);
        assert_eq!(row.margin_pct, 30.0);
    }

    #[test]
    fn free_products_have_zero_margin() {
        assert_eq!(margin_pct(0, 50), 0.0);
        let row = cost_margin_row(Uuid::new_v4(), "Gift".into(), 0, None, 3);
        assert_eq!(row.margin_pct, 0.0);
        assert_eq!(row.cost_total, 0);
    }

    #[test]
    fn missing_cost_counts_as_zero() {
        let row = cost_margin_row(Uuid::new_v4(), "Cable".into(), 200, None, 5);
        assert_eq!(row.cost_total, 0);
        assert_eq!(row.profit_total, 1000);
        assert_eq!(row.margin_pct, 100.0);
    }

    #[test]
    fn no_orders_means_no_cancellations() {
        assert_eq!(cancelled_pct(0, 0), 0.0);
        assert_eq!(cancelled_pct(4, 1), 25.0);
        assert_eq!(cancelled_pct(3, 1), 33.33);
    }

    #[test]
    fn months_window_is_bounded() {
        assert_eq!(validate_months(None).unwrap(), 3);
        assert_eq!(validate_months(Some(12)).unwrap(), 12);
        assert!(matches!(validate_months(Some(0)), Err(AppError::BadRequest(_))));
        assert!(matches!(validate_months(Some(13)), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn trailing_months_cross_year_boundaries() {
        assert_eq!(
            trailing_months(2025, 2, 3),
            vec![(2024, 12), (2025, 1), (2025, 2)]
        );
        assert_eq!(trailing_months(2025, 6, 1), vec![(2025, 6)]);
    }

    #[test]
    fn history_is_oldest_first_and_zero_filled() {
        let now = utc(2025, 3, 15, 12);
        let orders = [
            (utc(2025, 3, 1, 12), true),
            (utc(2025, 3, 2, 12), false),
            (utc(2025, 1, 10, 12), false),
        ];
        let history = cancellation_history(&orders, now, business(), 3);
        let months: Vec<_> = history.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, vec!["2025-01", "2025-02", "2025-03"]);
        assert_eq!(history[1].total_orders, 0);
        assert_eq!(history[1].cancelled_pct, 0.0);
        assert_eq!(history[2].cancelled_orders, 1);
        assert_eq!(history[2].cancelled_pct, 50.0);
    }

    #[test]
    fn active_users_ties_break_on_user_id() {
        let ids: Vec<Uuid> = (1..=7u128).map(Uuid::from_u128).collect();
        let user = |id: Uuid, order_count: i64| ActiveUser {
            user_id: id,
            email: format!("{id}@shop.test"),
            first_name: "a".into(),
            last_name: "b".into(),
            order_count,
        };
        let ranked = rank_active_users(
            vec![
                user(ids[3], 2),
                user(ids[1], 5),
                user(ids[6], 2),
                user(ids[0], 1),
                user(ids[2], 5),
                user(ids[4], 2),
                user(ids[5], 9),
            ],
            TOP_ACTIVE_USERS,
        );
        let order: Vec<Uuid> = ranked.iter().map(|u| u.user_id).collect();
        assert_eq!(order, vec![ids[5], ids[1], ids[2], ids[3], ids[4]]);
    }
}
