use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    entity::{
        discounts::{Column as DiscountCol, Entity as Discounts, Model as DiscountModel},
        products::Model as ProductModel,
        sea_orm_active_enums::DiscountKind,
    },
    error::AppResult,
};

pub fn is_applicable(discount: &DiscountModel, now: DateTime<Utc>) -> bool {
    discount.active
        && discount.starts_at <= now
        && discount.ends_at.is_none_or(|ends_at| now < ends_at)
}

/// Amount after applying a single discount. Never negative.
pub fn apply_discount(amount: i64, discount: &DiscountModel) -> i64 {
    let discounted = match discount.kind {
        DiscountKind::Percentage => {
            let off = (amount as f64 * discount.value / 100.0).round() as i64;
            amount - off
        }
        DiscountKind::FixedAmount => amount - discount.value.round() as i64,
        DiscountKind::InterestFreeInstallments => amount,
    };
    discounted.max(0)
}

/// Lowest amount among the applicable discounts, or `amount` when none applies.
pub fn best_price<'a>(
    amount: i64,
    discounts: impl IntoIterator<Item = &'a DiscountModel>,
    now: DateTime<Utc>,
) -> i64 {
    discounts
        .into_iter()
        .filter(|discount| is_applicable(discount, now))
        .map(|discount| apply_discount(amount, discount))
        .min()
        .unwrap_or(amount)
        .min(amount)
}

/// Active product-scoped discounts grouped by product.
pub async fn product_discounts<C: ConnectionTrait>(
    conn: &C,
    product_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Vec<DiscountModel>>> {
    if product_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = Discounts::find()
        .filter(DiscountCol::ProductId.is_in(product_ids.iter().copied()))
        .filter(DiscountCol::Active.eq(true))
        .all(conn)
        .await?;

    let mut grouped: HashMap<Uuid, Vec<DiscountModel>> = HashMap::new();
    for discount in rows {
        if let Some(product_id) = discount.product_id {
            grouped.entry(product_id).or_default().push(discount);
        }
    }
    Ok(grouped)
}

/// Authoritative unit price for a product at `now`.
pub async fn unit_price<C: ConnectionTrait>(
    conn: &C,
    product: &ProductModel,
    now: DateTime<Utc>,
) -> AppResult<i64> {
    let discounts = product_discounts(conn, &[product.id]).await?;
    let applicable = discounts.get(&product.id).into_iter().flatten();
    Ok(best_price(product.price, applicable, now))
}

/// Amount due for an order total paid with `payment_method_id`.
pub async fn payment_amount<C: ConnectionTrait>(
    conn: &C,
    order_total: i64,
    payment_method_id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<i64> {
    let discounts = Discounts::find()
        .filter(DiscountCol::PaymentMethodId.eq(payment_method_id))
        .filter(DiscountCol::Active.eq(true))
        .all(conn)
        .await?;
    Ok(best_price(order_total, &discounts, now))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn discount(kind: DiscountKind, value: f64) -> DiscountModel {
        let now = Utc::now();
        DiscountModel {
            id: Uuid::new_v4(),
            name: "promo".into(),
            description: None,
            kind,
            value,
            starts_at: (now - Duration::days(1)).into(),
            ends_at: Some((now + Duration::days(1)).into()),
            conditions: None,
            active: true,
            product_id: Some(Uuid::new_v4()),
            payment_method_id: None,
        }
    }

    #[test]
    fn percentage_discount_rounds_to_minor_unit() {
        assert_eq!(apply_discount(999, &discount(DiscountKind::Percentage, 10.0)), 899);
        assert_eq!(apply_discount(1000, &discount(DiscountKind::Percentage, 100.0)), 0);
    }

    #[test]
    fn fixed_discount_never_goes_negative() {
        assert_eq!(apply_discount(500, &discount(DiscountKind::FixedAmount, 200.0)), 300);
        assert_eq!(apply_discount(500, &discount(DiscountKind::FixedAmount, 900.0)), 0);
    }

    #[test]
    fn installment_discount_keeps_price() {
        assert_eq!(
            apply_discount(1200, &discount(DiscountKind::InterestFreeInstallments, 6.0)),
            1200
        );
    }

    #[test]
    fn expired_or_inactive_discounts_are_ignored() {
        let now = Utc::now();
        let mut expired = discount(DiscountKind::Percentage, 50.0);
        expired.ends_at = Some((now - Duration::hours(1)).into());
        let mut inactive = discount(DiscountKind::Percentage, 50.0);
        inactive.active = false;
        let mut future = discount(DiscountKind::Percentage, 50.0);
        future.starts_at = (now + Duration::hours(1)).into();

        assert_eq!(best_price(1000, [&expired, &inactive, &future], now), 1000);
    }

    #[test]
    fn best_price_picks_largest_reduction() {
        let ten_pct = discount(DiscountKind::Percentage, 10.0);
        let fixed = discount(DiscountKind::FixedAmount, 250.0);
        assert_eq!(best_price(1000, [&ten_pct, &fixed], Utc::now()), 750);
    }
}
