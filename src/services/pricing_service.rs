use chrono::Utc;
use sea_orm::ConnectionTrait;
use uuid::Uuid;

use crate::{
    catalog::{self, CatalogSnapshot},
    dto::orders::OrderItemRequest,
    error::{AppError, AppResult},
    staging::StagedItem,
};

/// Orders at or above this amount ship for free.
pub const FREE_SHIPPING_THRESHOLD: i64 = 50_000;
pub const SHIPPING_FEE: i64 = 3_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrder {
    pub items: Vec<StagedItem>,
    pub total_amount: i64,
    pub shipping_fee: i64,
    pub final_amount: i64,
}

pub fn shipping_fee(total_amount: i64) -> i64 {
    if total_amount >= FREE_SHIPPING_THRESHOLD {
        0
    } else {
        SHIPPING_FEE
    }
}

/// Price `items` against the catalog; every line is checked before any total is produced.
pub async fn price_order<C: ConnectionTrait>(
    conn: &C,
    items: &[OrderItemRequest],
) -> AppResult<PricedOrder> {
    if items.is_empty() {
        return Err(AppError::EmptyItems);
    }

    let product_ids = unique(items.iter().map(|item| item.product_id));
    let color_ids = unique(items.iter().filter_map(|item| item.color_id));
    let size_ids = unique(items.iter().filter_map(|item| item.size_id));

    let snapshot = catalog::load_snapshot(conn, &product_ids, &color_ids, &size_ids).await?;
    price_items(&snapshot, items)
}

pub fn price_items(catalog: &CatalogSnapshot, items: &[OrderItemRequest]) -> AppResult<PricedOrder> {
    if items.is_empty() {
        return Err(AppError::EmptyItems);
    }

    let mut priced = Vec::with_capacity(items.len());
    let mut total_amount: i64 = 0;

    for item in items {
        if item.quantity <= 0 {
            return Err(AppError::BadRequest(format!(
                "quantity must be positive for product {}",
                item.product_id
            )));
        }

        let product = catalog
            .product(&item.product_id)
            .ok_or(AppError::UnknownProduct(item.product_id))?;

        if let Some(color_id) = item.color_id {
            if !catalog.color_exists(&color_id) {
                return Err(AppError::InvalidVariant(format!(
                    "color {color_id} does not exist"
                )));
            }
            if !product.color_ids.contains(&color_id) {
                return Err(AppError::InvalidVariant(format!(
                    "color {color_id} is not available for {}",
                    product.name
                )));
            }
        }

        if let Some(size_id) = item.size_id {
            if !catalog.size_exists(&size_id) {
                return Err(AppError::InvalidVariant(format!(
                    "size {size_id} does not exist"
                )));
            }
            if !product.size_ids.contains(&size_id) {
                return Err(AppError::InvalidVariant(format!(
                    "size {size_id} is not available for {}",
                    product.name
                )));
            }
        }

        let unit_price = product.unit_price();
        let line_total = unit_price
            .checked_mul(i64::from(item.quantity))
            .and_then(|line| total_amount.checked_add(line))
            .ok_or_else(|| AppError::BadRequest("order amount is too large".into()))?;
        total_amount = line_total;

        priced.push(StagedItem {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity: item.quantity,
            unit_price,
            color_id: item.color_id,
            size_id: item.size_id,
        });
    }

    let shipping_fee = shipping_fee(total_amount);
    let final_amount = total_amount
        .checked_add(shipping_fee)
        .ok_or_else(|| AppError::BadRequest("order amount is too large".into()))?;

    Ok(PricedOrder {
        items: priced,
        total_amount,
        shipping_fee,
        final_amount,
    })
}

/// Display name shared by the order row and the gateway: `"Shirt 외 2건"`.
pub fn order_name(items: &[StagedItem]) -> String {
    match items {
        [] => String::new(),
        [only] => only.product_name.clone(),
        [first, rest @ ..] => format!("{} 외 {}건", first.product_name, rest.len()),
    }
}

pub fn generate_order_id() -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("ORD-{}-{}", date, &suffix[..12])
}

fn unique(ids: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = ids.collect();
    ids.sort();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use super::*;
    use crate::catalog::CatalogProduct;

    struct Fixture {
        catalog: CatalogSnapshot,
        shirt: Uuid,
        pants: Uuid,
        red: Uuid,
        blue: Uuid,
        large: Uuid,
    }

    fn fixture() -> Fixture {
        let shirt = Uuid::new_v4();
        let pants = Uuid::new_v4();
        let red = Uuid::new_v4();
        let blue = Uuid::new_v4();
        let large = Uuid::new_v4();

        let mut products = HashMap::new();
        products.insert(
            shirt,
            CatalogProduct {
                id: shirt,
                name: "Linen Shirt".into(),
                price: 35000,
                sale_price: None,
                stock: 5,
                color_ids: HashSet::from([red]),
                size_ids: HashSet::from([large]),
            },
        );
        products.insert(
            pants,
            CatalogProduct {
                id: pants,
                name: "Chino Pants".into(),
                price: 30000,
                sale_price: Some(5000),
                stock: 5,
                color_ids: HashSet::new(),
                size_ids: HashSet::new(),
            },
        );

        Fixture {
            catalog: CatalogSnapshot {
                products,
                colors: HashSet::from([red, blue]),
                sizes: HashSet::from([large]),
            },
            shirt,
            pants,
            red,
            blue,
            large,
        }
    }

    fn line(product_id: Uuid, quantity: i32) -> OrderItemRequest {
        OrderItemRequest {
            product_id,
            quantity,
            color_id: None,
            size_id: None,
        }
    }

    #[test]
    fn totals_are_exact_and_include_shipping() {
        let f = fixture();
        let priced = price_items(&f.catalog, &[line(f.shirt, 2)]).unwrap();
        assert_eq!(priced.total_amount, 70000);
        assert_eq!(priced.shipping_fee, 0);
        assert_eq!(priced.final_amount, 70000);

        let priced = price_items(&f.catalog, &[line(f.pants, 1)]).unwrap();
        assert_eq!(priced.items[0].unit_price, 25000);
        assert_eq!(priced.total_amount, 25000);
        assert_eq!(priced.final_amount, 28000);
    }

    #[test]
    fn shipping_fee_boundary() {
        assert_eq!(shipping_fee(49_999), 3_000);
        assert_eq!(shipping_fee(50_000), 0);
        assert_eq!(shipping_fee(0), 3_000);
    }

    #[test]
    fn empty_and_unknown_items_are_rejected() {
        let f = fixture();
        assert!(matches!(price_items(&f.catalog, &[]), Err(AppError::EmptyItems)));

        let ghost = Uuid::new_v4();
        let err = price_items(&f.catalog, &[line(f.shirt, 1), line(ghost, 1)]).unwrap_err();
        assert!(matches!(err, AppError::UnknownProduct(id) if id == ghost));

        let err = price_items(&f.catalog, &[line(f.shirt, 0)]).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn variants_must_exist_and_belong_to_product() {
        let f = fixture();

        let mut ok = line(f.shirt, 1);
        ok.color_id = Some(f.red);
        ok.size_id = Some(f.large);
        assert!(price_items(&f.catalog, &[ok]).is_ok());

        let mut foreign = line(f.shirt, 1);
        foreign.color_id = Some(f.blue);
        let err = price_items(&f.catalog, &[foreign]).unwrap_err();
        assert!(matches!(err, AppError::InvalidVariant(msg) if msg.contains("not available")));

        let mut missing = line(f.shirt, 1);
        missing.size_id = Some(Uuid::new_v4());
        let err = price_items(&f.catalog, &[missing]).unwrap_err();
        assert!(matches!(err, AppError::InvalidVariant(msg) if msg.contains("does not exist")));
    }

    #[test]
    fn overflow_is_a_bad_request() {
        let mut f = fixture();
        if let Some(product) = f.catalog.products.get_mut(&f.shirt) {
            product.price = i64::MAX / 2;
        }
        let err = price_items(&f.catalog, &[line(f.shirt, 3)]).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn order_name_summarizes_lines() {
        let f = fixture();
        let priced = price_items(&f.catalog, &[line(f.shirt, 1), line(f.pants, 2)]).unwrap();
        assert_eq!(order_name(&priced.items), "Linen Shirt 외 1건");
        assert_eq!(order_name(&priced.items[..1]), "Linen Shirt");
    }

    #[test]
    fn order_ids_have_stable_shape() {
        let id = generate_order_id();
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 12);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert_ne!(id, generate_order_id());
    }
}
