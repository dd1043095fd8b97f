//! Read-only view of the product catalog used while pricing a checkout.

use std::collections::{HashMap, HashSet};

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entity::{
    Colors, ProductColors, ProductSizes, Products, Sizes, colors, product_colors, product_sizes,
    products, sizes,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogProduct {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub sale_price: Option<i64>,
    pub stock: i32,
    pub color_ids: HashSet<Uuid>,
    pub size_ids: HashSet<Uuid>,
}

impl CatalogProduct {
    /// `sale_price` is a discount off `price`, never below zero.
    pub fn unit_price(&self) -> i64 {
        match self.sale_price {
            Some(discount) if discount > 0 => (self.price - discount).max(0),
            _ => self.price,
        }
    }
}

/// Everything a pricing pass needs, fetched up front in a fixed number of queries.
#[derive(Debug, Default, Clone)]
pub struct CatalogSnapshot {
    pub products: HashMap<Uuid, CatalogProduct>,
    pub colors: HashSet<Uuid>,
    pub sizes: HashSet<Uuid>,
}

impl CatalogSnapshot {
    pub fn product(&self, id: &Uuid) -> Option<&CatalogProduct> {
        self.products.get(id)
    }

    pub fn color_exists(&self, id: &Uuid) -> bool {
        self.colors.contains(id)
    }

    pub fn size_exists(&self, id: &Uuid) -> bool {
        self.sizes.contains(id)
    }
}

pub async fn load_snapshot<C: ConnectionTrait>(
    conn: &C,
    product_ids: &[Uuid],
    color_ids: &[Uuid],
    size_ids: &[Uuid],
) -> Result<CatalogSnapshot, DbErr> {
    if product_ids.is_empty() {
        return Ok(CatalogSnapshot::default());
    }

    let rows = Products::find()
        .filter(products::Column::Id.is_in(product_ids.iter().copied()))
        .all(conn)
        .await?;

    let mut catalog: HashMap<Uuid, CatalogProduct> = rows
        .into_iter()
        .map(|row| {
            (
                row.id,
                CatalogProduct {
                    id: row.id,
                    name: row.name,
                    price: row.price,
                    sale_price: row.sale_price,
                    stock: row.stock,
                    color_ids: HashSet::new(),
                    size_ids: HashSet::new(),
                },
            )
        })
        .collect();

    let links = ProductColors::find()
        .filter(product_colors::Column::ProductId.is_in(product_ids.iter().copied()))
        .all(conn)
        .await?;
    for link in links {
        if let Some(product) = catalog.get_mut(&link.product_id) {
            product.color_ids.insert(link.color_id);
        }
    }

    let links = ProductSizes::find()
        .filter(product_sizes::Column::ProductId.is_in(product_ids.iter().copied()))
        .all(conn)
        .await?;
    for link in links {
        if let Some(product) = catalog.get_mut(&link.product_id) {
            product.size_ids.insert(link.size_id);
        }
    }

    let colors = if color_ids.is_empty() {
        HashSet::new()
    } else {
        Colors::find()
            .filter(colors::Column::Id.is_in(color_ids.iter().copied()))
            .all(conn)
            .await?
            .into_iter()
            .map(|color| color.id)
            .collect()
    };

    let sizes = if size_ids.is_empty() {
        HashSet::new()
    } else {
        Sizes::find()
            .filter(sizes::Column::Id.is_in(size_ids.iter().copied()))
            .all(conn)
            .await?
            .into_iter()
            .map(|size| size.id)
            .collect()
    };

    Ok(CatalogSnapshot {
        products: catalog,
        colors,
        sizes,
    })
}
