use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    /// Discount amount subtracted from `price`, not a replacement price.
    pub sale_price: Option<i64>,
    pub stock: i32,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cart_items::Entity")]
    CartItems,
    #[sea_orm(has_many = "super::product_colors::Entity")]
    ProductColors,
    #[sea_orm(has_many = "super::product_sizes::Entity")]
    ProductSizes,
}

impl Related<super::cart_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItems.def()
    }
}

impl Related<super::colors::Entity> for Entity {
    fn to() -> RelationDef {
        super::product_colors::Relation::Colors.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::product_colors::Relation::Products.def().rev())
    }
}

impl Related<super::sizes::Entity> for Entity {
    fn to() -> RelationDef {
        super::product_sizes::Relation::Sizes.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::product_sizes::Relation::Products.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
