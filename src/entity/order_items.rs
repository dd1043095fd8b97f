use sea_orm::ActiveValue::{NotSet, Set, Unchanged};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_id: Uuid,
    /// Weak reference: the catalog product may be deleted later.
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub subtotal: i64,
    pub color_id: Option<Uuid>,
    pub size_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::orders::Entity",
        from = "Column::OrderId",
        to = "super::orders::Column::Id",
        on_delete = "Cascade"
    )]
    Orders,
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let quantity = match &self.quantity {
            Set(value) | Unchanged(value) => *value,
            NotSet => return Ok(self),
        };
        let unit_price = match &self.unit_price {
            Set(value) | Unchanged(value) => *value,
            NotSet => return Ok(self),
        };
        if quantity <= 0 || unit_price < 0 {
            return Err(DbErr::Custom(format!(
                "invalid order item: quantity={quantity}, unit_price={unit_price}"
            )));
        }
        self.subtotal = Set(i64::from(quantity) * unit_price);
        Ok(self)
    }
}
