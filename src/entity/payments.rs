use sea_orm::entity::prelude::*;

use super::status::PaymentStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_id: Uuid,
    pub provider: String,
    pub method: String,
    /// Issued by the gateway; doubles as the idempotency key.
    #[sea_orm(unique)]
    pub payment_key: String,
    pub amount: i64,
    pub status: PaymentStatus,
    pub approved_at: Option<DateTimeWithTimeZone>,
    pub receipt_url: Option<String>,
    pub raw_response: Option<Json>,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub account_holder: Option<String>,
    pub due_date: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::orders::Entity",
        from = "Column::OrderId",
        to = "super::orders::Column::Id"
    )]
    Orders,
    #[sea_orm(has_many = "super::payment_logs::Entity")]
    PaymentLogs,
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl Related<super::payment_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
