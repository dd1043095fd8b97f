use sea_orm::entity::prelude::*;

use super::status::{
    CancellationReason, ExchangeRefundType, OrderStatus, RequestStatus, ShippingStatus,
};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Identifier shared with the payment gateway.
    #[sea_orm(unique)]
    pub order_id: String,
    pub user_id: Uuid,
    pub product_name: String,
    pub total_amount: i64,
    pub shipping_fee: i64,
    pub status: OrderStatus,
    pub shipping_status: ShippingStatus,
    pub cancellation_request_status: RequestStatus,
    pub cancellation_reason: Option<CancellationReason>,
    pub cancellation_requested_at: Option<DateTimeWithTimeZone>,
    pub cancellation_processed_at: Option<DateTimeWithTimeZone>,
    pub cancellation_admin_note: Option<String>,
    pub exchange_refund_request_status: RequestStatus,
    pub exchange_refund_type: Option<ExchangeRefundType>,
    pub exchange_refund_reason: Option<String>,
    pub exchange_refund_requested_at: Option<DateTimeWithTimeZone>,
    pub exchange_refund_processed_at: Option<DateTimeWithTimeZone>,
    pub exchange_refund_admin_note: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
    #[sea_orm(has_many = "super::payments::Entity")]
    Payments,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
