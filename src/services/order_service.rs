use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    dto::orders::{OrderDetail, OrderList},
    entity::{
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems, Model as OrderItemModel},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        payments::{Column as PaymentCol, Entity as Payments},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{OrderStatus, RequestStatus, ShippingStatus},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder, parse_filter},
    services::pricing_service::{self, PricedOrder},
    state::AppState,
};

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = parse_filter::<OrderStatus>("status", query.status.as_ref())? {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    order_id: &str,
) -> AppResult<ApiResponse<OrderDetail>> {
    let order = find_owned_order(&state.orm, user.user_id, order_id).await?;
    let detail = load_detail(&state.orm, order).await?;
    Ok(ApiResponse::success("OK", detail, Some(Meta::empty())))
}

/// Orders belonging to someone else are reported as missing.
pub async fn find_owned_order<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    order_id: &str,
) -> AppResult<OrderModel> {
    Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user_id))
                .add(OrderCol::OrderId.eq(order_id)),
        )
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn load_detail<C: ConnectionTrait>(conn: &C, order: OrderModel) -> AppResult<OrderDetail> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    let payments = Payments::find()
        .filter(PaymentCol::OrderId.eq(order.id))
        .order_by_asc(PaymentCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(OrderDetail {
        order: order.into(),
        items,
        payments,
    })
}

/// Insert an order and its lines. The caller owns the transaction.
pub async fn insert_order<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    order_id: String,
    priced: &PricedOrder,
    status: OrderStatus,
) -> Result<(OrderModel, Vec<OrderItemModel>), DbErr> {
    let now = Utc::now();
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        user_id: Set(user_id),
        product_name: Set(pricing_service::order_name(&priced.items)),
        total_amount: Set(priced.final_amount),
        shipping_fee: Set(priced.shipping_fee),
        status: Set(status),
        shipping_status: Set(ShippingStatus::Pending),
        cancellation_request_status: Set(RequestStatus::None),
        cancellation_reason: Set(None),
        cancellation_requested_at: Set(None),
        cancellation_processed_at: Set(None),
        cancellation_admin_note: Set(None),
        exchange_refund_request_status: Set(RequestStatus::None),
        exchange_refund_type: Set(None),
        exchange_refund_reason: Set(None),
        exchange_refund_requested_at: Set(None),
        exchange_refund_processed_at: Set(None),
        exchange_refund_admin_note: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(conn)
    .await?;

    let mut items = Vec::with_capacity(priced.items.len());
    for item in &priced.items {
        let row = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(item.product_id),
            product_name: Set(item.product_name.clone()),
            quantity: Set(item.quantity),
            unit_price: Set(item.unit_price),
            subtotal: NotSet,
            color_id: Set(item.color_id),
            size_id: Set(item.size_id),
            created_at: Set(now.into()),
        }
        .insert(conn)
        .await?;
        items.push(row);
    }

    Ok((order, items))
}
