use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    Select,
};

use crate::{
    dto::orders::{OrderDetail, OrderList},
    entity::orders::{Column as OrderCol, Entity as Orders},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{ExchangeRefundType, OrderStatus, RequestStatus, ShippingStatus},
    response::{ApiResponse, Meta},
    routes::params::{
        AdminOrderQuery, Pagination, RequestListQuery, ShippingListQuery, SortOrder, parse_filter,
    },
    services::order_service,
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: AdminOrderQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;

    let mut condition = Condition::all();
    if let Some(status) = parse_filter::<OrderStatus>("status", query.status.as_ref())? {
        condition = condition.add(OrderCol::Status.eq(status));
    }
    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        condition = condition.add(
            Condition::any()
                .add(OrderCol::OrderId.contains(q))
                .add(OrderCol::ProductName.contains(q)),
        );
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    paged(state, finder, query.pagination(), "Orders").await
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    order_id: &str,
) -> AppResult<ApiResponse<OrderDetail>> {
    ensure_admin(user)?;
    let order = Orders::find()
        .filter(OrderCol::OrderId.eq(order_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let detail = order_service::load_detail(&state.orm, order).await?;
    Ok(ApiResponse::success("Order found", detail, Some(Meta::empty())))
}

/// Orders that carry a cancellation request, newest request first.
pub async fn list_cancellations(
    state: &AppState,
    user: &AuthUser,
    query: RequestListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;

    let mut condition =
        Condition::all().add(OrderCol::CancellationRequestStatus.ne(RequestStatus::None));
    if let Some(status) = parse_filter::<RequestStatus>("status", query.status.as_ref())? {
        condition = condition.add(OrderCol::CancellationRequestStatus.eq(status));
    }

    let finder = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::CancellationRequestedAt);
    paged(state, finder, query.pagination(), "Cancellations").await
}

pub async fn list_exchange_refunds(
    state: &AppState,
    user: &AuthUser,
    query: RequestListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;

    let mut condition =
        Condition::all().add(OrderCol::ExchangeRefundRequestStatus.ne(RequestStatus::None));
    if let Some(status) = parse_filter::<RequestStatus>("status", query.status.as_ref())? {
        condition = condition.add(OrderCol::ExchangeRefundRequestStatus.eq(status));
    }
    if let Some(kind) = parse_filter::<ExchangeRefundType>("type", query.request_type.as_ref())? {
        condition = condition.add(OrderCol::ExchangeRefundType.eq(kind));
    }

    let finder = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::ExchangeRefundRequestedAt);
    paged(state, finder, query.pagination(), "Exchange/refund requests").await
}

/// Paid orders, the only ones that can move through shipping.
pub async fn list_shipping(
    state: &AppState,
    user: &AuthUser,
    query: ShippingListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;

    let mut condition = Condition::all().add(OrderCol::Status.eq(OrderStatus::Paid));
    if let Some(status) =
        parse_filter::<ShippingStatus>("shipping_status", query.shipping_status.as_ref())?
    {
        condition = condition.add(OrderCol::ShippingStatus.eq(status));
    }

    let finder = Orders::find()
        .filter(condition)
        .order_by_asc(OrderCol::CreatedAt);
    paged(state, finder, query.pagination(), "Shipping").await
}

async fn paged(
    state: &AppState,
    finder: Select<Orders>,
    pagination: Pagination,
    message: &str,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = pagination.normalize();
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(ApiResponse::success(
        message,
        OrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}
