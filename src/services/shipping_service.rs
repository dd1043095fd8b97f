use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set, TransactionTrait};

use crate::{
    dto::admin::ShippingUpdateRequest,
    entity::{
        orders::{ActiveModel as OrderActive, Model as OrderModel},
        status::parse_active_enum,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderStatus, ShippingStatus},
    response::{ApiResponse, Meta},
    services::cancellation_service::lock_order,
    state::AppState,
};

pub fn parse_shipping_status(raw: &str) -> AppResult<ShippingStatus> {
    parse_active_enum::<ShippingStatus>(&raw.trim().to_uppercase())
        .ok_or_else(|| AppError::InvalidShippingStatus(raw.trim().to_string()))
}

pub fn check_can_ship(order: &OrderModel) -> AppResult<()> {
    if order.status != OrderStatus::Paid {
        return Err(AppError::InvalidOrderState(format!(
            "order is {:?}, only PAID orders ship",
            order.status
        )));
    }
    Ok(())
}

pub async fn update_shipping_status(
    state: &AppState,
    user: &AuthUser,
    order_id: &str,
    payload: ShippingUpdateRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let target = parse_shipping_status(&payload.shipping_status)?;

    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, order_id).await?;
    check_can_ship(&order)?;

    let previous = order.shipping_status;
    let mut active: OrderActive = order.into();
    active.shipping_status = Set(target);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        order_id = %order.order_id,
        from = ?previous,
        to = ?target,
        "shipping status updated"
    );
    Ok(ApiResponse::success(
        "Shipping status updated",
        order.into(),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cancellation_service::tests::order;

    #[test]
    fn shipping_targets_are_enumerated() {
        assert_eq!(parse_shipping_status("delivered").unwrap(), ShippingStatus::Delivered);
        assert!(matches!(
            parse_shipping_status("LOST"),
            Err(AppError::InvalidShippingStatus(v)) if v == "LOST"
        ));
    }

    #[test]
    fn only_paid_orders_ship() {
        assert!(check_can_ship(&order(OrderStatus::Paid)).is_ok());
        assert!(check_can_ship(&order(OrderStatus::Pending)).is_err());
        assert!(check_can_ship(&order(OrderStatus::Cancelled)).is_err());
    }
}
