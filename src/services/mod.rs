pub mod admin_service;
pub mod cancellation_service;
pub mod cart_service;
pub mod checkout_service;
pub mod exchange_refund_service;
pub mod order_service;
pub mod pricing_service;
pub mod shipping_service;
pub mod virtual_account_service;
