pub mod cart_items;
pub mod colors;
pub mod order_items;
pub mod orders;
pub mod payment_logs;
pub mod payments;
pub mod product_colors;
pub mod product_sizes;
pub mod products;
pub mod sizes;
pub mod status;
pub mod users;

pub use cart_items::Entity as CartItems;
pub use colors::Entity as Colors;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use payment_logs::Entity as PaymentLogs;
pub use payments::Entity as Payments;
pub use product_colors::Entity as ProductColors;
pub use product_sizes::Entity as ProductSizes;
pub use products::Entity as Products;
pub use sizes::Entity as Sizes;
pub use users::Entity as Users;
