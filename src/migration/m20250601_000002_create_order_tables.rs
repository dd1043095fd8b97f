use sea_orm::Schema;
use sea_orm_migration::prelude::*;

use super::m20250601_000001_create_catalog_tables::drop_table;
use crate::entity::{OrderItems, Orders, PaymentLogs, Payments, orders, payments};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        manager
            .create_table(schema.create_table_from_entity(Orders).if_not_exists().to_owned())
            .await?;
        manager
            .create_table(schema.create_table_from_entity(OrderItems).if_not_exists().to_owned())
            .await?;
        manager
            .create_table(schema.create_table_from_entity(Payments).if_not_exists().to_owned())
            .await?;
        manager
            .create_table(schema.create_table_from_entity(PaymentLogs).if_not_exists().to_owned())
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_user_id_created_at")
                    .table(Orders)
                    .col(orders::Column::UserId)
                    .col(orders::Column::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_payments_order_id")
                    .table(Payments)
                    .col(payments::Column::OrderId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_table(manager, PaymentLogs).await?;
        drop_table(manager, Payments).await?;
        drop_table(manager, OrderItems).await?;
        drop_table(manager, Orders).await
    }
}
