use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    entity::cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems},
    staging::StagedItem,
};

/// Remove purchased quantities from the buyer's cart.
///
/// Lines are matched on product and variant (a missing variant only matches
/// lines without one) and drained oldest first: a line is deleted once fully
/// consumed, otherwise its quantity is reduced. Runs on whatever connection
/// the caller passes so it can join the order transaction.
pub async fn consume_purchased<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    items: &[StagedItem],
) -> Result<u64, DbErr> {
    let mut touched = 0;

    for item in items {
        let mut condition = Condition::all()
            .add(CartCol::UserId.eq(user_id))
            .add(CartCol::ProductId.eq(item.product_id));
        condition = match item.color_id {
            Some(color_id) => condition.add(CartCol::ColorId.eq(color_id)),
            None => condition.add(CartCol::ColorId.is_null()),
        };
        condition = match item.size_id {
            Some(size_id) => condition.add(CartCol::SizeId.eq(size_id)),
            None => condition.add(CartCol::SizeId.is_null()),
        };

        let lines = CartItems::find()
            .filter(condition)
            .order_by_asc(CartCol::CreatedAt)
            .all(conn)
            .await?;

        let mut remaining = item.quantity;
        for line in lines {
            if remaining <= 0 {
                break;
            }
            if line.quantity <= remaining {
                remaining -= line.quantity;
                line.delete(conn).await?;
            } else {
                let left = line.quantity - remaining;
                remaining = 0;
                let mut active: CartActive = line.into();
                active.quantity = Set(left);
                active.update(conn).await?;
            }
            touched += 1;
        }
    }

    Ok(touched)
}
