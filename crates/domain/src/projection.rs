//! Seller view projection.

use common::{Money, SellerId};

use crate::order::Order;

/// Projects an order down to one seller's slice.
///
/// The returned order keeps only line items belonging to `seller_id`, with
/// `total_amount` recomputed over that slice — a seller-scoped total
/// distinct from the order's true total. Every other field (status, buyer,
/// timestamps, metadata) passes through unchanged. This is a read-time
/// transform; the stored order is never mutated.
pub fn project_for_seller(order: &Order, seller_id: SellerId) -> Order {
    let items: Vec<_> = order
        .items()
        .iter()
        .filter(|item| item.seller_id == seller_id)
        .cloned()
        .collect();

    let total_amount = items
        .iter()
        .fold(Money::zero(), |acc, item| acc + item.subtotal);

    let mut projected = order.clone();
    projected.items = items;
    projected.total_amount = total_amount;
    projected
}
