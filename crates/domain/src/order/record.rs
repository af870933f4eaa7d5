//! The order record.

use chrono::{DateTime, Utc};
use common::{BuyerId, Money, OrderId, SellerId};
use serde::{Deserialize, Serialize};

use super::{
    LineItem, OrderDetails, OrderError, OrderReference, OrderStatus, PaymentMethod, PaymentStatus,
    ShippingAddress,
};

/// A purchase record spanning possibly multiple sellers.
///
/// Immutable after creation except for `status`, `payment_status`, `notes`,
/// `cancel_reason` and `completed_at`. Line items carry prices frozen at
/// creation time; `total_amount` is computed once and never recomputed by
/// mutation paths. The `version` field is the optimistic concurrency token
/// managed by the order store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub(crate) id: OrderId,
    pub(crate) reference: OrderReference,
    pub(crate) buyer_id: BuyerId,
    pub(crate) items: Vec<LineItem>,
    pub(crate) total_amount: Money,
    pub(crate) status: OrderStatus,
    pub(crate) payment_status: PaymentStatus,
    pub(crate) shipping_address: Option<ShippingAddress>,
    pub(crate) payment_method: Option<PaymentMethod>,
    pub(crate) notes: Option<String>,
    pub(crate) cancel_reason: Option<String>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) completed_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub(crate) version: u64,
}

impl Order {
    /// Creates a new order in `pending`/`pending` from already-frozen line
    /// items.
    ///
    /// Fails with [`OrderError::NoItems`] on an empty item list; each item
    /// must carry a positive quantity and a non-negative unit price.
    pub fn create(
        id: OrderId,
        reference: OrderReference,
        buyer_id: BuyerId,
        items: Vec<LineItem>,
        details: OrderDetails,
        created_at: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }
        for item in &items {
            if item.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    quantity: item.quantity,
                });
            }
            if item.unit_price.is_negative() {
                return Err(OrderError::InvalidPrice {
                    price: item.unit_price.cents(),
                });
            }
        }

        let total_amount = items
            .iter()
            .fold(Money::zero(), |acc, item| acc + item.subtotal);

        Ok(Self {
            id,
            reference,
            buyer_id,
            items,
            total_amount,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            shipping_address: details.shipping_address,
            payment_method: details.payment_method,
            notes: details.notes,
            cancel_reason: None,
            created_at,
            completed_at: None,
            version: 0,
        })
    }

    /// Returns the internal order ID.
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Returns the externally visible reference.
    pub fn reference(&self) -> &OrderReference {
        &self.reference
    }

    /// Returns the buyer who placed the order.
    pub fn buyer_id(&self) -> BuyerId {
        self.buyer_id
    }

    /// Returns the line items in creation order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Returns the creation-time order total.
    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    /// Returns the current lifecycle status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the payment status.
    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    /// Returns the shipping address, if one was captured.
    pub fn shipping_address(&self) -> Option<&ShippingAddress> {
        self.shipping_address.as_ref()
    }

    /// Returns the chosen payment method, if any.
    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    /// Returns the buyer notes, if any.
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Returns the cancellation reason, if the order was cancelled with one.
    pub fn cancel_reason(&self) -> Option<&str> {
        self.cancel_reason.as_deref()
    }

    /// Returns when the order was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the order entered `completed`, if it has.
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the store-managed version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Sets the store-managed version.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Returns true if at least one line item belongs to the seller.
    pub fn contains_seller(&self, seller_id: SellerId) -> bool {
        self.items.iter().any(|item| item.seller_id == seller_id)
    }

    /// Returns true if the order is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Applies a status transition.
    ///
    /// Validates the move against the state machine; entering `completed`
    /// stamps `completed_at`, entering `cancelled` records the reason.
    /// `total_amount` and line items are never touched.
    pub fn transition(
        &mut self,
        new_status: OrderStatus,
        cancel_reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), OrderError> {
        if !self.status.can_transition_to(new_status) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: new_status,
            });
        }

        self.status = new_status;
        match new_status {
            OrderStatus::Completed => self.completed_at = Some(now),
            OrderStatus::Cancelled => self.cancel_reason = cancel_reason,
            _ => {}
        }
        Ok(())
    }
}
