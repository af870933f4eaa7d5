//! Value objects for the order domain.

use common::{Money, ProductId, SellerId};
use serde::{Deserialize, Serialize};

/// Human-readable, externally visible order reference.
///
/// Formatted `ORD-000123` from a strictly increasing sequence owned by the
/// order store. Distinct from the internal [`common::OrderId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderReference(String);

impl OrderReference {
    /// Formats a reference from a sequence number.
    pub fn from_sequence(sequence: u64) -> Self {
        Self(format!("ORD-{sequence:06}"))
    }

    /// Returns the reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OrderReference {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for OrderReference {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One product entry within an order.
///
/// `unit_price` and `subtotal` are frozen at order-creation time and never
/// re-read from the catalog; `seller_id` is the seller the catalog reported
/// for the product at that moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// The ordered product.
    pub product_id: ProductId,

    /// The seller owning the product at creation time.
    pub seller_id: SellerId,

    /// Units ordered.
    pub quantity: u32,

    /// Price per unit, frozen at creation.
    pub unit_price: Money,

    /// `unit_price * quantity`, frozen at creation.
    pub subtotal: Money,
}

impl LineItem {
    /// Creates a line item, computing the frozen subtotal.
    pub fn new(
        product_id: impl Into<ProductId>,
        seller_id: SellerId,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            seller_id,
            quantity,
            unit_price,
            subtotal: unit_price.multiply(quantity),
        }
    }
}

/// Shipping destination captured at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
}

/// How the buyer intends to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    Card,
    Paypal,
    BankTransfer,
    Cash,
}

impl PaymentMethod {
    /// Returns the wire name of the payment method.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::BankTransfer => "bank-transfer",
            PaymentMethod::Cash => "cash",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Optional checkout metadata attached to a new order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    /// Where to ship, if the buyer provided an address.
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,

    /// Chosen payment method, if any.
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,

    /// Free-form buyer notes.
    #[serde(default)]
    pub notes: Option<String>,
}
