//! # Domain Types
//!
//! Core domain types used throughout MobiMart.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                 │
//! │                                                                      │
//! │  ┌───────────────┐   ┌───────────────┐   ┌───────────────┐          │
//! │  │   Product     │   │     Order     │   │     Sale      │          │
//! │  │ ───────────── │   │ ───────────── │   │ ───────────── │          │
//! │  │ id (UUID)     │   │ id (UUID)     │   │ id (UUID)     │          │
//! │  │ price_minor   │   │ line items    │   │ line items    │          │
//! │  │ discount_pct  │   │ pickup_code   │   │ sold_by       │          │
//! │  │ stock         │   │ status        │   │ channel       │          │
//! │  └───────────────┘   └───────────────┘   └───────────────┘          │
//! │                                                                      │
//! │  Product is the single shared MUTABLE entity; Order and Sale are    │
//! │  append-only facts produced by the checkout service.                │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Order and Sale line items copy the product's name and unit price at
//! commit time. History stays correct even if the product is renamed,
//! repriced or deleted later.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Discount, Money};
use crate::pickup::PickupCode;

// =============================================================================
// Product Specs
// =============================================================================

/// A single key/value specification entry, e.g. `("Storage", "128GB")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SpecEntry {
    pub key: String,
    pub value: String,
}

/// Product specifications.
///
/// Historical data has two shapes: early products carry a free-text
/// blob, later ones an ordered list of key/value pairs. The checkout
/// path never reads this field; everything else must accept both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum ProductSpecs {
    /// Legacy free-text shape, e.g. `"128GB, Midnight Black"`.
    Text(String),
    /// Structured shape: ordered key/value pairs.
    Pairs(Vec<SpecEntry>),
}

impl Default for ProductSpecs {
    fn default() -> Self {
        ProductSpecs::Text(String::new())
    }
}

impl ProductSpecs {
    /// Renders the specs as one display line, whichever shape they are.
    pub fn display_line(&self) -> String {
        match self {
            ProductSpecs::Text(text) => text.clone(),
            ProductSpecs::Pairs(pairs) => pairs
                .iter()
                .map(|p| format!("{}: {}", p.key, p.value))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in the shop catalog.
///
/// Created/edited/deleted by admin actions; stock is additionally
/// decremented by the checkout service, which is the only non-admin
/// writer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown in listings and on receipts.
    pub name: String,

    /// Manufacturer brand, when known.
    pub brand: Option<String>,

    /// List price in minor units.
    pub price_minor: i64,

    /// Discount percentage (0-100, whole percent).
    pub discount_pct: i64,

    /// Sellable units currently available. Never negative.
    pub stock: i64,

    /// Specifications (legacy free text or structured pairs).
    pub specs: ProductSpecs,

    /// Hosted image URL, when an image was uploaded.
    pub image_url: Option<String>,

    /// When the product was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the list price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_minor(self.price_minor)
    }

    /// Effective price = price × (1 − discount/100), rounded to the
    /// nearest unit. Falls back to the list price if the stored
    /// discount is out of range.
    pub fn effective_price(&self) -> Money {
        match Discount::try_from_i64(self.discount_pct) {
            Ok(d) => self.price().with_discount(d),
            Err(_) => self.price(),
        }
    }

    /// Checks whether `quantity` units can currently be sold.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One (product, quantity, snapshot price) tuple within a cart, sale or
/// order.
///
/// `name` and `unit_price_minor` are frozen copies taken when the cart
/// was built, not live references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    /// The purchased product's id.
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name: String,
    /// Unit price in minor units at time of sale (frozen).
    pub unit_price_minor: i64,
    /// Quantity purchased. Always >= 1.
    pub quantity: i64,
}

impl LineItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_minor(self.unit_price_minor)
    }

    /// Line total = unit price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().times(self.quantity)
    }
}

// =============================================================================
// Order Status / Fulfillment / Payment
// =============================================================================

/// Order lifecycle: created `pending`, flipped to `completed` by staff
/// verification. There is no other transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

/// How an online order is fulfilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentType {
    /// Customer collects in store using a 6-digit pickup code.
    Pickup,
    /// Items are delivered to the customer's address. No code.
    Delivery,
}

/// Payment method chosen at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    Upi,
    /// Cash on delivery / on pickup.
    Cod,
}

/// Whether payment was captured before the order was committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

// =============================================================================
// Order
// =============================================================================

/// An online order (pickup or delivery), created atomically by the
/// checkout service and mutated only by the pending→completed flip.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,
    /// Snapshot line items.
    pub items: Vec<LineItem>,
    /// Total amount in minor units, as submitted by the caller.
    pub total_minor: i64,
    pub fulfillment: FulfillmentType,
    pub customer_name: String,
    pub customer_phone: String,
    /// Delivery address; empty for pickup orders.
    pub address: String,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    /// Present only for pickup orders. Unique among pending orders.
    pub pickup_code: Option<PickupCode>,
    pub status: OrderStatus,
    /// Client-generated idempotency token, when one was supplied.
    pub client_token: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_minor(self.total_minor)
    }
}

/// A proposed online order, as submitted by the storefront.
///
/// `total_minor` is the pre-computed discounted sum; the checkout
/// service records it verbatim and does not recompute it against live
/// prices.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDraft {
    pub items: Vec<LineItem>,
    pub total_minor: i64,
    pub fulfillment: FulfillmentType,
    pub customer_name: String,
    pub customer_phone: String,
    /// Required for delivery, ignored for pickup.
    pub address: String,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    /// Optional client-generated idempotency token. When supplied, a
    /// second commit carrying the same token is rejected.
    pub client_token: Option<String>,
}

// =============================================================================
// Sale
// =============================================================================

/// Which channel produced a sale record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SaleChannel {
    /// Recorded at the counter by staff or admin.
    Offline,
}

/// An in-store sale. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: String,
    /// Snapshot line items.
    pub items: Vec<LineItem>,
    /// Total amount in minor units, as submitted by the caller.
    pub total_minor: i64,
    /// Staff name or "Admin".
    pub sold_by: String,
    pub channel: SaleChannel,
    /// Client-generated idempotency token, when one was supplied.
    pub client_token: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_minor(self.total_minor)
    }
}

// =============================================================================
// Attendance
// =============================================================================

/// A staff attendance record, keyed by (staff id, date).
///
/// Check-in is a keyed upsert; check-out fills `check_out` on the
/// existing row. Not touched by the checkout path.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Attendance {
    pub staff_id: String,
    pub staff_name: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    #[ts(as = "String")]
    pub check_in: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub check_out: Option<DateTime<Utc>>,
    /// Free-form status marker; the storefront writes `"present"`.
    pub status: String,
}

// =============================================================================
// Unit Tests
// =============================================================================
