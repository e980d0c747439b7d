//! # mobimart-core: Pure Business Logic for MobiMart
//!
//! This crate is the heart of the MobiMart storefront backend. It
//! contains all business logic as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      MobiMart Architecture                           │
//! │                                                                      │
//! │  ┌────────────────────────────────────────────────────────────────┐ │
//! │  │                 Storefront / Admin UI (JavaScript)              │ │
//! │  └───────────────────────────────┬────────────────────────────────┘ │
//! │                                  │                                   │
//! │  ┌───────────────────────────────▼────────────────────────────────┐ │
//! │  │              ★ mobimart-core (THIS CRATE) ★                     │ │
//! │  │                                                                 │ │
//! │  │  ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌────────────┐         │ │
//! │  │  │  types   │ │  money   │ │  pickup  │ │ validation │         │ │
//! │  │  │ Product  │ │  Money   │ │ 6-digit  │ │   rules    │         │ │
//! │  │  │ Order    │ │ Discount │ │  codes   │ │   checks   │         │ │
//! │  │  └──────────┘ └──────────┘ └──────────┘ └────────────┘         │ │
//! │  │                                                                 │ │
//! │  │  NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS             │ │
//! │  └───────────────────────────────┬────────────────────────────────┘ │
//! │                                  │                                   │
//! │  ┌───────────────────────────────▼────────────────────────────────┐ │
//! │  │                 mobimart-db (Database Layer)                    │ │
//! │  │      SQLite repositories, migrations, checkout service          │ │
//! │  └─────────────────────────────────────────────────────────────────┘ │
//! └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, Sale, LineItem, ...)
//! - [`money`] - Integer money and percentage discounts
//! - [`pickup`] - The 6-digit pickup code format
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: deterministic given inputs (randomness is injected)
//! 2. **No I/O**: database, network and file access are FORBIDDEN here
//! 3. **Integer Money**: all monetary values are i64 minor units
//! 4. **Explicit Errors**: typed errors, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pickup;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Discount, Money};
pub use pickup::PickupCode;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed in a single cart.
///
/// Prevents runaway carts and keeps commit transactions bounded.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single item in a cart.
///
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;
