//! # Error Types
//!
//! Domain-specific error types for mobimart-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                  │
//! │                                                                      │
//! │  mobimart-core errors (this file)                                    │
//! │  ├── CoreError        - Business rule violations                     │
//! │  └── ValidationError  - Input validation failures                    │
//! │                                                                      │
//! │  mobimart-db errors (separate crate)                                 │
//! │  ├── DbError          - Storage/infrastructure failures              │
//! │  └── CheckoutError    - Domain | Store, at the service seam          │
//! │                                                                      │
//! │  Flow: ValidationError → CoreError → CheckoutError → Caller          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers are expected to render the specific failure (which product,
//! how many available) rather than a generic message, so every variant
//! carries its context.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These abort a checkout with zero side effects and are surfaced
/// verbatim to the caller. They are final: retrying the same commit
/// without changing the cart will fail the same way.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced product id has no corresponding row.
    ///
    /// The caller should treat the cart as stale and ask the user to
    /// refresh the listing.
    #[error("Product not found: {name} ({id})")]
    ProductNotFound { id: String, name: String },

    /// Requested quantity exceeds available stock at commit time.
    ///
    /// The caller should show the updated availability and allow the
    /// user to adjust quantities.
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// Pickup code lookup yielded no pending match.
    ///
    /// Either the order was already completed, the code never existed,
    /// or staff mistyped it.
    #[error("Invalid or expired pickup code: {code}")]
    InvalidOrExpiredCode { code: String },

    /// A commit carrying this idempotency token was already recorded.
    ///
    /// Protects against double-submission after an ambiguous network
    /// failure; the first commit stands, this one had no effect.
    #[error("Duplicate submission: token '{token}' was already committed")]
    DuplicateSubmission { token: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur before any storage access, when caller-supplied input
/// doesn't meet requirements.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative (zero is allowed).
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format (e.g., malformed pickup code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// The cart has no line items.
    #[error("cart must contain at least one item")]
    EmptyCart,

    /// The cart has too many line items.
    #[error("cart cannot have more than {max} items")]
    CartTooLarge { max: usize },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
