//! # Validation Module
//!
//! Input validation for caller-supplied checkout data.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                               │
//! │                                                                      │
//! │  Layer 1: Storefront (JavaScript)                                    │
//! │  └── Basic format checks, immediate user feedback                    │
//! │           │                                                          │
//! │           ▼                                                          │
//! │  Layer 2: THIS MODULE - business rule validation,                    │
//! │           before any storage access                                  │
//! │           │                                                          │
//! │           ▼                                                          │
//! │  Layer 3: Database (SQLite)                                          │
//! │  └── CHECK / UNIQUE / NOT NULL constraints                           │
//! │                                                                      │
//! │  Identity is NOT validated here: seller ids and customer contact     │
//! │  fields pass through as opaque strings (external auth owns them).    │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::{FulfillmentType, LineItem, OrderDraft};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Cart / Line Items
// =============================================================================

/// Validates a set of line items ahead of a commit.
///
/// ## Rules
/// - cart is non-empty, at most [`MAX_CART_ITEMS`] lines
/// - every line has a product id and a frozen name
/// - every quantity is between 1 and [`MAX_ITEM_QUANTITY`]
/// - snapshot prices are not negative
pub fn validate_line_items(items: &[LineItem]) -> ValidationResult<()> {
    if items.is_empty() {
        return Err(ValidationError::EmptyCart);
    }

    if items.len() > MAX_CART_ITEMS {
        return Err(ValidationError::CartTooLarge {
            max: MAX_CART_ITEMS,
        });
    }

    for item in items {
        if item.product_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "product_id".to_string(),
            });
        }
        if item.name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "name".to_string(),
            });
        }
        if !(1..=MAX_ITEM_QUANTITY).contains(&item.quantity) {
            return Err(ValidationError::OutOfRange {
                field: "quantity".to_string(),
                min: 1,
                max: MAX_ITEM_QUANTITY,
            });
        }
        if item.unit_price_minor < 0 {
            return Err(ValidationError::MustBeNonNegative {
                field: "unit_price".to_string(),
            });
        }
    }

    Ok(())
}

/// Validates a submitted total amount.
///
/// The total is otherwise recorded verbatim; it is NOT recomputed
/// against live prices (see the checkout service docs).
pub fn validate_total(total_minor: i64) -> ValidationResult<()> {
    if total_minor < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "total".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Order Draft
// =============================================================================

const MAX_NAME_LEN: usize = 100;
const MAX_PHONE_LEN: usize = 20;
const MAX_ADDRESS_LEN: usize = 500;

/// Validates an online order draft before it reaches the transaction.
///
/// Contact fields are opaque strings from the caller's auth context;
/// only presence and length are checked here.
pub fn validate_order_draft(draft: &OrderDraft) -> ValidationResult<()> {
    validate_line_items(&draft.items)?;
    validate_total(draft.total_minor)?;

    if draft.customer_name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "customer_name".to_string(),
        });
    }
    if draft.customer_name.len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "customer_name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    if draft.customer_phone.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "customer_phone".to_string(),
        });
    }
    if draft.customer_phone.len() > MAX_PHONE_LEN {
        return Err(ValidationError::TooLong {
            field: "customer_phone".to_string(),
            max: MAX_PHONE_LEN,
        });
    }

    // Address matters only when someone has to drive to it.
    if draft.fulfillment == FulfillmentType::Delivery {
        if draft.address.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "address".to_string(),
            });
        }
        if draft.address.len() > MAX_ADDRESS_LEN {
            return Err(ValidationError::TooLong {
                field: "address".to_string(),
                max: MAX_ADDRESS_LEN,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Product (admin CRUD)
// =============================================================================

/// Validates admin-supplied product fields before insert/update.
pub fn validate_product_fields(
    name: &str,
    price_minor: i64,
    discount_pct: i64,
    stock: i64,
) -> ValidationResult<()> {
    if name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }
    if name.len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }
    if price_minor < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "price".to_string(),
        });
    }
    if !(0..=100).contains(&discount_pct) {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: 100,
        });
    }
    if stock < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "stock".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PaymentMethod, PaymentStatus};

    fn item(qty: i64) -> LineItem {
        LineItem {
            product_id: "p-1".to_string(),
            name: "iPhone 15".to_string(),
            unit_price_minor: 79_999,
            quantity: qty,
        }
    }

    fn draft(fulfillment: FulfillmentType, address: &str) -> OrderDraft {
        OrderDraft {
            items: vec![item(1)],
            total_minor: 79_999,
            fulfillment,
            customer_name: "Asha".to_string(),
            customer_phone: "9876543210".to_string(),
            address: address.to_string(),
            payment_method: PaymentMethod::Card,
            payment_status: PaymentStatus::Paid,
            client_token: None,
        }
    }

    #[test]
    fn test_empty_cart_rejected() {
        assert!(matches!(
            validate_line_items(&[]),
            Err(ValidationError::EmptyCart)
        ));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        assert!(validate_line_items(&[item(0)]).is_err());
        assert!(validate_line_items(&[item(1)]).is_ok());
        assert!(validate_line_items(&[item(MAX_ITEM_QUANTITY + 1)]).is_err());
    }

    #[test]
    fn test_total_zero_allowed_negative_rejected() {
        assert!(validate_total(0).is_ok());

        let err = validate_total(-1).unwrap_err();
        assert!(matches!(err, ValidationError::MustBeNonNegative { .. }));
        assert_eq!(err.to_string(), "total must not be negative");
    }

    #[test]
    fn test_oversized_cart_rejected() {
        let items: Vec<LineItem> = (0..=MAX_CART_ITEMS).map(|_| item(1)).collect();
        assert!(matches!(
            validate_line_items(&items),
            Err(ValidationError::CartTooLarge { .. })
        ));
    }

    #[test]
    fn test_delivery_requires_address() {
        assert!(validate_order_draft(&draft(FulfillmentType::Delivery, "")).is_err());
        assert!(validate_order_draft(&draft(FulfillmentType::Delivery, "12 MG Road")).is_ok());
        // Pickup never needs one
        assert!(validate_order_draft(&draft(FulfillmentType::Pickup, "")).is_ok());
    }

    #[test]
    fn test_contact_fields_required() {
        let mut d = draft(FulfillmentType::Pickup, "");
        d.customer_phone = "  ".to_string();
        assert!(validate_order_draft(&d).is_err());
    }

    #[test]
    fn test_product_fields() {
        assert!(validate_product_fields("iPhone 15", 79_999, 10, 5).is_ok());
        assert!(validate_product_fields("", 79_999, 10, 5).is_err());
        assert!(validate_product_fields("iPhone 15", -1, 10, 5).is_err());
        assert!(validate_product_fields("iPhone 15", 79_999, 101, 5).is_err());
        assert!(validate_product_fields("iPhone 15", 79_999, 10, -5).is_err());
    }
}
