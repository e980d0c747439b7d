//! # mobimart-db: Database Layer for MobiMart
//!
//! This crate provides database access for the MobiMart storefront
//! backend. It uses SQLite for local storage with sqlx for async
//! operations, and hosts the checkout service that owns every stock
//! mutation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       MobiMart Data Flow                                │
//! │                                                                         │
//! │  Caller (commit_offline_sale / commit_online_order / verify_pickup)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    mobimart-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Checkout    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │ (checkout.rs) │    │ (product.rs)  │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ BEGIN         │    │ ProductRepo   │    │ 001_initial_ │  │   │
//! │  │   │ IMMEDIATE     │───►│ OrderRepo     │    │ schema.sql   │  │   │
//! │  │   │ commits       │    │ SaleRepo      │    │              │  │   │
//! │  │   └───────────────┘    │ AttendanceRepo│    └──────────────┘  │   │
//! │  │                        └───────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (product, order, sale, attendance)
//! - [`checkout`] - Atomic stock-deduct-and-record commits, pickup verification
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mobimart_db::{Database, DbConfig};
//! use mobimart_core::Money;
//!
//! let db = Database::new(DbConfig::new("path/to/mobimart.db")).await?;
//!
//! // Browse the catalog
//! let products = db.products().list_all().await?;
//!
//! // Commit a counter sale (validates stock, decrements, records -
//! // all in one transaction)
//! let sale_id = db
//!     .checkout()
//!     .commit_offline_sale(&items, Money::from_minor(3000), "ravi", None)
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::{CheckoutError, CheckoutService, CommittedOrder};
pub use error::{DbError, DbResult};
pub use pool::{Database, DashboardStats, DbConfig};

// Repository re-exports for convenience
pub use repository::attendance::AttendanceRepository;
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
