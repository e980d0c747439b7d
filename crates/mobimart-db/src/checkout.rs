//! # Checkout Service
//!
//! The order-commit protocol: convert a proposed purchase into a
//! durable, consistent state change - decrement stock for every
//! purchased product and record the transaction - or change nothing at
//! all.
//!
//! ## Commit Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     One Commit (offline or online)                   │
//! │                                                                      │
//! │  BEGIN IMMEDIATE            ← write lock taken up front, so the     │
//! │       │                       read-check-write sequence never       │
//! │       ▼                       upgrades against a stale snapshot     │
//! │  for each line item:                                                 │
//! │    SELECT name, stock       ← missing row?     → ProductNotFound    │
//! │    stock < quantity?        → InsufficientStock {name, available}   │
//! │    UPDATE stock = stock - q  (guarded: AND stock >= q)              │
//! │       │                                                              │
//! │       ▼                                                              │
//! │  INSERT sale/order + snapshot line items                             │
//! │  (pickup: attach 6-digit code, regenerate on collision with a       │
//! │   pending order; idempotency token enforced by unique index)        │
//! │       │                                                              │
//! │       ▼                                                              │
//! │  COMMIT ─ or ─ ROLLBACK with zero side effects                       │
//! └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! Two commits racing for the last unit cannot both succeed: SQLite
//! admits one writer at a time and `BEGIN IMMEDIATE` serializes the
//! whole sequence. A commit that cannot take the lock inside the busy
//! timeout aborts with a retryable [`DbError::Conflict`]; the service
//! replays the entire commit (re-reading stock) a bounded number of
//! times before surfacing the error. Domain errors are final and never
//! retried.
//!
//! ## Known simplification
//! `total_minor` is recorded verbatim from the caller and NOT recomputed
//! against live prices inside the transaction. A manipulated client can
//! submit an arbitrary total; see DESIGN.md before "fixing" this.

use chrono::Utc;
use rand::thread_rng;
use sqlx::{SqliteConnection, SqlitePool};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::order::OrderRepository;
use mobimart_core::{
    validation, CoreError, FulfillmentType, LineItem, Money, Order, OrderDraft, OrderStatus,
    PickupCode, SaleChannel, ValidationError,
};

/// How many times a whole commit is replayed after losing a race.
const MAX_COMMIT_ATTEMPTS: u32 = 5;

/// Base backoff between commit replays (scaled by attempt number).
const RETRY_BACKOFF: Duration = Duration::from_millis(10);

/// How many fresh pickup codes to try before giving up on a collision
/// streak. With 900000 values and pending orders in the hundreds, one
/// regeneration is already rare.
const MAX_CODE_ATTEMPTS: u32 = 8;

// =============================================================================
// Errors
// =============================================================================

/// Failure of a checkout operation.
///
/// Keeps the caller's two cases distinguishable:
/// - `Domain`: the commit definitely did not happen and retrying the
///   same input will fail the same way;
/// - `Store`: infrastructure trouble - retryable variants mean the
///   commit definitely rolled back, others mean "unknown, do not
///   blindly resubmit" (pair with an idempotency token instead).
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] DbError),
}

impl CheckoutError {
    /// Whether replaying the whole commit may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CheckoutError::Store(e) if e.is_retryable())
    }
}

impl From<ValidationError> for CheckoutError {
    fn from(err: ValidationError) -> Self {
        CheckoutError::Domain(CoreError::Validation(err))
    }
}

/// Result of a committed online order.
#[derive(Debug, Clone)]
pub struct CommittedOrder {
    pub order_id: String,
    /// The caller-visible receipt/lookup key; present for pickup only.
    pub pickup_code: Option<PickupCode>,
}

// =============================================================================
// Service
// =============================================================================

/// Draws one pickup code per call. Defaults to thread-local
/// randomness; tests swap in a deterministic sequence.
type CodeSource = Arc<dyn Fn() -> PickupCode + Send + Sync>;

/// The one code path allowed to decrement `products.stock`.
#[derive(Clone)]
pub struct CheckoutService {
    pool: SqlitePool,
    code_source: CodeSource,
}

impl fmt::Debug for CheckoutService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutService")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl CheckoutService {
    /// Creates a new CheckoutService.
    pub fn new(pool: SqlitePool) -> Self {
        CheckoutService {
            pool,
            code_source: Arc::new(|| PickupCode::generate(&mut thread_rng())),
        }
    }

    /// Replaces the pickup-code source.
    ///
    /// The regenerate-on-collision branch only triggers when a drawn
    /// code already belongs to a pending order; a deterministic source
    /// makes that branch reachable from tests.
    pub fn with_code_source(
        mut self,
        source: impl Fn() -> PickupCode + Send + Sync + 'static,
    ) -> Self {
        self.code_source = Arc::new(source);
        self
    }

    /// Commits an in-store sale: validate availability, decrement stock
    /// for every line item and insert one immutable Sale record, all in
    /// one atomic unit. Returns the new sale id.
    ///
    /// Empty `sold_by` is recorded as `"Admin"`. `client_token`, when
    /// supplied, makes resubmission safe: a second commit carrying the
    /// same token fails with [`CoreError::DuplicateSubmission`].
    pub async fn commit_offline_sale(
        &self,
        items: &[LineItem],
        total: Money,
        sold_by: &str,
        client_token: Option<&str>,
    ) -> Result<String, CheckoutError> {
        validation::validate_line_items(items)?;
        validation::validate_total(total.minor())?;

        let sold_by = if sold_by.trim().is_empty() {
            "Admin"
        } else {
            sold_by
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_offline_sale(items, total, sold_by, client_token).await {
                Err(e) if e.is_retryable() && attempt < MAX_COMMIT_ATTEMPTS => {
                    warn!(attempt, error = %e, "Sale commit lost a race, replaying");
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Ok(sale_id) => {
                    info!(sale_id = %sale_id, total = %total, items = items.len(), "Offline sale committed");
                    return Ok(sale_id);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Commits an online order (pickup or delivery): identical
    /// stock-validation/decrement sequence as an offline sale, in the
    /// same atomic unit as the Order insert.
    ///
    /// Pickup orders get a random 6-digit code, unique among pending
    /// orders (regenerated on collision); delivery orders get none.
    pub async fn commit_online_order(
        &self,
        draft: &OrderDraft,
    ) -> Result<CommittedOrder, CheckoutError> {
        validation::validate_order_draft(draft)?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_online_order(draft).await {
                Err(e) if e.is_retryable() && attempt < MAX_COMMIT_ATTEMPTS => {
                    warn!(attempt, error = %e, "Order commit lost a race, replaying");
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Ok(committed) => {
                    info!(
                        order_id = %committed.order_id,
                        fulfillment = ?draft.fulfillment,
                        items = draft.items.len(),
                        "Online order committed"
                    );
                    return Ok(committed);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Looks up the pending order carrying this 6-digit code.
    ///
    /// Fails with [`CoreError::InvalidOrExpiredCode`] when nothing
    /// matches: the order was already completed, the code never
    /// existed, or staff mistyped it.
    pub async fn verify_pickup(&self, code: &str) -> Result<Order, CheckoutError> {
        let code = PickupCode::parse(code).map_err(CoreError::from)?;

        let order = OrderRepository::new(self.pool.clone())
            .find_pending_by_code(&code)
            .await?;

        order.ok_or_else(|| {
            CheckoutError::Domain(CoreError::InvalidOrExpiredCode {
                code: code.to_string(),
            })
        })
    }

    /// Completes a verified pickup: flips the pending order to
    /// completed and returns its snapshot.
    ///
    /// A separate, non-transactional step by design - stock was already
    /// committed at order-creation time, so completion carries no
    /// inventory effect.
    pub async fn complete_pickup(&self, code: &str) -> Result<Order, CheckoutError> {
        let code = PickupCode::parse(code).map_err(CoreError::from)?;
        let orders = OrderRepository::new(self.pool.clone());

        let mut order = orders.find_pending_by_code(&code).await?.ok_or_else(|| {
            CheckoutError::Domain(CoreError::InvalidOrExpiredCode {
                code: code.to_string(),
            })
        })?;

        match orders.complete_pending(&code).await {
            Ok(()) => {
                order.status = OrderStatus::Completed;
                Ok(order)
            }
            // Lost a race with another staff terminal
            Err(DbError::NotFound { .. }) => Err(CheckoutError::Domain(
                CoreError::InvalidOrExpiredCode {
                    code: code.to_string(),
                },
            )),
            Err(e) => Err(CheckoutError::Store(e)),
        }
    }

    // =========================================================================
    // One attempt = one transaction
    // =========================================================================

    async fn try_offline_sale(
        &self,
        items: &[LineItem],
        total: Money,
        sold_by: &str,
        client_token: Option<&str>,
    ) -> Result<String, CheckoutError> {
        let mut tx = ImmediateTx::begin(&self.pool).await?;

        match offline_sale_body(tx.conn(), items, total, sold_by, client_token).await {
            Ok(sale_id) => {
                tx.commit().await?;
                Ok(sale_id)
            }
            Err(e) => {
                tx.rollback().await;
                Err(e)
            }
        }
    }

    async fn try_online_order(&self, draft: &OrderDraft) -> Result<CommittedOrder, CheckoutError> {
        let mut tx = ImmediateTx::begin(&self.pool).await?;

        match online_order_body(tx.conn(), draft, &self.code_source).await {
            Ok(committed) => {
                tx.commit().await?;
                Ok(committed)
            }
            Err(e) => {
                tx.rollback().await;
                Err(e)
            }
        }
    }
}

/// Everything between BEGIN and COMMIT for an offline sale.
async fn offline_sale_body(
    conn: &mut SqliteConnection,
    items: &[LineItem],
    total: Money,
    sold_by: &str,
    client_token: Option<&str>,
) -> Result<String, CheckoutError> {
    reserve_stock(conn, items).await?;

    let sale_id = Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO sales (id, total_minor, sold_by, channel, client_token, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(&sale_id)
    .bind(total.minor())
    .bind(sold_by)
    .bind(SaleChannel::Offline)
    .bind(client_token)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(DbError::from)
    .map_err(|e| map_token_collision(e, client_token))?;

    insert_snapshot_items(conn, ItemTable::Sale, &sale_id, items).await?;

    Ok(sale_id)
}

/// Everything between BEGIN and COMMIT for an online order.
async fn online_order_body(
    conn: &mut SqliteConnection,
    draft: &OrderDraft,
    code_source: &CodeSource,
) -> Result<CommittedOrder, CheckoutError> {
    reserve_stock(conn, &draft.items).await?;

    let order_id = Uuid::new_v4().to_string();
    let now = Utc::now();

    let wants_code = draft.fulfillment == FulfillmentType::Pickup;
    let mut code = wants_code.then(|| code_source());

    let mut code_attempt = 0;
    loop {
        code_attempt += 1;

        let insert = sqlx::query(
            "INSERT INTO orders (id, total_minor, fulfillment, customer_name, \
             customer_phone, address, payment_method, payment_status, pickup_code, \
             status, client_token, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(&order_id)
        .bind(draft.total_minor)
        .bind(draft.fulfillment)
        .bind(&draft.customer_name)
        .bind(&draft.customer_phone)
        .bind(&draft.address)
        .bind(draft.payment_method)
        .bind(draft.payment_status)
        .bind(code.as_ref().map(|c| c.as_str().to_string()))
        .bind(OrderStatus::Pending)
        .bind(&draft.client_token)
        .bind(now)
        .execute(&mut *conn)
        .await
        .map_err(DbError::from);

        match insert {
            Ok(_) => break,
            // Another pending order holds this code; draw again.
            Err(DbError::UniqueViolation { ref field })
                if field.contains("pickup_code") && code_attempt < MAX_CODE_ATTEMPTS =>
            {
                debug!(code_attempt, "Pickup code collision, regenerating");
                code = Some(code_source());
            }
            Err(e) => {
                return Err(map_token_collision(e, draft.client_token.as_deref()));
            }
        }
    }

    insert_snapshot_items(conn, ItemTable::Order, &order_id, &draft.items).await?;

    Ok(CommittedOrder {
        order_id,
        pickup_code: code,
    })
}

// =============================================================================
// Transaction body helpers
// =============================================================================

/// Validates availability and decrements stock for every line item.
///
/// Runs inside the write transaction: the SELECT classifies the domain
/// error, the UPDATE is additionally guarded on `stock >= quantity`.
/// With the write lock held from BEGIN, the guard can only miss if the
/// classification above is wrong; that case aborts as a conflict rather
/// than writing anything.
async fn reserve_stock(
    conn: &mut SqliteConnection,
    items: &[LineItem],
) -> Result<(), CheckoutError> {
    for item in items {
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT name, stock FROM products WHERE id = ?1")
                .bind(&item.product_id)
                .fetch_optional(&mut *conn)
                .await
                .map_err(DbError::from)?;

        let Some((name, available)) = row else {
            return Err(CheckoutError::Domain(CoreError::ProductNotFound {
                id: item.product_id.clone(),
                // The snapshot name is the best label we have for a
                // product that no longer exists.
                name: item.name.clone(),
            }));
        };

        if available < item.quantity {
            return Err(CheckoutError::Domain(CoreError::InsufficientStock {
                product_id: item.product_id.clone(),
                name,
                available,
                requested: item.quantity,
            }));
        }

        let result = sqlx::query(
            "UPDATE products SET stock = stock - ?2, updated_at = ?3 \
             WHERE id = ?1 AND stock >= ?2",
        )
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(CheckoutError::Store(DbError::Conflict(format!(
                "stock guard failed for product {}",
                item.product_id
            ))));
        }
    }

    Ok(())
}

/// Which child table receives the snapshot line items.
#[derive(Clone, Copy)]
enum ItemTable {
    Sale,
    Order,
}

impl ItemTable {
    fn insert_sql(self) -> &'static str {
        match self {
            ItemTable::Sale => {
                "INSERT INTO sale_items \
                 (id, sale_id, product_id, name_snapshot, unit_price_minor, quantity, seq) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
            }
            ItemTable::Order => {
                "INSERT INTO order_items \
                 (id, order_id, product_id, name_snapshot, unit_price_minor, quantity, seq) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
            }
        }
    }
}

async fn insert_snapshot_items(
    conn: &mut SqliteConnection,
    table: ItemTable,
    parent_id: &str,
    items: &[LineItem],
) -> Result<(), CheckoutError> {
    for (seq, item) in items.iter().enumerate() {
        sqlx::query(table.insert_sql())
            .bind(Uuid::new_v4().to_string())
            .bind(parent_id)
            .bind(&item.product_id)
            .bind(&item.name)
            .bind(item.unit_price_minor)
            .bind(item.quantity)
            .bind(seq as i64)
            .execute(&mut *conn)
            .await
            .map_err(DbError::from)?;
    }
    Ok(())
}

/// Rewrites an idempotency-token unique violation into its domain
/// error. Other errors pass through.
fn map_token_collision(err: DbError, token: Option<&str>) -> CheckoutError {
    match err {
        DbError::UniqueViolation { ref field } if field.contains("client_token") => {
            CheckoutError::Domain(CoreError::DuplicateSubmission {
                token: token.unwrap_or_default().to_string(),
            })
        }
        e => CheckoutError::Store(e),
    }
}

// =============================================================================
// Immediate transactions
// =============================================================================

/// A SQLite transaction opened with `BEGIN IMMEDIATE`.
///
/// Taking the write lock up front means the read-check-write sequence
/// runs against the authoritative state, never a snapshot another
/// writer can invalidate mid-commit. Competing commits queue on the
/// busy timeout and abort with a retryable conflict when it elapses.
///
/// Every code path must end in [`commit`](Self::commit) or
/// [`rollback`](Self::rollback): both consume the transaction, and
/// either one that cannot leave the connection clean closes it instead
/// of returning it to the pool.
struct ImmediateTx {
    conn: sqlx::pool::PoolConnection<sqlx::Sqlite>,
}

impl ImmediateTx {
    async fn begin(pool: &SqlitePool) -> Result<Self, CheckoutError> {
        let mut conn = pool.acquire().await.map_err(DbError::from)?;
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .map_err(DbError::from)?;
        Ok(ImmediateTx { conn })
    }

    fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }

    async fn commit(mut self) -> DbResult<()> {
        if let Err(e) = sqlx::query("COMMIT").execute(&mut *self.conn).await {
            self.discard().await;
            return Err(e.into());
        }
        Ok(())
    }

    /// Best-effort rollback. The commit outcome is already decided by
    /// the caller's error, so a rollback failure only affects the
    /// connection, which is then discarded rather than reused.
    async fn rollback(mut self) {
        if let Err(e) = sqlx::query("ROLLBACK").execute(&mut *self.conn).await {
            warn!(error = %e, "Rollback failed, discarding connection");
            self.discard().await;
        }
    }

    /// Removes the connection from the pool and closes it, so a
    /// possibly-open transaction never travels to the next caller.
    async fn discard(self) {
        use sqlx::Connection;
        let conn = self.conn.detach();
        if let Err(e) = conn.close().await {
            warn!(error = %e, "Failed to close discarded connection");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::generate_product_id;
    use mobimart_core::{PaymentMethod, PaymentStatus, Product, ProductSpecs};
    use std::collections::HashSet;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// File-backed database: in-memory SQLite is per-connection, so
    /// concurrency tests need a real file and a multi-connection pool.
    async fn file_db(dir: &tempfile::TempDir, max_connections: u32) -> Database {
        let path = dir.path().join("mobimart-test.db");
        Database::new(DbConfig::new(path).max_connections(max_connections))
            .await
            .unwrap()
    }

    async fn add_product(db: &Database, name: &str, price: i64, stock: i64) -> Product {
        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            name: name.to_string(),
            brand: None,
            price_minor: price,
            discount_pct: 0,
            stock,
            specs: ProductSpecs::default(),
            image_url: None,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();
        product
    }

    fn item_for(product: &Product, quantity: i64) -> LineItem {
        LineItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price_minor: product.price_minor,
            quantity,
        }
    }

    fn pickup_draft(product: &Product, quantity: i64) -> OrderDraft {
        OrderDraft {
            items: vec![item_for(product, quantity)],
            total_minor: product.price_minor * quantity,
            fulfillment: FulfillmentType::Pickup,
            customer_name: "Asha".to_string(),
            customer_phone: "9876543210".to_string(),
            address: String::new(),
            payment_method: PaymentMethod::Card,
            payment_status: PaymentStatus::Paid,
            client_token: None,
        }
    }

    async fn stock_of(db: &Database, id: &str) -> i64 {
        db.products().get_by_id(id).await.unwrap().unwrap().stock
    }

    // -------------------------------------------------------------------------
    // Offline sale scenarios
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_offline_sale_success() {
        let db = test_db().await;
        let p = add_product(&db, "iPhone 15", 1000, 10).await;

        let sale_id = db
            .checkout()
            .commit_offline_sale(&[item_for(&p, 3)], Money::from_minor(3000), "ravi", None)
            .await
            .unwrap();

        assert_eq!(stock_of(&db, &p.id).await, 7);

        let sale = db.sales().get_by_id(&sale_id).await.unwrap().unwrap();
        assert_eq!(sale.total_minor, 3000);
        assert_eq!(sale.sold_by, "ravi");
        assert_eq!(sale.items.len(), 1);
        assert_eq!(sale.items[0].quantity, 3);
        assert_eq!(sale.items[0].product_id, p.id);
    }

    #[tokio::test]
    async fn test_insufficient_stock_fails_whole_sale() {
        let db = test_db().await;
        let p = add_product(&db, "Redmi Note 13 Pro+", 31_999, 2).await;

        let err = db
            .checkout()
            .commit_offline_sale(&[item_for(&p, 5)], Money::from_minor(159_995), "ravi", None)
            .await
            .unwrap_err();

        match err {
            CheckoutError::Domain(CoreError::InsufficientStock {
                name,
                available,
                requested,
                ..
            }) => {
                assert_eq!(name, "Redmi Note 13 Pro+");
                assert_eq!(available, 2);
                assert_eq!(requested, 5);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        assert_eq!(stock_of(&db, &p.id).await, 2);
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_product_fails() {
        let db = test_db().await;

        let ghost = LineItem {
            product_id: "no-such-id".to_string(),
            name: "Ghost Phone".to_string(),
            unit_price_minor: 1,
            quantity: 1,
        };
        let err = db
            .checkout()
            .commit_offline_sale(&[ghost], Money::from_minor(1), "ravi", None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Domain(CoreError::ProductNotFound { .. })
        ));
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failing_item_rolls_back_earlier_decrements() {
        let db = test_db().await;
        let a = add_product(&db, "Vivo V30 Pro", 41_999, 10).await;
        let b = add_product(&db, "OnePlus 12 5G", 64_999, 1).await;

        // A validates and decrements first, then B fails; nothing may stick.
        let err = db
            .checkout()
            .commit_offline_sale(
                &[item_for(&a, 1), item_for(&b, 2)],
                Money::from_minor(171_997),
                "ravi",
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Domain(CoreError::InsufficientStock { .. })
        ));
        assert_eq!(stock_of(&db, &a.id).await, 10);
        assert_eq!(stock_of(&db, &b.id).await, 1);
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_seller_recorded_as_admin() {
        let db = test_db().await;
        let p = add_product(&db, "iPhone 15", 1000, 5).await;

        let sale_id = db
            .checkout()
            .commit_offline_sale(&[item_for(&p, 1)], Money::from_minor(1000), "  ", None)
            .await
            .unwrap();

        let sale = db.sales().get_by_id(&sale_id).await.unwrap().unwrap();
        assert_eq!(sale.sold_by, "Admin");
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let db = test_db().await;
        let err = db
            .checkout()
            .commit_offline_sale(&[], Money::zero(), "ravi", None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Domain(CoreError::Validation(ValidationError::EmptyCart))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_idempotency_token_rejected() {
        let db = test_db().await;
        let p = add_product(&db, "iPhone 15", 1000, 10).await;

        let token = Some("attempt-42");
        db.checkout()
            .commit_offline_sale(&[item_for(&p, 2)], Money::from_minor(2000), "ravi", token)
            .await
            .unwrap();

        let err = db
            .checkout()
            .commit_offline_sale(&[item_for(&p, 2)], Money::from_minor(2000), "ravi", token)
            .await
            .unwrap_err();

        match err {
            CheckoutError::Domain(CoreError::DuplicateSubmission { token }) => {
                assert_eq!(token, "attempt-42");
            }
            other => panic!("expected DuplicateSubmission, got {other:?}"),
        }

        // First commit stands, the duplicate changed nothing.
        assert_eq!(stock_of(&db, &p.id).await, 8);
        assert_eq!(db.sales().count().await.unwrap(), 1);
    }

    // -------------------------------------------------------------------------
    // Online order scenarios
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_pickup_order_flow() {
        let db = test_db().await;
        let q = add_product(&db, "Galaxy S24 Ultra", 129_999, 5).await;
        let checkout = db.checkout();

        let committed = checkout.commit_online_order(&pickup_draft(&q, 1)).await.unwrap();
        let code = committed.pickup_code.expect("pickup order must carry a code");
        assert_eq!(code.as_str().len(), 6);
        assert_eq!(stock_of(&db, &q.id).await, 4);

        let order = db
            .orders()
            .get_by_id(&committed.order_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.pickup_code.as_ref(), Some(&code));
        assert_eq!(order.items.len(), 1);

        // Staff verifies the code at the counter...
        let found = checkout.verify_pickup(code.as_str()).await.unwrap();
        assert_eq!(found.id, committed.order_id);
        assert_eq!(found.customer_name, "Asha");

        // ...and hands the items over.
        let done = checkout.complete_pickup(code.as_str()).await.unwrap();
        assert_eq!(done.status, OrderStatus::Completed);

        // Completion is a pure status flip: no further stock change,
        // and the code is dead afterwards.
        assert_eq!(stock_of(&db, &q.id).await, 4);
        let err = checkout.verify_pickup(code.as_str()).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Domain(CoreError::InvalidOrExpiredCode { .. })
        ));
    }

    #[tokio::test]
    async fn test_delivery_order_has_no_code() {
        let db = test_db().await;
        let p = add_product(&db, "iPhone 15", 79_999, 3).await;

        let mut draft = pickup_draft(&p, 1);
        draft.fulfillment = FulfillmentType::Delivery;
        draft.address = "12 MG Road, Pune".to_string();
        draft.payment_method = PaymentMethod::Cod;
        draft.payment_status = PaymentStatus::Pending;

        let committed = db.checkout().commit_online_order(&draft).await.unwrap();
        assert!(committed.pickup_code.is_none());

        let order = db
            .orders()
            .get_by_id(&committed.order_id)
            .await
            .unwrap()
            .unwrap();
        assert!(order.pickup_code.is_none());
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(stock_of(&db, &p.id).await, 2);
    }

    #[tokio::test]
    async fn test_delivery_requires_address() {
        let db = test_db().await;
        let p = add_product(&db, "iPhone 15", 79_999, 3).await;

        let mut draft = pickup_draft(&p, 1);
        draft.fulfillment = FulfillmentType::Delivery;
        draft.address = String::new();

        let err = db.checkout().commit_online_order(&draft).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Domain(CoreError::Validation(_))));
        assert_eq!(stock_of(&db, &p.id).await, 3);
    }

    #[tokio::test]
    async fn test_order_insufficient_stock_leaves_no_order() {
        let db = test_db().await;
        let p = add_product(&db, "iPhone 15", 79_999, 1).await;

        let err = db
            .checkout()
            .commit_online_order(&pickup_draft(&p, 2))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Domain(CoreError::InsufficientStock { available: 1, .. })
        ));
        assert_eq!(stock_of(&db, &p.id).await, 1);
        assert!(db.orders().list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_verify_never_issued_code() {
        let db = test_db().await;

        let err = db.checkout().verify_pickup("654321").await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Domain(CoreError::InvalidOrExpiredCode { .. })
        ));
    }

    #[tokio::test]
    async fn test_verify_malformed_code() {
        let db = test_db().await;

        let err = db.checkout().verify_pickup("12ab").await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Domain(CoreError::Validation(_))
        ));
    }

    // -------------------------------------------------------------------------
    // Concurrency properties
    // -------------------------------------------------------------------------

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_no_oversell_under_concurrent_commits() {
        let dir = tempfile::tempdir().unwrap();
        let db = file_db(&dir, 8).await;
        let p = add_product(&db, "iPhone 15", 1000, 5).await;

        // Ten buyers race for five units.
        let mut handles = Vec::new();
        for _ in 0..10 {
            let checkout = db.checkout();
            let item = item_for(&p, 1);
            handles.push(tokio::spawn(async move {
                checkout
                    .commit_offline_sale(&[item], Money::from_minor(1000), "ravi", None)
                    .await
            }));
        }

        let mut ok = 0;
        let mut out_of_stock = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(CheckoutError::Domain(CoreError::InsufficientStock { .. })) => {
                    out_of_stock += 1
                }
                Err(other) => panic!("unexpected failure: {other:?}"),
            }
        }

        assert_eq!(ok, 5);
        assert_eq!(out_of_stock, 5);
        assert_eq!(stock_of(&db, &p.id).await, 0);
        assert_eq!(db.sales().count().await.unwrap(), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_pickup_codes_are_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let db = file_db(&dir, 8).await;
        let p = add_product(&db, "iPhone 15", 1000, 200).await;

        let mut handles = Vec::new();
        for _ in 0..100 {
            let checkout = db.checkout();
            let draft = pickup_draft(&p, 1);
            handles.push(tokio::spawn(
                async move { checkout.commit_online_order(&draft).await },
            ));
        }

        let mut codes = HashSet::new();
        for handle in handles {
            let committed = handle.await.unwrap().unwrap();
            let code = committed.pickup_code.unwrap();
            assert!(codes.insert(code.as_str().to_string()), "duplicate code issued");
        }

        assert_eq!(codes.len(), 100);
        assert_eq!(stock_of(&db, &p.id).await, 100);
    }

    /// Pins the code source so the second order's first draw collides
    /// with an existing pending order and must be redrawn.
    #[tokio::test]
    async fn test_pickup_code_regenerated_on_collision() {
        use std::collections::VecDeque;
        use std::sync::Mutex;

        let db = test_db().await;
        let p = add_product(&db, "iPhone 15", 1000, 10).await;

        let first = db
            .checkout()
            .with_code_source(|| PickupCode::parse("123456").unwrap())
            .commit_online_order(&pickup_draft(&p, 1))
            .await
            .unwrap();
        assert_eq!(first.pickup_code.unwrap().as_str(), "123456");

        let draws = Mutex::new(VecDeque::from(["123456", "654321"]));
        let committed = db
            .checkout()
            .with_code_source(move || {
                let next = draws.lock().unwrap().pop_front().unwrap();
                PickupCode::parse(next).unwrap()
            })
            .commit_online_order(&pickup_draft(&p, 1))
            .await
            .unwrap();

        // First draw collided with the pending order above; the commit
        // still succeeded under the redrawn code.
        assert_eq!(committed.pickup_code.unwrap().as_str(), "654321");
        assert_eq!(stock_of(&db, &p.id).await, 8);

        let order = db
            .orders()
            .get_by_id(&committed.order_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
    }

    // -------------------------------------------------------------------------
    // Dashboard rollup
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_dashboard_stats_count_todays_commits() {
        let db = test_db().await;
        let p = add_product(&db, "iPhone 15", 1000, 10).await;
        let checkout = db.checkout();

        checkout
            .commit_offline_sale(&[item_for(&p, 3)], Money::from_minor(3000), "ravi", None)
            .await
            .unwrap();
        checkout.commit_online_order(&pickup_draft(&p, 1)).await.unwrap();

        let stats = db.dashboard_stats().await.unwrap();
        assert_eq!(stats.today_revenue_minor, 4000);
        assert_eq!(stats.today_transactions, 2);
    }
}
