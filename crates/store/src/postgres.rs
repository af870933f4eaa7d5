use async_trait::async_trait;
use common::{BuyerId, SellerId};
use domain::{Cart, Order, OrderReference, OrderStatus};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{CartStore, OrderStore, Result, StoreError};

/// PostgreSQL-backed cart and order store.
///
/// Records are stored as JSONB documents with the columns the queries
/// filter and sort on hoisted into the row; optimistic version checks ride
/// on a `version` column guarded by conditional `UPDATE ... WHERE version`.
/// Order references come from a database sequence.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the given database URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPool::connect(url).await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_cart(row: PgRow) -> Result<Cart> {
        let document: serde_json::Value = row.try_get("document")?;
        let mut cart: Cart = serde_json::from_value(document)?;
        cart.set_version(row.try_get::<i64, _>("version")? as u64);
        Ok(cart)
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let document: serde_json::Value = row.try_get("document")?;
        let mut order: Order = serde_json::from_value(document)?;
        order.set_version(row.try_get::<i64, _>("version")? as u64);
        Ok(order)
    }
}

#[async_trait]
impl CartStore for PostgresStore {
    async fn fetch(&self, buyer_id: BuyerId) -> Result<Option<Cart>> {
        let row = sqlx::query("SELECT document, version FROM carts WHERE buyer_id = $1")
            .bind(buyer_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_cart).transpose()
    }

    async fn save(&self, cart: &Cart) -> Result<Cart> {
        let expected = cart.version();
        let mut stored = cart.clone();
        stored.set_version(expected + 1);
        let document = serde_json::to_value(&stored)?;

        let rows_affected = if expected == 0 {
            sqlx::query(
                "INSERT INTO carts (buyer_id, version, document, updated_at)
                 VALUES ($1, 1, $2, now())
                 ON CONFLICT (buyer_id) DO NOTHING",
            )
            .bind(cart.buyer_id().as_uuid())
            .bind(&document)
            .execute(&self.pool)
            .await?
            .rows_affected()
        } else {
            sqlx::query(
                "UPDATE carts SET version = $3, document = $2, updated_at = now()
                 WHERE buyer_id = $1 AND version = $4",
            )
            .bind(cart.buyer_id().as_uuid())
            .bind(&document)
            .bind(stored.version() as i64)
            .bind(expected as i64)
            .execute(&self.pool)
            .await?
            .rows_affected()
        };

        if rows_affected == 0 {
            let actual: Option<i64> =
                sqlx::query_scalar("SELECT version FROM carts WHERE buyer_id = $1")
                    .bind(cart.buyer_id().as_uuid())
                    .fetch_optional(&self.pool)
                    .await?;
            return Err(StoreError::VersionConflict {
                key: cart.buyer_id().to_string(),
                expected,
                actual: actual.unwrap_or(0) as u64,
            });
        }

        Ok(stored)
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn allocate_reference(&self) -> Result<OrderReference> {
        let sequence: i64 = sqlx::query_scalar("SELECT nextval('order_reference_seq')")
            .fetch_one(&self.pool)
            .await?;
        Ok(OrderReference::from_sequence(sequence as u64))
    }

    async fn create(&self, order: Order) -> Result<Order> {
        let mut stored = order;
        stored.set_version(1);
        let document = serde_json::to_value(&stored)?;

        let result = sqlx::query(
            "INSERT INTO orders (id, reference, buyer_id, status, version, document, created_at)
             VALUES ($1, $2, $3, $4, 1, $5, $6)",
        )
        .bind(stored.id().as_uuid())
        .bind(stored.reference().as_str())
        .bind(stored.buyer_id().as_uuid())
        .bind(stored.status().as_str())
        .bind(&document)
        .bind(stored.created_at())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(stored),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(
                StoreError::DuplicateReference(stored.reference().to_string()),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_by_reference(&self, reference: &str) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT document, version FROM orders WHERE reference = $1")
            .bind(reference)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn update(&self, order: &Order) -> Result<Order> {
        let expected = order.version();
        let mut stored = order.clone();
        stored.set_version(expected + 1);
        let document = serde_json::to_value(&stored)?;

        let rows_affected = sqlx::query(
            "UPDATE orders SET status = $2, version = $3, document = $4
             WHERE id = $1 AND version = $5",
        )
        .bind(order.id().as_uuid())
        .bind(stored.status().as_str())
        .bind(stored.version() as i64)
        .bind(&document)
        .bind(expected as i64)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            let actual: Option<i64> = sqlx::query_scalar("SELECT version FROM orders WHERE id = $1")
                .bind(order.id().as_uuid())
                .fetch_optional(&self.pool)
                .await?;
            return match actual {
                None => Err(StoreError::NotFound {
                    key: order.reference().to_string(),
                }),
                Some(actual) => Err(StoreError::VersionConflict {
                    key: order.reference().to_string(),
                    expected,
                    actual: actual as u64,
                }),
            };
        }

        Ok(stored)
    }

    async fn list_all(&self, status: Option<OrderStatus>) -> Result<Vec<Order>> {
        let rows = match status {
            Some(status) => {
                sqlx::query(
                    "SELECT document, version FROM orders
                     WHERE status = $1 ORDER BY created_at DESC",
                )
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query("SELECT document, version FROM orders ORDER BY created_at DESC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn list_for_buyer(
        &self,
        buyer_id: BuyerId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>> {
        let rows = match status {
            Some(status) => {
                sqlx::query(
                    "SELECT document, version FROM orders
                     WHERE buyer_id = $1 AND status = $2 ORDER BY created_at DESC",
                )
                .bind(buyer_id.as_uuid())
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT document, version FROM orders
                     WHERE buyer_id = $1 ORDER BY created_at DESC",
                )
                .bind(buyer_id.as_uuid())
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn list_for_seller(
        &self,
        seller_id: SellerId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>> {
        // Containment against the embedded line items; served by the GIN
        // index on document->'items'.
        let containment =
            "document -> 'items' @> jsonb_build_array(jsonb_build_object('seller_id', to_jsonb($1::uuid)))";

        let rows = match status {
            Some(status) => {
                let sql = format!(
                    "SELECT document, version FROM orders
                     WHERE {containment} AND status = $2 ORDER BY created_at DESC"
                );
                sqlx::query(&sql)
                    .bind(seller_id.as_uuid())
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT document, version FROM orders
                     WHERE {containment} ORDER BY created_at DESC"
                );
                sqlx::query(&sql)
                    .bind(seller_id.as_uuid())
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.into_iter().map(Self::row_to_order).collect()
    }
}
