//! Database service: connection pool, CRUD, and the atomic sale transaction.

use crate::error::AppError;
use crate::models::{
    CreateCustomer, CreateProduct, CreateSale, Customer, Product, Sale, SaleDetail, SaleItem,
    UpdateCustomer, UpdateProduct,
};
use crate::services::metrics::DB_QUERY_DURATION;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Create a pool without establishing connections up front; the first
    /// query opens one. Only the URL is validated here.
    pub fn connect_lazy(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy(database_url)
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Invalid database URL: {}", e)))?;
        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Customer Operations
    // -------------------------------------------------------------------------

    /// Create a new customer.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_customer(&self, input: &CreateCustomer) -> Result<Customer, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_customer"])
            .start_timer();

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (customer_id, name, email, phone, address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING customer_id, name, email, phone, address, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Customer '{}' already exists",
                    input.name
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create customer: {}", e)),
        })?;

        timer.observe_duration();

        info!(customer_id = %customer.customer_id, "Customer created");

        Ok(customer)
    }

    /// Get a customer by ID.
    #[instrument(skip(self))]
    pub async fn get_customer(&self, customer_id: Uuid) -> Result<Option<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_customer"])
            .start_timer();

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT customer_id, name, email, phone, address, created_utc
            FROM customers
            WHERE customer_id = $1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get customer: {}", e)))?;

        timer.observe_duration();

        Ok(customer)
    }

    /// List all customers, ordered by name.
    #[instrument(skip(self))]
    pub async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_customers"])
            .start_timer();

        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT customer_id, name, email, phone, address, created_utc
            FROM customers
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list customers: {}", e)))?;

        timer.observe_duration();

        Ok(customers)
    }

    /// Update a customer. `None` fields keep their current value.
    #[instrument(skip(self, input))]
    pub async fn update_customer(
        &self,
        customer_id: Uuid,
        input: &UpdateCustomer,
    ) -> Result<Option<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_customer"])
            .start_timer();

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address)
            WHERE customer_id = $1
            RETURNING customer_id, name, email, phone, address, created_utc
            "#,
        )
        .bind(customer_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Customer name already in use"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to update customer: {}", e)),
        })?;

        timer.observe_duration();

        Ok(customer)
    }

    /// Delete a customer. Sales referencing it keep running with a nulled
    /// customer link (ON DELETE SET NULL).
    #[instrument(skip(self))]
    pub async fn delete_customer(&self, customer_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_customer"])
            .start_timer();

        let result = sqlx::query("DELETE FROM customers WHERE customer_id = $1")
            .bind(customer_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete customer: {}", e))
            })?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Product Operations
    // -------------------------------------------------------------------------

    /// Create a new product.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: &CreateProduct) -> Result<Product, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_product"])
            .start_timer();

        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (product_id, name, price, description)
            VALUES ($1, $2, $3, $4)
            RETURNING product_id, name, price, description, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(input.price)
        .bind(&input.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create product: {}", e)))?;

        timer.observe_duration();

        info!(product_id = %product.product_id, "Product created");

        Ok(product)
    }

    /// Get a product by ID.
    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<Option<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_product"])
            .start_timer();

        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT product_id, name, price, description, created_utc
            FROM products
            WHERE product_id = $1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get product: {}", e)))?;

        timer.observe_duration();

        Ok(product)
    }

    /// List all products, ordered by name.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_products"])
            .start_timer();

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT product_id, name, price, description, created_utc
            FROM products
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list products: {}", e)))?;

        timer.observe_duration();

        Ok(products)
    }

    /// Update a product.
    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: &UpdateProduct,
    ) -> Result<Option<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_product"])
            .start_timer();

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = COALESCE($2, name),
                price = COALESCE($3, price),
                description = COALESCE($4, description)
            WHERE product_id = $1
            RETURNING product_id, name, price, description, created_utc
            "#,
        )
        .bind(product_id)
        .bind(&input.name)
        .bind(input.price)
        .bind(&input.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update product: {}", e)))?;

        timer.observe_duration();

        Ok(product)
    }

    /// Delete a product. Sale items referencing it keep their snapshot with
    /// a nulled product link (ON DELETE SET NULL).
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_product"])
            .start_timer();

        let result = sqlx::query("DELETE FROM products WHERE product_id = $1")
            .bind(product_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete product: {}", e))
            })?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Sale Operations
    // -------------------------------------------------------------------------

    /// Create a sale with its line items in one transaction.
    ///
    /// Resolves the customer by exact name match, creating one if absent
    /// (UNIQUE constraint + ON CONFLICT, so concurrent requests converge on
    /// a single row). The total is the exact decimal sum of quantity x price
    /// over the submitted items. If any insert fails the whole transaction
    /// rolls back; no partial sale is ever visible.
    #[instrument(skip(self, input), fields(customer_name = %input.customer_name))]
    pub async fn create_sale(&self, input: &CreateSale) -> Result<SaleDetail, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_sale"])
            .start_timer();

        let total = input.total();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;

        // Get-or-create by exact name. The no-op DO UPDATE makes RETURNING
        // yield the surviving row whether it was inserted or already there.
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (customer_id, name)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING customer_id, name, email, phone, address, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.customer_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to resolve customer: {}", e)))?;

        let sale = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (sale_id, customer_id, total, issuer_name)
            VALUES ($1, $2, $3, $4)
            RETURNING sale_id, customer_id, sale_date, total, issuer_name, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(customer.customer_id)
        .bind(total)
        .bind(&input.issuer_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create sale: {}", e)))?;

        let mut items = Vec::with_capacity(input.items.len());
        for (idx, item) in input.items.iter().enumerate() {
            let row = sqlx::query_as::<_, SaleItem>(
                r#"
                INSERT INTO sale_items (sale_item_id, sale_id, product_id, product_name, quantity, price, sort_order)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING sale_item_id, sale_id, product_id, product_name, quantity, price, sort_order, created_utc
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(sale.sale_id)
            .bind(item.product_id)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.price)
            .bind(idx as i32)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to create sale item: {}", e))
            })?;
            items.push(row);
        }

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to commit sale: {}", e)))?;

        timer.observe_duration();

        info!(sale_id = %sale.sale_id, total = %sale.total, "Sale created");

        Ok(SaleDetail {
            sale,
            customer: Some(customer),
            items,
        })
    }

    /// List all sales, newest first.
    #[instrument(skip(self))]
    pub async fn list_sales(&self) -> Result<Vec<Sale>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_sales"])
            .start_timer();

        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT sale_id, customer_id, sale_date, total, issuer_name, created_utc
            FROM sales
            ORDER BY sale_date DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list sales: {}", e)))?;

        timer.observe_duration();

        Ok(sales)
    }

    /// Load a sale with its customer and items in submission order.
    #[instrument(skip(self))]
    pub async fn get_sale_detail(&self, sale_id: Uuid) -> Result<Option<SaleDetail>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_sale_detail"])
            .start_timer();

        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT sale_id, customer_id, sale_date, total, issuer_name, created_utc
            FROM sales
            WHERE sale_id = $1
            "#,
        )
        .bind(sale_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get sale: {}", e)))?;

        let Some(sale) = sale else {
            timer.observe_duration();
            return Ok(None);
        };

        let customer = match sale.customer_id {
            Some(customer_id) => self.get_customer(customer_id).await?,
            None => None,
        };

        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT sale_item_id, sale_id, product_id, product_name, quantity, price, sort_order, created_utc
            FROM sale_items
            WHERE sale_id = $1
            ORDER BY sort_order, created_utc
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get sale items: {}", e)))?;

        timer.observe_duration();

        Ok(Some(SaleDetail {
            sale,
            customer,
            items,
        }))
    }

    /// Delete a sale. Its items go with it (ON DELETE CASCADE).
    #[instrument(skip(self))]
    pub async fn delete_sale(&self, sale_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_sale"])
            .start_timer();

        let result = sqlx::query("DELETE FROM sales WHERE sale_id = $1")
            .bind(sale_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete sale: {}", e)))?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }
}
