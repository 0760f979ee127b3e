use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::{
    Alert, AuthAttemptRecord, EnrichedOrder, OrderSide, OrderStatus, PriceTick, RawOrder,
};
use crate::error::{Result, WatcherError};
use crate::persistence::Store;

/// SQLite storage adapter
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `database_url`
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        info!("Connected to SQLite at {}", database_url);
        Ok(Self { pool })
    }

    /// Private in-memory database with the schema applied.
    ///
    /// Pinned to a single connection that is never recycled, since every
    /// connection to `:memory:` opens its own empty database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Run migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn decimal(row: &SqliteRow, column: &str) -> Result<Decimal> {
    let raw: String = row.try_get(column)?;
    parse_decimal(column, &raw)
}

fn optional_decimal(row: &SqliteRow, column: &str) -> Result<Option<Decimal>> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|raw| parse_decimal(column, &raw)).transpose()
}

fn parse_decimal(column: &str, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw)
        .map_err(|e| WatcherError::Corrupt(format!("{} = '{}': {}", column, raw, e)))
}

fn order_from_row(row: &SqliteRow) -> Result<EnrichedOrder> {
    let side: String = row.try_get("side")?;
    let status: String = row.try_get("status")?;

    let order = RawOrder {
        symbol: row.try_get("symbol")?,
        order_id: row.try_get("order_id")?,
        order_list_id: row.try_get("order_list_id")?,
        client_order_id: row.try_get("client_order_id")?,
        price: decimal(row, "price")?,
        orig_qty: decimal(row, "orig_qty")?,
        executed_qty: decimal(row, "executed_qty")?,
        cumulative_quote_qty: decimal(row, "cumulative_quote_qty")?,
        status: OrderStatus::from_str(&status).unwrap_or(OrderStatus::Unknown),
        time_in_force: row.try_get("time_in_force")?,
        order_type: row.try_get("order_type")?,
        side: OrderSide::from_str(&side).map_err(WatcherError::Corrupt)?,
        stop_price: decimal(row, "stop_price")?,
        iceberg_qty: decimal(row, "iceberg_qty")?,
        time: row.try_get("time")?,
        update_time: row.try_get("update_time")?,
        is_working: row.try_get("is_working")?,
    };

    Ok(EnrichedOrder {
        order,
        last_filled_price: optional_decimal(row, "last_filled_price")?,
        market_price: optional_decimal(row, "market_price")?,
        spread: optional_decimal(row, "spread")?,
        percent_completed: optional_decimal(row, "percent_completed")?,
    })
}

fn alert_from_row(row: &SqliteRow) -> Result<Alert> {
    let id: String = row.try_get("id")?;
    Ok(Alert {
        id: Uuid::parse_str(&id)
            .map_err(|e| WatcherError::Corrupt(format!("alert id '{}': {}", id, e)))?,
        symbol: row.try_get("symbol")?,
        price: decimal(row, "price")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        text: row.try_get("text")?,
        direction_down: row.try_get("direction_down")?,
        created_at: row.try_get("created_at")?,
    })
}

fn attempt_from_row(row: &SqliteRow) -> Result<AuthAttemptRecord> {
    let attempts: i64 = row.try_get("attempts")?;
    Ok(AuthAttemptRecord {
        source: row.try_get("source")?,
        attempts: u32::try_from(attempts).unwrap_or(u32::MAX),
        alert_sent: row.try_get("alert_sent")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

#[async_trait]
impl Store for SqliteStore {
    // ==================== Snapshot ====================

    #[instrument(skip(self, orders, prices), fields(orders = orders.len(), prices = prices.len()))]
    async fn replace_snapshot(&self, orders: &[EnrichedOrder], prices: &[PriceTick]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM orders").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM prices").execute(&mut *tx).await?;

        for enriched in orders {
            let o = &enriched.order;
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO orders (
                    symbol, order_id, order_list_id, client_order_id, price, orig_qty,
                    executed_qty, cumulative_quote_qty, status, time_in_force, order_type,
                    side, stop_price, iceberg_qty, time, update_time, is_working,
                    last_filled_price, market_price, percent_completed, spread
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&o.symbol)
            .bind(o.order_id)
            .bind(o.order_list_id)
            .bind(&o.client_order_id)
            .bind(o.price.to_string())
            .bind(o.orig_qty.to_string())
            .bind(o.executed_qty.to_string())
            .bind(o.cumulative_quote_qty.to_string())
            .bind(o.status.as_str())
            .bind(&o.time_in_force)
            .bind(&o.order_type)
            .bind(o.side.as_str())
            .bind(o.stop_price.to_string())
            .bind(o.iceberg_qty.to_string())
            .bind(o.time)
            .bind(o.update_time)
            .bind(o.is_working)
            .bind(enriched.last_filled_price.map(|d| d.to_string()))
            .bind(enriched.market_price.map(|d| d.to_string()))
            .bind(enriched.percent_completed.map(|d| d.to_string()))
            .bind(enriched.spread.map(|d| d.to_string()))
            .execute(&mut *tx)
            .await?;
        }

        for tick in prices {
            sqlx::query("INSERT OR REPLACE INTO prices (symbol, price) VALUES (?, ?)")
                .bind(&tick.symbol)
                .bind(tick.price.to_string())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        debug!("Replaced snapshot: {} orders, {} prices", orders.len(), prices.len());
        Ok(())
    }

    async fn orders(&self) -> Result<Vec<EnrichedOrder>> {
        let rows = sqlx::query("SELECT * FROM orders ORDER BY symbol, order_id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(order_from_row).collect()
    }

    async fn prices(&self) -> Result<Vec<PriceTick>> {
        let rows = sqlx::query("SELECT symbol, price FROM prices ORDER BY symbol")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<PriceTick> {
                Ok(PriceTick {
                    symbol: row.try_get("symbol")?,
                    price: decimal(row, "price")?,
                })
            })
            .collect()
    }

    // ==================== Alerts ====================

    #[instrument(skip(self, alert), fields(id = %alert.id, symbol = %alert.symbol))]
    async fn add_alert(&self, alert: &Alert) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO alerts (id, symbol, price, name, email, text, direction_down, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(alert.id.to_string())
        .bind(&alert.symbol)
        .bind(alert.price.to_string())
        .bind(&alert.name)
        .bind(&alert.email)
        .bind(&alert.text)
        .bind(alert.direction_down)
        .bind(alert.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn alerts(&self) -> Result<Vec<Alert>> {
        let rows = sqlx::query(
            r#"
            SELECT id, symbol, price, name, email, text, direction_down, created_at
            FROM alerts
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(alert_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn delete_alert(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM alerts WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ==================== Auth attempts ====================

    async fn auth_attempt(&self, source: &str) -> Result<Option<AuthAttemptRecord>> {
        let rows = sqlx::query(
            "SELECT source, attempts, alert_sent, updated_at FROM auth_attempts WHERE source = ?",
        )
        .bind(source)
        .fetch_all(&self.pool)
        .await?;

        rows.first().map(attempt_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn reserve_auth_attempt(&self, source: &str, max_attempts: u32) -> Result<Option<u32>> {
        // fetch_all steps the statement to completion so the write commits
        // before the row is handed back
        let rows = sqlx::query(
            r#"
            INSERT INTO auth_attempts (source, attempts, alert_sent, updated_at)
            VALUES (?, 1, FALSE, ?)
            ON CONFLICT (source) DO UPDATE SET
                attempts = auth_attempts.attempts + 1,
                updated_at = excluded.updated_at
            WHERE auth_attempts.attempts < ?
            RETURNING attempts
            "#,
        )
        .bind(source)
        .bind(Utc::now())
        .bind(i64::from(max_attempts))
        .fetch_all(&self.pool)
        .await?;

        match rows.first() {
            Some(row) => {
                let attempts: i64 = row.try_get("attempts")?;
                Ok(Some(u32::try_from(attempts).unwrap_or(u32::MAX)))
            }
            None => {
                debug!(source, max_attempts, "no login attempts left");
                Ok(None)
            }
        }
    }

    async fn reset_auth_attempts(&self, source: &str) -> Result<()> {
        sqlx::query(
            "UPDATE auth_attempts SET attempts = 0, alert_sent = FALSE, updated_at = ? WHERE source = ?",
        )
        .bind(Utc::now())
        .bind(source)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn claim_lockout_notification(&self, source: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE auth_attempts SET alert_sent = TRUE, updated_at = ? WHERE source = ? AND alert_sent = FALSE",
        )
        .bind(Utc::now())
        .bind(source)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn release_lockout_notification(&self, source: &str) -> Result<()> {
        sqlx::query("UPDATE auth_attempts SET alert_sent = FALSE, updated_at = ? WHERE source = ?")
            .bind(Utc::now())
            .bind(source)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn clear_auth_source(&self, source: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM auth_attempts WHERE source = ?")
            .bind(source)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
