#![allow(dead_code)]

use async_trait::async_trait;
use order_watch::config::{
    AppConfig, AuthConfig, DatabaseConfig, ExchangeConfig, LoggingConfig, MailerConfig,
    SchedulerConfig, ServerConfig,
};
use order_watch::domain::{OrderSide, OrderStatus, PriceTick, RawOrder, Recipient};
use order_watch::error::{Result, WatcherError};
use order_watch::exchange::ExchangeGateway;
use order_watch::notify::Notifier;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;

pub const USER: &str = "admin";
pub const PASSWORD: &str = "correct horse";

pub fn config(database_url: &str) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        exchange: ExchangeConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            recv_window_ms: 10_000,
            timeout_secs: 5,
        },
        auth: AuthConfig {
            username: USER.to_string(),
            password: PASSWORD.to_string(),
            secret: "integration-secret-0123456789".to_string(),
            token_ttl_secs: 84_600,
            max_attempts: 3,
            admin_name: "Ops".to_string(),
            admin_email: "ops@example.com".to_string(),
        },
        mailer: MailerConfig::default(),
        database: DatabaseConfig {
            url: database_url.to_string(),
            max_connections: 2,
        },
        scheduler: SchedulerConfig { interval_secs: 1800 },
        logging: LoggingConfig::default(),
    }
}

pub fn order(symbol: &str, order_id: i64, price: Decimal, status: OrderStatus, update_time: i64) -> RawOrder {
    RawOrder {
        symbol: symbol.to_string(),
        order_id,
        order_list_id: -1,
        client_order_id: format!("it_{}", order_id),
        price,
        orig_qty: Decimal::ONE,
        executed_qty: Decimal::ZERO,
        cumulative_quote_qty: Decimal::ZERO,
        status,
        time_in_force: "GTC".to_string(),
        order_type: "LIMIT".to_string(),
        side: OrderSide::Sell,
        stop_price: Decimal::ZERO,
        iceberg_qty: Decimal::ZERO,
        time: update_time,
        update_time,
        is_working: true,
    }
}

/// In-process stand-in for the exchange account
#[derive(Default)]
pub struct FakeExchange {
    pub open: Mutex<Vec<RawOrder>>,
    pub history: Mutex<HashMap<String, Vec<RawOrder>>>,
    pub ticks: Mutex<Vec<PriceTick>>,
    pub down: Mutex<bool>,
}

impl FakeExchange {
    pub fn set_open(&self, orders: Vec<RawOrder>) {
        *self.open.lock().unwrap() = orders;
    }

    pub fn set_history(&self, symbol: &str, orders: Vec<RawOrder>) {
        self.history.lock().unwrap().insert(symbol.to_string(), orders);
    }

    pub fn set_ticks(&self, ticks: Vec<PriceTick>) {
        *self.ticks.lock().unwrap() = ticks;
    }

    pub fn set_down(&self, down: bool) {
        *self.down.lock().unwrap() = down;
    }

    fn check_up(&self) -> Result<()> {
        if *self.down.lock().unwrap() {
            return Err(WatcherError::Exchange("exchange unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ExchangeGateway for FakeExchange {
    async fn open_orders(&self) -> Result<Vec<RawOrder>> {
        self.check_up()?;
        Ok(self.open.lock().unwrap().clone())
    }

    async fn order_history(&self, symbol: &str) -> Result<Vec<RawOrder>> {
        self.check_up()?;
        Ok(self.history.lock().unwrap().get(symbol).cloned().unwrap_or_default())
    }

    async fn prices(&self) -> Result<Vec<PriceTick>> {
        self.check_up()?;
        Ok(self.ticks.lock().unwrap().clone())
    }
}

/// Notifier capturing (recipient email, text)
#[derive(Default)]
pub struct Outbox {
    pub messages: Mutex<Vec<(String, String)>>,
}

impl Outbox {
    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for Outbox {
    async fn send(&self, to: &Recipient, _subject: &str, text: &str) -> Result<()> {
        self.messages
            .lock()
            .unwrap()
            .push((to.email.clone(), text.to_string()));
        Ok(())
    }
}
