pub mod api_server;
pub mod binance_rest;
pub mod mailjet;
pub mod sqlite;

pub use api_server::start_api_server;
pub use binance_rest::BinanceClient;
pub use mailjet::MailjetNotifier;
pub use sqlite::SqliteStore;
