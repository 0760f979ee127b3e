pub mod hmac;
pub mod session;

pub use self::hmac::{ApiCredentials, QuerySigner, API_KEY_HEADER};
pub use self::session::{SessionClaims, SessionSigner};
