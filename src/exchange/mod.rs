pub mod traits;

pub use traits::ExchangeGateway;

#[cfg(test)]
pub use traits::mock;
