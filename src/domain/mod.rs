pub mod access;
pub mod alert;
pub mod order;
pub mod price;

pub use access::*;
pub use alert::*;
pub use order::*;
pub use price::*;
