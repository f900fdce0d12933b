pub mod api;
pub mod transaction;

pub use api::*;
pub use transaction::*;
