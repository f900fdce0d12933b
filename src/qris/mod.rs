pub mod crc;
pub mod lifecycle;
pub mod payload;

pub use crc::crc16;
pub use lifecycle::{evaluate, Liveness};
pub use payload::QrisTemplate;
