pub mod gateway;
pub mod payment;
pub mod qr_image;
pub mod random;
pub mod sweeper;

pub use gateway::SettlementGateway;
pub use payment::{PaymentService, PaymentSettings};
pub use qr_image::QrImagePublisher;
pub use random::{RandomSource, SystemRandom};
pub use sweeper::ExpirySweeper;
