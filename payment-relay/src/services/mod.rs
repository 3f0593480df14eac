pub mod gateway;
pub mod sslcommerz;
pub mod transaction_id;

pub use gateway::{CheckoutGateway, GatewayError};
pub use sslcommerz::{CallbackVerifier, SslCommerzClient};
pub use transaction_id::TransactionIdGenerator;
