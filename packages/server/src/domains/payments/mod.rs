pub mod models;
pub mod settlement;

pub use models::payment::{NewPaymentRecord, PaymentRecord, PaymentState};
pub use settlement::{create_checkout, fee_split, finalize, SettlementOutcome, ADMIN_FEE_PERCENT};
