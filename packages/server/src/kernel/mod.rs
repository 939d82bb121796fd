pub mod deps;
pub mod test_dependencies;
pub mod traits;

pub use deps::{FirebaseAdapter, ServerDeps, StripeAdapter};
pub use test_dependencies::{MockIdentityVerifier, MockPaymentProvider};
pub use traits::{
    BaseIdentityVerifier, BasePaymentProvider, CheckoutRequest, CheckoutSession,
    CheckoutSessionStatus, VerifiedIdentity,
};
