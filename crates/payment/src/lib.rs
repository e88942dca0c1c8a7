//! Payment gateway adapters.
//!
//! The order core only needs a QR payload and an external reference for
//! every order it creates. [`FakePaymentGateway`] issues both locally in the
//! shape of a Mercado Pago dynamic QR, so the service can run without a
//! payment provider account.

pub mod fake;

pub use fake::{DEFAULT_QR_PREFIX, FakePaymentGateway};
