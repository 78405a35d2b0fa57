//! Payment gateway adapters, one per provider, plus the registry that
//! selects them by provider id.

mod coinpayments;
mod fields;
mod registry;
mod robokassa;
mod unitpay;

#[cfg(test)]
pub(crate) mod test_support;

pub use coinpayments::CoinPaymentsGateway;
pub use registry::GatewayRegistry;
pub use robokassa::RobokassaGateway;
pub use unitpay::UnitpayGateway;
