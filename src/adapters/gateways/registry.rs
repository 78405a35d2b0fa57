//! Static strategy table from provider id to gateway.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::PaymentConfig;
use crate::domain::foundation::ProviderId;
use crate::ports::{GatewayError, GatewayLookup, PaymentGateway};

use super::{CoinPaymentsGateway, RobokassaGateway, UnitpayGateway};

/// Gateways keyed by provider id.
///
/// Built once at startup; an unknown id is always a configuration error,
/// never a fallback to some default provider.
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    gateways: HashMap<ProviderId, Arc<dyn PaymentGateway>>,
}

impl GatewayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every provider that has a configuration section.
    pub fn from_config(config: &PaymentConfig) -> Result<Self, GatewayError> {
        let mut registry = Self::new();
        if let Some(robokassa) = &config.robokassa {
            registry.register(Arc::new(RobokassaGateway::from_config(robokassa)?));
        }
        if let Some(unitpay) = &config.unitpay {
            registry.register(Arc::new(UnitpayGateway::from_config(unitpay)));
        }
        if let Some(coinpayments) = &config.coinpayments {
            registry.register(Arc::new(CoinPaymentsGateway::from_config(coinpayments)));
        }
        Ok(registry)
    }

    /// Register a gateway under its own provider id, replacing any previous one.
    pub fn register(&mut self, gateway: Arc<dyn PaymentGateway>) {
        self.gateways.insert(gateway.provider().clone(), gateway);
    }

    /// Register with builder pattern
    pub fn with_gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.register(gateway);
        self
    }

    pub fn get(&self, provider: &ProviderId) -> Result<Arc<dyn PaymentGateway>, GatewayError> {
        self.gateways.get(provider).cloned().ok_or_else(|| {
            GatewayError::Configuration(format!("no gateway configured for provider '{}'", provider))
        })
    }

    pub fn contains(&self, provider: &ProviderId) -> bool {
        self.gateways.contains_key(provider)
    }

    /// Registered ids, sorted.
    pub fn providers(&self) -> Vec<ProviderId> {
        let mut ids: Vec<ProviderId> = self.gateways.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl GatewayLookup for GatewayRegistry {
    fn gateway(&self, provider: &ProviderId) -> Result<Arc<dyn PaymentGateway>, GatewayError> {
        self.get(provider)
    }

    fn supports(&self, provider: &ProviderId) -> bool {
        self.contains(provider)
    }
}
