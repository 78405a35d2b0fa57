//! PollPaymentStatusHandler - Command handler for the polling fallback.
//!
//! Used when no notification arrived in time. A conclusive answer from the
//! provider is applied exactly like a verified notification; anything else,
//! a timeout included, leaves the order alone.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::{Actor, OrderId};
use crate::domain::order::{
    NotificationEffect, Order, OrderError, OrderStatus, PaymentNotification, PaymentOutcome,
};
use crate::ports::{EventPublisher, GatewayLookup, OrderRepository, PaymentStatusCheck};

use super::ledger::{self, gateway_error};

/// Command to poll the provider for one order.
#[derive(Debug, Clone)]
pub struct PollPaymentStatusCommand {
    pub order_id: OrderId,
    pub actor: Actor,
}

/// Result of a poll.
#[derive(Debug, Clone)]
pub struct PollPaymentStatusResult {
    pub order: Order,
    pub check: PaymentStatusCheck,

    /// Set when a conclusive check was applied to the order.
    pub effect: Option<NotificationEffect>,
}

/// Handler for payment status polling.
pub struct PollPaymentStatusHandler {
    repository: Arc<dyn OrderRepository>,
    gateways: Arc<dyn GatewayLookup>,
    event_publisher: Arc<dyn EventPublisher>,
    timeout: Duration,
}

impl PollPaymentStatusHandler {
    pub fn new(
        repository: Arc<dyn OrderRepository>,
        gateways: Arc<dyn GatewayLookup>,
        event_publisher: Arc<dyn EventPublisher>,
        timeout: Duration,
    ) -> Self {
        Self {
            repository,
            gateways,
            event_publisher,
            timeout,
        }
    }

    pub async fn handle(
        &self,
        cmd: PollPaymentStatusCommand,
    ) -> Result<PollPaymentStatusResult, OrderError> {
        // 1. Load and authorize
        let order = self
            .repository
            .find_by_id(&cmd.order_id)
            .await?
            .ok_or_else(|| OrderError::not_found(cmd.order_id))?;
        cmd.actor
            .ensure_owner_or_admin(&order.user_id, "order", order.id.to_string())?;

        if order.status != OrderStatus::Processing {
            return Err(OrderError::invalid_state(order.status, "poll payment status for"));
        }

        // 2. Ask the provider, bounded by the caller's timeout
        let gateway = self
            .gateways
            .gateway(&order.payment_provider)
            .map_err(gateway_error)?;
        let check = match tokio::time::timeout(self.timeout, gateway.check_status(&order, self.timeout))
            .await
        {
            Ok(check) => check,
            Err(_) => {
                tracing::warn!(
                    order_id = %order.id,
                    provider = %order.payment_provider,
                    timeout_secs = self.timeout.as_secs(),
                    "payment status check timed out"
                );
                PaymentStatusCheck::unknown("status check timed out")
            }
        };

        // 3. Apply a conclusive answer through the ledger
        let Some(notification) = as_notification(&order, &check) else {
            tracing::debug!(order_id = %order.id, ?check, "payment status inconclusive");
            return Ok(PollPaymentStatusResult {
                order,
                check,
                effect: None,
            });
        };

        let (order, effect) = ledger::apply_verified(
            self.repository.as_ref(),
            self.event_publisher.as_ref(),
            &notification,
        )
        .await?;

        Ok(PollPaymentStatusResult {
            order,
            check,
            effect: Some(effect),
        })
    }
}

/// A provider's own API answer is authentic by construction.
fn as_notification(order: &Order, check: &PaymentStatusCheck) -> Option<PaymentNotification> {
    let (payment_id, amount, outcome) = match check {
        PaymentStatusCheck::Paid { payment_id, amount } => {
            (payment_id, amount, PaymentOutcome::Succeeded)
        }
        PaymentStatusCheck::Failed {
            payment_id,
            amount,
            reason,
        } => (
            payment_id,
            amount,
            PaymentOutcome::Failed {
                reason: reason.clone(),
            },
        ),
        PaymentStatusCheck::Pending | PaymentStatusCheck::Unknown { .. } => return None,
    };
    Some(PaymentNotification {
        provider: order.payment_provider.clone(),
        order_id: order.id,
        amount: amount.clone(),
        provider_payment_id: payment_id.clone(),
        outcome,
        is_verified: true,
    })
}
