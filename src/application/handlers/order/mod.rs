//! Order command and query handlers.

mod cancel_order;
mod complete_order;
mod create_order;
mod get_order;
mod handle_payment_notification;
pub(crate) mod ledger;
mod poll_payment_status;
mod refund_order;
mod start_checkout;

use crate::domain::order::Order;

pub use cancel_order::{CancelOrderCommand, CancelOrderHandler};
pub use complete_order::{CompleteOrderCommand, CompleteOrderHandler};
pub use create_order::{CreateOrderCommand, CreateOrderHandler, CreateOrderResult};
pub use get_order::{GetOrderHandler, GetOrderQuery};
pub use handle_payment_notification::{
    HandlePaymentNotificationCommand, HandlePaymentNotificationHandler, NotificationReply,
};
pub use poll_payment_status::{
    PollPaymentStatusCommand, PollPaymentStatusHandler, PollPaymentStatusResult,
};
pub use refund_order::{RefundOrderCommand, RefundOrderHandler};
pub use start_checkout::{StartCheckoutCommand, StartCheckoutHandler, StartCheckoutResult};

/// Order after a lifecycle transition, with the event it produced.
#[derive(Debug, Clone)]
pub struct OrderTransitionResult<E> {
    pub order: Order,
    pub event: E,
}
