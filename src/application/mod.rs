//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Every write goes through a status compare-and-swap on the owning store,
//! and events are published only after the write won.

pub mod handlers;

pub use handlers::{
    // Orders
    CancelOrderCommand, CancelOrderHandler, CompleteOrderCommand, CompleteOrderHandler,
    CreateOrderCommand, CreateOrderHandler, CreateOrderResult, GetOrderHandler, GetOrderQuery,
    HandlePaymentNotificationCommand, HandlePaymentNotificationHandler, NotificationReply,
    OrderTransitionResult, PollPaymentStatusCommand, PollPaymentStatusHandler,
    PollPaymentStatusResult, RefundOrderCommand, RefundOrderHandler, StartCheckoutCommand,
    StartCheckoutHandler, StartCheckoutResult,
    // Discounts
    DiscountDecision, ValidateDiscountHandler, ValidateDiscountQuery,
    // Subscriptions
    CancelSubscriptionHandler, GetSubscriptionHandler, GetSubscriptionQuery,
    PauseSubscriptionHandler, ResumeSubscriptionHandler, SubscriptionCommand,
    SubscriptionTransitionResult,
};
