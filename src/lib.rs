//! Storefront Billing - orders, discounts, subscriptions and payments
//!
//! This crate keeps the order ledger for a storefront, validates discount
//! codes, manages subscription pause and resume, and talks to hosted payment
//! providers (Robokassa, Unitpay, CoinPayments) through signed redirects and
//! verified callbacks.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
