//! Adapters implementing the `PaymentGateway` port.

pub mod http;
pub mod in_memory;
