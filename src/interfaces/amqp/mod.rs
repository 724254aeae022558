//! AMQP request/reply interface consumed by the ledger service.

pub mod dispatcher;
pub mod handlers;
