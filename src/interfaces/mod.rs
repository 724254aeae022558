//! Transport-facing interfaces driving the application services.

pub mod amqp;
