//! Port traits decoupling the domain from infrastructure.

pub mod config_port;
pub mod quote_port;
pub mod store_port;
