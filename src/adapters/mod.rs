//! Concrete adapter implementations for ports.

pub mod file_config_adapter;
pub mod iex_adapter;
pub mod sqlite_adapter;
pub mod web;
