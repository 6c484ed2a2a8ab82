//! JSON-RPC 2.0 surface of the Credent daemon
//!
//! Localhost-only HTTP server exposing the employee, certificate,
//! compliance, container, export and admin methods.

pub mod error;
pub mod handler;
pub mod rate_limiter;
pub mod server;
pub mod types;

pub use server::{RpcServer, RpcServerConfig};
