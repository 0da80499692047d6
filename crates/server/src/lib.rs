//! HTTP surface of the relay: `/start`, `/chat`, `/check` and `/health`.

pub mod bootstrap;
pub mod health;
pub mod routes;
