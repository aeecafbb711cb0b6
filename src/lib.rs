//! Library facade - re-export internal modules so integration
//! tests or external code can use `echoping::...`.

pub mod cli;
pub mod engine;
pub mod error;
pub mod formatter;
pub mod probe;
pub mod server;
pub mod wire;
