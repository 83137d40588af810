//! Repository implementations for database operations

pub mod saturation;
pub mod wallets;

pub use saturation::*;
pub use wallets::*;
