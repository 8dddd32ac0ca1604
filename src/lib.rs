//! Technology-aware area, latency and power estimation of latch circuits
//! next to SRAM and emerging non-volatile memory cells.

pub mod blocks;
pub mod cell;
pub mod cli;
pub mod config;
pub mod error;
pub mod tech;

pub use error::{Error, Result};
