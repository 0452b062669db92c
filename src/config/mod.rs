//! # flexrec Configuration Module
//!
//! This module centralizes all configuration constants for flexrec. Constants
//! are grouped by their functional area and interdependencies are documented
//! and enforced through compile-time assertions.
//!
//! Two very different kinds of constant live here. Wire constants (offset
//! widths, vtable metadata) are part of the binary contract with every buffer
//! already written and can never change. Pool constants are tuning defaults
//! that `memory::PoolConfig` overrides per pool.
//!
//! ## Module Organization
//!
//! - [`constants`]: All numeric configuration values with dependency documentation

pub mod constants;
pub use constants::*;
