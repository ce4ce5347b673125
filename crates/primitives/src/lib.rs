//! # eof-primitives
//!
//! Primitive types and constants shared by the EOF crates.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc as std;

pub mod constants;

pub use alloy_primitives::{self, bytes, hex, Bytes, U256};
pub use constants::*;
