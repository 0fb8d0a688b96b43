//! Lock-free, time-ordered 64-bit Snowflake IDs.
//!
//! Every ID packs three fields, MSB to LSB:
//!
//! ```text
//!  Bit Index:  63             22 21             12 11             0
//!              +----------------+-----------------+---------------+
//!  Field:      | timestamp (42) |   node ID (10)  | sequence (12) |
//!              +----------------+-----------------+---------------+
//! ```
//!
//! An [`AtomicSnowflakeGenerator`] keeps `timestamp | sequence` in a single
//! atomic word and advances it with a bounded compare-and-swap loop. Node IDs
//! are assigned by the caller; generators with distinct node IDs never produce
//! the same ID and never need to talk to each other.
//!
//! ```
//! use casflake::{AtomicSnowflakeGenerator, SnowflakeId};
//!
//! let generator = AtomicSnowflakeGenerator::new(7).unwrap();
//! let a: SnowflakeId = generator.next_id();
//! let b = generator.next_id();
//!
//! assert!(a < b);
//! assert_eq!(a.node_id(), 7);
//! ```
#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
mod generator;
mod id;
mod time;

pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::time::*;
