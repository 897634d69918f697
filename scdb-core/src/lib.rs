//! Sidechain Coordination Database: the data model and wire codec core.
//!
//! # API Surface
//!
//! - [`registry::Registry`] -- the fixed, ordered table of known sidechains.
//! - [`codec`] -- bit-exact parse/encode of the state script (§4.2).
//! - [`types`] -- the append-only data model (`Sidechain`, `Verification`,
//!   `SidechainDeposit`).
//! - [`primitives`] -- the narrow interface this crate needs from the
//!   mainchain's transaction/script primitives, which are themselves out
//!   of scope.
//!
//! # Module dependency direction
//!
//! `primitives` <- `types` <- `registry`, `codec`
//!
//! One-way only. No cycles. Neither `registry` nor `codec` depends on the
//! other.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod codec;
pub mod primitives;
pub mod registry;
pub mod types;
