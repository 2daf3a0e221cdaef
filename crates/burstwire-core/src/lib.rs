//! Wire formats, checksum, and constants for the burstwire transfer protocol.
//!
//! This crate defines the on-wire shape of everything the protocol puts on
//! the serial line: data frames, bitmap ACK frames, the READY control frame,
//! and the Settings/Results session records. Pure data transformation — no
//! I/O happens here.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod ack;
pub mod checksum;
pub mod constants;
pub mod error;
pub mod frame;
pub mod pattern;
pub mod records;

pub use ack::AckFrame;
pub use error::FrameError;
pub use frame::DataFrame;
pub use pattern::PayloadPattern;
pub use records::{Results, Settings};
