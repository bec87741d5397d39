// SPDX-License-Identifier: Apache-2.0

//! An incremental, callback-driven JSON parser for character streams.
//!
//! Input arrives one byte at a time through [`ParserPool::feed`]; nothing is
//! buffered beyond a handful of fixed-size arrays, which makes the parser
//! suitable for serial lines and sockets on memory-constrained targets.
//! Structural boundaries and scalar values are reported synchronously through
//! an [`EventSink`], and a small pool of independent parser slots lets a
//! callback suspend one document and drive a nested parse on another slot.
//!
//! Only a JSON subset is handled: objects, arrays, string values with escape
//! sequences preserved verbatim, and signed integers. There is no floating
//! point, no exponent notation and no unicode escape decoding.

#![cfg_attr(not(test), no_std)]

// Compile-time configuration validation
mod config_check;

mod buffer;
mod ring;

mod error;
pub use error::ErrorKind;

mod int_parser;
pub use int_parser::{from_ascii, JsonInt, ParseIntegerError};

mod event;
pub use event::EventSink;

mod stream_parser;
pub use stream_parser::StreamParser;

mod pool;
pub use pool::ParserPool;

/// Number of independent parser slots in a [`ParserPool`].
pub const MAX_PARSERS: usize = 2;

/// Bound on the saved-state stack of a slot. One entry is held per open
/// object or array.
pub const MAX_DEPTH: usize = 10;

/// Bound on the name/value frame stack of a slot. Nesting deeper than
/// `MAX_STACK - 1` containers is reported as an internal error.
pub const MAX_STACK: usize = 5;

/// Capacity of a field name, in bytes.
pub const MAX_NAME: usize = 30;

/// Capacity of a scalar value, in bytes.
pub const MAX_VALUE: usize = 160;

/// Size of the diagnostic window of recently consumed characters attached
/// to error reports.
pub const MAX_CONTEXT: usize = 20;
