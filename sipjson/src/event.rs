// SPDX-License-Identifier: Apache-2.0

use crate::{ErrorKind, JsonInt, ParserPool};

/// Receiver for parse notifications.
///
/// Every method has a default empty body, so an implementor overrides only
/// the notifications it cares about. Notifications run synchronously on the
/// caller's stack while [`ParserPool::feed`] is executing; the pool is handed
/// back to each method so a callback may feed further characters itself,
/// including into a different slot after switching. A sink that reacts to a
/// value by driving a nested parse simply selects another slot, feeds it,
/// and selects back.
///
/// For the boundary notifications, `name` is the field name under which the
/// object or array was nested, or the empty string at the top level.
/// Elements of an array report the array's own field name.
pub trait EventSink {
    /// A `{` opened an object.
    fn on_object_start(&mut self, _parsers: &mut ParserPool, _name: &str) {}

    /// The matching `}` closed an object.
    fn on_object_complete(&mut self, _parsers: &mut ParserPool, _name: &str) {}

    /// A `[` opened an array.
    fn on_array_start(&mut self, _parsers: &mut ParserPool, _name: &str) {}

    /// The matching `]` closed an array.
    fn on_array_complete(&mut self, _parsers: &mut ParserPool, _name: &str) {}

    /// A string value completed. Escape sequences in `value` are preserved
    /// verbatim as `\<char>` pairs, never decoded.
    fn on_string(&mut self, _parsers: &mut ParserPool, _name: &str, _value: &str) {}

    /// An integer value completed and was converted.
    fn on_integer(&mut self, _parsers: &mut ParserPool, _name: &str, _value: JsonInt) {}

    /// A parse failure. `context` holds the tail of non-whitespace input
    /// consumed before the failure, for diagnostics only. Unless the report
    /// is a non-fatal length overflow under the `length-truncate` policy,
    /// the slot is reset to idle right after this returns.
    fn on_error(
        &mut self,
        _parsers: &mut ParserPool,
        _code: ErrorKind,
        _message: &'static str,
        _context: &str,
    ) {
    }
}

/// Sink that discards every notification.
impl EventSink for () {}
