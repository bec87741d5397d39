// SPDX-License-Identifier: Apache-2.0

//! The per-slot state machine.
//!
//! Recursive descent is modelled with an explicit stack of container states
//! instead of call recursion: entering an object or array pushes one entry
//! and one name/value frame, leaving pops them, so memory use and nesting
//! depth are bounded deterministically. A value-terminating character that is
//! not part of the value (a digit run ending in `,`, for instance) is
//! re-dispatched against the state it terminated into rather than pushed
//! back into an input buffer the parser does not have.

use log::debug;

use crate::buffer::FixedBuf;
use crate::int_parser::{self, JsonInt};
use crate::ring::ContextRing;
use crate::{ErrorKind, MAX_CONTEXT, MAX_DEPTH, MAX_NAME, MAX_STACK, MAX_VALUE};

pub(crate) type NameBuf = FixedBuf<MAX_NAME>;
pub(crate) type ValueBuf = FixedBuf<MAX_VALUE>;

/// Cursor position within the active document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    InObject,
    ExpectName,
    InName,
    ExpectColon,
    ExpectValue,
    InString,
    InNumber,
    InArray,
    AfterValue,
}

/// Notification payload copied out of the slot, so that the sink can
/// re-enter the pool while the notification is delivered.
#[derive(Debug)]
pub(crate) enum Emit {
    ObjectStart(NameBuf),
    ObjectComplete(NameBuf),
    ArrayStart(NameBuf),
    ArrayComplete(NameBuf),
    StringValue(NameBuf, ValueBuf),
    IntegerValue(NameBuf, JsonInt),
    Error { kind: ErrorKind, fatal: bool },
}

/// Outcome of consuming one character: at most one notification, plus
/// whether the same character must be reprocessed against the new state.
pub(crate) struct Step {
    pub(crate) emit: Option<Emit>,
    pub(crate) redispatch: bool,
}

impl Step {
    fn none() -> Self {
        Step {
            emit: None,
            redispatch: false,
        }
    }

    fn emit(emit: Emit) -> Self {
        Step {
            emit: Some(emit),
            redispatch: false,
        }
    }

    fn error(kind: ErrorKind, fatal: bool) -> Self {
        Step {
            emit: Some(Emit::Error { kind, fatal }),
            redispatch: false,
        }
    }
}

fn is_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\r' | b'\n' | b'\t')
}

fn is_sign(c: u8) -> bool {
    c == b'-' || c == b'+'
}

fn is_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'+'
}

/// One complete, independent parsing session.
///
/// A slot lives inside a [`ParserPool`](crate::ParserPool) and survives
/// untouched while other slots are driven; its state only changes when it is
/// the active slot being fed, when it errors, or when it is reset.
#[derive(Debug)]
pub struct StreamParser {
    state: State,
    /// One saved entry per open container.
    stack: [State; MAX_DEPTH],
    depth: usize,
    /// Index of the name/value frame in scope.
    frame: usize,
    names: [NameBuf; MAX_STACK],
    values: [ValueBuf; MAX_STACK],
    allow_comma: bool,
    escape_pending: bool,
    ring: ContextRing,
}

impl StreamParser {
    pub(crate) const fn new() -> Self {
        Self {
            state: State::Idle,
            stack: [State::Idle; MAX_DEPTH],
            depth: 0,
            frame: 0,
            names: [NameBuf::new(); MAX_STACK],
            values: [ValueBuf::new(); MAX_STACK],
            allow_comma: false,
            escape_pending: false,
            ring: ContextRing::new(),
        }
    }

    /// True when no parse is in progress on this slot.
    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    /// Characters fed to this slot since the last reset, whitespace included.
    pub fn chars_processed(&self) -> usize {
        self.ring.processed()
    }

    pub(crate) fn reset(&mut self) {
        self.state = State::Idle;
        self.depth = 0;
        self.frame = 0;
        self.allow_comma = false;
        self.escape_pending = false;
        self.names[0].clear();
        self.values[0].clear();
        self.ring.clear();
    }

    pub(crate) fn note_char(&mut self, byte: u8) {
        self.ring.note(byte, is_whitespace(byte));
    }

    pub(crate) fn context_snapshot<'a>(&self, scratch: &'a mut [u8; MAX_CONTEXT]) -> &'a str {
        self.ring.snapshot(scratch)
    }

    /// Advances the state machine by one character.
    pub(crate) fn step(&mut self, c: u8) -> Step {
        debug!(
            "byte {:?}, state {:?}, depth {}, frame {}",
            c as char, self.state, self.depth, self.frame
        );
        match self.state {
            State::Idle => {
                if c == b'{' {
                    self.open_object()
                } else if c == b'"' {
                    // bare top-level name, used by re-entrant sub-parses
                    self.names[self.frame].clear();
                    self.state = State::InName;
                    Step::none()
                } else if is_whitespace(c) || !cfg!(feature = "discard-error") {
                    Step::none()
                } else {
                    Step::error(ErrorKind::Discard, true)
                }
            }

            State::InObject => {
                if c == b'}' {
                    self.close(true)
                } else if c == b'"' {
                    self.names[self.frame].clear();
                    self.state = State::InName;
                    Step::none()
                } else if c == b',' && self.allow_comma {
                    self.allow_comma = false;
                    self.state = State::ExpectName;
                    Step::none()
                } else if is_whitespace(c) {
                    Step::none()
                } else {
                    Step::error(ErrorKind::ParseObject, true)
                }
            }

            State::ExpectName => {
                if c == b'"' {
                    self.names[self.frame].clear();
                    self.state = State::InName;
                    Step::none()
                } else if is_whitespace(c) {
                    Step::none()
                } else {
                    Step::error(ErrorKind::ParseName, true)
                }
            }

            State::InName => {
                if c == b'"' {
                    self.state = State::ExpectColon;
                    Step::none()
                } else if is_name_char(c) {
                    self.append_name(c)
                } else {
                    Step::error(ErrorKind::IllegalName, true)
                }
            }

            State::ExpectColon => {
                if c == b':' {
                    self.state = State::ExpectValue;
                    Step::none()
                } else if is_whitespace(c) {
                    Step::none()
                } else {
                    Step::error(ErrorKind::ParseAssignment, true)
                }
            }

            State::ExpectValue => {
                if c == b'"' {
                    self.begin_string()
                } else if c.is_ascii_digit() || is_sign(c) {
                    self.begin_number(c)
                } else if c == b'[' {
                    self.open_array()
                } else if c == b'{' {
                    self.open_object()
                } else if is_whitespace(c) {
                    Step::none()
                } else {
                    Step::error(ErrorKind::ParseValue, true)
                }
            }

            State::InString => {
                if self.escape_pending {
                    self.escape_pending = false;
                    self.append_escape(c)
                } else if c == b'\\' {
                    self.escape_pending = true;
                    Step::none()
                } else if c == b'"' {
                    let name = self.names[self.frame];
                    let value = self.values[self.frame];
                    self.state = State::AfterValue;
                    Step::emit(Emit::StringValue(name, value))
                } else {
                    self.append_value(c)
                }
            }

            State::InNumber => {
                if c.is_ascii_digit() {
                    self.append_value(c)
                } else {
                    // the terminator is not part of the number
                    let name = self.names[self.frame];
                    let value = int_parser::convert(self.values[self.frame].as_bytes());
                    self.state = State::AfterValue;
                    Step {
                        emit: Some(Emit::IntegerValue(name, value)),
                        redispatch: true,
                    }
                }
            }

            State::InArray => {
                if c == b']' {
                    self.close(false)
                } else if c == b'"' {
                    self.begin_string()
                } else if c.is_ascii_digit() || is_sign(c) {
                    self.begin_number(c)
                } else if c == b'{' {
                    self.open_object()
                } else if c == b'[' {
                    self.open_array()
                } else if c == b',' && self.allow_comma {
                    self.allow_comma = false;
                    self.state = State::ExpectValue;
                    Step::none()
                } else if is_whitespace(c) {
                    Step::none()
                } else {
                    Step::error(ErrorKind::ParseArray, true)
                }
            }

            State::AfterValue => {
                if c == b',' {
                    self.allow_comma = false;
                    self.state = if self.enclosing_is_array() {
                        State::ExpectValue
                    } else {
                        State::ExpectName
                    };
                    Step::none()
                } else if is_whitespace(c) {
                    Step::none()
                } else if self.depth == 0 {
                    // a bare top-level value ran past its end; the character
                    // is reprocessed from idle after the reset
                    Step {
                        emit: Some(Emit::Error {
                            kind: ErrorKind::Internal,
                            fatal: true,
                        }),
                        redispatch: true,
                    }
                } else {
                    self.state = self.stack[self.depth - 1];
                    Step {
                        emit: None,
                        redispatch: true,
                    }
                }
            }
        }
    }

    fn enclosing_is_array(&self) -> bool {
        self.depth > 0 && self.stack[self.depth - 1] == State::InArray
    }

    /// Pushes a container entry and the frame that scopes it.
    fn enter(&mut self, container: State, scope_name: NameBuf) -> Result<(), ErrorKind> {
        if self.depth == MAX_DEPTH || self.frame + 1 == MAX_STACK {
            return Err(ErrorKind::Internal);
        }
        self.stack[self.depth] = container;
        self.depth += 1;
        self.frame += 1;
        self.names[self.frame] = scope_name;
        self.values[self.frame].clear();
        self.state = container;
        self.allow_comma = false;
        Ok(())
    }

    fn open_object(&mut self) -> Step {
        let name = self.names[self.frame];
        match self.enter(State::InObject, NameBuf::new()) {
            Ok(()) => Step::emit(Emit::ObjectStart(name)),
            Err(kind) => Step::error(kind, true),
        }
    }

    fn open_array(&mut self) -> Step {
        // elements report the array's own field name, so the frame pushed
        // for the array inherits it
        let name = self.names[self.frame];
        match self.enter(State::InArray, name) {
            Ok(()) => Step::emit(Emit::ArrayStart(name)),
            Err(kind) => Step::error(kind, true),
        }
    }

    /// Leaves the innermost container. The frame pops before the completion
    /// notification so it reports the introducing field name whether or not
    /// the container held any values.
    fn close(&mut self, object: bool) -> Step {
        if self.depth == 0 || self.frame == 0 {
            return Step::error(ErrorKind::Internal, true);
        }
        self.depth -= 1;
        self.frame -= 1;
        let name = self.names[self.frame];
        if self.depth == 0 {
            self.state = State::Idle;
            self.names[0].clear();
            self.allow_comma = false;
        } else {
            self.state = self.stack[self.depth - 1];
            self.allow_comma = true;
        }
        Step::emit(if object {
            Emit::ObjectComplete(name)
        } else {
            Emit::ArrayComplete(name)
        })
    }

    fn begin_string(&mut self) -> Step {
        self.values[self.frame].clear();
        self.escape_pending = false;
        self.state = State::InString;
        Step::none()
    }

    fn begin_number(&mut self, c: u8) -> Step {
        self.values[self.frame].clear();
        self.state = State::InNumber;
        self.append_value(c)
    }

    fn append_name(&mut self, c: u8) -> Step {
        if self.names[self.frame].push(c).is_ok() {
            return Step::none();
        }
        self.overflow(ErrorKind::NameTooLong, true)
    }

    fn append_value(&mut self, c: u8) -> Step {
        if self.values[self.frame].push(c).is_ok() {
            return Step::none();
        }
        self.overflow(ErrorKind::ValueTooLong, false)
    }

    /// An escape pair goes into the value atomically, so a truncated value
    /// never ends in a dangling backslash.
    fn append_escape(&mut self, c: u8) -> Step {
        if self.values[self.frame].remaining() < 2 {
            return self.overflow(ErrorKind::ValueTooLong, false);
        }
        let _ = self.values[self.frame].push(b'\\');
        let _ = self.values[self.frame].push(c);
        Step::none()
    }

    /// Length policy: abort the document, or report once and keep the
    /// truncated field when `length-truncate` is enabled.
    fn overflow(&mut self, kind: ErrorKind, name_buf: bool) -> Step {
        if cfg!(feature = "length-truncate") {
            let seen = if name_buf {
                self.names[self.frame].is_truncated()
            } else {
                self.values[self.frame].is_truncated()
            };
            if seen {
                return Step::none();
            }
            if name_buf {
                self.names[self.frame].mark_truncated();
            } else {
                self.values[self.frame].mark_truncated();
            }
            Step::error(kind, false)
        } else {
            Step::error(kind, true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn drive(parser: &mut StreamParser, input: &[u8]) -> Vec<Emit> {
        let mut emitted = Vec::new();
        for &b in input {
            parser.note_char(b);
            let mut again = true;
            while again {
                let step = parser.step(b);
                again = step.redispatch;
                if let Some(emit) = step.emit {
                    if let Emit::Error { fatal: true, .. } = emit {
                        again = false;
                        emitted.push(emit);
                        parser.reset();
                        continue;
                    }
                    emitted.push(emit);
                }
            }
        }
        emitted
    }

    #[test]
    fn test_starts_idle_and_ignores_noise() {
        let mut parser = StreamParser::new();
        assert!(parser.is_idle());
        let emitted = drive(&mut parser, b"  xq\t");
        assert!(emitted.is_empty());
        assert!(parser.is_idle());
        assert_eq!(parser.chars_processed(), 5);
    }

    #[test]
    fn test_single_field_emits_in_document_order() {
        let mut parser = StreamParser::new();
        let emitted = drive(&mut parser, b"{\"a\":1}");
        assert_eq!(emitted.len(), 3);
        assert!(matches!(emitted[0], Emit::ObjectStart(_)));
        match &emitted[1] {
            Emit::IntegerValue(name, value) => {
                assert_eq!(name.as_str(), Ok("a"));
                assert_eq!(*value, 1);
            }
            other => panic!("unexpected emit {other:?}"),
        }
        assert!(matches!(emitted[2], Emit::ObjectComplete(_)));
        assert!(parser.is_idle());
    }

    #[test]
    fn test_number_terminator_is_redispatched() {
        let mut parser = StreamParser::new();
        // the `}` both ends the number and closes the object
        let emitted = drive(&mut parser, b"{\"n\":42}");
        assert_eq!(emitted.len(), 3);
        assert!(matches!(emitted[1], Emit::IntegerValue(_, 42)));
        assert!(matches!(emitted[2], Emit::ObjectComplete(_)));
    }

    #[test]
    fn test_nesting_past_frame_stack_is_internal_error() {
        let mut parser = StreamParser::new();
        let mut doc = Vec::new();
        for _ in 0..(MAX_STACK - 1) {
            doc.extend_from_slice(b"{\"x\":");
        }
        doc.push(b'{');
        let emitted = drive(&mut parser, &doc);
        let last = emitted.last().expect("events");
        assert!(matches!(
            last,
            Emit::Error {
                kind: ErrorKind::Internal,
                fatal: true
            }
        ));
        assert!(parser.is_idle());
    }

    #[test]
    fn test_reset_restores_baseline() {
        let mut parser = StreamParser::new();
        drive(&mut parser, b"{\"a\":\"part");
        parser.reset();
        assert!(parser.is_idle());
        assert_eq!(parser.chars_processed(), 0);
        let emitted = drive(&mut parser, b"{\"a\":2}");
        assert_eq!(emitted.len(), 3);
    }
}
