// SPDX-License-Identifier: Apache-2.0

use log::error;

use crate::event::EventSink;
use crate::stream_parser::{Emit, StreamParser};
use crate::{ErrorKind, MAX_CONTEXT, MAX_PARSERS};

/// Fixed pool of independent parser slots with one active slot at a time.
///
/// Switching slots moves the active pointer and nothing else: a suspended
/// slot keeps its state until its owner feeds it again, which is what lets a
/// callback park one document mid-parse and drive a nested parse elsewhere.
/// The pool provides no internal synchronization; callers sharing it across
/// threads must serialize access themselves.
pub struct ParserPool {
    slots: [StreamParser; MAX_PARSERS],
    active: usize,
}

impl ParserPool {
    /// Creates a pool with every slot idle and slot 0 active.
    pub const fn new() -> Self {
        const IDLE: StreamParser = StreamParser::new();
        Self {
            slots: [IDLE; MAX_PARSERS],
            active: 0,
        }
    }

    /// Feeds one character to the active slot.
    ///
    /// Never blocks; any notifications the character completes are delivered
    /// to `sink` before this returns. Notifications may re-enter the pool,
    /// including switching the active slot, in which case a character that
    /// has to be reprocessed is reprocessed against whichever slot is active
    /// by then.
    pub fn feed<S: EventSink + ?Sized>(&mut self, byte: u8, sink: &mut S) {
        self.slots[self.active].note_char(byte);
        let mut again = true;
        while again {
            let current = self.active;
            let step = self.slots[current].step(byte);
            again = step.redispatch;
            if let Some(emit) = step.emit {
                self.dispatch(current, emit, sink);
            }
        }
    }

    /// Resets the active slot to idle with empty stacks and buffers.
    pub fn reset(&mut self) {
        self.slots[self.active].reset();
    }

    /// Makes the next slot active. Logs and keeps the current slot when
    /// already at the last one.
    pub fn select_next(&mut self) {
        if self.active + 1 < MAX_PARSERS {
            self.active += 1;
        } else {
            error!("parser overflow: already at slot {}", self.active);
        }
    }

    /// Makes the previous slot active. Logs and keeps the current slot when
    /// already at slot 0.
    pub fn select_prev(&mut self) {
        if self.active > 0 {
            self.active -= 1;
        } else {
            error!("parser underflow: already at slot 0");
        }
    }

    /// Index of the active slot.
    pub fn current_index(&self) -> usize {
        self.active
    }

    /// The active slot, for state inspection.
    pub fn active_slot(&self) -> &StreamParser {
        &self.slots[self.active]
    }

    /// A slot by index, for state inspection.
    pub fn slot(&self, index: usize) -> Option<&StreamParser> {
        self.slots.get(index)
    }

    fn dispatch<S: EventSink + ?Sized>(&mut self, slot: usize, emit: Emit, sink: &mut S) {
        match emit {
            Emit::ObjectStart(name) => match name.as_str() {
                Ok(name) => sink.on_object_start(self, name),
                Err(_) => self.report(slot, ErrorKind::Utf8, true, sink),
            },
            Emit::ObjectComplete(name) => match name.as_str() {
                Ok(name) => sink.on_object_complete(self, name),
                Err(_) => self.report(slot, ErrorKind::Utf8, true, sink),
            },
            Emit::ArrayStart(name) => match name.as_str() {
                Ok(name) => sink.on_array_start(self, name),
                Err(_) => self.report(slot, ErrorKind::Utf8, true, sink),
            },
            Emit::ArrayComplete(name) => match name.as_str() {
                Ok(name) => sink.on_array_complete(self, name),
                Err(_) => self.report(slot, ErrorKind::Utf8, true, sink),
            },
            Emit::StringValue(name, value) => match (name.as_str(), value.as_str()) {
                (Ok(name), Ok(value)) => sink.on_string(self, name, value),
                _ => self.report(slot, ErrorKind::Utf8, true, sink),
            },
            Emit::IntegerValue(name, value) => match name.as_str() {
                Ok(name) => sink.on_integer(self, name, value),
                Err(_) => self.report(slot, ErrorKind::Utf8, true, sink),
            },
            Emit::Error { kind, fatal } => self.report(slot, kind, fatal, sink),
        }
    }

    /// Delivers an error report with the diagnostic tail of the slot that
    /// raised it, then resets that same slot if the report was fatal, even
    /// if the callback switched slots in the meantime.
    fn report<S: EventSink + ?Sized>(
        &mut self,
        slot: usize,
        kind: ErrorKind,
        fatal: bool,
        sink: &mut S,
    ) {
        let mut scratch = [0u8; MAX_CONTEXT];
        let context = self.slots[slot].context_snapshot(&mut scratch);
        sink.on_error(self, kind, kind.message(), context);
        if fatal {
            self.slots[slot].reset();
        }
    }
}

impl Default for ParserPool {
    fn default() -> Self {
        Self::new()
    }
}
