// SPDX-License-Identifier: Apache-2.0

//! Slot switching and re-entrant feeding across the pool.

use sipjson::{EventSink, JsonInt, ParserPool};

#[derive(Debug, PartialEq, Clone)]
enum Ev {
    ObjStart(usize, String),
    ObjEnd(usize, String),
    Int(usize, String, JsonInt),
}

/// Records events tagged with the slot they came from.
#[derive(Default)]
struct SlotRecorder {
    events: Vec<Ev>,
}

impl EventSink for SlotRecorder {
    fn on_object_start(&mut self, parsers: &mut ParserPool, name: &str) {
        self.events
            .push(Ev::ObjStart(parsers.current_index(), name.into()));
    }
    fn on_object_complete(&mut self, parsers: &mut ParserPool, name: &str) {
        self.events
            .push(Ev::ObjEnd(parsers.current_index(), name.into()));
    }
    fn on_integer(&mut self, parsers: &mut ParserPool, name: &str, value: JsonInt) {
        self.events
            .push(Ev::Int(parsers.current_index(), name.into(), value));
    }
}

fn feed_all<S: EventSink>(pool: &mut ParserPool, sink: &mut S, doc: &[u8]) {
    for &b in doc {
        pool.feed(b, sink);
    }
}

#[test]
fn test_suspended_slot_resumes_where_it_left_off() {
    let mut pool = ParserPool::new();
    let mut recorder = SlotRecorder::default();

    // park slot 0 right before its value
    feed_all(&mut pool, &mut recorder, br#"{"a":"#);
    assert!(!pool.active_slot().is_idle());

    // run a complete document on slot 1
    pool.select_next();
    assert_eq!(pool.current_index(), 1);
    feed_all(&mut pool, &mut recorder, br#"{"b":2}"#);
    assert!(pool.active_slot().is_idle());

    // resume slot 0 and finish its document
    pool.select_prev();
    assert_eq!(pool.current_index(), 0);
    feed_all(&mut pool, &mut recorder, b"1}");
    assert!(pool.active_slot().is_idle());

    assert_eq!(
        recorder.events,
        [
            Ev::ObjStart(0, "".into()),
            Ev::ObjStart(1, "".into()),
            Ev::Int(1, "b".into(), 2),
            Ev::ObjEnd(1, "".into()),
            Ev::Int(0, "a".into(), 1),
            Ev::ObjEnd(0, "".into()),
        ]
    );
}

/// Sink that reacts to one value by parsing an embedded sub-document on the
/// other slot, from inside the callback.
#[derive(Default)]
struct NestingSink {
    events: Vec<(usize, String, JsonInt)>,
}

impl EventSink for NestingSink {
    fn on_string(&mut self, parsers: &mut ParserPool, _name: &str, value: &str) {
        // the value carries a quoted sub-message with its escapes intact;
        // undo the quoting and parse it on the next slot while this one
        // stays suspended
        let doc = value.replace("\\\"", "\"");
        parsers.select_next();
        for b in doc.bytes() {
            parsers.feed(b, self);
        }
        parsers.select_prev();
    }
    fn on_integer(&mut self, parsers: &mut ParserPool, name: &str, value: JsonInt) {
        self.events
            .push((parsers.current_index(), name.into(), value));
    }
}

#[test]
fn test_callback_drives_nested_parse_on_other_slot() {
    let mut pool = ParserPool::new();
    let mut sink = NestingSink::default();

    // the "p" value carries a JSON document of its own
    feed_all(&mut pool, &mut sink, br#"{"p":"{\"n\":7} ","q":1}"#);

    assert!(pool.active_slot().is_idle());
    assert_eq!(pool.current_index(), 0);
    assert_eq!(
        sink.events,
        [(1, "n".to_string(), 7), (0, "q".to_string(), 1)]
    );
}
