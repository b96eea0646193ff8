//! Integration tests for the pull cursor: event ordering, compound-event
//! expansion, filtering, and sub-tree replay.
mod common;

use std::cell::Cell;

use common::{Recorder, ScriptedSource, Step};
use quarry_json::coords::Coords;
use quarry_json::cursor::{Cursor, EventCursor};
use quarry_json::errors::ConvError;
use quarry_json::events::{Event, EventKind, SemanticTag};
use quarry_json::sax::{json_cursor, json_cursor_with_filter};
use quarry_json::visitor::TypedArraySlice;

fn collect(cursor: &mut dyn Cursor) -> Vec<Event> {
    let mut out = vec![];
    while !cursor.done() {
        out.push(cursor.current().clone());
        cursor.next().unwrap();
    }
    out
}

#[test]
fn should_pull_events_in_document_order() {
    let mut cursor = json_cursor(r#"[1, "a", null]"#).unwrap();
    let events = collect(&mut cursor);
    assert_eq!(
        events,
        vec![
            Event::begin_array(None, SemanticTag::None),
            Event::uint64(1, SemanticTag::None),
            Event::string("a", SemanticTag::None),
            Event::null(SemanticTag::None),
            Event::end_array(),
        ]
    );
    assert!(cursor.done());
}

#[test]
fn should_balance_structural_events() {
    let input = r#"{"a": [1, {"b": [2, 3]}], "c": {"d": null}}"#;
    let mut cursor = json_cursor(input).unwrap();
    let mut depth = 0i64;
    for event in collect(&mut cursor) {
        match event.kind() {
            EventKind::BeginObject | EventKind::BeginArray => depth += 1,
            EventKind::EndObject | EventKind::EndArray => {
                depth -= 1;
                assert!(depth >= 0, "end without matching begin");
            }
            _ => {}
        }
    }
    assert_eq!(depth, 0);
}

#[test]
fn should_expand_typed_arrays() {
    let steps: Vec<Step> = vec![Box::new(|v, c| {
        v.typed_array(TypedArraySlice::U8(&[7, 8, 9]), SemanticTag::None, c)
    })];
    let mut cursor = EventCursor::new(ScriptedSource::new(steps)).unwrap();
    // interleaved reads of current() must not perturb the expansion
    assert_eq!(cursor.current().kind(), EventKind::BeginArray);
    assert_eq!(cursor.current().tag(), SemanticTag::None);
    let events = collect(&mut cursor);
    assert_eq!(
        events,
        vec![
            Event::begin_array(None, SemanticTag::None),
            Event::uint64(7, SemanticTag::None),
            Event::uint64(8, SemanticTag::None),
            Event::uint64(9, SemanticTag::None),
            Event::end_array(),
        ]
    );
}

#[test]
fn should_expand_typed_arrays_of_each_family() {
    let steps: Vec<Step> = vec![
        Box::new(|v, c| v.begin_array(None, SemanticTag::None, c)),
        Box::new(|v, c| v.typed_array(TypedArraySlice::I32(&[-4, 5]), SemanticTag::None, c)),
        Box::new(|v, c| v.typed_array(TypedArraySlice::F64(&[2.5]), SemanticTag::None, c)),
        Box::new(|v, c| {
            // 1.5 in binary16
            v.typed_array(TypedArraySlice::F16(&[0x3e00]), SemanticTag::None, c)
        }),
        Box::new(|v, c| v.end_array(c)),
    ];
    let mut cursor = EventCursor::new(ScriptedSource::new(steps)).unwrap();
    let events = collect(&mut cursor);
    assert_eq!(
        events,
        vec![
            Event::begin_array(None, SemanticTag::None),
            Event::begin_array(None, SemanticTag::None),
            Event::int64(-4, SemanticTag::None),
            Event::int64(5, SemanticTag::None),
            Event::end_array(),
            Event::begin_array(None, SemanticTag::None),
            Event::double(2.5, SemanticTag::None),
            Event::end_array(),
            Event::begin_array(None, SemanticTag::None),
            Event::half(0x3e00, SemanticTag::None),
            Event::end_array(),
            Event::end_array(),
        ]
    );
}

#[test]
fn should_expand_empty_typed_arrays() {
    let steps: Vec<Step> = vec![Box::new(|v, c| {
        v.typed_array(TypedArraySlice::U64(&[]), SemanticTag::None, c)
    })];
    let mut cursor = EventCursor::new(ScriptedSource::new(steps)).unwrap();
    let events = collect(&mut cursor);
    assert_eq!(
        events,
        vec![
            Event::begin_array(None, SemanticTag::None),
            Event::end_array(),
        ]
    );
}

#[test]
fn should_expand_multi_dim_shape_headers() {
    let steps: Vec<Step> = vec![
        Box::new(|v, c| v.begin_multi_dim(&[2, 3], SemanticTag::RowMajor, c)),
        Box::new(|v, c| v.begin_array(Some(6), SemanticTag::None, c)),
        Box::new(|v, c| v.uint64_value(10, SemanticTag::None, c)),
        Box::new(|v, c| v.uint64_value(20, SemanticTag::None, c)),
        Box::new(|v, c| v.end_array(c)),
        Box::new(|v, c| v.end_multi_dim(c)),
    ];
    let mut cursor = EventCursor::new(ScriptedSource::new(steps)).unwrap();
    let events = collect(&mut cursor);
    assert_eq!(
        events,
        vec![
            Event::begin_array(Some(2), SemanticTag::RowMajor),
            Event::begin_array(Some(2), SemanticTag::None),
            Event::uint64(2, SemanticTag::None),
            Event::uint64(3, SemanticTag::None),
            Event::end_array(),
            Event::begin_array(Some(6), SemanticTag::None),
            Event::uint64(10, SemanticTag::None),
            Event::uint64(20, SemanticTag::None),
            Event::end_array(),
            Event::end_array(),
        ]
    );
}

#[test]
fn should_filter_by_name_with_a_stateful_predicate() {
    let skip_next = Cell::new(false);
    let pred = move |event: &Event, _: &Coords| {
        if skip_next.get() {
            skip_next.set(false);
            return false;
        }
        if event.kind() == EventKind::Name && event.get_str() == Ok("b") {
            skip_next.set(true);
            return false;
        }
        true
    };
    let mut cursor = json_cursor_with_filter(r#"{"a":1,"b":2,"c":3}"#, pred).unwrap();
    let events = collect(&mut cursor);
    assert_eq!(
        events,
        vec![
            Event::begin_object(None, SemanticTag::None),
            Event::name("a"),
            Event::uint64(1, SemanticTag::None),
            Event::name("c"),
            Event::uint64(3, SemanticTag::None),
            Event::end_object(),
        ]
    );
}

#[test]
fn should_compose_filter_views_conjunctively() {
    let input = r#"[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]"#;

    let p1 = |event: &Event, _: &Coords| event.get_u64().map(|u| u % 2 == 0).unwrap_or(true);
    let p2 = |event: &Event, _: &Coords| event.get_u64().map(|u| u % 3 == 0).unwrap_or(true);

    let mut lhs_cursor = json_cursor(input).unwrap();
    let mut lhs_view = &mut lhs_cursor | p1 | p2;
    let mut lhs = vec![];
    while !lhs_view.done() {
        lhs.push((lhs_view.current().clone(), lhs_view.context()));
        lhs_view.next().unwrap();
    }

    let mut rhs_cursor = json_cursor(input).unwrap();
    let mut rhs_view = &mut rhs_cursor | move |e: &Event, c: &Coords| p1(e, c) && p2(e, c);
    let mut rhs = vec![];
    while !rhs_view.done() {
        rhs.push((rhs_view.current().clone(), rhs_view.context()));
        rhs_view.next().unwrap();
    }

    assert_eq!(lhs, rhs);
    let values: Vec<u64> = lhs
        .iter()
        .filter(|(e, _)| e.kind() == EventKind::UInt64)
        .map(|(e, _)| e.get_u64().unwrap())
        .collect();
    assert_eq!(values, vec![6, 12]);
}

#[test]
fn should_layer_filters_through_the_trait_method() {
    let mut cursor = json_cursor(r#"[1, 2, 3, 4]"#).unwrap();
    let mut view = cursor.filter(|event: &Event, _: &Coords| {
        event.get_u64().map(|u| u > 2).unwrap_or(true)
    });
    let events = collect(&mut view);
    assert_eq!(
        events,
        vec![
            Event::begin_array(None, SemanticTag::None),
            Event::uint64(3, SemanticTag::None),
            Event::uint64(4, SemanticTag::None),
            Event::end_array(),
        ]
    );
}

#[test]
fn should_read_balanced_subtrees_to_a_sink() {
    let mut cursor = json_cursor(r#"{"a": [1, 2], "b": 3}"#).unwrap();
    // advance to the array's begin event
    cursor.next().unwrap();
    cursor.next().unwrap();
    assert_eq!(cursor.current().kind(), EventKind::BeginArray);

    let mut sink = Recorder::new();
    cursor.read_to(&mut sink).unwrap();
    assert_eq!(
        sink.events,
        vec![
            Event::begin_array(None, SemanticTag::None),
            Event::uint64(1, SemanticTag::None),
            Event::uint64(2, SemanticTag::None),
            Event::end_array(),
        ]
    );

    // the cursor is left on the subtree's closing event
    assert_eq!(cursor.current().kind(), EventKind::EndArray);
    cursor.next().unwrap();
    assert_eq!(cursor.current(), &Event::name("b"));
}

#[test]
fn should_read_scalar_current_to_a_sink() {
    let mut cursor = json_cursor(r#"[42]"#).unwrap();
    cursor.next().unwrap();
    let mut sink = Recorder::new();
    cursor.read_to(&mut sink).unwrap();
    assert_eq!(sink.events, vec![Event::uint64(42, SemanticTag::None)]);
}

#[test]
fn should_forward_fresh_typed_arrays_in_bulk() {
    let steps: Vec<Step> = vec![Box::new(|v, c| {
        v.typed_array(TypedArraySlice::U8(&[7, 8, 9]), SemanticTag::None, c)
    })];
    let mut cursor = EventCursor::new(ScriptedSource::new(steps)).unwrap();
    assert_eq!(cursor.current().kind(), EventKind::BeginArray);

    let mut sink = Recorder::new();
    cursor.read_to(&mut sink).unwrap();
    // one bulk call, not a per-element replay
    assert_eq!(sink.bulk_typed_arrays, 1);
    assert_eq!(
        sink.kinds(),
        vec![
            EventKind::BeginArray,
            EventKind::UInt64,
            EventKind::UInt64,
            EventKind::UInt64,
            EventKind::EndArray,
        ]
    );
    cursor.next().unwrap();
    assert!(cursor.done());
}

#[test]
fn should_replay_mid_stream_typed_arrays_per_element() {
    let steps: Vec<Step> = vec![Box::new(|v, c| {
        v.typed_array(TypedArraySlice::U8(&[7, 8, 9]), SemanticTag::None, c)
    })];
    let mut cursor = EventCursor::new(ScriptedSource::new(steps)).unwrap();
    cursor.next().unwrap();
    assert_eq!(cursor.current(), &Event::uint64(7, SemanticTag::None));

    let mut sink = Recorder::new();
    cursor.read_to(&mut sink).unwrap();
    assert_eq!(sink.bulk_typed_arrays, 0);
    assert_eq!(
        sink.events,
        vec![
            Event::uint64(7, SemanticTag::None),
            Event::uint64(8, SemanticTag::None),
            Event::uint64(9, SemanticTag::None),
            Event::end_array(),
        ]
    );
    cursor.next().unwrap();
    assert!(cursor.done());
}

#[test]
fn should_check_for_array_like_events() {
    let mut cursor = json_cursor(r#"[1]"#).unwrap();
    assert!(cursor.array_expected().is_ok());
    cursor.next().unwrap();
    assert_eq!(cursor.array_expected(), Err(ConvError::NotVector));

    let steps: Vec<Step> = vec![Box::new(|v, c| {
        v.byte_string_value(&[1, 2, 3], SemanticTag::None, c)
    })];
    let byte_cursor = EventCursor::new(ScriptedSource::new(steps)).unwrap();
    assert!(byte_cursor.array_expected().is_ok());
}

#[test]
fn should_stick_on_decoder_errors() {
    let mut cursor = json_cursor("[1, 2").unwrap();
    cursor.next().unwrap();
    cursor.next().unwrap();
    let err = cursor.next();
    assert!(err.is_err());
    assert!(cursor.done());
    // once failed, the cursor refuses to advance rather than re-erroring
    assert!(cursor.next().is_ok());
    assert!(cursor.done());
}

#[test]
fn should_surface_decoder_provenance() {
    let mut cursor = json_cursor("[10,\n 20]").unwrap();
    assert_eq!(cursor.context().line, 1);
    cursor.next().unwrap();
    cursor.next().unwrap();
    assert_eq!(cursor.current(), &Event::uint64(20, SemanticTag::None));
    assert_eq!(cursor.context().line, 2);
}

#[test]
fn should_preserve_ext_tags_through_replay() {
    let steps: Vec<Step> = vec![
        Box::new(|v, c| v.begin_array(None, SemanticTag::None, c)),
        Box::new(|v, c| v.byte_string_ext(&[1, 2], 270, c)),
        Box::new(|v, c| v.end_array(c)),
    ];
    let mut cursor = EventCursor::new(ScriptedSource::new(steps)).unwrap();
    let mut sink = Recorder::new();
    cursor.read_to(&mut sink).unwrap();
    assert_eq!(
        sink.events,
        vec![
            Event::begin_array(None, SemanticTag::None),
            Event::byte_string_ext(vec![1, 2], 270),
            Event::end_array(),
        ]
    );
    assert_eq!(sink.events[1].ext_tag(), 270);
}
