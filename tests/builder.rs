//! Integration tests for `ArrayBuilder` together with forms and buffers.

use jagged::{ArrayBuilder, BuilderOptions, Content, ErrorCategory, Form, Reducer, Slice, Value};

#[test]
fn test_heterogeneous_values_round_trip() {
    let text = r#"[1.1,2.2,3.3,[1,2,3],[],[4,5],{"x":12.3,"y":"wow"}]"#;
    let expected = Value::from_json(text).unwrap();
    let Value::List(items) = &expected else {
        panic!("expected a JSON array");
    };
    let array = ArrayBuilder::from_values(items).unwrap();
    assert_eq!(array.length(), 7);
    assert!(array.is_union());
    assert_eq!(array.to_value().unwrap(), expected);
    assert_eq!(array.to_value().unwrap().to_json(), text);
}

#[test]
fn test_repeated_snapshots_agree() {
    let mut b = ArrayBuilder::default();
    for row in 0..5i64 {
        b.begin_record().unwrap();
        b.field("id").unwrap();
        b.integer(row).unwrap();
        b.field("hits").unwrap();
        b.begin_list().unwrap();
        for k in 0..row {
            if k % 2 == 0 {
                b.real(k as f64 * 0.5).unwrap();
            } else {
                b.null().unwrap();
            }
        }
        b.end_list().unwrap();
        b.end_record().unwrap();
    }
    let first = b.snapshot().unwrap();
    let second = b.snapshot().unwrap();
    assert_eq!(first.to_value().unwrap(), second.to_value().unwrap());
    assert_eq!(first.form().unwrap(), second.form().unwrap());

    b.begin_record().unwrap();
    b.field("id").unwrap();
    b.integer(5).unwrap();
    b.end_record().unwrap();
    let third = b.snapshot().unwrap();
    assert_eq!(third.length(), 6);
    // the earlier snapshot is unaffected by later events
    assert_eq!(first.length(), 5);
    let hits = third.getitem_field("hits").unwrap();
    assert!(hits.getitem_at(-1).unwrap().is_none());
}

#[test]
fn test_usage_errors_are_value_errors() {
    let mut b = ArrayBuilder::default();
    let err = b.end_list().unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Value);

    b.begin_tuple(2).unwrap();
    assert!(b.index(2).is_err());
    assert!(b.field("x").is_err());
    b.index(0).unwrap();
    b.integer(1).unwrap();
    b.end_tuple().unwrap();
    assert_eq!(b.snapshot().unwrap().to_value().unwrap().to_json(), "[[1,null]]");

    let bad = BuilderOptions { initial: 8, resize: 0.5 };
    assert!(ArrayBuilder::new(bad).is_err());
}

#[test]
fn test_built_arrays_reduce_and_slice() {
    let array = ArrayBuilder::from_json("[[1, 2, 3], [], [4, 5], null]").unwrap();
    assert!(array.is_option());
    let sums = array.reduce(Reducer::Sum, -1, false, false).unwrap();
    assert_eq!(sums.to_value().unwrap().to_json(), "[6,0,9,null]");
    let maxes = array.reduce(Reducer::Max, -1, true, false).unwrap();
    assert_eq!(maxes.to_value().unwrap().to_json(), "[3,null,5,null]");
    let tails = array.getitem(&Slice::new().range(Some(0), Some(3)).range(Some(1), None)).unwrap();
    assert_eq!(tails.to_value().unwrap().to_json(), "[[2,3],[],[5]]");
    assert_eq!(array.flatten(1).unwrap().to_value().unwrap().to_json(), "[1,2,3,4,5]");
}

#[test]
fn test_buffers_round_trip_through_json_form() {
    let array = ArrayBuilder::from_json(r#"[{"a":[1,2],"b":"x"},{"a":[],"b":null},{"a":[3],"b":"yz"}]"#).unwrap();
    let (form, length, buffers) = array.to_buffers().unwrap();
    assert_eq!(length, 3);
    assert!(buffers.keys().all(|k| k.starts_with("node")));

    let text = form.to_json().unwrap();
    let parsed = Form::from_json(&text).unwrap();
    assert_eq!(parsed, form);

    let rebuilt = Content::from_buffers(&parsed, length, &buffers).unwrap();
    assert_eq!(rebuilt.to_value().unwrap(), array.to_value().unwrap());
}
