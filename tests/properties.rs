//! Whole-crate properties: range round-trips, empty merges, NumPy parity
//! for fancy indexing and reductions, ragged reductions, option
//! transparency, negative-index boundaries and merge associativity.

use jagged::{
    ArrayBuilder, ByteMaskedArray, Content, EmptyArray, ErrorCategory, Index64, Index8, IndexedOptionArray,
    ListArray, ListOffsetArray, NumpyArray, NumpyData, RecordArray, Reducer, RegularArray, Slice, UnionArray,
    Value, merge_many,
};

const PRIMES: [i64; 30] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89, 97, 101, 103, 107,
    109, 113,
];

fn json(content: &Content) -> String {
    content.to_value().unwrap().to_json()
}

/// The primes as a `(2, 3, 5)` block.
fn primes_block() -> Content {
    let flat = NumpyArray::from_vec(PRIMES.to_vec());
    NumpyArray::new(flat.data().clone(), vec![2, 3, 5]).unwrap().into()
}

/// The primes as two levels of `RegularArray` over a flat leaf.
fn primes_regular() -> Content {
    let flat: Content = NumpyArray::from_vec(PRIMES.to_vec()).into();
    let inner: Content = RegularArray::new(flat, 5, 0).unwrap().into();
    RegularArray::new(inner, 3, 0).unwrap().into()
}

/// One tree of every kind, all holding small integer data.
fn zoo() -> Vec<Content> {
    let ints: Content = NumpyArray::from_vec(vec![1i64, 2, 3, 4, 5, 6]).into();
    let lists: Content = ListOffsetArray::new(Index64::from(vec![0i64, 2, 2, 6]), ints.clone())
        .unwrap()
        .into();
    let list_array: Content = ListArray::new(Index64::from(vec![4i64, 0]), Index64::from(vec![6i64, 1]), ints.clone())
        .unwrap()
        .into();
    let regular: Content = RegularArray::new(ints.clone(), 3, 0).unwrap().into();
    let option: Content = IndexedOptionArray::new(Index64::from(vec![0i64, -1, 5]), ints.clone())
        .unwrap()
        .into();
    let masked: Content = ByteMaskedArray::new(Index8::from(vec![1i8, 0, 1]), lists.clone(), true)
        .unwrap()
        .into();
    let x: Content = NumpyArray::from_vec(vec![1.5f64, 2.5, 3.5]).into();
    let record: Content = RecordArray::from_fields(vec![("x", x), ("y", lists.clone())]).unwrap().into();
    let union: Content = UnionArray::<i64>::regular(Index8::from(vec![0i8, 1, 0]), vec![ints.clone(), lists.clone()])
        .unwrap()
        .into();
    let strings: Content = ListOffsetArray::from_strings(&["one", "", "three"]).unwrap().into();
    vec![
        EmptyArray::new().into(),
        ints,
        lists,
        list_array,
        regular,
        option,
        masked,
        record,
        union,
        strings,
        primes_block(),
    ]
}

#[test]
fn test_full_range_round_trip() {
    for tree in zoo() {
        let whole = tree.getitem_range(Some(0), Some(tree.length() as i64)).unwrap();
        assert_eq!(whole.to_value().unwrap(), tree.to_value().unwrap(), "{}", tree.classname());
    }
}

#[test]
fn test_merge_with_empty_on_both_sides() {
    let empty: Content = EmptyArray::new().into();
    for tree in zoo() {
        let expected = tree.to_value().unwrap();
        assert_eq!(tree.merge(&empty).unwrap().to_value().unwrap(), expected, "{}", tree.classname());
        assert_eq!(empty.merge(&tree).unwrap().to_value().unwrap(), expected, "{}", tree.classname());
    }
}

#[test]
fn test_prod_matches_numpy_at_every_axis() {
    let expected = [
        (
            -1,
            "[[2310,2800733,95041567],[907383479,4132280413,13710311357]]",
        ),
        (
            -2,
            "[[806,1887,3895,6923,14993],[390769,480083,541741,649967,778231]]",
        ),
        (
            0,
            "[[106,177,305,469,781],[949,1343,1577,2047,2813],[3131,3811,4387,4687,5311]]",
        ),
    ];
    for tree in [primes_block(), primes_regular()] {
        for (axis, want) in expected {
            let got = tree.reduce(Reducer::Prod, axis, false, false).unwrap();
            assert_eq!(got.to_value().unwrap().to_json(), want, "axis={} on {}", axis, tree.classname());
        }
        // axis 2 and -1 agree on a rectangular tree, as do 1 and -2
        let a = tree.prod(2, false).unwrap().to_value().unwrap();
        let b = tree.prod(-1, false).unwrap().to_value().unwrap();
        assert_eq!(a, b);
        let a = tree.prod(1, false).unwrap().to_value().unwrap();
        let b = tree.prod(-2, false).unwrap().to_value().unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn test_fancy_indexing_matches_numpy() {
    for tree in [primes_block(), primes_regular()] {
        // a[1, [0, 2], -1]
        let got = tree.getitem(&Slice::new().at(1).array(vec![0, 2]).at(-1)).unwrap();
        assert_eq!(got.to_value().unwrap().to_json(), "[71,113]");

        // a[[1, 0, 1], [0, 2, 1]]
        let got = tree.getitem(&Slice::new().array(vec![1, 0, 1]).array(vec![0, 2, 1])).unwrap();
        assert_eq!(
            got.to_value().unwrap().to_json(),
            "[[53,59,61,67,71],[31,37,41,43,47],[73,79,83,89,97]]"
        );

        // a[:, [2, 0], 1]
        let got = tree
            .getitem(&Slice::new().range(None, None).array(vec![2, 0]).at(1))
            .unwrap();
        assert_eq!(got.to_value().unwrap().to_json(), "[[37,3],[103,59]]");

        // a[-1, -1, -1]
        let got = tree.getitem(&Slice::new().at(-1).at(-1).at(-1)).unwrap();
        assert_eq!(got.to_value().unwrap().to_json(), "113");
    }
}

#[test]
fn test_ragged_reduction_keeps_rows_apart() {
    // x = [[2, 3, 5], [1], [7, 11]] inside records grouped as [[r0], [], [r1, r2]]
    let values: Content = NumpyArray::from_vec(vec![2i64, 3, 5, 1, 7, 11]).into();
    let x: Content = ListOffsetArray::new(Index64::from(vec![0i64, 3, 4, 6]), values)
        .unwrap()
        .into();
    let y: Content = NumpyArray::from_vec(vec![0.5f64, 1.5, 2.5]).into();
    let records: Content = RecordArray::from_fields(vec![("x", x), ("y", y)]).unwrap().into();
    let outer: Content = ListOffsetArray::new(Index64::from(vec![0i64, 1, 1, 3]), records)
        .unwrap()
        .into();

    let field = outer.getitem_field("x").unwrap();
    let got = field.prod(-1, false).unwrap();
    assert_eq!(got.to_value().unwrap().to_json(), "[[30],[],[1,77]]");

    let counts = field.count(-1, false).unwrap();
    assert_eq!(counts.to_value().unwrap().to_json(), "[[3],[],[1,2]]");
}

#[test]
fn test_ragged_depth_three_reduces_at_axis_zero() {
    let tree = ArrayBuilder::from_json("[[[1, 2], [3]], [[4]]]").unwrap();
    let sums = tree.reduce(Reducer::Sum, 0, false, false).unwrap().into_content().unwrap();
    assert_eq!(json(&sums), "[[5,2],[3]]");
    let inner = tree.reduce(Reducer::Sum, 1, false, false).unwrap().into_content().unwrap();
    assert_eq!(json(&inner), "[[4,2],[4]]");
    let innermost = tree.reduce(Reducer::Sum, -1, false, false).unwrap().into_content().unwrap();
    assert_eq!(json(&innermost), "[[3,3],[4]]");
}

#[test]
fn test_arg_reducers_count_missing_positions() {
    let tree = ArrayBuilder::from_json("[[null, 3, 1], [], [5, null]]").unwrap();
    let argmins = tree.reduce(Reducer::ArgMin, -1, true, false).unwrap().into_content().unwrap();
    assert_eq!(json(&argmins), "[2,null,0]");
    let argmaxs = tree.reduce(Reducer::ArgMax, -1, true, false).unwrap().into_content().unwrap();
    assert_eq!(json(&argmaxs), "[1,null,0]");
}

#[test]
fn test_option_transparency() {
    let values: Content = NumpyArray::from_vec(vec![1i64, 2, 3]).into();
    let lists: Content = ListOffsetArray::new(Index64::from(vec![0i64, 2, 3]), values)
        .unwrap()
        .into();

    // a mask with nothing missing changes nothing
    let unmasked: Content = ByteMaskedArray::new(Index8::from(vec![1i8, 1]), lists.clone(), true)
        .unwrap()
        .into();
    assert_eq!(json(&unmasked.drop_none().unwrap()), json(&lists));

    // missing entries never form groups of their own
    let flat: Content = NumpyArray::from_vec(vec![10i64, 20, 30]).into();
    let option: Content = IndexedOptionArray::new(Index64::from(vec![0i64, -1, 1, -1, 2]), flat)
        .unwrap()
        .into();
    let grouped: Content = ListOffsetArray::new(Index64::from(vec![0i64, 2, 5]), option)
        .unwrap()
        .into();
    let sums = grouped.sum(-1, false).unwrap();
    assert_eq!(sums.to_value().unwrap().to_json(), "[10,50]");
    let counts = grouped.count(-1, false).unwrap();
    assert_eq!(counts.to_value().unwrap().to_json(), "[1,2]");
}

#[test]
fn test_negative_index_boundary() {
    for tree in zoo().into_iter().filter(|t| t.length() > 0) {
        let n = tree.length() as i64;
        let last = tree.getitem_at(-1).unwrap().to_value().unwrap();
        assert_eq!(last, tree.getitem_at(n - 1).unwrap().to_value().unwrap());
        let err = tree.getitem_at(-n - 1).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Index, "{}", tree.classname());
        assert!(tree.getitem_at(n).is_err());
    }
    let empty: Content = EmptyArray::new().into();
    assert!(empty.getitem_at(0).is_err());
}

#[test]
fn test_merge_is_associative() {
    let a = ArrayBuilder::from_json("[[1, 2], [], [3]]").unwrap();
    let b = ArrayBuilder::from_json("[[4.5], null]").unwrap();
    let c = ArrayBuilder::from_json(r#"[7, "eight"]"#).unwrap();

    let left = a.merge(&b).unwrap().merge(&c).unwrap();
    let right = a.merge(&b.merge(&c).unwrap()).unwrap();
    assert_eq!(left.to_value().unwrap(), right.to_value().unwrap());

    let mut joined = Vec::new();
    for tree in [&a, &b, &c] {
        if let Value::List(items) = tree.to_value().unwrap() {
            joined.extend(items);
        }
    }
    assert_eq!(left.to_value().unwrap(), Value::List(joined));
    assert_eq!(merge_many(&[a, b, c]).unwrap().to_value().unwrap(), left.to_value().unwrap());
}

#[test]
fn test_dtype_promotion_on_merge() {
    let ints = NumpyArray::from_vec(vec![1i32, 2]);
    let floats = NumpyArray::from_vec(vec![0.25f32]);
    let merged = Content::from(ints).merge(&floats.into()).unwrap();
    let Content::Numpy(node) = &merged else {
        panic!("expected a NumpyArray, got {}", merged.classname());
    };
    assert!(matches!(node.data(), NumpyData::Float64(_)));
    assert_eq!(json(&merged), "[1.0,2.0,0.25]");
}
