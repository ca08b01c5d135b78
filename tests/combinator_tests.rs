// Multi-axis combination: values, ids and marks.
use caseform::prelude::*;
use rand::Rng;

#[test]
fn default_ids_use_canonical_text() {
    let decl = Declaration::new(
        "x",
        vec![
            Value::Bool(true),
            Value::Bool(false),
            Value::Nil,
            Value::Float(1.0),
            Value::Int(1),
            Value::from("1"),
            Value::List(vec![Value::Int(1)]),
        ],
    );
    let set = combine(&[decl], "-").unwrap();
    assert_eq!(set.ids(), vec!["True", "False", "None", "1.0", "1", "1", "x6"]);
}

#[test]
fn tuple_rows_derive_dash_joined_ids() {
    let decl = Declaration::new("a, b", [(1, "x"), (2, "y")]);
    let set = combine(&[decl], "-").unwrap();
    assert_eq!(set.ids(), vec!["1-x", "2-y"]);
    assert_eq!(set.values()[1], &Value::from((2, "y")));
}

#[test]
fn id_sources_and_row_overrides() {
    let by_fn = Declaration::new("x", [1, 2]).with_id_fn(|v| format!("n{}", v));
    assert_eq!(combine(&[by_fn], "-").unwrap().ids(), vec!["n1", "n2"]);

    let rows = vec![param(1).with_id("custom"), param(2)];
    let overridden = Declaration::with_params("x", rows).with_ids(["one", "two"]);
    assert_eq!(combine(&[overridden], "-").unwrap().ids(), vec!["custom", "two"]);
}

#[test]
fn two_axes_combine_with_the_last_fastest() {
    let a = Declaration::new("a", [1, 2]).with_ids(["a1", "a2"]);
    let b = Declaration::new("b", [10, 20]).with_ids(["b1", "b2"]);
    let set = combine(&[a, b], "-").unwrap();
    assert_eq!(set.ids(), vec!["a1-b1", "a1-b2", "a2-b1", "a2-b2"]);
    let values: Vec<Value> = set.values().into_iter().cloned().collect();
    assert_eq!(
        values,
        vec![
            Value::from((1, 10)),
            Value::from((1, 20)),
            Value::from((2, 10)),
            Value::from((2, 20)),
        ]
    );
}

#[test]
fn configured_separator_joins_axes() {
    let engine = Engine::new(EngineConfig::from_yaml_str("id_separator: \"/\"\n").unwrap()).unwrap();
    let a = Declaration::new("a", [1]);
    let b = Declaration::new("b, c", [(2, 3)]);
    assert_eq!(engine.combine(&[a, b]).unwrap().ids(), vec!["1/2/3"]);
}

#[test]
fn marks_reach_exactly_the_entries_holding_their_row() {
    let mut rng = rand::thread_rng();
    for _ in 0..20 {
        let len_a = rng.gen_range(1..5);
        let len_b = rng.gen_range(1..5);
        let marked_a = rng.gen_range(0..len_a);
        let marked_b = rng.gen_range(0..len_b);
        let rows_a = (0..len_a)
            .map(|i| {
                let row = param(i as i64);
                if i == marked_a { row.with_mark(Mark::new("slow")) } else { row }
            })
            .collect();
        let rows_b = (0..len_b)
            .map(|i| {
                let row = param(i as i64);
                if i == marked_b { row.with_mark(Mark::new("skip")) } else { row }
            })
            .collect();
        let set = combine(
            &[Declaration::with_params("a", rows_a), Declaration::with_params("b", rows_b)],
            "-",
        )
        .unwrap();
        assert_eq!(set.len(), len_a * len_b);
        for (index, entry) in set.entries().iter().enumerate() {
            let (i, j) = (index / len_b, index % len_b);
            let mut expected = Vec::new();
            if i == marked_a {
                expected.push(Mark::new("slow"));
            }
            if j == marked_b {
                expected.push(Mark::new("skip"));
            }
            assert_eq!(entry.marks, expected, "entry {}", entry.id);
        }
    }
}

#[test]
fn declaration_level_marks_must_cover_every_row() {
    let err = Declaration::new("x", [1, 2])
        .with_marks(vec![Some(vec![Mark::new("slow")])])
        .unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Configuration);

    let decl = Declaration::new("x", [1, 2])
        .with_marks(vec![None, Some(vec![Mark::new("xfail").with_arg("flaky")])])
        .unwrap();
    let set = combine(&[decl], "-").unwrap();
    assert!(!set.entries()[0].is_marked());
    assert_eq!(set.entries()[1].marks[0].to_string(), "xfail(flaky)");
}

#[test]
fn malformed_declarations_are_configuration_errors() {
    let cases = [
        Declaration::new("", [1]),
        Declaration::new("a, a", [(1, 2)]),
        Declaration::new("a, b", [1]),
        Declaration::new("a", [1, 2]).with_ids(["only"]),
    ];
    for decl in cases {
        let err = combine(&[decl], "-").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Configuration);
    }
}
