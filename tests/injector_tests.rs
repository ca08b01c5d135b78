// Signature rewriting and argument injection.
mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use caseform::injector::unpack;
use caseform::prelude::*;
use common::{axes, echo, request};
use rand::Rng;

fn output_map(produced: Produced) -> Kwargs {
    match produced.into_first().unwrap() {
        Value::Map(map) => map,
        other => panic!("expected a map, got {}", other),
    }
}

#[test]
fn wrapped_call_receives_the_same_kwargs_as_a_direct_call() {
    let mut rng = rand::thread_rng();
    let f = echo("f", "(a, b, c, extra)")
        .parametrize(Declaration::new("a", (0..3i64).map(Value::from).collect::<Vec<_>>()))
        .parametrize(Declaration::new(
            "b, c",
            (0..4i64).map(|i| Value::from((i, format!("s{}", i)))).collect::<Vec<_>>(),
        ));
    let engine = Engine::default();
    let set = engine.combine(f.declarations()).unwrap();
    let wrapped = engine.wrap(&f, &set).unwrap();
    assert_eq!(wrapped.signature().to_string(), "(request, extra)");

    for _ in 0..10 {
        let index = rng.gen_range(0..set.len());
        let entry = &set.entries()[index];
        let extra: i64 = rng.gen();

        let via_wrapper = output_map(
            wrapped
                .call(
                    Args::new()
                        .with_keyword("request", request(entry.value.clone(), &entry.id))
                        .with_keyword("extra", extra),
                )
                .unwrap(),
        );

        let rows = entry.value.as_tuple().unwrap();
        let pair = rows[1].as_tuple().unwrap();
        let direct = output_map(
            f.call(
                Args::new()
                    .with_keyword("a", rows[0].clone())
                    .with_keyword("b", pair[0].clone())
                    .with_keyword("c", pair[1].clone())
                    .with_keyword("extra", extra),
            )
            .unwrap(),
        );
        assert_eq!(via_wrapper, direct);
    }
}

#[test]
fn single_name_single_axis_binds_without_nesting() {
    let kwargs = unpack(&axes(&[&["x"]]), &Value::from((1, 2))).unwrap();
    assert_eq!(kwargs.get("x"), Some(&Value::from((1, 2))));

    let kwargs = unpack(&axes(&[&["x", "y"]]), &Value::from((1, 2))).unwrap();
    assert_eq!(kwargs.get("y"), Some(&Value::Int(2)));

    assert!(unpack(&axes(&[&["x"], &["y"]]), &Value::Int(1)).is_err());
}

#[test]
fn positional_arguments_pass_through() {
    let f = Callable::returning("f", Signature::parse("(x, *rest)").unwrap(), |args: Args| {
        let x = args.keyword("x").cloned().unwrap_or_default();
        Ok(Value::tuple([x, Value::List(args.positional)]))
    });
    let wrapped = caseform::injector::wrap(&f, &axes(&[&["x"]]), "request").unwrap();
    assert_eq!(wrapped.signature().to_string(), "(request, *rest)");
    let out = wrapped
        .call(
            Args::new()
                .with_positional(7)
                .with_keyword("request", request(Value::Int(1), "1")),
        )
        .unwrap()
        .into_first()
        .unwrap();
    assert_eq!(out, Value::tuple([Value::Int(1), Value::List(vec![Value::Int(7)])]));
}

#[test]
fn control_value_can_be_passed_positionally() {
    let f = Callable::returning("f", Signature::parse("(x, *rest)").unwrap(), |args: Args| {
        let x = args.keyword("x").cloned().unwrap_or_default();
        Ok(Value::tuple([x, Value::List(args.positional)]))
    });
    let wrapped = caseform::injector::wrap(&f, &axes(&[&["x"]]), "request").unwrap();
    let out = wrapped
        .call(
            Args::new()
                .with_positional(request(Value::Int(1), "1"))
                .with_positional(7),
        )
        .unwrap()
        .into_first()
        .unwrap();
    assert_eq!(out, Value::tuple([Value::Int(1), Value::List(vec![Value::Int(7)])]));

    let plain = caseform::injector::wrap(&echo("f", "(x)"), &axes(&[&["x"]]), "request").unwrap();
    let kwargs = output_map(
        plain
            .call(Args::new().with_positional(request(Value::Int(1), "1")))
            .unwrap(),
    );
    assert_eq!(kwargs.get("x"), Some(&Value::Int(1)));
    assert!(kwargs.get("request").is_none());
}

#[test]
fn keyword_only_parameters_can_be_injected() {
    let f = echo("f", "(a, *, flag)");
    let wrapped = caseform::injector::wrap(&f, &axes(&[&["flag"]]), "request").unwrap();
    assert_eq!(wrapped.signature().to_string(), "(request, a)");
}

#[test]
fn yielding_callables_stay_lazy() {
    let setups = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&setups);
    let resource = Callable::yielding("resource", Signature::from_names(["size"]).unwrap(), move |args: Args| {
        let size = args.keyword("size").cloned().unwrap_or_default();
        let counter = Arc::clone(&counter);
        let stream: ValueStream = Box::new(
            std::iter::once_with(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<Value, BoxError>(size)
            })
            .chain(std::iter::once(Ok::<Value, BoxError>(Value::from("teardown")))),
        );
        Ok(stream)
    });
    let wrapped = caseform::injector::wrap(&resource, &axes(&[&["size"]]), "request").unwrap();
    assert!(wrapped.body().is_yielding());

    let produced = wrapped
        .call(Args::new().with_keyword("request", request(Value::Int(4), "4")))
        .unwrap();
    assert_eq!(setups.load(Ordering::SeqCst), 0);
    let Produced::Stream(mut stream) = produced else { panic!("expected a stream") };
    assert_eq!(stream.next().unwrap().unwrap(), Value::Int(4));
    assert_eq!(setups.load(Ordering::SeqCst), 1);
    assert_eq!(stream.next().unwrap().unwrap(), Value::from("teardown"));
    assert!(stream.next().is_none());
}

#[test]
fn absent_names_fail_before_any_invocation() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let f = Callable::returning("f", Signature::from_names(["a"]).unwrap(), move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Value::Nil)
    })
    .parametrize(Declaration::new("missing", [1, 2]));
    let err = Engine::default().provider("f", f).unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Configuration);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn user_errors_propagate_unmodified() {
    let f = Callable::returning("f", Signature::from_names(["a"]).unwrap(), |_| Err("division by zero".into()))
        .parametrize(Declaration::new("a", [0]));
    let provider = Engine::default().provider("f", f).unwrap();
    let err = provider.invoke(0, Args::new()).unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Invocation);
    assert_eq!(err.into_user_error().unwrap().to_string(), "division by zero");
}
