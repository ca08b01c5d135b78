//! Signature rewriter and argument injector.
//!
//! [`wrap`] turns a callable consuming N declared parameters into one that receives a single
//! control parameter instead. At call time the control parameter carries a
//! [`Request`](crate::value::Request) whose `param` is the selected combined value. The
//! injector unpacks that value back into the original named arguments and forwards the call.
//!
//! Wrapping never changes the execution shape: a yielding body stays yielding, and nothing
//! in its stream runs before it is pulled.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::callable::{Args, Body, Callable};
use crate::diagnostics::BoxError;
use crate::signature::{Param, ParamKind};
use crate::value::{Kwargs, Value};
use crate::{err_msg, CaseError};

/// Binding plan of a wrapped callable.
#[derive(Debug, Clone)]
struct Injection {
    callable: String,
    axes: Vec<Vec<String>>,
    control: String,
    /// The original callable declares the control parameter itself and receives it too.
    forward_control: bool,
    /// The control parameter is the first parameter of the rewritten signature and may be
    /// passed positionally.
    positional_control: bool,
}

impl Injection {
    /// Takes the control value by name, or from the first positional slot, which the
    /// rewritten signature assigns to the control parameter. A forwarded control value is
    /// handed back to the original callable by name.
    fn bind(&self, mut args: Args) -> Result<Args, BoxError> {
        let control = match args.keywords.remove(&self.control) {
            Some(value) => Some(value),
            None if self.positional_control && !args.positional.is_empty() => {
                Some(args.positional.remove(0))
            }
            None => None,
        };
        let request = match control {
            Some(Value::Request(request)) => request,
            Some(other) => {
                return Err(format!(
                    "'{}' expected a request in its '{}' parameter, got {} '{}'",
                    self.callable,
                    self.control,
                    other.type_name(),
                    other
                )
                .into())
            }
            None => {
                return Err(format!(
                    "'{}' was invoked without its '{}' parameter",
                    self.callable, self.control
                )
                .into())
            }
        };
        if self.forward_control {
            args.keywords
                .insert(self.control.clone(), Value::Request(Arc::clone(&request)));
        }
        let bound = unpack(&self.axes, &request.param)?;
        trace!(callable = %self.callable, id = %request.id, bound = bound.len(), "injected arguments");
        args.keywords = bound.union(args.keywords);
        Ok(args)
    }
}

/// Unpacks a combined value into keyword arguments, one per declared name.
///
/// With a single axis the value is that axis's row. With several axes it is a tuple holding
/// one row per axis. A row bound to several names is unpacked positionally.
pub fn unpack(axes: &[Vec<String>], value: &Value) -> Result<Kwargs, CaseError> {
    let mut bound = Kwargs::new();
    match axes {
        [] => {}
        [axis] => bind_axis(axis, value, &mut bound)?,
        _ => {
            let rows = value
                .as_tuple()
                .filter(|rows| rows.len() == axes.len())
                .ok_or_else(|| {
                    err_msg!(
                        Configuration,
                        "combined value '{}' should hold one row per axis ({} axes)",
                        value,
                        axes.len()
                    )
                })?;
            for (axis, row) in axes.iter().zip(rows) {
                bind_axis(axis, row, &mut bound)?;
            }
        }
    }
    Ok(bound)
}

fn bind_axis(names: &[String], row: &Value, bound: &mut Kwargs) -> Result<(), CaseError> {
    if let [name] = names {
        bound.insert(name.clone(), row.clone());
        return Ok(());
    }
    let items = row
        .as_tuple()
        .filter(|items| items.len() == names.len())
        .ok_or_else(|| {
            err_msg!(
                Configuration,
                "row '{}' cannot be unpacked into '{}'",
                row,
                names.join(",")
            )
        })?;
    for (name, item) in names.iter().zip(items) {
        bound.insert(name.clone(), item.clone());
    }
    Ok(())
}

/// Rewrites `callable` so that the names of `axes` are delivered through `control_param`.
///
/// The new signature is the original one minus every declared name, with `control_param`
/// added first unless the callable already declares it. All checks happen here, before any
/// invocation.
pub fn wrap(callable: &Callable, axes: &[Vec<String>], control_param: &str) -> Result<Callable, CaseError> {
    let signature = callable.signature();
    if axes.is_empty() {
        return Err(err_msg!(
            Configuration,
            "nothing to inject into '{}': no parametrized names",
            callable.name()
        ));
    }

    let mut declared: Vec<&str> = Vec::new();
    for name in axes.iter().flatten() {
        if declared.contains(&name.as_str()) {
            return Err(err_msg!(
                Configuration,
                "parameter '{}' of '{}' is parametrized by more than one declaration",
                name,
                callable.name()
            ));
        }
        match signature.get(name) {
            Some(param) if param.kind.binds_by_name() => declared.push(name),
            Some(_) => {
                return Err(err_msg!(
                    Configuration,
                    "parameter '{}' of '{}' cannot be bound by name",
                    name,
                    callable.name()
                ))
            }
            None => {
                return Err(err_msg!(
                    Configuration,
                    "parameter '{}' is not a parameter of '{}{}'",
                    name,
                    callable.name(),
                    signature
                )
                .with_help("every parametrized name must appear in the function signature"))
            }
        }
    }

    let forward_control = match signature.get(control_param) {
        None => false,
        Some(_) if declared.contains(&control_param) => {
            return Err(err_msg!(
                Configuration,
                "'{}' is both a parametrized name and the control parameter of '{}'",
                control_param,
                callable.name()
            ))
        }
        Some(param) if !param.kind.binds_by_name() => {
            return Err(err_msg!(
                Configuration,
                "'{}' of '{}' is a variadic parameter and collides with the control parameter",
                control_param,
                callable.name()
            ))
        }
        Some(_) => true,
    };

    let reduced = signature.without(declared.iter().copied());
    let new_signature = if forward_control {
        reduced
    } else {
        reduced.with_first(Param::positional(control_param))?
    };

    let positional_control = new_signature
        .params()
        .first()
        .is_some_and(|p| p.name == control_param && p.kind == ParamKind::PositionalOrKeyword);
    let injection = Arc::new(Injection {
        callable: callable.name().to_string(),
        axes: axes.to_vec(),
        control: control_param.to_string(),
        forward_control,
        positional_control,
    });
    let body = match callable.body().clone() {
        Body::Return(f) => Body::Return(Arc::new(move |args: Args| f(injection.bind(args)?))),
        Body::Yield(f) => Body::Yield(Arc::new(move |args: Args| f(injection.bind(args)?))),
    };

    debug!(
        callable = callable.name(),
        signature = %new_signature,
        injected = declared.len(),
        "wrapped callable"
    );
    Ok(Callable::new(callable.name(), new_signature, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::Signature;
    use crate::value::Request;
    use crate::ErrorType;

    fn echo(signature: &str) -> Callable {
        Callable::returning("f", Signature::parse(signature).unwrap(), |args: Args| {
            Ok(Value::Map(args.keywords))
        })
    }

    fn request(param: Value) -> Value {
        Value::Request(Arc::new(Request::new(param, "id")))
    }

    #[test]
    fn signature_loses_declared_names_and_gains_control() {
        let axes = vec![vec!["a".to_string()], vec!["b".to_string(), "c".to_string()]];
        let wrapped = wrap(&echo("(a, b, c, d)"), &axes, "request").unwrap();
        assert_eq!(wrapped.signature().to_string(), "(request, d)");
    }

    #[test]
    fn existing_control_parameter_is_forwarded() {
        let axes = vec![vec!["a".to_string()]];
        let wrapped = wrap(&echo("(request, a)"), &axes, "request").unwrap();
        assert_eq!(wrapped.signature().to_string(), "(request)");
        let out = wrapped
            .call(Args::new().with_keyword("request", request(Value::Int(3))))
            .unwrap()
            .into_first()
            .unwrap();
        let Value::Map(kwargs) = out else { panic!("expected a map") };
        assert_eq!(kwargs.get("a"), Some(&Value::Int(3)));
        assert!(kwargs.get("request").is_some());
    }

    #[test]
    fn multi_axis_values_are_unpacked_per_axis() {
        let axes = vec![vec!["a".to_string()], vec!["b".to_string(), "c".to_string()]];
        let combined = Value::tuple([Value::Int(1), Value::from((2, "x"))]);
        let kwargs = unpack(&axes, &combined).unwrap();
        assert_eq!(kwargs.get("a"), Some(&Value::Int(1)));
        assert_eq!(kwargs.get("b"), Some(&Value::Int(2)));
        assert_eq!(kwargs.get("c"), Some(&Value::from("x")));
    }

    #[test]
    fn wrap_time_errors() {
        let axes = vec![vec!["z".to_string()]];
        let err = wrap(&echo("(a)"), &axes, "request").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Configuration);

        let axes = vec![vec!["a".to_string()]];
        let err = wrap(&echo("(a, *request)"), &axes, "request").unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Configuration);

        let axes = vec![vec!["a".to_string()], vec!["a".to_string()]];
        assert!(wrap(&echo("(a)"), &axes, "request").is_err());
    }

    #[test]
    fn missing_control_value_fails_at_call_time() {
        let axes = vec![vec!["a".to_string()]];
        let wrapped = wrap(&echo("(a)"), &axes, "request").unwrap();
        let missing = wrapped.call(Args::new()).unwrap_err();
        assert!(missing.downcast_ref::<CaseError>().is_none());
        assert!(missing.to_string().contains("without its 'request' parameter"));

        let mistyped = wrapped
            .call(Args::new().with_keyword("request", 5))
            .unwrap_err();
        assert!(mistyped.downcast_ref::<CaseError>().is_none());
        assert!(mistyped.to_string().contains("expected a request"));
    }

    #[test]
    fn forwarded_control_can_be_passed_positionally() {
        let axes = vec![vec!["a".to_string()]];
        let wrapped = wrap(&echo("(request, a)"), &axes, "request").unwrap();
        let out = wrapped
            .call(Args::new().with_positional(request(Value::Int(3))))
            .unwrap()
            .into_first()
            .unwrap();
        let Value::Map(kwargs) = out else { panic!("expected a map") };
        assert_eq!(kwargs.get("a"), Some(&Value::Int(3)));
        assert!(matches!(kwargs.get("request"), Some(Value::Request(_))));
    }
}
