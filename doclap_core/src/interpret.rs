//! Rules turning a parameter's default and documented type into options.
use crate::registry::{Action, ArgOptions, Nargs, ValueType};
use crate::value::Value;

const LIST_PREFIX: &str = "list of";

/// Recognized builtin scalar type names and their converters.
fn builtin(name: &str) -> Option<ValueType> {
    match name {
        "int" => Some(ValueType::Int),
        "float" => Some(ValueType::Float),
        "str" | "string" => Some(ValueType::Str),
        "bool" => Some(ValueType::Bool),
        _ => None,
    }
}

/// Resolve a scalar type name, tolerating a plural `s` (`floats`, `strings`).
///
/// Returns the converter together with the singular name.
pub fn scalar_type(dtype: &str) -> Option<(ValueType, &str)> {
    if let Some(value_type) = builtin(dtype) {
        return Some((value_type, dtype));
    }
    let singular = dtype.strip_suffix('s')?;
    builtin(singular).map(|value_type| (value_type, singular))
}

/// Derive the option set of one parameter.
///
/// Without a default the parameter is positional. With `interpret` enabled
/// the documented type selects a switch (`bool` with a boolean default), a
/// converter for builtin scalars, and one-or-more values for `list of X`.
pub fn interpret(default: Option<&Value>, dtype: Option<&str>, interpret: bool) -> ArgOptions {
    let mut options = ArgOptions {
        positional: Some(default.is_none()),
        default: default.cloned(),
        ..Default::default()
    };
    if !interpret {
        return options;
    }
    let Some(dtype) = dtype.map(str::trim) else {
        return options;
    };

    if let (Some(Value::Bool(on)), "bool") = (default, dtype) {
        options.action = Some(if *on {
            Action::StoreFalse
        } else {
            Action::StoreTrue
        });
        return options;
    }

    let mut dtype = dtype;
    if let Some(inner) = dtype.strip_prefix(LIST_PREFIX) {
        options.nargs = Some(Nargs::OneOrMore);
        dtype = inner.trim();
    }
    match scalar_type(dtype) {
        Some((value_type, singular)) => {
            options.value_type = Some(value_type);
            options.metavar = Some(singular.to_string());
        }
        None => options.metavar = Some(dtype.to_string()),
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some(Value::Int(1)), Some("int"), false, Some(ValueType::Int), None, Some("int"))]
    #[case(None, Some("int"), true, Some(ValueType::Int), None, Some("int"))]
    #[case(None, Some("float"), true, Some(ValueType::Float), None, Some("float"))]
    #[case(None, Some("str"), true, Some(ValueType::Str), None, Some("str"))]
    #[case(None, Some("string"), true, Some(ValueType::Str), None, Some("string"))]
    #[case(Some(Value::None), Some("list of floats"), false, Some(ValueType::Float), Some(Nargs::OneOrMore), Some("float"))]
    #[case(Some(Value::None), Some("list of int"), false, Some(ValueType::Int), Some(Nargs::OneOrMore), Some("int"))]
    #[case(Some(Value::None), Some("list of strings"), false, Some(ValueType::Str), Some(Nargs::OneOrMore), Some("string"))]
    #[case(Some(Value::Int(2)), Some("anything"), false, None, None, Some("anything"))]
    #[case(None, Some("list of anything"), true, None, Some(Nargs::OneOrMore), Some("anything"))]
    #[case(None, Some("List of int"), true, None, None, Some("List of int"))]
    #[case(Some(Value::Int(2)), None, false, None, None, None)]
    #[case(None, None, true, None, None, None)]
    fn interpretation(
        #[case] default: Option<Value>,
        #[case] dtype: Option<&str>,
        #[case] positional: bool,
        #[case] value_type: Option<ValueType>,
        #[case] nargs: Option<Nargs>,
        #[case] metavar: Option<&str>,
    ) {
        let options = interpret(default.as_ref(), dtype, true);
        assert_eq!(options.positional, Some(positional));
        assert_eq!(options.value_type, value_type);
        assert_eq!(options.nargs, nargs);
        assert_eq!(options.metavar.as_deref(), metavar);
        assert_eq!(options.action, None);
        assert_eq!(options.default, default);
    }

    #[rstest]
    #[case(false, Action::StoreTrue)]
    #[case(true, Action::StoreFalse)]
    fn switch(#[case] default: bool, #[case] action: Action) {
        let options = interpret(Some(&Value::Bool(default)), Some("bool"), true);
        assert_eq!(options.action, Some(action));
        assert_eq!(options.value_type, None);
        assert_eq!(options.metavar, None);
        assert_eq!(options.positional, Some(false));
    }

    #[test]
    fn test_bool_without_boolean_default() {
        let options = interpret(None, Some("bool"), true);
        assert_eq!(options.action, None);
        assert_eq!(options.value_type, Some(ValueType::Bool));

        let options = interpret(Some(&Value::Bool(true)), Some("int"), true);
        assert_eq!(options.action, None);
        assert_eq!(options.value_type, Some(ValueType::Int));
    }

    #[test]
    fn test_interpretation_disabled() {
        let options = interpret(Some(&Value::Bool(false)), Some("bool"), false);
        assert_eq!(
            options,
            ArgOptions {
                positional: Some(false),
                default: Some(Value::Bool(false)),
                ..Default::default()
            }
        );
        let options = interpret(None, Some("list of int"), false);
        assert_eq!(options.positional, Some(true));
        assert_eq!(options.nargs, None);
        assert_eq!(options.value_type, None);
    }

    #[test]
    fn test_scalar_type() {
        assert_eq!(scalar_type("ints"), Some((ValueType::Int, "int")));
        assert_eq!(scalar_type("bools"), Some((ValueType::Bool, "bool")));
        assert_eq!(scalar_type("complex"), None);
        assert_eq!(scalar_type("s"), None);
    }
}
