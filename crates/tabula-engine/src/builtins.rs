//! Built-in spreadsheet functions (Rust) and their metadata.
//!
//! Conventions:
//! - Spreadsheet-facing built-in names are ALL CAPS (e.g. `SUM`, `AVG`) and
//!   matched case-insensitively in formulas.
//! - Every built-in is registered as a Rhai function taking one array, so
//!   `SUM(a, b, c)` is lowered to `SUM([a, b, c])`. This gives variadic calls
//!   and a single place to check argument counts.
//! - If you add a new built-in, add it to `BUILTINS` and register its
//!   implementation in `register_builtins`.

use rand::Rng;
use rhai::{Array, Dynamic, Engine, EvalAltResult, Position};
use std::f64::consts::PI;

/// Accepted argument count of a built-in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Arity::Exact(1) => write!(f, "exactly 1 parameter"),
            Arity::Exact(n) => write!(f, "exactly {} parameters", n),
            Arity::AtLeast(n) => write!(f, "{} parameters or more", n),
        }
    }
}

pub struct Builtin {
    pub name: &'static str,
    pub arity: Arity,
    pub description: &'static str,
}

impl Builtin {
    /// Message reported when a call has the wrong number of arguments.
    pub fn arity_message(&self) -> String {
        format!("{} function requires {}", self.name, self.arity)
    }
}

pub const BUILTINS: &[Builtin] = &[
    Builtin {
        name: "ABS",
        arity: Arity::Exact(1),
        description: "Absolute value",
    },
    Builtin {
        name: "AVG",
        arity: Arity::AtLeast(2),
        description: "Arithmetic mean of the arguments",
    },
    Builtin {
        name: "COS",
        arity: Arity::Exact(1),
        description: "Cosine of an angle in radians",
    },
    Builtin {
        name: "EXP",
        arity: Arity::Exact(1),
        description: "e raised to the given power",
    },
    Builtin {
        name: "IIF",
        arity: Arity::Exact(3),
        description: "IIF(condition, then, else): pick a value by condition",
    },
    Builtin {
        name: "INT",
        arity: Arity::Exact(1),
        description: "Largest integer not greater than the argument",
    },
    Builtin {
        name: "LN",
        arity: Arity::Exact(1),
        description: "Natural logarithm",
    },
    Builtin {
        name: "LOG10",
        arity: Arity::Exact(1),
        description: "Base-10 logarithm",
    },
    Builtin {
        name: "LOG2",
        arity: Arity::Exact(1),
        description: "Base-2 logarithm",
    },
    Builtin {
        name: "MAX",
        arity: Arity::AtLeast(2),
        description: "Largest of the arguments",
    },
    Builtin {
        name: "MIN",
        arity: Arity::AtLeast(2),
        description: "Smallest of the arguments",
    },
    Builtin {
        name: "MOD",
        arity: Arity::Exact(2),
        description: "MOD(a, b): remainder of a / b",
    },
    Builtin {
        name: "POW",
        arity: Arity::Exact(2),
        description: "POW(base, exp): base raised to exp",
    },
    Builtin {
        name: "RAND",
        arity: Arity::Exact(0),
        description: "Uniform random number in [0, 1)",
    },
    Builtin {
        name: "SIN",
        arity: Arity::Exact(1),
        description: "Sine of an angle in radians",
    },
    Builtin {
        name: "SQRT",
        arity: Arity::Exact(1),
        description: "Square root",
    },
    Builtin {
        name: "STD",
        arity: Arity::AtLeast(2),
        description: "Population standard deviation of the arguments",
    },
    Builtin {
        name: "STDS",
        arity: Arity::AtLeast(2),
        description: "Sample standard deviation of the arguments (n - 1)",
    },
    Builtin {
        name: "STR",
        arity: Arity::Exact(1),
        description: "Quoted string literal, by index (inserted automatically)",
    },
    Builtin {
        name: "SUM",
        arity: Arity::AtLeast(2),
        description: "Sum of the arguments",
    },
    Builtin {
        name: "TAN",
        arity: Arity::Exact(1),
        description: "Tangent of an angle in radians",
    },
    Builtin {
        name: "TODEG",
        arity: Arity::Exact(1),
        description: "Convert radians to degrees",
    },
    Builtin {
        name: "TORAD",
        arity: Arity::Exact(1),
        description: "Convert degrees to radians",
    },
];

pub struct Constant {
    pub name: &'static str,
    pub value: f64,
    pub description: &'static str,
}

pub const CONSTANTS: &[Constant] = &[
    Constant {
        name: "PI",
        value: PI,
        description: "Ratio of a circle's circumference to its diameter",
    },
    Constant {
        name: "E",
        value: std::f64::consts::E,
        description: "Euler's number",
    },
    Constant {
        name: "C",
        value: 299_792_458.0,
        description: "Speed of light in m/s",
    },
];

/// Look up a built-in function by name, ignoring case.
pub fn find_builtin(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name.eq_ignore_ascii_case(name))
}

pub fn is_builtin_name(name: &str) -> bool {
    find_builtin(name).is_some()
}

/// Look up a named constant, ignoring case.
pub fn find_constant(name: &str) -> Option<&'static Constant> {
    CONSTANTS.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

fn invalid_arg(message: &str) -> Box<EvalAltResult> {
    EvalAltResult::ErrorRuntime(message.into(), Position::NONE).into()
}

fn check_arity(name: &str, args: &Array) -> Result<(), Box<EvalAltResult>> {
    match find_builtin(name) {
        Some(builtin) if !builtin.arity.accepts(args.len()) => {
            Err(invalid_arg(&builtin.arity_message()))
        }
        _ => Ok(()),
    }
}

/// Coerce one argument to a number: floats, ints, booleans (1/0) and
/// numeric strings are accepted.
fn number_arg(name: &str, value: &Dynamic) -> Result<f64, Box<EvalAltResult>> {
    if let Ok(n) = value.as_float() {
        return Ok(n);
    }
    if let Ok(n) = value.as_int() {
        return Ok(n as f64);
    }
    if let Ok(b) = value.as_bool() {
        return Ok(if b { 1.0 } else { 0.0 });
    }
    if value.is_string() {
        let text = value.to_string();
        if let Ok(n) = text.trim().parse::<f64>() {
            return Ok(n);
        }
        return Err(invalid_arg(&format!(
            "{}: '{}' is not a number",
            name, text
        )));
    }
    Err(invalid_arg(&format!(
        "{}: expected a number, got {}",
        name,
        value.type_name()
    )))
}

fn numbers(name: &str, args: &Array) -> Result<Vec<f64>, Box<EvalAltResult>> {
    check_arity(name, args)?;
    args.iter().map(|v| number_arg(name, v)).collect()
}

fn truthy(name: &str, value: &Dynamic) -> Result<bool, Box<EvalAltResult>> {
    if let Ok(b) = value.as_bool() {
        return Ok(b);
    }
    Ok(number_arg(name, value)? != 0.0)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn standard_deviation(values: &[f64], sample: bool) -> f64 {
    let avg = mean(values);
    let sum_of_squares: f64 = values.iter().map(|v| (v - avg).powi(2)).sum();
    let divisor = values.len() as f64 - if sample { 1.0 } else { 0.0 };
    (sum_of_squares / divisor).sqrt()
}

/// Register a built-in whose arguments are all numbers and whose result is a number.
fn register_numeric(engine: &mut Engine, name: &'static str, f: fn(&[f64]) -> f64) {
    engine.register_fn(
        name,
        move |args: Array| -> Result<f64, Box<EvalAltResult>> { Ok(f(&numbers(name, &args)?)) },
    );
}

pub fn register_builtins(engine: &mut Engine) {
    // Unary math
    register_numeric(engine, "ABS", |v| v[0].abs());
    register_numeric(engine, "INT", |v| v[0].floor());
    register_numeric(engine, "LN", |v| v[0].ln());
    register_numeric(engine, "LOG10", |v| v[0].log10());
    register_numeric(engine, "LOG2", |v| v[0].log2());
    register_numeric(engine, "SQRT", |v| v[0].sqrt());
    register_numeric(engine, "SIN", |v| v[0].sin());
    register_numeric(engine, "COS", |v| v[0].cos());
    register_numeric(engine, "TAN", |v| v[0].tan());
    register_numeric(engine, "EXP", |v| v[0].exp());
    register_numeric(engine, "TODEG", |v| v[0].to_degrees());
    register_numeric(engine, "TORAD", |v| v[0].to_radians());

    // Binary
    register_numeric(engine, "MOD", |v| v[0] % v[1]);
    register_numeric(engine, "POW", |v| v[0].powf(v[1]));

    // Variadic, at least two arguments
    register_numeric(engine, "SUM", |v| v.iter().sum());
    register_numeric(engine, "AVG", mean);
    register_numeric(engine, "MIN", |v| v.iter().copied().fold(f64::INFINITY, f64::min));
    register_numeric(engine, "MAX", |v| {
        v.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    });
    register_numeric(engine, "STD", |v| standard_deviation(v, false));
    register_numeric(engine, "STDS", |v| standard_deviation(v, true));

    // RAND(): random float in [0.0, 1.0)
    engine.register_fn("RAND", |args: Array| -> Result<f64, Box<EvalAltResult>> {
        check_arity("RAND", &args)?;
        Ok(rand::thread_rng().r#gen())
    });

    // IIF is lowered to `if truthy(cond) { then } else { otherwise }`, so the
    // branch not taken is never evaluated. Lowercase keeps it out of formulas.
    engine.register_fn(
        "truthy",
        |cond: Dynamic| -> Result<bool, Box<EvalAltResult>> { truthy("IIF", &cond) },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        let mut engine = Engine::new();
        register_builtins(&mut engine);
        engine
    }

    fn eval_f64(script: &str) -> f64 {
        engine().eval::<f64>(script).unwrap()
    }

    #[test]
    fn test_find_builtin_ignores_case() {
        assert_eq!(find_builtin("sum").map(|b| b.name), Some("SUM"));
        assert_eq!(find_builtin("Log10").map(|b| b.name), Some("LOG10"));
        assert!(find_builtin("SUMIF").is_none());
        assert!(find_constant("pi").is_some());
        assert!(find_constant("A1").is_none());
    }

    #[test]
    fn test_arity_messages() {
        assert_eq!(
            find_builtin("ABS").unwrap().arity_message(),
            "ABS function requires exactly 1 parameter"
        );
        assert_eq!(
            find_builtin("MOD").unwrap().arity_message(),
            "MOD function requires exactly 2 parameters"
        );
        assert_eq!(
            find_builtin("SUM").unwrap().arity_message(),
            "SUM function requires 2 parameters or more"
        );
    }

    #[test]
    fn test_variadic_builtins() {
        assert_eq!(eval_f64("SUM([1.0, 2.0, 3.0])"), 6.0);
        assert_eq!(eval_f64("AVG([1.0, 2.0, 3.0, 4.0])"), 2.5);
        assert_eq!(eval_f64("MIN([4.0, -2.0, 3.0])"), -2.0);
        assert_eq!(eval_f64("MAX([4.0, -2.0, 3.0])"), 4.0);
    }

    #[test]
    fn test_standard_deviation() {
        let population = eval_f64("STD([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0])");
        assert!((population - 2.0).abs() < 1e-12);
        let sample = eval_f64("STDS([1.0, 2.0, 3.0, 4.0])");
        assert!((sample - 1.2909944487358056).abs() < 1e-12);
    }

    #[test]
    fn test_unary_and_binary_builtins() {
        assert_eq!(eval_f64("INT([-2.5])"), -3.0);
        assert_eq!(eval_f64("ABS([-2.5])"), 2.5);
        assert_eq!(eval_f64("MOD([7.0, 3.0])"), 1.0);
        assert_eq!(eval_f64("POW([2.0, 10.0])"), 1024.0);
        assert!((eval_f64("TODEG([3.141592653589793])") - 180.0).abs() < 1e-9);
        assert_eq!(eval_f64("LOG2([8.0])"), 3.0);
    }

    #[test]
    fn test_numeric_strings_and_bools_are_coerced() {
        assert_eq!(eval_f64("SUM([\"2.5\", true])"), 3.5);
        assert!(engine().eval::<f64>("SUM([\"abc\", 1.0])").is_err());
    }

    #[test]
    fn test_truthy_condition() {
        let engine = engine();
        assert_eq!(
            engine
                .eval::<f64>("if truthy(1.0 > 0.0) { 10.0 } else { 20.0 }")
                .unwrap(),
            10.0
        );
        assert_eq!(
            engine
                .eval::<String>("if truthy(0.0) { \"yes\" } else { \"no\" }")
                .unwrap(),
            "no"
        );
        assert!(engine.eval::<bool>("truthy(\"2\")").unwrap());

        let err = engine.eval::<bool>("truthy(\"maybe\")").unwrap_err();
        assert!(err.to_string().contains("IIF: 'maybe' is not a number"));
    }

    #[test]
    fn test_rand_in_unit_interval() {
        let n = eval_f64("RAND([])");
        assert!((0.0..1.0).contains(&n));
    }

    #[test]
    fn test_runtime_arity_check() {
        let err = engine().eval::<f64>("ABS([1.0, 2.0])").unwrap_err();
        assert!(err.to_string().contains("ABS function requires exactly 1 parameter"));
    }
}
