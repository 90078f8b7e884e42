//! Rhai engine creation and formula evaluation.
//!
//! One Rhai engine with the spreadsheet built-ins registered is created on
//! first use and shared by every cell. Evaluation is a pure call: the
//! compiled formula and the parameter table are passed in, and the result
//! says whether the formula resolved, failed, or needs another identifier.

use rhai::{AST, Dynamic, Engine, EvalAltResult, Scope};
use std::collections::HashMap;
use std::sync::OnceLock;

use super::error::{CellError, ErrorKind};
use super::lower::lower;
use super::value::Value;
use crate::builtins::{CONSTANTS, register_builtins};

/// Values bound to identifiers for one evaluation, keyed by canonical name.
pub type Params = HashMap<String, Value>;

/// Outcome of a single evaluation attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    Resolved(Value),
    /// The expression refers to an identifier that has no value yet.
    NeedsIdentifier(String),
    Failed(CellError),
}

/// A formula lowered to Rhai and compiled to an AST.
#[derive(Clone, Debug)]
pub struct CompiledFormula {
    ast: AST,
    source: String,
}

impl CompiledFormula {
    /// The Rhai expression this formula was lowered to.
    pub fn source(&self) -> &str {
        &self.source
    }
}

pub struct FormulaEngine {
    engine: Engine,
}

impl Default for FormulaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FormulaEngine {
    /// Create a Rhai engine with built-ins registered.
    pub fn new() -> Self {
        let mut engine = Engine::new();
        register_builtins(&mut engine);
        FormulaEngine { engine }
    }

    /// Process-wide engine, built once and never mutated afterwards.
    pub fn shared() -> &'static FormulaEngine {
        static ENGINE: OnceLock<FormulaEngine> = OnceLock::new();
        ENGINE.get_or_init(FormulaEngine::new)
    }

    /// Compile formula text whose ranges are already expanded and whose
    /// string literals have been extracted into `strings`.
    pub fn compile(&self, text: &str, strings: &[String]) -> Result<CompiledFormula, CellError> {
        let source = lower(text, strings)?;
        let ast = self
            .engine
            .compile_expression(&source)
            .map_err(|e| CellError::new(ErrorKind::Syntax, format!("Syntax error: {}", e)))?;
        Ok(CompiledFormula { ast, source })
    }

    /// Evaluate a compiled formula with the given identifier bindings.
    pub fn evaluate(&self, formula: &CompiledFormula, params: &Params) -> Step {
        let mut scope = Scope::new();
        for constant in CONSTANTS {
            scope.push_constant(constant.name, constant.value);
        }
        for (name, value) in params {
            scope.push_constant_dynamic(name.clone(), value.to_dynamic());
        }

        match self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, &formula.ast)
        {
            Ok(result) => match Value::from_dynamic(result.clone()) {
                Some(value) => Step::Resolved(value),
                None => Step::Failed(CellError::new(
                    ErrorKind::Evaluation,
                    format!("Unsupported result type '{}'", result.type_name()),
                )),
            },
            Err(err) => classify(*err),
        }
    }
}

/// Map a Rhai failure onto the evaluation protocol.
fn classify(err: EvalAltResult) -> Step {
    match err {
        EvalAltResult::ErrorVariableNotFound(name, _) => Step::NeedsIdentifier(name),
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => classify(*inner),
        EvalAltResult::ErrorRuntime(message, _) => {
            Step::Failed(CellError::new(ErrorKind::Evaluation, message.to_string()))
        }
        EvalAltResult::ErrorFunctionNotFound(signature, _) => Step::Failed(CellError::new(
            ErrorKind::Evaluation,
            format!("Unsupported operation '{}'", signature),
        )),
        EvalAltResult::ErrorParsing(kind, _) => {
            Step::Failed(CellError::new(ErrorKind::Syntax, kind.to_string()))
        }
        other => Step::Failed(CellError::new(ErrorKind::Evaluation, other.to_string())),
    }
}
