//! Tree-walking evaluator for Bamboo
//!
//! Evaluation is a plain recursive walk over the AST. Runtime errors are
//! `Value::Error` values: every composite node checks each sub-result and
//! hands an error back unchanged instead of continuing.

use std::cell::Cell;
use std::rc::Rc;

use crate::ast::{Block, Expr, InfixOp, PrefixOp, Program, Stmt};
use crate::builtins;
use crate::environment::{Env, Environment};
use crate::error::{ParseErrors, RuntimeError};
use crate::parser::Parser;
use crate::stack::ensure_sufficient_stack;
use crate::value::{Function, HashPair, HashTable, Value};

/// Deepest chain of nested user-function calls before evaluation gives
/// up with a `stack overflow` error
pub const MAX_CALL_DEPTH: usize = 10_000;

thread_local! {
    static CALL_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// One active user-function call. Dropping it pops the frame.
struct CallFrame;

impl CallFrame {
    fn enter() -> Option<Self> {
        CALL_DEPTH.with(|depth| {
            if depth.get() >= MAX_CALL_DEPTH {
                None
            } else {
                depth.set(depth.get() + 1);
                Some(CallFrame)
            }
        })
    }
}

impl Drop for CallFrame {
    fn drop(&mut self) {
        CALL_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// An evaluation session owning one root environment. Bindings made by
/// one call are visible to the next, which is what a REPL needs.
pub struct Interpreter {
    env: Env,
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Evaluate a parsed program against the session environment
    pub fn eval_program(&mut self, program: &Program) -> Value {
        eval_program(program, &self.env)
    }

    /// Parse and evaluate `source`
    pub fn eval_source(&mut self, source: &str) -> Result<Value, ParseErrors> {
        let program = Parser::from_source(source).parse()?;
        Ok(self.eval_program(&program))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluate top-level statements. A `return` ends the program with its
/// payload; an error ends it with the error.
#[tracing::instrument(level = "debug", skip_all, fields(statements = program.statements.len()))]
pub fn eval_program(program: &Program, env: &Env) -> Value {
    let mut result = Value::Null;

    for stmt in &program.statements {
        match eval_statement(stmt, env) {
            Value::ReturnValue(value) => return *value,
            err @ Value::Error(_) => {
                tracing::debug!(%err, "program stopped on runtime error");
                return err;
            }
            value => result = value,
        }
    }

    result
}

/// Evaluate statements in `env` itself. A return value or error stops the
/// block and is passed up still wrapped.
pub fn eval_block(block: &Block, env: &Env) -> Value {
    let mut result = Value::Null;

    for stmt in &block.statements {
        result = eval_statement(stmt, env);
        if matches!(result, Value::ReturnValue(_) | Value::Error(_)) {
            return result;
        }
    }

    result
}

pub fn eval_statement(stmt: &Stmt, env: &Env) -> Value {
    match stmt {
        Stmt::Expr { expr } => eval_expr(expr, env),
        Stmt::Let { name, value } => {
            let value = eval_expr(value, env);
            if value.is_error() {
                return value;
            }
            env.borrow_mut().define(name.name.clone(), value);
            Value::Null
        }
        Stmt::Assign { name, value } => {
            let value = eval_expr(value, env);
            if value.is_error() {
                return value;
            }
            if env.borrow_mut().assign(&name.name, value) {
                Value::Null
            } else {
                Value::error(RuntimeError::IdentifierNotFound(name.name.clone()))
            }
        }
        Stmt::Return { value } => {
            let value = eval_expr(value, env);
            if value.is_error() {
                return value;
            }
            Value::ReturnValue(Box::new(value))
        }
        Stmt::Block(block) => eval_block(block, env),
    }
}

pub fn eval_expr(expr: &Expr, env: &Env) -> Value {
    ensure_sufficient_stack(|| eval_expr_inner(expr, env))
}

fn eval_expr_inner(expr: &Expr, env: &Env) -> Value {
    match expr {
        Expr::Integer(value) => Value::Integer(*value),
        Expr::String(value) => Value::string(value),
        Expr::Bool(value) => Value::Boolean(*value),
        Expr::Ident(ident) => eval_identifier(&ident.name, env),

        Expr::Prefix { op, operand } => {
            let operand = eval_expr(operand, env);
            if operand.is_error() {
                return operand;
            }
            eval_prefix(*op, operand)
        }

        Expr::Infix { left, op, right } => {
            let left = eval_expr(left, env);
            if left.is_error() {
                return left;
            }
            let right = eval_expr(right, env);
            if right.is_error() {
                return right;
            }
            eval_infix(*op, &left, &right)
        }

        Expr::If { condition, consequence, alternative } => {
            let condition = eval_expr(condition, env);
            if condition.is_error() {
                return condition;
            }
            if condition.is_truthy() {
                eval_block(consequence, env)
            } else if let Some(alternative) = alternative {
                eval_block(alternative, env)
            } else {
                Value::Null
            }
        }

        Expr::While { condition, body } => eval_while(condition, body, env),

        Expr::Function(literal) => {
            Value::Function(Rc::new(Function::new(Rc::clone(literal), Rc::clone(env))))
        }

        Expr::Call { callee, args } => {
            let callee = eval_expr(callee, env);
            if callee.is_error() {
                return callee;
            }
            match eval_expressions(args, env) {
                Ok(args) => apply_function(&callee, args),
                Err(err) => err,
            }
        }

        Expr::Array(elements) => match eval_expressions(elements, env) {
            Ok(elements) => Value::array(elements),
            Err(err) => err,
        },

        Expr::Hash(pairs) => eval_hash_literal(pairs, env),

        Expr::Index { collection, index } => {
            let collection = eval_expr(collection, env);
            if collection.is_error() {
                return collection;
            }
            let index = eval_expr(index, env);
            if index.is_error() {
                return index;
            }
            eval_index(&collection, &index)
        }
    }
}

fn eval_identifier(name: &str, env: &Env) -> Value {
    if let Some(value) = env.borrow().get(name) {
        return value;
    }
    match builtins::lookup(name) {
        Some(builtin) => Value::Builtin(builtin),
        None => Value::error(RuntimeError::IdentifierNotFound(name.to_string())),
    }
}

/// Evaluate left to right, stopping at the first error
fn eval_expressions(exprs: &[Expr], env: &Env) -> Result<Vec<Value>, Value> {
    let mut values = Vec::with_capacity(exprs.len());
    for expr in exprs {
        let value = eval_expr(expr, env);
        if value.is_error() {
            return Err(value);
        }
        values.push(value);
    }
    Ok(values)
}

fn eval_prefix(op: PrefixOp, operand: Value) -> Value {
    match (op, operand) {
        (PrefixOp::Not, operand) => Value::Boolean(!operand.is_truthy()),
        (PrefixOp::Neg, Value::Integer(n)) => Value::Integer(n.wrapping_neg()),
        (PrefixOp::Neg, operand) => {
            Value::error(RuntimeError::UnknownPrefixOperator(op.to_string(), operand.value_type()))
        }
    }
}

fn eval_infix(op: InfixOp, left: &Value, right: &Value) -> Value {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => eval_integer_infix(op, *a, *b),
        (Value::String(a), Value::String(b)) if op == InfixOp::Add => {
            let mut joined = String::with_capacity(a.len() + b.len());
            joined.push_str(a);
            joined.push_str(b);
            Value::string(&joined)
        }
        (Value::Boolean(a), Value::Boolean(b)) if op == InfixOp::Eq => Value::Boolean(a == b),
        (Value::Boolean(a), Value::Boolean(b)) if op == InfixOp::NotEq => Value::Boolean(a != b),
        _ if left.value_type() != right.value_type() => Value::error(RuntimeError::TypeMismatch(
            left.value_type(),
            op.to_string(),
            right.value_type(),
        )),
        _ => Value::error(RuntimeError::UnknownInfixOperator(
            left.value_type(),
            op.to_string(),
            right.value_type(),
        )),
    }
}

/// Machine-integer arithmetic; overflow wraps
fn eval_integer_infix(op: InfixOp, a: i64, b: i64) -> Value {
    match op {
        InfixOp::Add => Value::Integer(a.wrapping_add(b)),
        InfixOp::Sub => Value::Integer(a.wrapping_sub(b)),
        InfixOp::Mul => Value::Integer(a.wrapping_mul(b)),
        InfixOp::Div if b == 0 => Value::error(RuntimeError::DivisionByZero),
        InfixOp::Div => Value::Integer(a.wrapping_div(b)),
        InfixOp::Lt => Value::Boolean(a < b),
        InfixOp::Gt => Value::Boolean(a > b),
        InfixOp::Eq => Value::Boolean(a == b),
        InfixOp::NotEq => Value::Boolean(a != b),
    }
}

/// Run `body` in a fresh child scope for every iteration while `condition`
/// holds. Iteration results are discarded; the loop itself yields Null.
fn eval_while(condition: &Expr, body: &Block, env: &Env) -> Value {
    loop {
        let test = eval_expr(condition, env);
        if test.is_error() {
            return test;
        }
        if !test.is_truthy() {
            return Value::Null;
        }

        let scope = Environment::with_parent(Rc::clone(env));
        let result = eval_block(body, &scope);
        if matches!(result, Value::ReturnValue(_) | Value::Error(_)) {
            return result;
        }
    }
}

fn eval_hash_literal(pairs: &[(Expr, Expr)], env: &Env) -> Value {
    let mut hash = HashTable::new();

    for (key_expr, value_expr) in pairs {
        let key = eval_expr(key_expr, env);
        if key.is_error() {
            return key;
        }
        let Some(hash_key) = key.hash_key() else {
            return Value::error(RuntimeError::UnusableHashKey(key.value_type()));
        };

        let value = eval_expr(value_expr, env);
        if value.is_error() {
            return value;
        }
        hash.insert(hash_key, HashPair { key, value });
    }

    Value::Hash(Rc::new(hash))
}

/// Out-of-range array indices and missing hash keys yield Null
fn eval_index(collection: &Value, index: &Value) -> Value {
    match (collection, index) {
        (Value::Array(elements), Value::Integer(i)) => usize::try_from(*i)
            .ok()
            .and_then(|i| elements.get(i))
            .cloned()
            .unwrap_or(Value::Null),
        (Value::Hash(hash), key) => match key.hash_key() {
            Some(hash_key) => hash
                .get(&hash_key)
                .map(|pair| pair.value.clone())
                .unwrap_or(Value::Null),
            None => Value::error(RuntimeError::UnusableHashKey(key.value_type())),
        },
        _ => Value::error(RuntimeError::IndexNotSupported(collection.value_type())),
    }
}

/// Call a function value. Parameters without a matching argument are bound
/// to Null and surplus arguments are ignored.
pub fn apply_function(callee: &Value, args: Vec<Value>) -> Value {
    match callee {
        Value::Function(function) => {
            let Some(_frame) = CallFrame::enter() else {
                tracing::debug!(depth = MAX_CALL_DEPTH, "call depth limit reached");
                return Value::error(RuntimeError::StackOverflow);
            };
            tracing::trace!(params = function.params().len(), args = args.len(), "call");

            let scope = Environment::with_parent(Rc::clone(&function.env));
            {
                let mut scope = scope.borrow_mut();
                let mut args = args.into_iter();
                for param in function.params() {
                    scope.define(param.name.clone(), args.next().unwrap_or(Value::Null));
                }
            }

            match eval_block(function.body(), &scope) {
                Value::ReturnValue(value) => *value,
                value => value,
            }
        }
        Value::Builtin(builtin) => {
            tracing::trace!(name = builtin.name, args = args.len(), "builtin call");
            builtin.call(&args)
        }
        other => Value::error(RuntimeError::NotCallable(other.value_type())),
    }
}
