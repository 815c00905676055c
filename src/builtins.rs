//! Built-in functions
//!
//! A fixed table built at compile time. Each builtin validates its own
//! argument types and reports problems as `Value::Error`.

use std::fmt;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::value::Value;

/// Native function signature
pub type BuiltinFn = fn(&[Value]) -> Value;

/// Native/built-in function
#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub arity: Option<usize>, // None means the builtin checks its own arguments
    pub func: BuiltinFn,
}

impl Builtin {
    pub fn call(&self, args: &[Value]) -> Value {
        if let Some(arity) = self.arity {
            if args.len() != arity {
                return wrong_arity(args.len(), arity.to_string());
            }
        }
        (self.func)(args)
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<builtin {}>", self.name)
    }
}

static BUILTINS: &[Builtin] = &[
    Builtin { name: "len", arity: Some(1), func: len },
    Builtin { name: "type", arity: Some(1), func: type_of },
    Builtin { name: "print", arity: None, func: print },
    Builtin { name: "exit", arity: None, func: exit },
    Builtin { name: "first", arity: Some(1), func: first },
    Builtin { name: "last", arity: Some(1), func: last },
    Builtin { name: "rest", arity: Some(1), func: rest },
    Builtin { name: "push", arity: Some(2), func: push },
    Builtin { name: "keys", arity: Some(1), func: keys },
];

/// Find a builtin by name
pub fn lookup(name: &str) -> Option<Builtin> {
    BUILTINS.iter().find(|b| b.name == name).copied()
}

/// Names of every registered builtin
pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|b| b.name)
}

fn wrong_arity(got: usize, want: String) -> Value {
    Value::error(RuntimeError::WrongArity { got, want })
}

fn unsupported(builtin: &'static str, arg: &Value) -> Value {
    Value::error(RuntimeError::UnsupportedArgument {
        builtin,
        got: arg.value_type(),
    })
}

fn len(args: &[Value]) -> Value {
    match &args[0] {
        Value::String(s) => Value::Integer(s.len() as i64),
        Value::Array(elements) => Value::Integer(elements.len() as i64),
        Value::Hash(hash) => Value::Integer(hash.len() as i64),
        other => unsupported("len", other),
    }
}

fn type_of(args: &[Value]) -> Value {
    let name = match &args[0] {
        Value::String(_) => "String",
        Value::Array(_) => "Array",
        Value::Integer(_) => "Integer",
        Value::Function(_) => "Function",
        Value::Boolean(_) => "Boolean",
        Value::Hash(_) => "HashMap",
        other => return unsupported("type", other),
    };
    Value::string(name)
}

fn print(args: &[Value]) -> Value {
    let line: String = args.iter().map(|arg| format!("{} ", arg)).collect();
    println!("{}", line);
    Value::Null
}

fn exit(args: &[Value]) -> Value {
    let code = match args {
        [] => 0,
        [Value::Integer(code)] => *code as i32,
        [other] => return unsupported("exit", other),
        _ => return wrong_arity(args.len(), "1 or 0".to_string()),
    };
    tracing::warn!(code, "exit requested by program");
    std::process::exit(code)
}

fn first(args: &[Value]) -> Value {
    match &args[0] {
        Value::Array(elements) => elements.first().cloned().unwrap_or(Value::Null),
        other => unsupported("first", other),
    }
}

fn last(args: &[Value]) -> Value {
    match &args[0] {
        Value::Array(elements) => elements.last().cloned().unwrap_or(Value::Null),
        other => unsupported("last", other),
    }
}

fn rest(args: &[Value]) -> Value {
    match &args[0] {
        Value::Array(elements) if elements.is_empty() => Value::Null,
        Value::Array(elements) => Value::array(elements[1..].to_vec()),
        other => unsupported("rest", other),
    }
}

fn push(args: &[Value]) -> Value {
    match &args[0] {
        Value::Array(elements) => {
            let mut pushed = Vec::with_capacity(elements.len() + 1);
            pushed.extend(elements.iter().cloned());
            pushed.push(args[1].clone());
            Value::Array(Rc::new(pushed))
        }
        other => unsupported("push", other),
    }
}

fn keys(args: &[Value]) -> Value {
    match &args[0] {
        Value::Hash(hash) => Value::array(hash.iter().map(|pair| pair.key.clone()).collect()),
        other => unsupported("keys", other),
    }
}
