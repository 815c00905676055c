//! Runtime value types for Bamboo

use std::fmt;
use std::hash::Hasher;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHasher};

use crate::ast::{Block, FunctionLiteral, Identifier};
use crate::builtins::Builtin;
use crate::environment::Env;
use crate::error::RuntimeError;

/// Runtime values in Bamboo
#[derive(Clone)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
    String(Rc<str>),
    Null,

    /// Result of a `return` statement on its way to the function boundary
    ReturnValue(Box<Value>),

    /// Runtime error, propagated as an ordinary value
    Error(String),

    /// User-defined function closed over its defining environment
    Function(Rc<Function>),

    /// Built-in function
    Builtin(Builtin),

    Array(Rc<Vec<Value>>),

    Hash(Rc<HashTable>),
}

/// Type tags, used in error messages and hash keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueType {
    Integer,
    Boolean,
    String,
    Null,
    ReturnValue,
    Error,
    Function,
    Builtin,
    Array,
    Hash,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Integer => "INTEGER",
            ValueType::Boolean => "BOOLEAN",
            ValueType::String => "STRING",
            ValueType::Null => "NULL",
            ValueType::ReturnValue => "RETURN_VALUE",
            ValueType::Error => "ERROR",
            ValueType::Function => "FUNCTION",
            ValueType::Builtin => "BUILTIN",
            ValueType::Array => "ARRAY",
            ValueType::Hash => "HASH",
        };
        f.write_str(name)
    }
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Integer(_) => ValueType::Integer,
            Value::Boolean(_) => ValueType::Boolean,
            Value::String(_) => ValueType::String,
            Value::Null => ValueType::Null,
            Value::ReturnValue(_) => ValueType::ReturnValue,
            Value::Error(_) => ValueType::Error,
            Value::Function(_) => ValueType::Function,
            Value::Builtin(_) => ValueType::Builtin,
            Value::Array(_) => ValueType::Array,
            Value::Hash(_) => ValueType::Hash,
        }
    }

    /// Only `false` and `Null` are falsy; integer zero is truthy
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Boolean(false))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn string(s: &str) -> Self {
        Value::String(Rc::from(s))
    }

    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(Rc::new(elements))
    }

    pub fn error(err: RuntimeError) -> Self {
        Value::Error(err.to_string())
    }

    /// Identity under which this value indexes a hash, if it is hashable
    pub fn hash_key(&self) -> Option<HashKey> {
        let hash = match self {
            Value::Integer(n) => *n as u64,
            Value::Boolean(b) => u64::from(*b),
            Value::String(s) => {
                let mut hasher = FxHasher::default();
                hasher.write(s.as_bytes());
                hasher.finish()
            }
            _ => return None,
        };
        Some(HashKey {
            kind: self.value_type(),
            hash,
        })
    }
}

/// Derived identity of a hashable value. String content is not re-checked
/// on lookup, so two strings with the same 64-bit digest alias one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HashKey {
    pub kind: ValueType,
    pub hash: u64,
}

/// Original key kept next to the value for display
#[derive(Debug, Clone, PartialEq)]
pub struct HashPair {
    pub key: Value,
    pub value: Value,
}

/// Hash value storage. Remembers insertion order for stable rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HashTable {
    pairs: FxHashMap<HashKey, HashPair>,
    order: Vec<HashKey>,
}

impl HashTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite; an overwritten key keeps its original position
    pub fn insert(&mut self, key: HashKey, pair: HashPair) {
        if self.pairs.insert(key, pair).is_none() {
            self.order.push(key);
        }
    }

    pub fn get(&self, key: &HashKey) -> Option<&HashPair> {
        self.pairs.get(key)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &HashPair> {
        self.order.iter().filter_map(|key| self.pairs.get(key))
    }
}

/// User-defined function
pub struct Function {
    pub literal: Rc<FunctionLiteral>,
    pub env: Env,
}

impl Function {
    pub fn new(literal: Rc<FunctionLiteral>, env: Env) -> Self {
        Self { literal, env }
    }

    pub fn params(&self) -> &[Identifier] {
        &self.literal.params
    }

    pub fn body(&self) -> &Block {
        &self.literal.body
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::String(s) => write!(f, "{}", s),
            Value::Null => write!(f, "NULL"),
            Value::ReturnValue(inner) => write!(f, "{}", inner),
            Value::Error(message) => write!(f, "ERROR: {}", message),
            Value::Function(function) => write!(f, "{}", function.literal),
            Value::Builtin(_) => write!(f, "builtin function"),
            Value::Array(elements) => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }
            Value::Hash(hash) => {
                write!(f, "{{")?;
                for (i, pair) in hash.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", pair.key, pair.value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Error(message) => write!(f, "Error({:?})", message),
            Value::ReturnValue(inner) => write!(f, "ReturnValue({:?})", inner),
            _ => write!(f, "{}", self),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::ReturnValue(a), Value::ReturnValue(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a.name == b.name,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Hash(a), Value::Hash(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_truthiness() {
        assert!(Value::Integer(0).is_truthy());
        assert!(Value::string("").is_truthy());
        assert!(Value::Boolean(true).is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(!Value::Null.is_truthy());
    }

    #[test]
    fn test_string_hash_keys() {
        let hello1 = Value::string("Hello World");
        let hello2 = Value::string("Hello World");
        let diff = Value::string("My name is johnny");

        assert_eq!(hello1.hash_key(), hello2.hash_key());
        assert_ne!(hello1.hash_key(), diff.hash_key());
    }

    #[test]
    fn test_hash_keys_are_typed() {
        assert_ne!(Value::Integer(1).hash_key(), Value::Boolean(true).hash_key());
        assert_eq!(Value::Integer(-1).hash_key(), Value::Integer(-1).hash_key());
        assert_eq!(Value::Null.hash_key(), None);
        assert_eq!(Value::array(vec![]).hash_key(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Integer(-7).to_string(), "-7");
        assert_eq!(Value::Boolean(false).to_string(), "false");
        assert_eq!(Value::string("raw text").to_string(), "raw text");
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Error("boom".into()).to_string(), "ERROR: boom");
        assert_eq!(
            Value::array(vec![Value::Integer(1), Value::string("two")]).to_string(),
            "[1, two]"
        );
    }

    #[test]
    fn test_hash_keeps_insertion_order() {
        let mut hash = HashTable::new();
        for (k, v) in [("b", 1), ("a", 2), ("b", 3)] {
            let key = Value::string(k);
            hash.insert(key.hash_key().unwrap(), HashPair { key, value: Value::Integer(v) });
        }
        assert_eq!(hash.len(), 2);
        assert_eq!(Value::Hash(Rc::new(hash)).to_string(), "{b: 3, a: 2}");
    }

    #[test]
    fn test_colliding_string_keys_alias() {
        let shared = HashKey { kind: ValueType::String, hash: 0x5eed };
        let mut hash = HashTable::new();
        hash.insert(shared, HashPair { key: Value::string("left"), value: Value::Integer(1) });
        hash.insert(shared, HashPair { key: Value::string("right"), value: Value::Integer(2) });

        assert_eq!(hash.len(), 1);
        assert_eq!(
            hash.get(&shared),
            Some(&HashPair { key: Value::string("right"), value: Value::Integer(2) })
        );
    }
}
