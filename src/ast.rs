//! Abstract Syntax Tree definitions for Bamboo
//!
//! Represents the structure of programs after parsing. Every node renders
//! through `Display` in a canonical form that parses back to the same tree.

use std::fmt;
use std::rc::Rc;

/// A name in binding or reference position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub name: String,
}

impl Identifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Prefix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
    Not, // !
    Neg, // -
}

impl fmt::Display for PrefixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefixOp::Not => write!(f, "!"),
            PrefixOp::Neg => write!(f, "-"),
        }
    }
}

/// Infix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOp {
    Add,   // +
    Sub,   // -
    Mul,   // *
    Div,   // /
    Eq,    // ==
    NotEq, // !=
    Lt,    // <
    Gt,    // >
}

impl fmt::Display for InfixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfixOp::Add => write!(f, "+"),
            InfixOp::Sub => write!(f, "-"),
            InfixOp::Mul => write!(f, "*"),
            InfixOp::Div => write!(f, "/"),
            InfixOp::Eq => write!(f, "=="),
            InfixOp::NotEq => write!(f, "!="),
            InfixOp::Lt => write!(f, "<"),
            InfixOp::Gt => write!(f, ">"),
        }
    }
}

/// Expression nodes
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Variable reference: foo
    Ident(Identifier),

    /// Integer literal: 42
    Integer(i64),

    /// String literal: "hello"
    String(String),

    /// Boolean literal: true, false
    Bool(bool),

    /// Prefix operation: -x, !y
    Prefix { op: PrefixOp, operand: Box<Expr> },

    /// Infix operation: a + b, x < y
    Infix {
        left: Box<Expr>,
        op: InfixOp,
        right: Box<Expr>,
    },

    /// Conditional: if (cond) { } else { }
    If {
        condition: Box<Expr>,
        consequence: Block,
        alternative: Option<Block>,
    },

    /// Loop: while (cond) { }
    While { condition: Box<Expr>, body: Block },

    /// Function literal: fn(a, b) { }
    Function(Rc<FunctionLiteral>),

    /// Function call: foo(a, b)
    Call { callee: Box<Expr>, args: Vec<Expr> },

    /// Array literal: [1, 2, 3]
    Array(Vec<Expr>),

    /// Hash literal: {"a": 1}
    Hash(Vec<(Expr, Expr)>),

    /// Subscript: arr[0], map["key"]
    Index { collection: Box<Expr>, index: Box<Expr> },
}

/// Parameters and body of a function literal. Shared with the function
/// values created from it so evaluation does not copy the body.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionLiteral {
    pub params: Vec<Identifier>,
    pub body: Block,
}

/// Braced statement sequence: { stmt* }
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

impl Block {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }
}

/// Statement nodes
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Binding: let x = expr
    Let { name: Identifier, value: Expr },

    /// Rebinding of an existing name: x = expr
    Assign { name: Identifier, value: Expr },

    /// Return from the enclosing function: return expr
    Return { value: Expr },

    /// Expression statement
    Expr { expr: Expr },

    /// Nested block, evaluated in the enclosing scope. Only built
    /// programmatically: a bare `{` at statement position parses as a hash
    /// literal.
    Block(Block),
}

/// A complete program
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(ident) => write!(f, "{}", ident),
            Expr::Integer(value) => write!(f, "{}", value),
            Expr::String(value) => write!(f, "\"{}\"", value),
            Expr::Bool(value) => write!(f, "{}", value),
            Expr::Prefix { op, operand } => write!(f, "({}{})", op, operand),
            Expr::Infix { left, op, right } => write!(f, "({} {} {})", left, op, right),
            Expr::If { condition, consequence, alternative } => {
                write!(f, "if ({}) {}", condition, consequence)?;
                if let Some(alternative) = alternative {
                    write!(f, " else {}", alternative)?;
                }
                Ok(())
            }
            Expr::While { condition, body } => write!(f, "while ({}) {}", condition, body),
            Expr::Function(literal) => write!(f, "{}", literal),
            Expr::Call { callee, args } => {
                write!(f, "{}(", callee)?;
                write_joined(f, args, ", ")?;
                write!(f, ")")
            }
            Expr::Array(elements) => {
                write!(f, "[")?;
                write_joined(f, elements, ", ")?;
                write!(f, "]")
            }
            Expr::Hash(pairs) => {
                write!(f, "{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Expr::Index { collection, index } => write!(f, "({}[{}])", collection, index),
        }
    }
}

impl fmt::Display for FunctionLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn(")?;
        write_joined(f, &self.params, ", ")?;
        write!(f, ") {}", self.body)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.statements.is_empty() {
            return write!(f, "{{ }}");
        }
        write!(f, "{{ ")?;
        write_joined(f, &self.statements, "; ")?;
        write!(f, " }}")
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Let { name, value } => write!(f, "let {} = {}", name, value),
            Stmt::Assign { name, value } => write!(f, "{} = {}", name, value),
            Stmt::Return { value } => write!(f, "return {}", value),
            Stmt::Expr { expr } => write!(f, "{}", expr),
            Stmt::Block(block) => write!(f, "{}", block),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_joined(f, &self.statements, "; ")
    }
}
