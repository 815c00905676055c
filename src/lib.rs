//! Bamboo - a small expression-oriented scripting language
//!
//! Source text goes through a lexer, a Pratt parser and a tree-walking
//! evaluator. Functions are first-class closures; integers, booleans,
//! strings, arrays and hashes are the data types.

pub mod token;
pub mod lexer;
pub mod parser;
pub mod ast;
pub mod value;
pub mod environment;
pub mod builtins;
pub mod evaluator;
pub mod error;
pub mod stack;

use std::sync::Once;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub use ast::Program;
pub use environment::{Env, Environment};
pub use error::{ParseError, ParseErrors, RuntimeError};
pub use evaluator::Interpreter;
pub use lexer::Lexer;
pub use parser::Parser;
pub use value::Value;

/// Parse a whole program, collecting every syntax error
pub fn parse(source: &str) -> Result<Program, ParseErrors> {
    Parser::from_source(source).parse()
}

/// Convenience function to run Bamboo code in a fresh environment
pub fn run(source: &str) -> Result<Value, ParseErrors> {
    Interpreter::new().eval_source(source)
}

/// Version of the Bamboo language
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

static TRACING: Once = Once::new();

/// Install a stderr log subscriber filtered by `BAMBOO_LOG` (or
/// `RUST_LOG`). Does nothing when neither is set.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let directives = match std::env::var("BAMBOO_LOG").or_else(|_| std::env::var("RUST_LOG")) {
            Ok(directives) => directives,
            Err(_) => return,
        };

        let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("warn"));

        // A subscriber may already be installed by an embedding host
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .with(filter)
            .try_init();
    });
}
