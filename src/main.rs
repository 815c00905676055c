//! Bamboo CLI and REPL
//!
//! Usage:
//!   bamboo                  - Start interactive REPL
//!   bamboo run <file.bam>   - Execute a Bamboo file
//!   bamboo repl             - Start interactive REPL
//!   bamboo help             - Show help message

use std::env;
use std::fs;
use std::process;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use bamboo::{Interpreter, ParseErrors, Value, VERSION};

fn main() {
    bamboo::init_tracing();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        run_repl();
        return;
    }

    match args[1].as_str() {
        "run" => {
            if args.len() < 3 {
                eprintln!("{}: missing file argument", "error".red());
                eprintln!("Usage: bamboo run <file.bam>");
                process::exit(1);
            }
            run_file(&args[2]);
        }
        "repl" => run_repl(),
        "help" | "--help" | "-h" => print_help(),
        "version" | "--version" | "-v" => println!("Bamboo {}", VERSION),
        path if path.starts_with('-') => {
            eprintln!("{}: unknown option '{}'", "error".red(), path);
            print_help();
            process::exit(1);
        }
        path => run_file(path),
    }
}

fn print_help() {
    println!("{}", "Bamboo".green().bold());
    println!("A small expression-oriented scripting language");
    println!("{} {}\n", "Version".green(), VERSION);
    println!("{}", "USAGE:".yellow());
    println!("  bamboo                   Start interactive REPL");
    println!("  bamboo run <file.bam>    Execute a Bamboo file");
    println!("  bamboo <file.bam>        Same as run");
    println!("  bamboo repl              Start interactive REPL");
    println!("  bamboo help              Show this help message");
    println!("  bamboo version           Show version\n");
    println!("{}", "ENVIRONMENT:".yellow());
    println!("  BAMBOO_LOG=debug         Log filter (falls back to RUST_LOG)\n");
    println!("{}", "LANGUAGE FEATURES:".yellow());
    println!("  let x = 10;                      Binding");
    println!("  x = x + 1;                       Rebind nearest binding");
    println!("  let add = fn(a, b) {{ a + b }};    Function literal");
    println!("  if (x > 5) {{ 1 }} else {{ 2 }}      Conditional expression");
    println!("  while (x < 10) {{ x = x + 1; }}    Loop");
    println!("  [1, 2, 3][0]  {{\"k\": 1}}[\"k\"]     Arrays and hashes");
}

fn print_parse_errors(errors: ParseErrors, source: &str) {
    for error in errors.with_source(source).iter() {
        eprintln!("{}", format!("{}", error).red());
    }
}

fn run_file(path: &str) {
    let source = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("{}: cannot read file '{}': {}", "error".red(), path, e);
            process::exit(1);
        }
    };

    let mut interpreter = Interpreter::new();
    match interpreter.eval_source(&source) {
        Ok(Value::Null) => {}
        Ok(err @ Value::Error(_)) => {
            eprintln!("{}", format!("{}", err).red());
            process::exit(1);
        }
        Ok(value) => println!("{}", value),
        Err(errors) => {
            print_parse_errors(errors, &source);
            process::exit(1);
        }
    }
}

fn run_repl() {
    println!("{} {} - {}",
        "Bamboo".green().bold(),
        VERSION.green(),
        "a small scripting language".dimmed()
    );
    println!("Type {} to exit, {} for help\n",
        "exit".yellow(),
        "help".yellow()
    );

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("{}: cannot start REPL: {}", "error".red(), e);
            process::exit(1);
        }
    };

    // Bindings persist across lines
    let mut interpreter = Interpreter::new();

    loop {
        match rl.readline(&format!("{} ", ">>".green().bold())) {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                match line {
                    "exit" | "quit" => {
                        println!("{}", "Goodbye!".green());
                        break;
                    }
                    "help" => {
                        print_repl_help();
                        continue;
                    }
                    "clear" => {
                        interpreter = Interpreter::new();
                        println!("{}", "Environment cleared.".dimmed());
                        continue;
                    }
                    _ => {}
                }

                match interpreter.eval_source(line) {
                    Ok(Value::Null) => {}
                    Ok(err @ Value::Error(_)) => {
                        eprintln!("{}", format!("{}", err).red());
                    }
                    Ok(value) => {
                        println!("{} {}", "=>".dimmed(), format!("{}", value).cyan());
                    }
                    Err(errors) => print_parse_errors(errors, line),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".dimmed());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "Goodbye!".green());
                break;
            }
            Err(err) => {
                eprintln!("{}: {:?}", "error".red(), err);
                break;
            }
        }
    }
}

fn print_repl_help() {
    println!("{}", "REPL Commands:".yellow());
    println!("  exit, quit   Exit the REPL");
    println!("  clear        Forget every binding");
    println!("  help         Show this help\n");
    println!("{}", "Language Examples:".yellow());
    println!("  let x = 10;");
    println!("  let double = fn(n) {{ n * 2 }};");
    println!("  double(x)");
    println!("  let counter = 0; while (counter < 3) {{ counter = counter + 1; }}");
    println!("  len(\"bamboo\")  first([1, 2])  push([1], 2)  keys({{\"a\": 1}})");
    println!();
    println!("{}", "Builtins:".yellow());
    println!("  {}", bamboo::builtins::names().collect::<Vec<_>>().join(", "));
}
