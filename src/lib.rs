mod analyzer;
mod ast;
mod environment;
mod error;
mod interpreter;
mod parser;
mod resolver;
mod scanner;
mod token;
mod value;

use std::io::Write;

use analyzer::{Analyzer, BareReturnAnalyzer, EmptyLoopAnalyzer};
use interpreter::Flow;

pub use ast::{Expr, ExprId, Stmt};
pub use error::SlangError;
pub use parser::Parser;
pub use resolver::Resolver;
pub use scanner::Scanner;
pub use token::{Literal, Token, TokenType};

/// How a source fragment entered the pipeline. Batch scripts get the
/// lint analyzers; REPL lines echo each pipeline stage instead.
enum Mode {
    Script,
    Line,
}

/// One interpreter session. Globals and resolved variable depths
/// persist across runs, so a REPL can feed lines one at a time.
pub struct Slang {
    interpreter: interpreter::Interpreter,
    /// First expression id for the next parse. Ids must never repeat
    /// within a session or old resolutions would go stale.
    next_id: ExprId,
}

impl Default for Slang {
    fn default() -> Self {
        Self::new()
    }
}

impl Slang {
    pub fn new() -> Self {
        Self {
            interpreter: interpreter::Interpreter::new(),
            next_id: 0,
        }
    }

    /// Runs a whole script, lint analyzers included.
    pub fn run_script<O: Write>(&mut self, source: &str, mut output: O) -> Vec<SlangError> {
        self.run(source, &mut output, Mode::Script)
    }

    /// Runs one REPL line, echoing tokens, AST and locals as it goes.
    pub fn run_line<O: Write>(&mut self, source: &str, mut output: O) -> Vec<SlangError> {
        self.run(source, &mut output, Mode::Line)
    }

    fn run(&mut self, source: &str, output: &mut dyn Write, mode: Mode) -> Vec<SlangError> {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();
        for result in Scanner::new(source) {
            match result {
                Ok(token) => tokens.push(token),
                Err(error) => errors.push(error),
            }
        }
        if !errors.is_empty() {
            return errors;
        }

        if let Mode::Line = mode {
            if let Err(error) = writeln!(output, "Tokens: {:?}", tokens) {
                return vec![error.into()];
            }
        }

        let mut parser = Parser::new(tokens, self.next_id);
        let statements = parser.parse();
        self.next_id = parser.next_id();

        let errors = parser.take_errors();
        if !errors.is_empty() {
            return errors;
        }

        if let Mode::Line = mode {
            if let Err(error) = writeln!(output, "AST: {:?}", statements) {
                return vec![error.into()];
            }
        }

        let resolutions = match Resolver::new().resolve(&statements) {
            Ok(resolutions) => resolutions,
            Err(error) => return vec![error],
        };

        if let Mode::Line = mode {
            if let Err(error) = writeln!(output, "Locals: {:?}", resolutions) {
                return vec![error.into()];
            }
        }

        if let Mode::Script = mode {
            if let Err(error) = analyze(&statements, output) {
                return vec![error];
            }
        }

        self.interpreter.add_resolutions(resolutions);

        for stmt in &statements {
            match self.interpreter.execute(stmt, output) {
                Ok(Flow::Normal) => {}
                // A top-level return ends the program early.
                Ok(Flow::Return(_)) => break,
                Err(error) => return vec![error],
            }
        }

        Vec::new()
    }
}

fn analyze(statements: &[Stmt], output: &mut dyn Write) -> Result<(), SlangError> {
    let mut analyzers: Vec<Box<dyn Analyzer>> = vec![
        Box::new(BareReturnAnalyzer::new()),
        Box::new(EmptyLoopAnalyzer),
    ];
    for analyzer in &mut analyzers {
        analyzer.run(statements, output)?;
    }
    Ok(())
}
