use std::fmt;
use std::io::Write;

use crate::ast::{Expr, Stmt};
use crate::error::SlangError;

/// Advisory lint pass over a parsed program. Findings go to the output
/// sink and never stop the pipeline. Implementations override
/// `visit_stmt` (or `visit_expr`) for the nodes they care about and
/// fall back to `walk_stmt`/`walk_expr` for the rest.
pub trait Analyzer {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn run(&mut self, program: &[Stmt], output: &mut dyn Write) -> Result<(), SlangError> {
        writeln!(output, "{}: {}", self.name(), self.description())?;
        for stmt in program {
            self.visit_stmt(stmt, output)?;
        }
        Ok(())
    }

    fn visit_stmt(&mut self, stmt: &Stmt, output: &mut dyn Write) -> Result<(), SlangError> {
        walk_stmt(self, stmt, output)
    }

    fn visit_expr(&mut self, expr: &Expr, output: &mut dyn Write) -> Result<(), SlangError> {
        walk_expr(self, expr, output)
    }
}

fn diagnostic(
    output: &mut dyn Write,
    node: impl fmt::Display,
    message: &str,
) -> Result<(), SlangError> {
    writeln!(output, "[Diagnostic]: {}\n              {}", node, message)?;
    Ok(())
}

/// Default statement traversal: visit every child node.
pub fn walk_stmt<A: Analyzer + ?Sized>(
    analyzer: &mut A,
    stmt: &Stmt,
    output: &mut dyn Write,
) -> Result<(), SlangError> {
    match stmt {
        Stmt::Expression { expr } | Stmt::Print { expr } | Stmt::Return { expr } => {
            analyzer.visit_expr(expr, output)
        }
        Stmt::Var { initializer, .. } => analyzer.visit_expr(initializer, output),
        Stmt::If {
            condition,
            then_branch,
            else_branch,
        } => {
            analyzer.visit_expr(condition, output)?;
            analyzer.visit_stmt(then_branch, output)?;
            if let Some(else_branch) = else_branch {
                analyzer.visit_stmt(else_branch, output)?;
            }
            Ok(())
        }
        Stmt::Block { statements } => {
            for statement in statements {
                analyzer.visit_stmt(statement, output)?;
            }
            Ok(())
        }
        Stmt::While { condition, body } => {
            analyzer.visit_expr(condition, output)?;
            analyzer.visit_stmt(body, output)
        }
        Stmt::Fun { body, .. } => {
            for statement in body {
                analyzer.visit_stmt(statement, output)?;
            }
            Ok(())
        }
    }
}

/// Default expression traversal: visit every child node.
pub fn walk_expr<A: Analyzer + ?Sized>(
    analyzer: &mut A,
    expr: &Expr,
    output: &mut dyn Write,
) -> Result<(), SlangError> {
    match expr {
        Expr::Binary { left, right, .. } => {
            analyzer.visit_expr(left, output)?;
            analyzer.visit_expr(right, output)
        }
        Expr::Unary { right, .. } => analyzer.visit_expr(right, output),
        Expr::Grouping { expression } => analyzer.visit_expr(expression, output),
        Expr::Assignment { value, .. } => analyzer.visit_expr(value, output),
        Expr::Call { callee, arguments } => {
            analyzer.visit_expr(callee, output)?;
            for argument in arguments {
                analyzer.visit_expr(argument, output)?;
            }
            Ok(())
        }
        Expr::Literal { .. } | Expr::Variable { .. } => Ok(()),
    }
}

/// Flags return statements outside any function. They are legal at
/// runtime (a top-level return ends the program early), which is
/// rarely what the author meant.
pub struct BareReturnAnalyzer {
    function_depth: usize,
}

impl BareReturnAnalyzer {
    pub fn new() -> Self {
        Self { function_depth: 0 }
    }
}

impl Analyzer for BareReturnAnalyzer {
    fn name(&self) -> &'static str {
        "bare-return"
    }

    fn description(&self) -> &'static str {
        "Detects bare return statements"
    }

    fn visit_stmt(&mut self, stmt: &Stmt, output: &mut dyn Write) -> Result<(), SlangError> {
        match stmt {
            Stmt::Fun { .. } => {
                self.function_depth += 1;
                let result = walk_stmt(self, stmt, output);
                self.function_depth -= 1;
                result
            }
            Stmt::Return { .. } => {
                if self.function_depth == 0 {
                    diagnostic(output, stmt, "Bare return statement detected.")?;
                }
                walk_stmt(self, stmt, output)
            }
            _ => walk_stmt(self, stmt, output),
        }
    }
}

/// Flags while loops whose body is an empty block.
pub struct EmptyLoopAnalyzer;

impl Analyzer for EmptyLoopAnalyzer {
    fn name(&self) -> &'static str {
        "empty-loop"
    }

    fn description(&self) -> &'static str {
        "Detects loops with empty bodies"
    }

    fn visit_stmt(&mut self, stmt: &Stmt, output: &mut dyn Write) -> Result<(), SlangError> {
        match stmt {
            Stmt::While { condition, body } => match body.as_ref() {
                Stmt::Block { statements } => {
                    self.visit_expr(condition, output)?;
                    if statements.is_empty() {
                        diagnostic(output, stmt, "Empty loop body detected")?;
                    }
                    Ok(())
                }
                _ => walk_stmt(self, stmt, output),
            },
            _ => walk_stmt(self, stmt, output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;
    use crate::token::Token;

    fn parse(source: &str) -> Vec<Stmt> {
        let tokens: Vec<Token> = Scanner::new(source).map(|token| token.unwrap()).collect();
        let mut parser = Parser::new(tokens, 0);
        let statements = parser.parse();
        let errors = parser.take_errors();
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        statements
    }

    fn report(analyzer: &mut dyn Analyzer, source: &str) -> String {
        let statements = parse(source);
        let mut output = Vec::new();
        analyzer.run(&statements, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn bare_return_announces_itself() {
        assert_eq!(
            report(&mut BareReturnAnalyzer::new(), ""),
            "bare-return: Detects bare return statements\n"
        );
    }

    #[test]
    fn bare_return_flags_a_top_level_return() {
        assert_eq!(
            report(&mut BareReturnAnalyzer::new(), "return 1;"),
            concat!(
                "bare-return: Detects bare return statements\n",
                "[Diagnostic]: (return 1)\n",
                "              Bare return statement detected.\n",
            )
        );
    }

    #[test]
    fn bare_return_allows_returns_inside_functions() {
        assert_eq!(
            report(&mut BareReturnAnalyzer::new(), "fun f() { return 1; }"),
            "bare-return: Detects bare return statements\n"
        );
    }

    #[test]
    fn bare_return_follows_blocks_and_loops() {
        let output = report(
            &mut BareReturnAnalyzer::new(),
            "{ return 1; } while (false) { return 2; }",
        );
        assert!(output.contains("[Diagnostic]: (return 1)"));
        assert!(output.contains("[Diagnostic]: (return 2)"));
    }

    #[test]
    fn bare_return_resumes_flagging_after_a_function() {
        let output = report(
            &mut BareReturnAnalyzer::new(),
            "fun f() { return 1; } return 2;",
        );
        assert!(!output.contains("(return 1)"));
        assert!(output.contains("[Diagnostic]: (return 2)"));
    }

    #[test]
    fn bare_return_ignores_nested_function_returns() {
        assert_eq!(
            report(
                &mut BareReturnAnalyzer::new(),
                "fun outer() { fun inner() { return 1; } return 2; }",
            ),
            "bare-return: Detects bare return statements\n"
        );
    }

    #[test]
    fn empty_loop_announces_itself() {
        assert_eq!(
            report(&mut EmptyLoopAnalyzer, ""),
            "empty-loop: Detects loops with empty bodies\n"
        );
    }

    #[test]
    fn empty_loop_flags_a_while_with_an_empty_block() {
        assert_eq!(
            report(&mut EmptyLoopAnalyzer, "while (true) {}"),
            concat!(
                "empty-loop: Detects loops with empty bodies\n",
                "[Diagnostic]: (while true (block))\n",
                "              Empty loop body detected\n",
            )
        );
    }

    #[test]
    fn empty_loop_allows_a_loop_with_statements() {
        assert_eq!(
            report(&mut EmptyLoopAnalyzer, "while (true) { print 1; }"),
            "empty-loop: Detects loops with empty bodies\n"
        );
    }

    #[test]
    fn empty_loop_allows_a_non_block_body() {
        assert_eq!(
            report(&mut EmptyLoopAnalyzer, "while (true) print 1;"),
            "empty-loop: Detects loops with empty bodies\n"
        );
    }

    #[test]
    fn empty_loop_finds_loops_inside_functions() {
        let output = report(&mut EmptyLoopAnalyzer, "fun f() { while (true) {} }");
        assert!(output.contains("[Diagnostic]: (while true (block))"));
    }

    #[test]
    fn empty_loop_finds_loops_inside_blocks() {
        let output = report(&mut EmptyLoopAnalyzer, "{ while (1 < 2) {} }");
        assert!(output.contains("[Diagnostic]: (while (< 1 2) (block))"));
    }
}
