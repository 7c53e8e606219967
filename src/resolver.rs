use std::collections::HashMap;

use crate::ast::{Expr, ExprId, Stmt};
use crate::error::SlangError;
use crate::token::Token;

/// Maps expression ids to the number of scopes to walk up between a
/// variable use and the scope that declares it.
pub type Resolutions = HashMap<ExprId, usize>;

pub struct Resolver {
    /// Stack of scopes. Each scope maps variable names to whether their
    /// initializer has finished resolving. Top-level code never pushes
    /// a scope, so globals stay dynamically looked up.
    scopes: Vec<HashMap<String, bool>>,
    /// Resolved variable depths
    resolutions: Resolutions,
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            scopes: Vec::new(),
            resolutions: HashMap::new(),
        }
    }

    /// Main entry point - resolve all statements, stopping at the
    /// first error.
    pub fn resolve(mut self, statements: &[Stmt]) -> Result<Resolutions, SlangError> {
        for stmt in statements {
            self.resolve_stmt(stmt)?;
        }
        Ok(self.resolutions)
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        let len = self.scopes.len();
        for depth in 0..len {
            if self.scopes[len - 1 - depth].contains_key(&name.lexeme) {
                self.resolutions.insert(id, depth);
                return;
            }
        }
        // Not found = global variable (looked up dynamically at runtime)
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) -> Result<(), SlangError> {
        match stmt {
            Stmt::Block { statements } => {
                self.begin_scope();
                for statement in statements {
                    self.resolve_stmt(statement)?;
                }
                self.end_scope();
            }
            Stmt::Var { name, initializer } => {
                self.declare(name);
                self.resolve_expr(initializer)?;
                self.define(name);
            }
            Stmt::Fun { name, params, body } => {
                // Defined before the body so the function can call itself.
                self.declare(name);
                self.define(name);
                self.resolve_function(params, body)?;
            }
            Stmt::Expression { expr } => {
                self.resolve_expr(expr)?;
            }
            Stmt::Print { expr } => {
                self.resolve_expr(expr)?;
            }
            Stmt::Return { expr } => {
                self.resolve_expr(expr)?;
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition)?;
                self.resolve_stmt(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch)?;
                }
            }
            Stmt::While { condition, body } => {
                self.resolve_expr(condition)?;
                self.resolve_stmt(body)?;
            }
        }
        Ok(())
    }

    /// Params and body share a single scope, mirroring the one
    /// environment a call creates at runtime.
    fn resolve_function(&mut self, params: &[Token], body: &[Stmt]) -> Result<(), SlangError> {
        self.begin_scope();
        for param in params {
            self.declare(param);
            self.define(param);
        }
        for stmt in body {
            self.resolve_stmt(stmt)?;
        }
        self.end_scope();
        Ok(())
    }

    fn resolve_expr(&mut self, expr: &Expr) -> Result<(), SlangError> {
        match expr {
            Expr::Variable { id, name } => {
                if let Some(scope) = self.scopes.last()
                    && scope.get(&name.lexeme) == Some(&false)
                {
                    return Err(SlangError::Initializer {
                        ident: name.lexeme.clone(),
                    });
                }
                self.resolve_local(*id, name);
            }
            Expr::Assignment { id, name, value } => {
                self.resolve_expr(value)?;
                self.resolve_local(*id, name);
            }
            Expr::Binary { left, right, .. } => {
                self.resolve_expr(left)?;
                self.resolve_expr(right)?;
            }
            Expr::Unary { right, .. } => {
                self.resolve_expr(right)?;
            }
            Expr::Grouping { expression } => {
                self.resolve_expr(expression)?;
            }
            Expr::Call { callee, arguments } => {
                self.resolve_expr(callee)?;
                for argument in arguments {
                    self.resolve_expr(argument)?;
                }
            }
            Expr::Literal { .. } => {}
        }
        Ok(())
    }
}
