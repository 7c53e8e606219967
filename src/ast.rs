use std::fmt;

use crate::token::{Literal, Token};

/// Parser-assigned id for nodes that name a variable. The resolver keys
/// its depth table by these ids, so they must stay unique for the
/// lifetime of an interpreter session.
pub type ExprId = usize;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },
    Unary {
        operator: Token,
        right: Box<Expr>,
    },
    Grouping {
        expression: Box<Expr>,
    },
    Literal {
        value: Literal,
    },
    Variable {
        id: ExprId,
        name: Token,
    },
    Assignment {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expression {
        expr: Expr,
    },
    Print {
        expr: Expr,
    },
    Var {
        name: Token,
        initializer: Expr,
    },
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    Block {
        statements: Vec<Stmt>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    Fun {
        name: Token,
        params: Vec<Token>,
        body: Vec<Stmt>,
    },
    Return {
        expr: Expr,
    },
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Binary {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", operator.lexeme, left, right),
            Expr::Unary { operator, right } => write!(f, "({} {})", operator.lexeme, right),
            Expr::Grouping { expression } => write!(f, "(group {})", expression),
            Expr::Literal { value } => write!(f, "{}", value),
            Expr::Variable { name, .. } => write!(f, "{}", name.lexeme),
            Expr::Assignment { name, value, .. } => write!(f, "(= {} {})", name.lexeme, value),
            Expr::Call { callee, arguments } => {
                write!(f, "(call {}", callee)?;
                for argument in arguments {
                    write!(f, " {}", argument)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Expression { expr } => write!(f, "{}", expr),
            Stmt::Print { expr } => write!(f, "(print {})", expr),
            Stmt::Var { name, initializer } => {
                write!(f, "(var {} {})", name.lexeme, initializer)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => {
                    write!(f, "(if {} {} {})", condition, then_branch, else_branch)
                }
                None => write!(f, "(if {} {})", condition, then_branch),
            },
            Stmt::Block { statements } => {
                write!(f, "(block")?;
                for statement in statements {
                    write!(f, " {}", statement)?;
                }
                write!(f, ")")
            }
            Stmt::While { condition, body } => write!(f, "(while {} {})", condition, body),
            Stmt::Fun { name, params, body } => {
                write!(f, "(fun {} (", name.lexeme)?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", param.lexeme)?;
                }
                write!(f, ")")?;
                for statement in body {
                    write!(f, " {}", statement)?;
                }
                write!(f, ")")
            }
            Stmt::Return { expr } => write!(f, "(return {})", expr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    fn make_token(token_type: TokenType, lexeme: &str) -> Token {
        Token {
            token_type,
            lexeme: lexeme.to_string(),
            literal: None,
            line: 1,
        }
    }

    #[test]
    fn displays_nested_expression() {
        // -123 * (45.67)
        let expr = Expr::Binary {
            left: Box::new(Expr::Unary {
                operator: make_token(TokenType::Minus, "-"),
                right: Box::new(Expr::Literal {
                    value: Literal::Number(123.0),
                }),
            }),
            operator: make_token(TokenType::Star, "*"),
            right: Box::new(Expr::Grouping {
                expression: Box::new(Expr::Literal {
                    value: Literal::Number(45.67),
                }),
            }),
        };

        assert_eq!(expr.to_string(), "(* (- 123) (group 45.67))");
    }

    #[test]
    fn displays_variable_as_its_name() {
        let expr = Expr::Variable {
            id: 0,
            name: make_token(TokenType::Identifier, "counter"),
        };

        assert_eq!(expr.to_string(), "counter");
    }

    #[test]
    fn displays_assignment() {
        let expr = Expr::Assignment {
            id: 0,
            name: make_token(TokenType::Identifier, "x"),
            value: Box::new(Expr::Literal {
                value: Literal::Number(1.0),
            }),
        };

        assert_eq!(expr.to_string(), "(= x 1)");
    }

    #[test]
    fn displays_call_with_arguments() {
        let expr = Expr::Call {
            callee: Box::new(Expr::Variable {
                id: 0,
                name: make_token(TokenType::Identifier, "add"),
            }),
            arguments: vec![
                Expr::Literal {
                    value: Literal::Number(1.0),
                },
                Expr::Literal {
                    value: Literal::Number(2.0),
                },
            ],
        };

        assert_eq!(expr.to_string(), "(call add 1 2)");
    }

    #[test]
    fn displays_call_without_arguments() {
        let expr = Expr::Call {
            callee: Box::new(Expr::Variable {
                id: 0,
                name: make_token(TokenType::Identifier, "clock"),
            }),
            arguments: vec![],
        };

        assert_eq!(expr.to_string(), "(call clock)");
    }

    #[test]
    fn displays_return_statement() {
        let stmt = Stmt::Return {
            expr: Expr::Literal {
                value: Literal::Nil,
            },
        };

        assert_eq!(stmt.to_string(), "(return nil)");
    }

    #[test]
    fn displays_empty_block() {
        let stmt = Stmt::Block { statements: vec![] };

        assert_eq!(stmt.to_string(), "(block)");
    }

    #[test]
    fn displays_while_with_empty_block_body() {
        let stmt = Stmt::While {
            condition: Expr::Literal {
                value: Literal::Bool(true),
            },
            body: Box::new(Stmt::Block { statements: vec![] }),
        };

        assert_eq!(stmt.to_string(), "(while true (block))");
    }

    #[test]
    fn displays_function_declaration() {
        let stmt = Stmt::Fun {
            name: make_token(TokenType::Identifier, "add"),
            params: vec![
                make_token(TokenType::Identifier, "a"),
                make_token(TokenType::Identifier, "b"),
            ],
            body: vec![Stmt::Print {
                expr: Expr::Binary {
                    left: Box::new(Expr::Variable {
                        id: 0,
                        name: make_token(TokenType::Identifier, "a"),
                    }),
                    operator: make_token(TokenType::Plus, "+"),
                    right: Box::new(Expr::Variable {
                        id: 1,
                        name: make_token(TokenType::Identifier, "b"),
                    }),
                },
            }],
        };

        assert_eq!(stmt.to_string(), "(fun add (a b) (print (+ a b)))");
    }

    #[test]
    fn displays_if_with_and_without_else() {
        let bare = Stmt::If {
            condition: Expr::Literal {
                value: Literal::Bool(true),
            },
            then_branch: Box::new(Stmt::Print {
                expr: Expr::Literal {
                    value: Literal::Number(1.0),
                },
            }),
            else_branch: None,
        };
        assert_eq!(bare.to_string(), "(if true (print 1))");

        let with_else = Stmt::If {
            condition: Expr::Literal {
                value: Literal::Bool(false),
            },
            then_branch: Box::new(Stmt::Print {
                expr: Expr::Literal {
                    value: Literal::Number(1.0),
                },
            }),
            else_branch: Some(Box::new(Stmt::Print {
                expr: Expr::Literal {
                    value: Literal::Number(2.0),
                },
            })),
        };
        assert_eq!(with_else.to_string(), "(if false (print 1) (print 2))");
    }
}
