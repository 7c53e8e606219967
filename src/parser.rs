use crate::ast::{Expr, ExprId, Stmt};
use crate::error::SlangError;
use crate::token::{Literal, Token, TokenType};

// program        → declaration* EOF
// declaration    → var-stmt | fun-stmt | stmt
// var-stmt       → "var" IDENT ( "=" expression )? ";"
// fun-stmt       → "fun" IDENT "(" parameters? ")" "{" declaration* "}"
// stmt           → print-stmt | if-stmt | while-stmt | for-stmt
//                | return-stmt | block | expr-stmt
// expression     → assignment
// assignment     → equality ( "=" equality )?
// equality       → comparison ( ( "!=" | "==" ) comparison )* ;
// comparison     → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
// term           → factor ( ( "-" | "+" ) factor )* ;
// factor         → unary ( ( "/" | "*" ) unary )* ;
// unary          → ( "!" | "-" ) unary | call ;
// call           → primary ( "(" arguments? ")" )* ;
// primary        → NUMBER | STRING | "true" | "false" | "nil"
//                | IDENT | "(" expression ")" ;
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<SlangError>,
    next_id: ExprId,
}

impl Parser {
    /// `first_id` seeds the id counter for variable-reference nodes. A
    /// session that parses several programs against one interpreter must
    /// thread the counter through, so ids never repeat.
    pub fn new(tokens: Vec<Token>, first_id: ExprId) -> Self {
        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
            next_id: first_id,
        }
    }

    pub fn parse(&mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        statements
    }

    pub fn take_errors(&mut self) -> Vec<SlangError> {
        std::mem::take(&mut self.errors)
    }

    /// The id the next parsed variable reference would get.
    pub fn next_id(&self) -> ExprId {
        self.next_id
    }

    fn fresh_id(&mut self) -> ExprId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.match_types(&[TokenType::Var]) {
            self.var_declaration()
        } else if self.match_types(&[TokenType::Fun]) {
            self.fun_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                self.errors.push(e);
                self.synchronize();
                None
            }
        }
    }

    fn var_declaration(&mut self) -> Result<Stmt, SlangError> {
        let name = self.consume_identifier()?;

        // A missing initializer is a nil literal, not an absent field
        let initializer = if self.match_types(&[TokenType::Equal]) {
            self.expression()?
        } else {
            Expr::Literal {
                value: Literal::Nil,
            }
        };

        self.consume(TokenType::Semicolon, "Expected ;")?;
        Ok(Stmt::Var { name, initializer })
    }

    fn fun_declaration(&mut self) -> Result<Stmt, SlangError> {
        let name = self.consume_identifier()?;
        self.consume(TokenType::LeftParen, "Expected '(' after function name.")?;

        let mut params = Vec::new();
        if !self.check(&TokenType::RightParen) {
            loop {
                params.push(self.consume_identifier()?);
                if !self.match_types(&[TokenType::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenType::RightParen, "Expected ')' after parameters.")?;

        self.consume(TokenType::LeftBrace, "Expected '{' before function body.")?;
        let body = self.block_statements()?;
        Ok(Stmt::Fun { name, params, body })
    }

    fn statement(&mut self) -> Result<Stmt, SlangError> {
        if self.match_types(&[TokenType::For]) {
            self.for_statement()
        } else if self.match_types(&[TokenType::If]) {
            self.if_statement()
        } else if self.match_types(&[TokenType::While]) {
            self.while_statement()
        } else if self.match_types(&[TokenType::Return]) {
            self.return_statement()
        } else if self.match_types(&[TokenType::LeftBrace]) {
            self.block()
        } else if self.match_types(&[TokenType::Print]) {
            self.print_statement()
        } else {
            self.expression_statement()
        }
    }

    fn for_statement(&mut self) -> Result<Stmt, SlangError> {
        self.consume(TokenType::LeftParen, "Expected '(' after 'for'.")?;

        // Initializer
        let initializer = if self.match_types(&[TokenType::Semicolon]) {
            None
        } else if self.match_types(&[TokenType::Var]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        // Condition
        let condition = if self.check(&TokenType::Semicolon) {
            Expr::Literal {
                value: Literal::Bool(true),
            }
        } else {
            self.expression()?
        };
        self.consume(TokenType::Semicolon, "Expected ;")?;

        // Increment
        let increment = if self.check(&TokenType::RightParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenType::RightParen, "Expected ')' after for clauses.")?;

        let mut body = self.statement()?;

        // Desugar: add increment to end of body
        if let Some(inc) = increment {
            body = Stmt::Block {
                statements: vec![body, Stmt::Expression { expr: inc }],
            };
        }

        // Desugar: wrap in while
        body = Stmt::While {
            condition,
            body: Box::new(body),
        };

        // Desugar: run the initializer once, in its own scope
        if let Some(init) = initializer {
            body = Stmt::Block {
                statements: vec![init, body],
            };
        }

        Ok(body)
    }

    fn if_statement(&mut self) -> Result<Stmt, SlangError> {
        self.consume(TokenType::LeftParen, "Expected '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenType::RightParen, "Expected ')' after condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_types(&[TokenType::Else]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt, SlangError> {
        self.consume(TokenType::LeftParen, "Expected '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenType::RightParen, "Expected ')' after condition.")?;

        let body = Box::new(self.statement()?);
        Ok(Stmt::While { condition, body })
    }

    fn return_statement(&mut self) -> Result<Stmt, SlangError> {
        // A bare return produces nil
        let expr = if self.check(&TokenType::Semicolon) {
            Expr::Literal {
                value: Literal::Nil,
            }
        } else {
            self.expression()?
        };

        self.consume(TokenType::Semicolon, "Expected ;")?;
        Ok(Stmt::Return { expr })
    }

    fn block(&mut self) -> Result<Stmt, SlangError> {
        let statements = self.block_statements()?;
        Ok(Stmt::Block { statements })
    }

    fn block_statements(&mut self) -> Result<Vec<Stmt>, SlangError> {
        let mut statements = Vec::new();

        while !self.check(&TokenType::RightBrace) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(TokenType::RightBrace, "Expected '}' after block.")?;
        Ok(statements)
    }

    fn print_statement(&mut self) -> Result<Stmt, SlangError> {
        let expr = self.expression()?;
        self.consume(TokenType::Semicolon, "Expected ;")?;
        Ok(Stmt::Print { expr })
    }

    fn expression_statement(&mut self) -> Result<Stmt, SlangError> {
        let expr = self.expression()?;
        self.consume(TokenType::Semicolon, "Expected ;")?;
        Ok(Stmt::Expression { expr })
    }

    fn expression(&mut self) -> Result<Expr, SlangError> {
        self.assignment()
    }

    // The right-hand side is equality, not assignment, so chains like
    // a = b = c do not parse.
    fn assignment(&mut self) -> Result<Expr, SlangError> {
        let expr = self.equality()?;

        if self.match_types(&[TokenType::Equal]) {
            let equals = self.previous().clone();
            let value = self.equality()?;

            if let Expr::Variable { id, name } = expr {
                return Ok(Expr::Assignment {
                    id,
                    name,
                    value: Box::new(value),
                });
            }

            return Err(SlangError::Parse {
                token: equals.to_string(),
                message: "Invalid assignment target".to_string(),
            });
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr, SlangError> {
        let mut expr = self.comparison()?;

        while self.match_types(&[TokenType::BangEqual, TokenType::EqualEqual]) {
            let operator = self.previous().clone();
            let right = self.comparison()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr, SlangError> {
        let mut expr = self.term()?;

        while self.match_types(&[
            TokenType::Greater,
            TokenType::GreaterEqual,
            TokenType::Less,
            TokenType::LessEqual,
        ]) {
            let operator = self.previous().clone();
            let right = self.term()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, SlangError> {
        let mut expr = self.factor()?;

        while self.match_types(&[TokenType::Minus, TokenType::Plus]) {
            let operator = self.previous().clone();
            let right = self.factor()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, SlangError> {
        let mut expr = self.unary()?;

        while self.match_types(&[TokenType::Slash, TokenType::Star]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, SlangError> {
        if self.match_types(&[TokenType::Bang, TokenType::Minus]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }
        self.call()
    }

    fn call(&mut self) -> Result<Expr, SlangError> {
        let mut expr = self.primary()?;

        // f(1)(2) is a call on the result of a call
        while self.match_types(&[TokenType::LeftParen]) {
            let mut arguments = Vec::new();
            if !self.check(&TokenType::RightParen) {
                loop {
                    arguments.push(self.expression()?);
                    if !self.match_types(&[TokenType::Comma]) {
                        break;
                    }
                }
            }
            self.consume(TokenType::RightParen, "Expected ')' after arguments.")?;

            expr = Expr::Call {
                callee: Box::new(expr),
                arguments,
            };
        }

        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, SlangError> {
        let token = self.peek();
        match token.token_type {
            TokenType::False => {
                self.advance();
                Ok(Expr::Literal {
                    value: Literal::Bool(false),
                })
            }
            TokenType::True => {
                self.advance();
                Ok(Expr::Literal {
                    value: Literal::Bool(true),
                })
            }
            TokenType::Nil => {
                self.advance();
                Ok(Expr::Literal {
                    value: Literal::Nil,
                })
            }
            TokenType::Number | TokenType::String => {
                let value = token.literal.clone().unwrap_or(Literal::Nil);
                self.advance();
                Ok(Expr::Literal { value })
            }
            TokenType::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(TokenType::RightParen, "Expected ')' after expression.")?;
                Ok(Expr::Grouping {
                    expression: Box::new(expr),
                })
            }
            TokenType::Identifier => {
                let name = token.clone();
                self.advance();
                Ok(Expr::Variable {
                    id: self.fresh_id(),
                    name,
                })
            }
            _ => Err(SlangError::Parse {
                token: token.to_string(),
                message: format!("Unexpected token '{}'.", token),
            }),
        }
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> Result<&Token, SlangError> {
        if self.check(&token_type) {
            return Ok(self.advance());
        }
        Err(SlangError::Parse {
            token: self.peek().to_string(),
            message: message.to_string(),
        })
    }

    fn consume_identifier(&mut self) -> Result<Token, SlangError> {
        if self.check(&TokenType::Identifier) {
            return Ok(self.advance().clone());
        }
        Err(SlangError::Parse {
            token: self.peek().to_string(),
            message: "Expected token".to_string(),
        })
    }

    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().token_type == TokenType::Semicolon {
                return;
            }

            match self.peek().token_type {
                TokenType::Class
                | TokenType::Fun
                | TokenType::Var
                | TokenType::For
                | TokenType::If
                | TokenType::While
                | TokenType::Print
                | TokenType::Return => return,
                _ => {}
            }

            self.advance();
        }
    }

    fn match_types(&mut self, types: &[TokenType]) -> bool {
        for t in types {
            if self.check(t) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }
        &self.peek().token_type == token_type
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;

    fn scan(source: &str) -> Vec<Token> {
        Scanner::new(source).map(|token| token.unwrap()).collect()
    }

    fn parser(source: &str) -> Parser {
        Parser::new(scan(source), 0)
    }

    fn parse_ok(source: &str) -> Vec<Stmt> {
        let mut parser = parser(source);
        let statements = parser.parse();
        let errors = parser.take_errors();
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        statements
    }

    fn parse_errors(source: &str) -> Vec<SlangError> {
        let mut parser = parser(source);
        parser.parse();
        parser.take_errors()
    }

    #[test]
    fn parses_empty_program() {
        assert!(parse_ok("").is_empty());
    }

    #[test]
    fn parses_var_declaration_with_initializer() {
        let statements = parse_ok("var x = 1;");
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].to_string(), "(var x 1)");
    }

    #[test]
    fn var_declaration_without_initializer_defaults_to_nil() {
        let statements = parse_ok("var x;");
        assert_eq!(statements[0].to_string(), "(var x nil)");
    }

    #[test]
    fn parses_print_statement() {
        let statements = parse_ok("print 1 + 2;");
        assert_eq!(statements[0].to_string(), "(print (+ 1 2))");
    }

    #[test]
    fn parses_expression_statement() {
        let statements = parse_ok("1 + 2;");
        assert_eq!(statements[0].to_string(), "(+ 1 2)");
    }

    #[test]
    fn parses_assignment() {
        let statements = parse_ok("x = 2;");
        assert_eq!(statements[0].to_string(), "(= x 2)");
    }

    #[test]
    fn assignment_to_non_variable_is_an_error() {
        let errors = parse_errors("1 = 2;");
        assert_eq!(errors.len(), 1);
        if let SlangError::Parse { token, message } = &errors[0] {
            assert_eq!(token, "=");
            assert_eq!(message, "Invalid assignment target");
        } else {
            panic!("expected a parse error, got {:?}", errors[0]);
        }
    }

    #[test]
    fn chained_assignment_does_not_parse() {
        // The grammar's right-hand side is equality, so the second '='
        // is left dangling
        let errors = parse_errors("a = b = c;");
        assert!(!errors.is_empty());
        assert!(matches!(&errors[0], SlangError::Parse { .. }));
    }

    #[test]
    fn comparison_binds_tighter_than_equality() {
        let statements = parse_ok("1 < 2 == true;");
        assert_eq!(statements[0].to_string(), "(== (< 1 2) true)");
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let statements = parse_ok("1 + 2 * 3;");
        assert_eq!(statements[0].to_string(), "(+ 1 (* 2 3))");
    }

    #[test]
    fn binary_operators_associate_left() {
        let statements = parse_ok("1 - 2 - 3;");
        assert_eq!(statements[0].to_string(), "(- (- 1 2) 3)");
    }

    #[test]
    fn unary_operators_nest() {
        let statements = parse_ok("!!true;");
        assert_eq!(statements[0].to_string(), "(! (! true))");
    }

    #[test]
    fn grouping_overrides_precedence() {
        let statements = parse_ok("(1 + 2) * 3;");
        assert_eq!(statements[0].to_string(), "(* (group (+ 1 2)) 3)");
    }

    #[test]
    fn unclosed_grouping_is_an_error() {
        let errors = parse_errors("(1 + 2;");
        if let SlangError::Parse { message, .. } = &errors[0] {
            assert_eq!(message, "Expected ')' after expression.");
        } else {
            panic!("expected a parse error, got {:?}", errors[0]);
        }
    }

    #[test]
    fn parses_call_without_arguments() {
        let statements = parse_ok("clock();");
        assert_eq!(statements[0].to_string(), "(call clock)");
    }

    #[test]
    fn parses_call_with_arguments() {
        let statements = parse_ok("add(1, 2 + 3);");
        assert_eq!(statements[0].to_string(), "(call add 1 (+ 2 3))");
    }

    #[test]
    fn calls_chain_left_to_right() {
        let statements = parse_ok("f(1)(2);");
        assert_eq!(statements[0].to_string(), "(call (call f 1) 2)");
    }

    #[test]
    fn missing_closing_paren_in_call_is_an_error() {
        let errors = parse_errors("f(1;");
        if let SlangError::Parse { message, .. } = &errors[0] {
            assert_eq!(message, "Expected ')' after arguments.");
        } else {
            panic!("expected a parse error, got {:?}", errors[0]);
        }
    }

    #[test]
    fn parses_block() {
        let statements = parse_ok("{ var x = 1; print x; }");
        assert_eq!(statements[0].to_string(), "(block (var x 1) (print x))");
    }

    #[test]
    fn unclosed_block_is_an_error() {
        let errors = parse_errors("{ print 1;");
        if let SlangError::Parse { token, message } = &errors[0] {
            assert_eq!(token, "EOF");
            assert_eq!(message, "Expected '}' after block.");
        } else {
            panic!("expected a parse error, got {:?}", errors[0]);
        }
    }

    #[test]
    fn parses_if_statement() {
        let statements = parse_ok("if (x > 1) print x;");
        assert_eq!(statements[0].to_string(), "(if (> x 1) (print x))");
    }

    #[test]
    fn parses_if_else_statement() {
        let statements = parse_ok("if (x > 1) print x; else print 0;");
        assert_eq!(
            statements[0].to_string(),
            "(if (> x 1) (print x) (print 0))"
        );
    }

    #[test]
    fn parses_while_statement() {
        let statements = parse_ok("while (x < 3) x = x + 1;");
        assert_eq!(
            statements[0].to_string(),
            "(while (< x 3) (= x (+ x 1)))"
        );
    }

    #[test]
    fn for_desugars_to_while_in_a_block() {
        let statements = parse_ok("for (var i = 0; i < 3; i = i + 1) print i;");
        assert_eq!(
            statements[0].to_string(),
            "(block (var i 0) (while (< i 3) (block (print i) (= i (+ i 1)))))"
        );
    }

    #[test]
    fn for_without_clauses_desugars_to_bare_while_true() {
        let statements = parse_ok("for (;;) print 1;");
        assert_eq!(statements[0].to_string(), "(while true (print 1))");
    }

    #[test]
    fn for_with_expression_initializer_keeps_the_outer_block() {
        let statements = parse_ok("for (i = 0; i < 3;) print i;");
        assert_eq!(
            statements[0].to_string(),
            "(block (= i 0) (while (< i 3) (print i)))"
        );
    }

    #[test]
    fn parses_function_declaration() {
        let statements = parse_ok("fun add(a, b) { print a + b; }");
        assert_eq!(statements[0].to_string(), "(fun add (a b) (print (+ a b)))");
    }

    #[test]
    fn parses_function_without_parameters() {
        let statements = parse_ok("fun hello() { print \"hi\"; }");
        assert_eq!(statements[0].to_string(), "(fun hello () (print hi))");
    }

    #[test]
    fn function_name_must_be_an_identifier() {
        let errors = parse_errors("fun 1() {}");
        if let SlangError::Parse { token, message } = &errors[0] {
            assert_eq!(token, "1");
            assert_eq!(message, "Expected token");
        } else {
            panic!("expected a parse error, got {:?}", errors[0]);
        }
    }

    #[test]
    fn parses_return_with_expression() {
        let statements = parse_ok("fun f() { return 1 + 2; }");
        assert_eq!(statements[0].to_string(), "(fun f () (return (+ 1 2)))");
    }

    #[test]
    fn bare_return_defaults_to_nil() {
        let statements = parse_ok("fun f() { return; }");
        assert_eq!(statements[0].to_string(), "(fun f () (return nil))");
    }

    #[test]
    fn stray_token_is_reported_with_its_lexeme() {
        let errors = parse_errors(") ;");
        if let SlangError::Parse { token, message } = &errors[0] {
            assert_eq!(token, ")");
            assert_eq!(message, "Unexpected token ')'.");
        } else {
            panic!("expected a parse error, got {:?}", errors[0]);
        }
    }

    #[test]
    fn missing_semicolon_is_an_error() {
        let errors = parse_errors("print 1");
        if let SlangError::Parse { token, message } = &errors[0] {
            assert_eq!(token, "EOF");
            assert_eq!(message, "Expected ;");
        } else {
            panic!("expected a parse error, got {:?}", errors[0]);
        }
    }

    #[test]
    fn recovers_at_statement_boundary_and_keeps_parsing() {
        let mut parser = parser("var = 1; print 2;");
        let statements = parser.parse();
        let errors = parser.take_errors();

        assert_eq!(errors.len(), 1);
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].to_string(), "(print 2)");
    }

    #[test]
    fn reports_several_errors_in_one_pass() {
        let errors = parse_errors("var = 1; var = 2; print 3;");
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn variable_references_get_increasing_ids() {
        let statements = parse_ok("x; y;");

        let first = match &statements[0] {
            Stmt::Expression {
                expr: Expr::Variable { id, .. },
            } => *id,
            other => panic!("expected a variable, got {other:?}"),
        };
        let second = match &statements[1] {
            Stmt::Expression {
                expr: Expr::Variable { id, .. },
            } => *id,
            other => panic!("expected a variable, got {other:?}"),
        };

        assert_eq!(first, 0);
        assert_eq!(second, 1);
    }

    #[test]
    fn assignment_keeps_the_id_of_its_target() {
        let statements = parse_ok("x = y;");

        match &statements[0] {
            Stmt::Expression {
                expr: Expr::Assignment { id, value, .. },
            } => {
                assert_eq!(*id, 0);
                assert!(matches!(value.as_ref(), Expr::Variable { id: 1, .. }));
            }
            other => panic!("expected an assignment, got {other:?}"),
        }
    }

    #[test]
    fn id_counter_continues_from_the_seed() {
        let mut parser = Parser::new(scan("x;"), 10);
        let statements = parser.parse();
        assert!(parser.take_errors().is_empty());

        assert!(matches!(
            &statements[0],
            Stmt::Expression {
                expr: Expr::Variable { id: 10, .. }
            }
        ));
        assert_eq!(parser.next_id(), 11);
    }
}
