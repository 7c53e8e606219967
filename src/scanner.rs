use phf::phf_map;
use unicode_properties::UnicodeEmoji;

use crate::error::SlangError;
use crate::token::{Literal, Token, TokenType};

static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "and" => TokenType::And,
    "class" => TokenType::Class,
    "else" => TokenType::Else,
    "false" => TokenType::False,
    "fun" => TokenType::Fun,
    "for" => TokenType::For,
    "if" => TokenType::If,
    "nil" => TokenType::Nil,
    "or" => TokenType::Or,
    "print" => TokenType::Print,
    "return" => TokenType::Return,
    "super" => TokenType::Super,
    "this" => TokenType::This,
    "true" => TokenType::True,
    "var" => TokenType::Var,
    "while" => TokenType::While,
};

pub fn is_identifier_start(c: char) -> bool {
    !c.is_ascii_digit() && (c.is_alphabetic() || c == '_' || c.is_emoji_char())
}

pub fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c.is_emoji_char()
}

pub struct Scanner<'a> {
    source: &'a str,
    start: usize,
    current: usize,
    line: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            start: 0,
            current: 0,
            line: 1,
        }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token, SlangError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current > self.source.len() {
                return None;
            }

            if self.is_at_end() {
                self.current += 1;
                return Some(Ok(Token {
                    token_type: TokenType::Eof,
                    lexeme: String::new(),
                    literal: None,
                    line: self.line,
                }));
            }

            self.start = self.current;
            let c = self.advance();

            match c {
                // Whitespace
                ' ' | '\r' | '\t' => continue,
                '\n' => {
                    self.line += 1;
                    continue;
                }
                // Single-character tokens
                '(' => return Some(Ok(self.add_token(TokenType::LeftParen))),
                ')' => return Some(Ok(self.add_token(TokenType::RightParen))),
                '{' => return Some(Ok(self.add_token(TokenType::LeftBrace))),
                '}' => return Some(Ok(self.add_token(TokenType::RightBrace))),
                ',' => return Some(Ok(self.add_token(TokenType::Comma))),
                '.' => return Some(Ok(self.add_token(TokenType::Dot))),
                '-' => return Some(Ok(self.add_token(TokenType::Minus))),
                '+' => return Some(Ok(self.add_token(TokenType::Plus))),
                ';' => return Some(Ok(self.add_token(TokenType::Semicolon))),
                '*' => return Some(Ok(self.add_token(TokenType::Star))),
                // Slash or comment
                '/' => {
                    if self.match_char('/') {
                        // Comment - consume until end of line
                        while self.peek() != Some('\n') && !self.is_at_end() {
                            self.advance();
                        }
                        continue;
                    } else {
                        return Some(Ok(self.add_token(TokenType::Slash)));
                    }
                }
                '!' => {
                    let token_type = if self.match_char('=') {
                        TokenType::BangEqual
                    } else {
                        TokenType::Bang
                    };
                    return Some(Ok(self.add_token(token_type)));
                }
                '=' => {
                    let token_type = if self.match_char('=') {
                        TokenType::EqualEqual
                    } else {
                        TokenType::Equal
                    };
                    return Some(Ok(self.add_token(token_type)));
                }
                '<' => {
                    let token_type = if self.match_char('=') {
                        TokenType::LessEqual
                    } else {
                        TokenType::Less
                    };
                    return Some(Ok(self.add_token(token_type)));
                }
                '>' => {
                    let token_type = if self.match_char('=') {
                        TokenType::GreaterEqual
                    } else {
                        TokenType::Greater
                    };
                    return Some(Ok(self.add_token(token_type)));
                }
                '"' => return Some(self.string()),
                c if c.is_ascii_digit() => return Some(Ok(self.number())),
                c if is_identifier_start(c) => return Some(Ok(self.identifier())),
                _ => {
                    return Some(Err(SlangError::Scan {
                        line: self.line,
                        message: format!("Unexpected token: '{c}'."),
                    }));
                }
            }
        }
    }
}

impl<'a> Scanner<'a> {
    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    // Callers check is_at_end first, so there is always a next char.
    fn advance(&mut self) -> char {
        let c = self.source[self.current..].chars().next().unwrap_or('\u{0}');
        self.current += c.len_utf8();
        c
    }

    fn peek(&self) -> Option<char> {
        self.source[self.current..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.source[self.current..].chars();
        chars.next(); // skip current
        chars.next() // return next
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn add_token(&self, token_type: TokenType) -> Token {
        Token {
            token_type,
            lexeme: self.source[self.start..self.current].to_string(),
            literal: None,
            line: self.line,
        }
    }

    fn add_token_with_literal(&self, token_type: TokenType, literal: Literal) -> Token {
        Token {
            token_type,
            lexeme: self.source[self.start..self.current].to_string(),
            literal: Some(literal),
            line: self.line,
        }
    }

    fn identifier(&mut self) -> Token {
        while self.peek().is_some_and(is_identifier_char) {
            self.advance();
        }

        let text = &self.source[self.start..self.current];
        let token_type = KEYWORDS
            .get(text)
            .cloned()
            .unwrap_or(TokenType::Identifier);
        self.add_token(token_type)
    }

    fn number(&mut self) -> Token {
        // Consume digits
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        // Look for decimal part - only if dot is followed by digit
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance(); // consume the '.'
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let value: f64 = self.source[self.start..self.current]
            .parse()
            .unwrap_or_default();
        self.add_token_with_literal(TokenType::Number, Literal::Number(value))
    }

    fn string(&mut self) -> Result<Token, SlangError> {
        // Consume characters until closing quote
        while self.peek() != Some('"') && !self.is_at_end() {
            if self.peek() == Some('\n') {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            return Err(SlangError::Scan {
                line: self.line,
                message: "Unterminated string literal.".to_string(),
            });
        }

        // Consume the closing "
        self.advance();

        // Extract the string value (without quotes)
        let value = self.source[self.start + 1..self.current - 1].to_string();
        Ok(self.add_token_with_literal(TokenType::String, Literal::String(value)))
    }
}
