//! Tokenizer for descriptor text.

use crate::error::{ConfigError, ConfigResult, Location};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    Str(String),
    Int(i64),
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Eq,
    Dot,
    /// `?.`
    SafeDot,
    Colon,
    Star,
    Comma,
    /// Statement separator: a line break or `;`.
    Newline,
    Eof,
}

impl TokenKind {
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier '{}'", name),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::Int(n) => format!("number {}", n),
            TokenKind::LBrace => "'{'".to_string(),
            TokenKind::RBrace => "'}'".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::LBracket => "'['".to_string(),
            TokenKind::RBracket => "']'".to_string(),
            TokenKind::Eq => "'='".to_string(),
            TokenKind::Dot => "'.'".to_string(),
            TokenKind::SafeDot => "'?.'".to_string(),
            TokenKind::Colon => "':'".to_string(),
            TokenKind::Star => "'*'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Newline => "end of line".to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: Location,
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn location(&self) -> Location {
        Location::new(self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next()
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
    }

    /// Block comments nest, as in Kotlin.
    fn skip_block_comment(&mut self, start: Location) -> ConfigResult<()> {
        self.bump();
        self.bump();
        let mut depth = 1;
        while depth > 0 {
            match self.bump() {
                Some('*') if self.peek() == Some('/') => {
                    self.bump();
                    depth -= 1;
                }
                Some('/') if self.peek() == Some('*') => {
                    self.bump();
                    depth += 1;
                }
                Some(_) => {}
                None => return Err(ConfigError::malformed(start, "unterminated block comment")),
            }
        }
        Ok(())
    }

    fn string(&mut self, start: Location) -> ConfigResult<String> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(value),
                Some('\\') => {
                    let escaped = match self.bump() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('"') => '"',
                        Some('\'') => '\'',
                        Some('\\') => '\\',
                        Some('$') => '$',
                        Some(other) => {
                            return Err(ConfigError::malformed(
                                self.location(),
                                format!("unsupported escape '\\{}'", other),
                            ));
                        }
                        None => break,
                    };
                    value.push(escaped);
                }
                Some('\n') | None => break,
                Some(c) => value.push(c),
            }
        }
        Err(ConfigError::malformed(start, "unterminated string literal"))
    }

    fn backtick_ident(&mut self, start: Location) -> ConfigResult<String> {
        self.bump();
        let mut name = String::new();
        loop {
            match self.bump() {
                Some('`') if !name.is_empty() => return Ok(name),
                Some('`') => return Err(ConfigError::malformed(start, "empty quoted identifier")),
                Some('\n') | None => {
                    return Err(ConfigError::malformed(start, "unterminated quoted identifier"));
                }
                Some(c) => name.push(c),
            }
        }
    }

    fn number(&mut self, start: Location) -> ConfigResult<i64> {
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
            } else if c != '_' {
                break;
            }
            self.bump();
        }
        if matches!(self.peek(), Some(c) if c.is_alphabetic()) {
            return Err(ConfigError::malformed(
                self.location(),
                "unexpected character after number",
            ));
        }
        digits
            .parse()
            .map_err(|_| ConfigError::malformed(start, format!("number {} is out of range", digits)))
    }

    fn ident(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        name
    }

    fn next_token(&mut self) -> ConfigResult<Token> {
        loop {
            let location = self.location();
            let Some(c) = self.peek() else {
                return Ok(Token {
                    kind: TokenKind::Eof,
                    location,
                });
            };

            let kind = match c {
                ' ' | '\t' | '\r' => {
                    self.bump();
                    continue;
                }
                '/' if self.peek_second() == Some('/') => {
                    self.skip_line_comment();
                    continue;
                }
                '/' if self.peek_second() == Some('*') => {
                    self.skip_block_comment(location)?;
                    continue;
                }
                '\n' | ';' => {
                    self.bump();
                    TokenKind::Newline
                }
                '{' => {
                    self.bump();
                    TokenKind::LBrace
                }
                '}' => {
                    self.bump();
                    TokenKind::RBrace
                }
                '(' => {
                    self.bump();
                    TokenKind::LParen
                }
                ')' => {
                    self.bump();
                    TokenKind::RParen
                }
                '[' => {
                    self.bump();
                    TokenKind::LBracket
                }
                ']' => {
                    self.bump();
                    TokenKind::RBracket
                }
                '?' if self.peek_second() == Some('.') => {
                    self.bump();
                    self.bump();
                    TokenKind::SafeDot
                }
                ':' => {
                    self.bump();
                    TokenKind::Colon
                }
                '*' => {
                    self.bump();
                    TokenKind::Star
                }
                '=' => {
                    self.bump();
                    TokenKind::Eq
                }
                '.' => {
                    self.bump();
                    TokenKind::Dot
                }
                ',' => {
                    self.bump();
                    TokenKind::Comma
                }
                '"' => TokenKind::Str(self.string(location)?),
                '`' => TokenKind::Ident(self.backtick_ident(location)?),
                c if c.is_ascii_digit() => TokenKind::Int(self.number(location)?),
                c if c.is_alphabetic() || c == '_' => TokenKind::Ident(self.ident()),
                other => {
                    return Err(ConfigError::malformed(
                        location,
                        format!("unexpected character '{}'", other),
                    ));
                }
            };

            return Ok(Token { kind, location });
        }
    }
}

/// Split descriptor text into tokens, ending with [`TokenKind::Eof`].
pub fn tokenize(src: &str) -> ConfigResult<Vec<Token>> {
    let mut lexer = Lexer::new(src);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}
