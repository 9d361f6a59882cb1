//! Recursive-descent parser producing a [`Document`].
//!
//! Grammar, informally:
//!
//! ```text
//! document   := statement*
//! statement  := IDENT '{' statement* '}'
//!             | IDENT '(' args ')' '{' statement* '}'
//!             | 'import' IDENT ('.' IDENT)* ('.' '*')? ('as' IDENT)?
//!             | ('val' | 'var') IDENT (':' type)? '=' expr
//!             | path '=' expr
//!             | expr
//! expr       := postfix (IDENT postfix)*        // Kotlin infix calls
//! postfix    := primary ( ('.' | '?.') IDENT ('(' args ')')?
//!                       | '(' args ')' | '[' expr ']' | lambda )*
//! args       := ((IDENT '=')? expr ','?)*
//! lambda     := '{' statement* '}'              // not after a statement head
//! primary    := STRING | INT | 'true' | 'false' | IDENT | '(' expr ')'
//! ```
//!
//! Statements end at a line break, `;`, a closing brace, or end of input.

use crate::ast::{Document, Expr, ExprKind, Statement};
use crate::error::{ConfigError, ConfigResult, Location};
use crate::lexer::{Token, TokenKind, tokenize};

/// Deepest nesting of blocks, lambdas and expressions the parser accepts.
const MAX_DEPTH: usize = 128;

/// Parse descriptor text into a syntax tree.
pub fn parse_document(src: &str) -> ConfigResult<Document> {
    let tokens = tokenize(src)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let statements = parser.statements(false)?;
    Ok(Document { statements })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_second(&self) -> &TokenKind {
        let index = (self.pos + 1).min(self.tokens.len() - 1);
        &self.tokens[index].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Ident(name) if name == keyword)
    }

    fn skip_newlines(&mut self) {
        while self.peek().kind == TokenKind::Newline {
            self.advance();
        }
    }

    fn unexpected(&self, expected: &str) -> ConfigError {
        let token = self.peek();
        ConfigError::malformed(
            token.location,
            format!("expected {}, found {}", expected, token.kind.describe()),
        )
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> ConfigResult<()> {
        if self.peek().kind != kind {
            return Err(self.unexpected(expected));
        }
        self.advance();
        Ok(())
    }

    fn ident(&mut self, expected: &str) -> ConfigResult<String> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    /// Run `parse` one nesting level deeper.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> ConfigResult<T>) -> ConfigResult<T> {
        if self.depth >= MAX_DEPTH {
            return Err(ConfigError::malformed(self.peek().location, "nesting too deep"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn statements(&mut self, nested: bool) -> ConfigResult<Vec<Statement>> {
        let mut statements = Vec::new();
        loop {
            self.skip_newlines();
            match self.peek().kind {
                TokenKind::RBrace if nested => return Ok(statements),
                TokenKind::Eof if !nested => return Ok(statements),
                TokenKind::Eof => return Err(self.unexpected("'}'")),
                TokenKind::RBrace => return Err(self.unexpected("a statement")),
                _ => {}
            }

            statements.push(self.statement()?);

            match self.peek().kind {
                TokenKind::Newline | TokenKind::Eof => {}
                TokenKind::RBrace if nested => {}
                _ => return Err(self.unexpected("end of statement")),
            }
        }
    }

    /// Statements up to the closing brace, which is consumed. The opening
    /// brace is already consumed.
    fn block_body(&mut self) -> ConfigResult<Vec<Statement>> {
        self.nested(|p| {
            let body = p.statements(true)?;
            p.advance();
            Ok(body)
        })
    }

    fn statement(&mut self) -> ConfigResult<Statement> {
        let location = self.peek().location;
        if matches!(self.peek_second(), TokenKind::Ident(_)) {
            if self.at_keyword("import") {
                return self.import(location);
            }
            if self.at_keyword("val") || self.at_keyword("var") {
                return self.local(location);
            }
        }

        let expr = self.expression(false)?;

        match self.peek().kind {
            TokenKind::Eq => {
                let ExprKind::Path(target) = expr.kind else {
                    return Err(ConfigError::malformed(
                        location,
                        "left side of '=' must be a property name",
                    ));
                };
                self.advance();
                let value = self.expression(true)?;
                Ok(Statement::Assign {
                    target,
                    value,
                    location,
                })
            }
            TokenKind::LBrace => {
                let (name, args) = match &expr.kind {
                    ExprKind::Path(segments) if segments.len() == 1 => {
                        (segments[0].clone(), Vec::new())
                    }
                    ExprKind::Call {
                        receiver: None,
                        name,
                        args,
                    } => (name.clone(), args.clone()),
                    _ => {
                        return Err(ConfigError::malformed(
                            location,
                            format!("'{}' cannot open a block", expr.describe()),
                        ));
                    }
                };
                self.advance();
                let body = self.block_body()?;
                Ok(Statement::Block {
                    name,
                    args,
                    body,
                    location,
                })
            }
            _ => Ok(Statement::Expr(expr)),
        }
    }

    /// `import a.b.C`, `import a.b.*` or `import a.b.C as D`.
    fn import(&mut self, location: Location) -> ConfigResult<Statement> {
        self.advance();
        let mut path = vec![self.ident("a package name")?];
        while self.peek().kind == TokenKind::Dot {
            self.advance();
            if self.peek().kind == TokenKind::Star {
                self.advance();
                path.push("*".to_string());
                break;
            }
            path.push(self.ident("an identifier after '.'")?);
        }
        if self.at_keyword("as") {
            self.advance();
            self.ident("an import alias")?;
        }
        Ok(Statement::Import { path, location })
    }

    /// `val name = value`, with an optional `: Type` annotation.
    fn local(&mut self, location: Location) -> ConfigResult<Statement> {
        let mutable = self.at_keyword("var");
        self.advance();
        let name = self.ident("a variable name")?;
        if self.peek().kind == TokenKind::Colon {
            self.advance();
            self.ident("a type name")?;
            while self.peek().kind == TokenKind::Dot {
                self.advance();
                self.ident("an identifier after '.'")?;
            }
        }
        self.expect(TokenKind::Eq, "'='")?;
        let value = self.expression(true)?;
        Ok(Statement::Local {
            name,
            mutable,
            value,
            location,
        })
    }

    /// `lambdas` enables trailing lambdas; statement heads parse without them
    /// so `android {` opens a block.
    fn expression(&mut self, lambdas: bool) -> ConfigResult<Expr> {
        self.nested(|p| p.infix(lambdas))
    }

    fn infix(&mut self, lambdas: bool) -> ConfigResult<Expr> {
        let mut lhs = self.postfix(lambdas)?;
        while let TokenKind::Ident(op) = &self.peek().kind {
            let op = op.clone();
            self.advance();
            let rhs = self.postfix(lambdas)?;
            let location = lhs.location;
            lhs = Expr::new(
                ExprKind::Infix {
                    lhs: Box::new(lhs),
                    op,
                    rhs: Box::new(rhs),
                },
                location,
            );
        }
        Ok(lhs)
    }

    fn postfix(&mut self, lambdas: bool) -> ConfigResult<Expr> {
        let mut expr = self.primary()?;
        loop {
            let location = expr.location;
            match self.peek().kind {
                TokenKind::Dot | TokenKind::SafeDot => {
                    let safe = self.peek().kind == TokenKind::SafeDot;
                    self.advance();
                    let name = self.ident("an identifier after '.'")?;

                    if self.peek().kind == TokenKind::LParen {
                        self.advance();
                        let args = self.arguments()?;
                        expr = Expr::new(
                            ExprKind::Call {
                                receiver: Some(Box::new(expr)),
                                name,
                                args,
                            },
                            location,
                        );
                    } else {
                        expr = match expr.kind {
                            ExprKind::Path(mut segments) if !safe => {
                                segments.push(name);
                                Expr::new(ExprKind::Path(segments), location)
                            }
                            other => Expr::new(
                                ExprKind::Member {
                                    receiver: Box::new(Expr::new(other, location)),
                                    name,
                                },
                                location,
                            ),
                        };
                    }
                }
                TokenKind::LParen => {
                    let name = match &expr.kind {
                        ExprKind::Path(segments) if segments.len() == 1 => segments[0].clone(),
                        _ => {
                            return Err(ConfigError::malformed(
                                location,
                                format!("'{}' cannot be called", expr.describe()),
                            ));
                        }
                    };
                    self.advance();
                    let args = self.arguments()?;
                    expr = Expr::new(
                        ExprKind::Call {
                            receiver: None,
                            name,
                            args,
                        },
                        location,
                    );
                }
                TokenKind::LBracket => {
                    self.advance();
                    self.skip_newlines();
                    let index = self.expression(true)?;
                    self.skip_newlines();
                    self.expect(TokenKind::RBracket, "']'")?;
                    expr = Expr::new(
                        ExprKind::Index {
                            receiver: Box::new(expr),
                            index: Box::new(index),
                        },
                        location,
                    );
                }
                TokenKind::LBrace if lambdas && takes_lambda(&expr) => {
                    let brace = self.peek().location;
                    self.advance();
                    let lambda = Expr::new(ExprKind::Lambda(self.block_body()?), brace);
                    expr = with_trailing_lambda(expr, lambda);
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Parse call arguments; the opening parenthesis is already consumed.
    fn arguments(&mut self) -> ConfigResult<Vec<Expr>> {
        let mut args = Vec::new();
        loop {
            self.skip_newlines();
            if self.peek().kind == TokenKind::RParen {
                self.advance();
                return Ok(args);
            }

            let arg = match self.named_argument() {
                Some(name) => {
                    let location = self.peek().location;
                    self.advance();
                    self.advance();
                    let value = self.expression(true)?;
                    Expr::new(
                        ExprKind::Named {
                            name,
                            value: Box::new(value),
                        },
                        location,
                    )
                }
                None => self.expression(true)?,
            };
            args.push(arg);
            self.skip_newlines();

            match self.peek().kind {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::RParen => {}
                _ => return Err(self.unexpected("',' or ')'")),
            }
        }
    }

    /// The name of a `name = value` argument starting at the current token.
    fn named_argument(&self) -> Option<String> {
        match (&self.peek().kind, self.peek_second()) {
            (TokenKind::Ident(name), TokenKind::Eq) => Some(name.clone()),
            _ => None,
        }
    }

    fn primary(&mut self) -> ConfigResult<Expr> {
        let token = self.peek().clone();
        let kind = match token.kind {
            TokenKind::Str(s) => ExprKind::Str(s),
            TokenKind::Int(n) => ExprKind::Int(n),
            TokenKind::Ident(name) if name == "true" => ExprKind::Bool(true),
            TokenKind::Ident(name) if name == "false" => ExprKind::Bool(false),
            TokenKind::Ident(name) => ExprKind::Path(vec![name]),
            TokenKind::LParen => {
                self.advance();
                self.skip_newlines();
                let inner = self.expression(true)?;
                self.skip_newlines();
                self.expect(TokenKind::RParen, "')'")?;
                return Ok(inner);
            }
            _ => return Err(self.unexpected("an expression")),
        };
        self.advance();
        Ok(Expr::new(kind, token.location))
    }
}

fn takes_lambda(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Path(_) | ExprKind::Call { .. } | ExprKind::Member { .. }
    )
}

/// `x.let { }` becomes the call `x.let({ })`; `f(a) { }` gains a last argument.
fn with_trailing_lambda(expr: Expr, lambda: Expr) -> Expr {
    let location = expr.location;
    let kind = match expr.kind {
        ExprKind::Path(mut segments) => {
            let name = segments.pop().unwrap_or_default();
            let receiver = (!segments.is_empty())
                .then(|| Box::new(Expr::new(ExprKind::Path(segments), location)));
            ExprKind::Call {
                receiver,
                name,
                args: vec![lambda],
            }
        }
        ExprKind::Call {
            receiver,
            name,
            mut args,
        } => {
            args.push(lambda);
            ExprKind::Call {
                receiver,
                name,
                args,
            }
        }
        ExprKind::Member { receiver, name } => ExprKind::Call {
            receiver: Some(receiver),
            name,
            args: vec![lambda],
        },
        other => other,
    };
    Expr::new(kind, location)
}
