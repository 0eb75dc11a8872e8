// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 The Lumen Project Authors

//! Recursive-descent parser: token stream to [`Program`].
//!
//! Standard C-like precedence, lowest to highest: `||`, `&&`, equality
//! (`==`/`!=`), relational (`<`/`<=`/`>`/`>=`), additive (`+`/`-`),
//! multiplicative (`*`/`/`/`%`), unary (`!`/`-`), primary.

use lumen_bytecode::ValueType;
use thiserror::Error;

use crate::ast::{BinOp, Expr, FunctionDecl, Param, Program, Stmt, UnOp};
use crate::token::{Token, TokenKind};

/// A syntactic error: an unexpected token, missing punctuation, or a
/// malformed declaration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// A token appeared where the grammar did not allow it.
    #[error("line {line}: unexpected {found}, expected {expected}")]
    UnexpectedToken {
        /// What the parser was looking for.
        expected: String,
        /// What it found instead.
        found: TokenKind,
        /// The offending line.
        line: u32,
    },
    /// A type name was expected but the identifier did not name one of
    /// `int`, `float`, `bool`, `string`, `void`.
    #[error("line {line}: unknown type name `{name}`")]
    UnknownType {
        /// The unrecognized name.
        name: String,
        /// The offending line.
        line: u32,
    },
}

/// Parse a token stream (as produced by [`crate::lexer::lex`]) into a
/// [`Program`].
///
/// # Errors
///
/// Returns the first [`ParseError`] encountered.
pub fn parse(tokens: Vec<Token>) -> Result<Program, ParseError> {
    Parser::new(tokens).parse_program()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn expect(&mut self, kind: &TokenKind, expected: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let found = self.peek().kind.clone();
            let line = self.peek().line;
            Err(ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found,
                line,
            })
        }
    }

    fn expect_ident(&mut self) -> Result<(String, u32), ParseError> {
        let tok = self.peek().clone();
        if let TokenKind::Ident(name) = tok.kind {
            self.advance();
            Ok((name, tok.line))
        } else {
            Err(ParseError::UnexpectedToken {
                expected: "identifier".to_string(),
                found: tok.kind,
                line: tok.line,
            })
        }
    }

    fn expect_type_name(&mut self) -> Result<ValueType, ParseError> {
        let (name, line) = self.expect_ident()?;
        ValueType::from_name(&name).ok_or(ParseError::UnknownType { name, line })
    }

    fn peek_nth(&self, offset: usize) -> &TokenKind {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut functions = Vec::new();
        while self.check(&TokenKind::Fn) {
            functions.push(self.parse_function_decl()?);
        }
        let mut top_level = Vec::new();
        while !self.check(&TokenKind::Eof) {
            top_level.push(self.parse_stmt()?);
        }
        Ok(Program {
            functions,
            top_level,
        })
    }

    fn parse_function_decl(&mut self) -> Result<FunctionDecl, ParseError> {
        let fn_tok = self.expect(&TokenKind::Fn, "`fn`")?;
        let (name, _) = self.expect_ident()?;
        self.expect(&TokenKind::LParen, "`(`")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                let (pname, _) = self.expect_ident()?;
                let ty = self.expect_type_name()?;
                params.push(Param { name: pname, ty });
                if self.check(&TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen, "`)`")?;
        let return_type = if matches!(self.peek().kind, TokenKind::Ident(_)) {
            self.expect_type_name()?
        } else {
            ValueType::Void
        };
        let body = self.parse_block()?;
        Ok(FunctionDecl {
            name,
            params,
            return_type,
            body,
            line: fn_tok.line,
        })
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(&TokenKind::LBrace, "`{`")?;
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            stmts.push(self.parse_stmt()?);
        }
        self.expect(&TokenKind::RBrace, "`}`")?;
        Ok(stmts)
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match &self.peek().kind {
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Ident(_) if self.is_decl_start() => self.parse_decl_stmt(),
            TokenKind::Ident(_) if self.is_assignment_start() => self.parse_assign_stmt(),
            _ => {
                let expr = self.parse_expr()?;
                self.expect(&TokenKind::Semicolon, "`;`")?;
                Ok(Stmt::ExprStmt(expr))
            }
        }
    }

    /// Whether the identifier at the cursor begins a declaration: Lumen
    /// declarations are name-first (`r int;`, `arr int[3];`), so the type
    /// name is the *next* token, never the current one.
    fn is_decl_start(&self) -> bool {
        matches!(self.peek_nth(1), TokenKind::Ident(name) if ValueType::from_name(name).is_some())
    }

    /// Whether the identifier at the cursor begins `name = ...` or
    /// `name[index] = ...`, as opposed to an expression statement (a call,
    /// or a bare array read that is otherwise pointless but not a syntax
    /// error). Requires scanning past a balanced `[...]` in the array
    /// case, since the index expression can itself contain brackets.
    fn is_assignment_start(&self) -> bool {
        match self.peek_nth(1) {
            TokenKind::Assign => true,
            TokenKind::LBracket => self.bracket_closes_into_assign(1),
            _ => false,
        }
    }

    /// Given the offset of a `[` relative to the cursor, scan to its
    /// matching `]` and report whether the token right after it is `=`.
    fn bracket_closes_into_assign(&self, open_offset: usize) -> bool {
        let mut depth: i32 = 0;
        let mut offset = open_offset;
        loop {
            match self.peek_nth(offset) {
                TokenKind::LBracket => depth += 1,
                TokenKind::RBracket => {
                    depth -= 1;
                    if depth == 0 {
                        return matches!(self.peek_nth(offset + 1), TokenKind::Assign);
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            offset += 1;
        }
    }

    /// `name type;` or `name elemType[length];`
    fn parse_decl_stmt(&mut self) -> Result<Stmt, ParseError> {
        let (name, line) = self.expect_ident()?;
        let ty = self.expect_type_name()?;
        if self.check(&TokenKind::LBracket) {
            self.advance();
            let length = self.parse_expr()?;
            self.expect(&TokenKind::RBracket, "`]`")?;
            self.expect(&TokenKind::Semicolon, "`;`")?;
            Ok(Stmt::ArrayDecl {
                name,
                elem_ty: ty,
                length,
                line,
            })
        } else {
            self.expect(&TokenKind::Semicolon, "`;`")?;
            Ok(Stmt::VarDecl { name, ty, line })
        }
    }

    /// `name = value;` or `name[index] = value;`
    fn parse_assign_stmt(&mut self) -> Result<Stmt, ParseError> {
        let (name, line) = self.expect_ident()?;
        if self.check(&TokenKind::LBracket) {
            self.advance();
            let index = self.parse_expr()?;
            self.expect(&TokenKind::RBracket, "`]`")?;
            self.expect(&TokenKind::Assign, "`=`")?;
            let value = self.parse_expr()?;
            self.expect(&TokenKind::Semicolon, "`;`")?;
            return Ok(Stmt::ArrayAssign {
                name,
                index,
                value,
                line,
            });
        }
        self.expect(&TokenKind::Assign, "`=`")?;
        let value = self.parse_expr()?;
        self.expect(&TokenKind::Semicolon, "`;`")?;
        Ok(Stmt::Assign { name, value, line })
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let tok = self.expect(&TokenKind::If, "`if`")?;
        self.expect(&TokenKind::LParen, "`(`")?;
        let cond = self.parse_expr()?;
        self.expect(&TokenKind::RParen, "`)`")?;
        let then_branch = self.parse_block()?;
        let else_branch = if self.check(&TokenKind::Else) {
            self.advance();
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
            line: tok.line,
        })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let tok = self.expect(&TokenKind::For, "`for`")?;
        self.expect(&TokenKind::LParen, "`(`")?;
        let init = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_ident_led_stmt_without_semicolon_check()?))
        };
        self.expect(&TokenKind::Semicolon, "`;`")?;
        let cond = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(&TokenKind::Semicolon, "`;`")?;
        let post = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(Box::new(self.parse_bare_assign()?))
        };
        self.expect(&TokenKind::RParen, "`)`")?;
        let body = self.parse_block()?;
        Ok(Stmt::For {
            init,
            cond,
            post,
            body,
            line: tok.line,
        })
    }

    /// Parse the `init` clause of a `for`, which is itself a declaration
    /// or assignment but — unlike a standalone statement — is not
    /// terminated by the statement's own semicolon (the `for` header's
    /// semicolon is consumed by the caller).
    fn parse_ident_led_stmt_without_semicolon_check(&mut self) -> Result<Stmt, ParseError> {
        let (name, line) = self.expect_ident()?;
        if let TokenKind::Ident(type_name) = &self.peek().kind {
            if ValueType::from_name(type_name).is_some() {
                let ty = self.expect_type_name()?;
                return Ok(Stmt::VarDecl { name, ty, line });
            }
        }
        self.expect(&TokenKind::Assign, "`=`")?;
        let value = self.parse_expr()?;
        Ok(Stmt::Assign { name, value, line })
    }

    /// Parse the `post` clause of a `for`: always a bare assignment
    /// (`i = i + 1`), with no trailing semicolon.
    fn parse_bare_assign(&mut self) -> Result<Stmt, ParseError> {
        let (name, line) = self.expect_ident()?;
        if self.check(&TokenKind::LBracket) {
            self.advance();
            let index = self.parse_expr()?;
            self.expect(&TokenKind::RBracket, "`]`")?;
            self.expect(&TokenKind::Assign, "`=`")?;
            let value = self.parse_expr()?;
            return Ok(Stmt::ArrayAssign {
                name,
                index,
                value,
                line,
            });
        }
        self.expect(&TokenKind::Assign, "`=`")?;
        let value = self.parse_expr()?;
        Ok(Stmt::Assign { name, value, line })
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        let tok = self.expect(&TokenKind::Return, "`return`")?;
        if self.check(&TokenKind::Semicolon) {
            self.advance();
            return Ok(Stmt::Return {
                value: None,
                line: tok.line,
            });
        }
        let value = self.parse_expr()?;
        self.expect(&TokenKind::Semicolon, "`;`")?;
        Ok(Stmt::Return {
            value: Some(value),
            line: tok.line,
        })
    }

    // -- Expressions, by precedence tier -----------------------------------

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_and()?;
        while self.check(&TokenKind::OrOr) {
            let line = self.advance().line;
            let rhs = self.parse_and()?;
            lhs = Expr::Binary {
                op: BinOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_equality()?;
        while self.check(&TokenKind::AndAnd) {
            let line = self.advance().line;
            let rhs = self.parse_equality()?;
            lhs = Expr::Binary {
                op: BinOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::NotEq => BinOp::Neq,
                _ => break,
            };
            let line = self.advance().line;
            let rhs = self.parse_relational()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Le => BinOp::Le,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Ge => BinOp::Ge,
                _ => break,
            };
            let line = self.advance().line;
            let rhs = self.parse_additive()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let line = self.advance().line;
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            let line = self.advance().line;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        match &self.peek().kind {
            TokenKind::Minus => {
                let line = self.advance().line;
                let expr = self.parse_unary()?;
                Ok(Expr::Unary {
                    op: UnOp::Neg,
                    expr: Box::new(expr),
                    line,
                })
            }
            TokenKind::Bang => {
                let line = self.advance().line;
                let expr = self.parse_unary()?;
                Ok(Expr::Unary {
                    op: UnOp::Not,
                    expr: Box::new(expr),
                    line,
                })
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::Int(n) => Ok(Expr::Int(n)),
            TokenKind::Float(x) => Ok(Expr::Float(x)),
            TokenKind::Bool(b) => Ok(Expr::Bool(b)),
            TokenKind::String(s) => Ok(Expr::Str(s)),
            TokenKind::LParen => {
                let expr = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "`)`")?;
                Ok(expr)
            }
            TokenKind::Ident(name) => {
                if self.check(&TokenKind::LParen) {
                    self.parse_call_tail(name, tok.line)
                } else if self.check(&TokenKind::LBracket) {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(&TokenKind::RBracket, "`]`")?;
                    Ok(Expr::ArrayIndex {
                        name,
                        index: Box::new(index),
                        line: tok.line,
                    })
                } else {
                    Ok(Expr::Ident {
                        name,
                        line: tok.line,
                    })
                }
            }
            found => Err(ParseError::UnexpectedToken {
                expected: "expression".to_string(),
                found,
                line: tok.line,
            }),
        }
    }

    fn parse_call_tail(&mut self, callee: String, line: u32) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LParen, "`(`")?;
        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if self.check(&TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen, "`)`")?;
        Ok(Expr::Call { callee, args, line })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn parse_src(src: &str) -> Program {
        parse(lex(src).expect("lex ok")).expect("parse ok")
    }

    #[test]
    fn parses_function_and_call() {
        let program = parse_src("fn f(x int) int { return x + 1; } r int; r = f(41); print(r);");
        assert_eq!(program.functions.len(), 1);
        assert_eq!(program.functions[0].name, "f");
        assert_eq!(program.functions[0].params[0].ty, ValueType::Int);
        assert_eq!(program.top_level.len(), 2);
    }

    #[test]
    fn parses_array_decl_and_index() {
        let program = parse_src("arr int[3]; arr[0] = 10; print(arr[0]);");
        assert!(matches!(program.top_level[0], Stmt::ArrayDecl { .. }));
        assert!(matches!(program.top_level[1], Stmt::ArrayAssign { .. }));
    }

    #[test]
    fn parses_for_loop() {
        let program = parse_src("i int; for (i=0;i<3;i=i+1) { print(i); }");
        assert!(matches!(program.top_level[1], Stmt::For { .. }));
    }

    #[test]
    fn parses_if_else() {
        let program = parse_src("if (1 < 2) { print(1); } else { print(2); }");
        assert!(matches!(program.top_level[0], Stmt::If { else_branch: Some(_), .. }));
    }

    #[test]
    fn operator_precedence_groups_multiplication_first() {
        let program = parse_src("print(1 + 2 * 3);");
        let Stmt::ExprStmt(Expr::Call { args, .. }) = &program.top_level[0] else {
            panic!("expected call");
        };
        let Expr::Binary { op: BinOp::Add, rhs, .. } = &args[0] else {
            panic!("expected addition at the top");
        };
        assert!(matches!(**rhs, Expr::Binary { op: BinOp::Mul, .. }));
    }

    #[test]
    fn unknown_type_name_is_an_error() {
        let tokens = lex("x bogus;").expect("lex ok");
        assert!(matches!(
            parse(tokens),
            Err(ParseError::UnknownType { .. })
        ));
    }
}
