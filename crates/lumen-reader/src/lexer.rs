// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 The Lumen Project Authors

//! Lexer for Lumen source code.
//!
//! Converts source text into a flat token stream, tracking line numbers
//! for diagnostics.

use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

use crate::token::{Token, TokenKind};

/// A lexical error: invalid character or an unterminated string literal.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LexError {
    /// An input byte that starts no valid token.
    #[error("line {line}: invalid character '{ch}'")]
    InvalidCharacter {
        /// The offending character.
        ch: char,
        /// The 1-based line it appeared on.
        line: u32,
    },
    /// A string literal with no closing quote before end of input or
    /// end of line.
    #[error("line {line}: unterminated string literal")]
    UnterminatedString {
        /// The line the string literal started on.
        line: u32,
    },
}

/// Tokenizes `source` into a flat stream terminated by [`TokenKind::Eof`].
///
/// # Errors
///
/// Returns the first [`LexError`] encountered.
pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: u32,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            let line = self.line;
            let Some(ch) = self.chars.next() else {
                tokens.push(Token::new(TokenKind::Eof, line));
                return Ok(tokens);
            };
            let kind = self.lex_token(ch, line)?;
            tokens.push(Token::new(kind, line));
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.chars.peek() {
                Some('\n') => {
                    self.line += 1;
                    self.chars.next();
                }
                Some(c) if c.is_whitespace() => {
                    self.chars.next();
                }
                Some('/') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    if lookahead.peek() == Some(&'/') {
                        self.chars.next();
                        self.chars.next();
                        for c in self.chars.by_ref() {
                            if c == '\n' {
                                self.line += 1;
                                break;
                            }
                        }
                    } else {
                        return;
                    }
                }
                _ => return,
            }
        }
    }

    fn lex_token(&mut self, ch: char, line: u32) -> Result<TokenKind, LexError> {
        match ch {
            '(' => Ok(TokenKind::LParen),
            ')' => Ok(TokenKind::RParen),
            '{' => Ok(TokenKind::LBrace),
            '}' => Ok(TokenKind::RBrace),
            '[' => Ok(TokenKind::LBracket),
            ']' => Ok(TokenKind::RBracket),
            ';' => Ok(TokenKind::Semicolon),
            ',' => Ok(TokenKind::Comma),
            '+' => Ok(TokenKind::Plus),
            '-' => Ok(TokenKind::Minus),
            '*' => Ok(TokenKind::Star),
            '/' => Ok(TokenKind::Slash),
            '%' => Ok(TokenKind::Percent),
            '=' => Ok(self.one_or_two('=', TokenKind::Assign, TokenKind::EqEq)),
            '!' => Ok(self.one_or_two('=', TokenKind::Bang, TokenKind::NotEq)),
            '<' => Ok(self.one_or_two('=', TokenKind::Lt, TokenKind::Le)),
            '>' => Ok(self.one_or_two('=', TokenKind::Gt, TokenKind::Ge)),
            '&' => self.expect_second('&', TokenKind::AndAnd, line),
            '|' => self.expect_second('|', TokenKind::OrOr, line),
            '"' => self.lex_string(line),
            c if c.is_ascii_digit() => Ok(self.lex_number(c)),
            c if c.is_alphabetic() || c == '_' => Ok(self.lex_ident_or_keyword(c)),
            c => Err(LexError::InvalidCharacter { ch: c, line }),
        }
    }

    /// Consume `second` if it follows immediately, yielding `two`; otherwise
    /// yield `one` without consuming anything further.
    fn one_or_two(&mut self, second: char, one: TokenKind, two: TokenKind) -> TokenKind {
        if self.chars.peek() == Some(&second) {
            self.chars.next();
            two
        } else {
            one
        }
    }

    fn expect_second(
        &mut self,
        second: char,
        kind: TokenKind,
        line: u32,
    ) -> Result<TokenKind, LexError> {
        if self.chars.peek() == Some(&second) {
            self.chars.next();
            Ok(kind)
        } else {
            Err(LexError::InvalidCharacter {
                ch: second,
                line,
            })
        }
    }

    fn lex_string(&mut self, line: u32) -> Result<TokenKind, LexError> {
        let mut s = String::new();
        loop {
            match self.chars.next() {
                Some('"') => return Ok(TokenKind::String(s)),
                Some('\n') | None => return Err(LexError::UnterminatedString { line }),
                Some('\\') => match self.chars.next() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('"') => s.push('"'),
                    Some('\\') => s.push('\\'),
                    Some(other) => s.push(other),
                    None => return Err(LexError::UnterminatedString { line }),
                },
                Some(c) => s.push(c),
            }
        }
    }

    fn lex_number(&mut self, first: char) -> TokenKind {
        let mut text = String::from(first);
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        let mut is_float = false;
        if self.chars.peek() == Some(&'.') {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            if lookahead.peek().is_some_and(char::is_ascii_digit) {
                is_float = true;
                text.push('.');
                self.chars.next();
                while let Some(&c) = self.chars.peek() {
                    if c.is_ascii_digit() {
                        text.push(c);
                        self.chars.next();
                    } else {
                        break;
                    }
                }
            }
        }
        if is_float {
            TokenKind::Float(text.parse().unwrap_or(0.0))
        } else {
            TokenKind::Int(text.parse().unwrap_or(0))
        }
    }

    fn lex_ident_or_keyword(&mut self, first: char) -> TokenKind {
        let mut text = String::from(first);
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        match text.as_str() {
            "fn" => TokenKind::Fn,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "return" => TokenKind::Return,
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            _ => TokenKind::Ident(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src)
            .expect("lex should succeed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_simple_arithmetic() {
        assert_eq!(
            kinds("1 + 2 * 3"),
            vec![
                TokenKind::Int(1),
                TokenKind::Plus,
                TokenKind::Int(2),
                TokenKind::Star,
                TokenKind::Int(3),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_keywords_and_identifiers() {
        assert_eq!(
            kinds("fn foo"),
            vec![TokenKind::Fn, TokenKind::Ident("foo".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn lexes_two_char_operators() {
        assert_eq!(
            kinds("a == b != c && d || !e"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::EqEq,
                TokenKind::Ident("b".into()),
                TokenKind::NotEq,
                TokenKind::Ident("c".into()),
                TokenKind::AndAnd,
                TokenKind::Ident("d".into()),
                TokenKind::OrOr,
                TokenKind::Bang,
                TokenKind::Ident("e".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_float_literal() {
        assert_eq!(kinds("3.14"), vec![TokenKind::Float(3.14), TokenKind::Eof]);
    }

    #[test]
    fn tracks_line_numbers() {
        let tokens = lex("1\n2\n3").expect("lex should succeed");
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[2].line, 3);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert_eq!(
            lex("\"abc"),
            Err(LexError::UnterminatedString { line: 1 })
        );
    }

    #[test]
    fn invalid_character_is_an_error() {
        assert_eq!(
            lex("1 @ 2"),
            Err(LexError::InvalidCharacter { ch: '@', line: 1 })
        );
    }

    #[test]
    fn skips_line_comments() {
        assert_eq!(
            kinds("1 // comment\n2"),
            vec![TokenKind::Int(1), TokenKind::Int(2), TokenKind::Eof]
        );
    }

    #[test]
    fn lexes_string_with_escapes() {
        assert_eq!(
            kinds(r#""a\nb""#),
            vec![TokenKind::String("a\nb".into()), TokenKind::Eof]
        );
    }
}
