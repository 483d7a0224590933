// File: src/lexer.rs
//
// Lexical analyzer (tokenizer) for the Soutk programming language.
// Converts source code text into a stream of tokens for parsing.
//
// Soutk is line-oriented: one logical statement per line, so newlines are
// emitted as tokens and act as statement boundaries. Supports:
// - Keywords: summon, chant, spell, cast, forge, enchant, conjure, ward,
//   rescue, stride, loop, scroll, inscribe, append, invoke, and friends
// - Identifiers, integer and float literals
// - String literals in both quote styles (no escape processing; the text
//   between the quotes is taken literally)
// - Operators: + - * / % = == != < > <= >= && || !
// - Punctuation: ( ) { } [ ] , ; : .
// - Comments starting with //

use crate::errors::SoutkError;
use once_cell::sync::Lazy;
use std::collections::HashSet;

static KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "summon", "chant", "if", "else", "while", "do", "for", "stride", "loop", "spell", "cast",
        "forge", "enchant", "conjure", "ward", "rescue", "return", "break", "continue", "scroll",
        "inscribe", "append", "invoke", "from", "to", "into", "with", "as", "not",
    ]
    .into_iter()
    .collect()
});

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Identifier(String),
    Keyword(String),
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Operator(String),
    Punct(char),
    Newline,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, line: usize) -> Self {
        Token { kind, text: text.into(), line }
    }
}

/// Tokenizes Soutk source code into a vector of tokens.
///
/// Processes the input character by character. Comments starting with // are
/// skipped until end of line; the newline itself is kept because statement
/// boundaries are line boundaries.
///
/// # Errors
/// Returns a `LexError` for an unterminated string literal.
pub fn tokenize(source: &str) -> Result<Vec<Token>, SoutkError> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line = 1;

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\r' => {
                chars.next();
            }
            '\n' => {
                chars.next();
                tokens.push(Token::new(TokenKind::Newline, "\n", line));
                line += 1;
            }
            '/' => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    // Line comment: drop up to (not including) the newline
                    while let Some(&ch) = chars.peek() {
                        if ch == '\n' {
                            break;
                        }
                        chars.next();
                    }
                } else {
                    tokens.push(Token::new(TokenKind::Operator("/".into()), "/", line));
                }
            }
            '"' | '\'' => {
                let quote = c;
                chars.next();
                let mut s = String::new();
                let mut terminated = false;
                for ch in chars.by_ref() {
                    if ch == quote {
                        terminated = true;
                        break;
                    }
                    if ch == '\n' {
                        break;
                    }
                    s.push(ch);
                }
                if !terminated {
                    return Err(SoutkError::lex_error(
                        format!("Unterminated string literal starting with {}", quote),
                        line,
                    ));
                }
                tokens.push(Token::new(TokenKind::Str(s.clone()), s, line));
            }
            '0'..='9' => {
                let mut num = String::new();
                let mut is_float = false;
                while let Some(&ch) = chars.peek() {
                    if ch.is_ascii_digit() {
                        num.push(ch);
                        chars.next();
                    } else if ch == '.' && !is_float {
                        // A digit must follow for this to be a float; otherwise
                        // the dot belongs to attribute access (e.g. `3 .`
                        // never occurs, but `arr.length` style dots do).
                        let mut lookahead = chars.clone();
                        lookahead.next();
                        if matches!(lookahead.peek(), Some(d) if d.is_ascii_digit()) {
                            is_float = true;
                            num.push(ch);
                            chars.next();
                        } else {
                            break;
                        }
                    } else {
                        break;
                    }
                }
                let kind = if is_float {
                    TokenKind::Float(num.parse().unwrap_or(0.0))
                } else {
                    TokenKind::Int(num.parse().unwrap_or(0))
                };
                tokens.push(Token::new(kind, num, line));
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let mut ident = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_alphanumeric() || ch == '_' {
                        ident.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }

                let kind = match ident.as_str() {
                    "true" => TokenKind::Bool(true),
                    "false" => TokenKind::Bool(false),
                    k if KEYWORDS.contains(k) => TokenKind::Keyword(ident.clone()),
                    _ => TokenKind::Identifier(ident.clone()),
                };
                tokens.push(Token::new(kind, ident, line));
            }
            '=' | '<' | '>' | '!' => {
                let op = chars.next().unwrap();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    let two = format!("{}=", op);
                    tokens.push(Token::new(TokenKind::Operator(two.clone()), two, line));
                } else {
                    tokens.push(Token::new(TokenKind::Operator(op.to_string()), op.to_string(), line));
                }
            }
            '&' => {
                chars.next();
                if chars.peek() == Some(&'&') {
                    chars.next();
                    tokens.push(Token::new(TokenKind::Operator("&&".into()), "&&", line));
                } else {
                    return Err(SoutkError::lex_error("Unexpected character '&'".into(), line));
                }
            }
            '|' => {
                chars.next();
                if chars.peek() == Some(&'|') {
                    chars.next();
                    tokens.push(Token::new(TokenKind::Operator("||".into()), "||", line));
                } else {
                    return Err(SoutkError::lex_error("Unexpected character '|'".into(), line));
                }
            }
            '+' | '-' | '*' | '%' => {
                chars.next();
                tokens.push(Token::new(TokenKind::Operator(c.to_string()), c.to_string(), line));
            }
            '(' | ')' | '{' | '}' | '[' | ']' | ',' | ';' | ':' | '.' => {
                chars.next();
                tokens.push(Token::new(TokenKind::Punct(c), c.to_string(), line));
            }
            _ => {
                // Stray characters (decorative unicode, etc.) are skipped
                chars.next();
            }
        }
    }

    tokens.push(Token::new(TokenKind::Eof, "", line));

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).expect("lexing should succeed").into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenizes_declaration() {
        assert_eq!(
            kinds("summon x = 5"),
            vec![
                TokenKind::Keyword("summon".into()),
                TokenKind::Identifier("x".into()),
                TokenKind::Operator("=".into()),
                TokenKind::Int(5),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_two_char_operators_and_floats() {
        assert_eq!(
            kinds("a <= 1.5 && b != 2"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::Operator("<=".into()),
                TokenKind::Float(1.5),
                TokenKind::Operator("&&".into()),
                TokenKind::Identifier("b".into()),
                TokenKind::Operator("!=".into()),
                TokenKind::Int(2),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_both_quote_styles_and_comments() {
        assert_eq!(
            kinds("chant 'hi' // ignored\nchant \"yo\""),
            vec![
                TokenKind::Keyword("chant".into()),
                TokenKind::Str("hi".into()),
                TokenKind::Newline,
                TokenKind::Keyword("chant".into()),
                TokenKind::Str("yo".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_line_numbers_advance_with_newlines() {
        let tokens = tokenize("chant 1\nchant 2").expect("lexing should succeed");
        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 1, 1, 2, 2, 2]);
    }

    #[test]
    fn test_unterminated_string_is_error() {
        let err = tokenize("chant \"oops").expect_err("should fail");
        assert!(err.message.contains("Unterminated"));
    }

    #[test]
    fn test_method_call_punctuation() {
        assert_eq!(
            kinds("s.length()"),
            vec![
                TokenKind::Identifier("s".into()),
                TokenKind::Punct('.'),
                TokenKind::Identifier("length".into()),
                TokenKind::Punct('('),
                TokenKind::Punct(')'),
                TokenKind::Eof,
            ]
        );
    }
}
