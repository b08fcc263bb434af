use std::ops::Range;

use crate::parser::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    // Literals
    Number(f64),
    StringLit(String),
    Ident(String),

    // Keywords
    Var,
    Function,
    Return,
    If,
    Else,
    While,
    For,
    Of,
    Break,
    Continue,
    True,
    False,
    Undefined,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Eq,       // =
    EqEq,     // == and ===
    BangEq,   // != and !==
    Gt,
    Lt,
    GtEq,
    LtEq,
    AmpAmp,   // &&
    PipePipe, // ||
    PlusEq,   // +=
    MinusEq,  // -=
    PlusPlus, // ++
    MinusMinus, // --
    Dot,
    Comma,
    Semicolon,

    // Grouping
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
}

impl Token {
    /// Human-readable form used in "expected X, found Y" messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number `{n}`"),
            Token::StringLit(_) => "string literal".to_string(),
            Token::Ident(name) => format!("identifier `{name}`"),
            other => format!("`{}`", other.text()),
        }
    }

    fn text(&self) -> &'static str {
        match self {
            Token::Var => "var",
            Token::Function => "function",
            Token::Return => "return",
            Token::If => "if",
            Token::Else => "else",
            Token::While => "while",
            Token::For => "for",
            Token::Of => "of",
            Token::Break => "break",
            Token::Continue => "continue",
            Token::True => "true",
            Token::False => "false",
            Token::Undefined => "undefined",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Bang => "!",
            Token::Eq => "=",
            Token::EqEq => "==",
            Token::BangEq => "!=",
            Token::Gt => ">",
            Token::Lt => "<",
            Token::GtEq => ">=",
            Token::LtEq => "<=",
            Token::AmpAmp => "&&",
            Token::PipePipe => "||",
            Token::PlusEq => "+=",
            Token::MinusEq => "-=",
            Token::PlusPlus => "++",
            Token::MinusMinus => "--",
            Token::Dot => ".",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Number(_) | Token::StringLit(_) | Token::Ident(_) => "",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Spanned {
    pub token: Token,
    pub span: Range<usize>,
}

fn keyword(ident: &str) -> Option<Token> {
    Some(match ident {
        "var" => Token::Var,
        "function" => Token::Function,
        "return" => Token::Return,
        "if" => Token::If,
        "else" => Token::Else,
        "while" => Token::While,
        "for" => Token::For,
        "of" => Token::Of,
        "break" => Token::Break,
        "continue" => Token::Continue,
        "true" => Token::True,
        "false" => Token::False,
        "undefined" => Token::Undefined,
        _ => return None,
    })
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Split source text into tokens. Lexing stops at the first malformed token.
pub(crate) fn tokenize(source: &str, file_id: usize) -> Result<Vec<Spanned>, ParseError> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let len = chars.len();
    let offset_at = |i: usize| chars.get(i).map(|(o, _)| *o).unwrap_or(source.len());
    let char_at = |i: usize| chars.get(i).map(|(_, c)| *c);

    let mut tokens = Vec::new();
    let mut i = 0;

    while i < len {
        let start = i;
        let c = chars[i].1;

        // Whitespace and comments
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c == '/' && char_at(i + 1) == Some('/') {
            while i < len && chars[i].1 != '\n' {
                i += 1;
            }
            continue;
        }
        if c == '/' && char_at(i + 1) == Some('*') {
            i += 2;
            loop {
                if i >= len {
                    return Err(ParseError::error(
                        "unterminated block comment",
                        offset_at(start)..source.len(),
                        file_id,
                    ));
                }
                if chars[i].1 == '*' && char_at(i + 1) == Some('/') {
                    i += 2;
                    break;
                }
                i += 1;
            }
            continue;
        }

        let token = match c {
            '0'..='9' | '.' if c != '.' || char_at(i + 1).is_some_and(|d| d.is_ascii_digit()) => {
                while i < len && chars[i].1.is_ascii_digit() {
                    i += 1;
                }
                if char_at(i) == Some('.') && char_at(i + 1).is_some_and(|d| d.is_ascii_digit()) {
                    i += 1;
                    while i < len && chars[i].1.is_ascii_digit() {
                        i += 1;
                    }
                }
                if matches!(char_at(i), Some('e' | 'E')) {
                    let mut j = i + 1;
                    if matches!(char_at(j), Some('+' | '-')) {
                        j += 1;
                    }
                    if char_at(j).is_some_and(|d| d.is_ascii_digit()) {
                        i = j;
                        while i < len && chars[i].1.is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text = &source[offset_at(start)..offset_at(i)];
                match text.parse::<f64>() {
                    Ok(n) => Token::Number(n),
                    Err(_) => {
                        return Err(ParseError::error(
                            format!("invalid number literal `{text}`"),
                            offset_at(start)..offset_at(i),
                            file_id,
                        ));
                    }
                }
            }

            '"' | '\'' => {
                let quote = c;
                i += 1;
                let mut value = String::new();
                loop {
                    match char_at(i) {
                        None | Some('\n') => {
                            return Err(ParseError::error(
                                "unterminated string literal",
                                offset_at(start)..offset_at(i),
                                file_id,
                            )
                            .with_note("string literals must close on the same line"));
                        }
                        Some(q) if q == quote => {
                            i += 1;
                            break;
                        }
                        Some('\\') => {
                            let escaped = match char_at(i + 1) {
                                Some('n') => '\n',
                                Some('t') => '\t',
                                Some('r') => '\r',
                                Some('0') => '\0',
                                Some(other) => other,
                                None => '\\',
                            };
                            value.push(escaped);
                            i += 2;
                        }
                        Some(other) => {
                            value.push(other);
                            i += 1;
                        }
                    }
                }
                Token::StringLit(value)
            }

            c if is_ident_start(c) => {
                while i < len && is_ident_continue(chars[i].1) {
                    i += 1;
                }
                let ident = &source[offset_at(start)..offset_at(i)];
                keyword(ident).unwrap_or_else(|| Token::Ident(ident.to_string()))
            }

            _ => {
                let next = char_at(i + 1);
                let (token, width) = match (c, next) {
                    ('=', Some('=')) if char_at(i + 2) == Some('=') => (Token::EqEq, 3),
                    ('!', Some('=')) if char_at(i + 2) == Some('=') => (Token::BangEq, 3),
                    ('=', Some('=')) => (Token::EqEq, 2),
                    ('!', Some('=')) => (Token::BangEq, 2),
                    ('>', Some('=')) => (Token::GtEq, 2),
                    ('<', Some('=')) => (Token::LtEq, 2),
                    ('&', Some('&')) => (Token::AmpAmp, 2),
                    ('|', Some('|')) => (Token::PipePipe, 2),
                    ('+', Some('=')) => (Token::PlusEq, 2),
                    ('-', Some('=')) => (Token::MinusEq, 2),
                    ('+', Some('+')) => (Token::PlusPlus, 2),
                    ('-', Some('-')) => (Token::MinusMinus, 2),
                    ('=', _) => (Token::Eq, 1),
                    ('!', _) => (Token::Bang, 1),
                    ('>', _) => (Token::Gt, 1),
                    ('<', _) => (Token::Lt, 1),
                    ('+', _) => (Token::Plus, 1),
                    ('-', _) => (Token::Minus, 1),
                    ('*', _) => (Token::Star, 1),
                    ('/', _) => (Token::Slash, 1),
                    ('%', _) => (Token::Percent, 1),
                    ('.', _) => (Token::Dot, 1),
                    (',', _) => (Token::Comma, 1),
                    (';', _) => (Token::Semicolon, 1),
                    ('(', _) => (Token::LParen, 1),
                    (')', _) => (Token::RParen, 1),
                    ('{', _) => (Token::LBrace, 1),
                    ('}', _) => (Token::RBrace, 1),
                    ('[', _) => (Token::LBracket, 1),
                    (']', _) => (Token::RBracket, 1),
                    _ => {
                        return Err(ParseError::error(
                            format!("unexpected character `{c}`"),
                            offset_at(start)..offset_at(start + 1),
                            file_id,
                        ));
                    }
                };
                i += width;
                token
            }
        };

        tokens.push(Spanned {
            token,
            span: offset_at(start)..offset_at(i),
        });
    }

    Ok(tokens)
}
