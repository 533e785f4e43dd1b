use std::fmt;

// ── Token ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literals
    Ident,
    Str,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    // Punctuation
    Assign,
    Colon,
    Comma,
    Dot,
    LParen,
    RParen,
    LBrace,
    RBrace,
    /// `frame`, `var`, `block`, `slot`, `prop`, `data`, `action`, `trigger`, `then`, `props`
    Keyword,
    /// A character the lexer does not understand, or an unterminated string.
    Illegal,
    // Sentinel
    Eof,
}

impl TokenKind {
    /// True for every kind that can stand as a value on the right of `=`.
    pub fn is_value(self) -> bool {
        matches!(
            self,
            TokenKind::Ident
                | TokenKind::Str
                | TokenKind::Boolean
                | TokenKind::Int
                | TokenKind::Long
                | TokenKind::Float
                | TokenKind::Double
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Ident => "an identifier",
            TokenKind::Str => "a string",
            TokenKind::Boolean => "a boolean",
            TokenKind::Int | TokenKind::Long => "an integer",
            TokenKind::Float | TokenKind::Double => "a decimal number",
            TokenKind::Assign => "'='",
            TokenKind::Colon => "':'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Keyword => "a keyword",
            TokenKind::Illegal => "an illegal character",
            TokenKind::Eof => "end of input",
        };
        f.write_str(s)
    }
}

/// A lexed token. `line` and `column` are 1-based and point at the first
/// character of the token (the opening quote for strings).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Keyword && self.literal == word
    }
}

pub const KEYWORDS: &[&str] = &[
    "frame", "var", "slot", "trigger", "prop", "action", "block", "then", "props", "data",
];

/// Integer literals with more digits than this lex as `long`.
pub const MAX_INT_DIGITS: usize = 9;
/// Decimal literals with more fractional digits than this lex as `double`.
pub const MAX_FLOAT_FRACTION_DIGITS: usize = 6;

// ── Lexer ─────────────────────────────────────────────────────────────────

pub struct Lexer<'s> {
    src: &'s str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'s> Lexer<'s> {
    pub fn new(src: &'s str) -> Self {
        Self { src, pos: 0, line: 1, column: 1 }
    }

    /// Lex the whole input. The returned vector always ends with `Eof`.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let eof = tok.is(TokenKind::Eof);
            tokens.push(tok);
            if eof {
                break;
            }
        }
        log::debug!("lexed {} tokens", tokens.len());
        tokens
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.src[self.pos..].chars().nth(1)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.src[self.pos..].chars().next()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while matches!(self.peek(), Some(c) if c.is_whitespace()) {
                self.advance();
            }
            // skip `//` line comments
            if self.src[self.pos..].starts_with("//") {
                while !matches!(self.peek(), None | Some('\n')) {
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn token(&self, kind: TokenKind, literal: impl Into<String>, line: usize, column: usize) -> Token {
        Token { kind, literal: literal.into(), line, column }
    }

    /// Advance past one token and return it. Unknown characters come back as
    /// `Illegal` tokens rather than errors; the parser decides what to do.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let (line, column) = (self.line, self.column);
        let ch = match self.peek() {
            None => return self.token(TokenKind::Eof, "", line, column),
            Some(c) => c,
        };

        let punct = match ch {
            '=' => Some(TokenKind::Assign),
            ':' => Some(TokenKind::Colon),
            ',' => Some(TokenKind::Comma),
            '.' => Some(TokenKind::Dot),
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            '{' => Some(TokenKind::LBrace),
            '}' => Some(TokenKind::RBrace),
            _ => None,
        };
        if let Some(kind) = punct {
            self.advance();
            return self.token(kind, ch.to_string(), line, column);
        }

        match ch {
            '"' => self.lex_string(line, column),
            c if c.is_ascii_digit() => self.lex_number(line, column),
            '-' if matches!(self.peek_second(), Some(d) if d.is_ascii_digit()) => {
                self.lex_number(line, column)
            }
            c if c.is_ascii_alphabetic() || c == '_' => self.lex_ident_or_keyword(line, column),
            other => {
                self.advance();
                self.token(TokenKind::Illegal, other.to_string(), line, column)
            }
        }
    }

    /// Strings run to the next `"`; there are no escapes, and newlines are
    /// kept verbatim (multi-line `#SCRIPT` bodies rely on this).
    fn lex_string(&mut self, line: usize, column: usize) -> Token {
        self.advance(); // consume opening `"`
        let start = self.pos;
        loop {
            match self.peek() {
                None => {
                    let rest = &self.src[start..];
                    return self.token(TokenKind::Illegal, format!("\"{rest}"), line, column);
                }
                Some('"') => break,
                Some(_) => {
                    self.advance();
                }
            }
        }
        let literal = &self.src[start..self.pos];
        self.advance(); // consume closing `"`
        self.token(TokenKind::Str, literal, line, column)
    }

    fn lex_number(&mut self, line: usize, column: usize) -> Token {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.advance();
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') {
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }
        let literal = &self.src[start..self.pos];
        self.token(classify_number(literal), literal, line, column)
    }

    fn lex_ident_or_keyword(&mut self, line: usize, column: usize) -> Token {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.advance();
        }
        let word = &self.src[start..self.pos];
        let kind = match word {
            "true" | "false" => TokenKind::Boolean,
            w if KEYWORDS.contains(&w) => TokenKind::Keyword,
            _ => TokenKind::Ident,
        };
        self.token(kind, word, line, column)
    }
}

/// Decide the lexical number kind from the literal's shape alone.
fn classify_number(literal: &str) -> TokenKind {
    let unsigned = literal.strip_prefix('-').unwrap_or(literal);
    match unsigned.split_once('.') {
        Some((_, fraction)) if fraction.len() > MAX_FLOAT_FRACTION_DIGITS => TokenKind::Double,
        Some(_) => TokenKind::Float,
        None if unsigned.len() > MAX_INT_DIGITS => TokenKind::Long,
        None => TokenKind::Int,
    }
}
