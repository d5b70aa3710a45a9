//! SQL Tokenizer implementation.

use tracing::trace;

use super::{registry, Span, Token, TokenKind};

/// Punctuation that may directly follow a numeric literal.
const DELIMITERS: &str = "()[]{},;+-*/%=<>!|&^~?:'\"`";

/// A query hint captured from a `/*+ ... */` or `--+ ...` comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintComment {
    /// Hint name as written.
    pub name: String,
    /// Raw text between the hint parentheses, trimmed.
    pub value: String,
    /// Index of the first token following the comment.
    pub token_index: usize,
    /// Location of the whole comment.
    pub span: Span,
}

/// Output of a full scan: the token stream and the hints found between tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct Scanned {
    /// Tokens, always terminated by an EOF token.
    pub tokens: Vec<Token>,
    /// Hints in source order.
    pub hints: Vec<HintComment>,
}

/// A lexer that tokenizes SQL input.
pub struct Lexer<'a> {
    /// The input source code.
    input: &'a str,
    /// The current byte position.
    pos: usize,
    /// The byte position of the start of the current token.
    start: usize,
    /// Number of tokens handed out so far.
    emitted: usize,
    /// Hints collected while skipping comments.
    hints: Vec<HintComment>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            start: 0,
            emitted: 0,
            hints: Vec::new(),
        }
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Returns the next character without advancing.
    fn peek_next(&self) -> Option<char> {
        self.peek_at(1)
    }

    /// Returns the character `n` positions ahead without advancing.
    fn peek_at(&self, n: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(n)
    }

    /// Advances to the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Returns the byte offset of the next significant character, skipping
    /// whitespace and comments and recording any hints on the way.
    ///
    /// # Errors
    ///
    /// Returns a message for an unterminated block comment or a malformed
    /// hint comment.
    fn skip_whitespace_and_comments(&mut self) -> Result<usize, String> {
        let input = self.input;
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.advance();
            }

            // -- line comment, --+ hint line
            if self.peek() == Some('-') && self.peek_next() == Some('-') {
                let comment_start = self.pos;
                self.advance();
                self.advance();
                let body_start = self.pos;
                while self.peek().is_some_and(|c| c != '\n') {
                    self.advance();
                }
                if let Some(body) = input[body_start..self.pos].strip_prefix('+') {
                    self.record_hints(body, Span::new(comment_start, self.pos))?;
                }
                continue;
            }

            // /* block comment */, /*+ hint block */
            if self.peek() == Some('/') && self.peek_next() == Some('*') {
                let comment_start = self.pos;
                self.advance();
                self.advance();
                let body_start = self.pos;
                let body_end = loop {
                    match self.advance() {
                        Some('*') if self.peek() == Some('/') => {
                            let end = self.pos - 1;
                            self.advance();
                            break end;
                        }
                        None => return Err(String::from("Unterminated block comment")),
                        _ => {}
                    }
                };
                if let Some(body) = input[body_start..body_end].strip_prefix('+') {
                    self.record_hints(body, Span::new(comment_start, self.pos))?;
                }
                continue;
            }

            return Ok(self.pos);
        }
    }

    fn record_hints(&mut self, body: &str, span: Span) -> Result<(), String> {
        for (name, value) in parse_hint_body(body)? {
            trace!(hint = %name, value = %value, "captured query hint");
            self.hints.push(HintComment {
                name,
                value,
                token_index: self.emitted,
                span,
            });
        }
        Ok(())
    }

    /// Returns true when the current position ends a token.
    fn at_delimiter(&self) -> bool {
        self.peek()
            .map_or(true, |c| c.is_whitespace() || DELIMITERS.contains(c))
    }

    /// Creates a span from start to current position.
    fn make_span(&self) -> Span {
        Span::new(self.start, self.pos)
    }

    /// Creates a token with the current span.
    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.make_span())
    }

    /// Scans an identifier or keyword.
    fn scan_identifier(&mut self) -> Token {
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }

        let text = &self.input[self.start..self.pos];

        if let Some(keyword) = registry().lookup(text) {
            self.make_token(TokenKind::Keyword(keyword))
        } else {
            self.make_token(TokenKind::Identifier(String::from(text)))
        }
    }

    /// Scans a quoted identifier (e.g., "column name" or `column name`).
    fn scan_quoted_identifier(&mut self, quote: char) -> Token {
        self.advance(); // consume opening quote
        let content_start = self.pos;

        loop {
            match self.peek() {
                Some(c) if c == quote => {
                    // Doubled delimiter is an escaped delimiter
                    if self.peek_next() == Some(quote) {
                        self.advance();
                        self.advance();
                    } else {
                        break;
                    }
                }
                Some(_) => {
                    self.advance();
                }
                None => {
                    return self.make_token(TokenKind::Error(String::from(
                        "Unterminated quoted identifier",
                    )));
                }
            }
        }

        let content = &self.input[content_start..self.pos];
        self.advance(); // consume closing quote

        if content.is_empty() {
            return self.make_token(TokenKind::Error(String::from(
                "Zero-length delimited identifier",
            )));
        }
        let unescaped = content.replace(&format!("{quote}{quote}"), &quote.to_string());
        self.make_token(TokenKind::QuotedIdentifier(unescaped))
    }

    /// Scans a number, keeping its text (and any type suffix) for literal
    /// inference by the grammar.
    fn scan_number(&mut self) -> Token {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal point, with or without fraction digits
        if self.peek() == Some('.') && self.peek_next() != Some('.') {
            self.advance(); // consume .
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Exponent, only when digits follow
        if self.peek().is_some_and(|c| c == 'e' || c == 'E') {
            let has_digits = match self.peek_next() {
                Some(c) if c.is_ascii_digit() => true,
                Some('+' | '-') => self.peek_at(2).is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            };
            if has_digits {
                self.advance(); // consume e/E
                if self.peek().is_some_and(|c| c == '+' || c == '-') {
                    self.advance();
                }
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        // Type suffix
        if self
            .input
            .get(self.pos..self.pos + 2)
            .is_some_and(|s| s.eq_ignore_ascii_case("bd"))
        {
            self.pos += 2;
        } else if self
            .peek()
            .is_some_and(|c| matches!(c.to_ascii_uppercase(), 'L' | 'S' | 'Y' | 'D' | 'F'))
        {
            self.advance();
        }

        if !self.at_delimiter() {
            while self.peek().is_some_and(|c| !c.is_whitespace() && !DELIMITERS.contains(c)) {
                self.advance();
            }
            return self.make_token(TokenKind::Error(format!(
                "Invalid numeric literal: {}",
                &self.input[self.start..self.pos]
            )));
        }

        self.make_token(TokenKind::Number(String::from(
            &self.input[self.start..self.pos],
        )))
    }

    /// Scans a string literal.
    fn scan_string(&mut self, quote: char) -> Token {
        self.advance(); // consume opening quote
        let mut value = String::new();

        loop {
            match self.peek() {
                Some(c) if c == quote => {
                    // Check for escaped quote (double quote)
                    if self.peek_next() == Some(quote) {
                        value.push(quote);
                        self.advance();
                        self.advance();
                    } else {
                        break;
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
                None => {
                    return self.make_token(TokenKind::Error(String::from(
                        "Unterminated string literal",
                    )));
                }
            }
        }

        self.advance(); // consume closing quote
        self.make_token(TokenKind::String(value))
    }

    /// Scans a blob literal (X'...' or x'...').
    fn scan_blob(&mut self) -> Token {
        self.advance(); // consume X/x
        self.advance(); // consume opening quote

        let mut bytes = Vec::new();
        let mut hex_chars = String::new();

        loop {
            match self.peek() {
                Some('\'') => break,
                Some(c) if c.is_ascii_hexdigit() => {
                    hex_chars.push(c);
                    self.advance();

                    if hex_chars.len() == 2 {
                        if let Ok(byte) = u8::from_str_radix(&hex_chars, 16) {
                            bytes.push(byte);
                        }
                        hex_chars.clear();
                    }
                }
                Some(_) => {
                    return self.make_token(TokenKind::Error(String::from(
                        "Invalid character in binary literal",
                    )));
                }
                None => {
                    return self
                        .make_token(TokenKind::Error(String::from("Unterminated binary literal")));
                }
            }
        }

        if !hex_chars.is_empty() {
            return self.make_token(TokenKind::Error(String::from(
                "Odd number of hex digits in binary literal",
            )));
        }

        self.advance(); // consume closing quote
        self.make_token(TokenKind::Blob(bytes))
    }

    /// Scans the next token.
    #[must_use]
    pub fn next_token(&mut self) -> Token {
        let token = self.scan_token();
        self.emitted += 1;
        token
    }

    fn scan_token(&mut self) -> Token {
        let gap_start = self.pos;
        if let Err(message) = self.skip_whitespace_and_comments() {
            return Token::new(TokenKind::Error(message), Span::new(gap_start, self.pos));
        }
        self.start = self.pos;

        let Some(c) = self.advance() else {
            return self.make_token(TokenKind::Eof);
        };

        match c {
            // Single-character tokens
            '(' => self.make_token(TokenKind::LeftParen),
            ')' => self.make_token(TokenKind::RightParen),
            '[' => self.make_token(TokenKind::LeftBracket),
            ']' => self.make_token(TokenKind::RightBracket),
            '{' => self.make_token(TokenKind::LeftBrace),
            '}' => self.make_token(TokenKind::RightBrace),
            ',' => self.make_token(TokenKind::Comma),
            ';' => self.make_token(TokenKind::Semicolon),
            '+' => self.make_token(TokenKind::Plus),
            '-' => self.make_token(TokenKind::Minus),
            '*' => self.make_token(TokenKind::Star),
            '/' => self.make_token(TokenKind::Slash),
            '%' => self.make_token(TokenKind::Percent),
            '~' => self.make_token(TokenKind::BitNot),
            '^' => self.make_token(TokenKind::BitXor),
            '?' => self.make_token(TokenKind::Question),
            ':' => self.make_token(TokenKind::Colon),
            '&' => self.make_token(TokenKind::BitAnd),

            // Numbers starting with a decimal point
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                self.pos = self.start;
                self.scan_number()
            }
            '.' => self.make_token(TokenKind::Dot),

            // Potentially multi-character tokens
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                }
                self.make_token(TokenKind::Eq)
            }
            '<' => match self.peek() {
                Some('=') => {
                    self.advance();
                    if self.peek() == Some('>') {
                        self.advance();
                        self.make_token(TokenKind::NullSafeEq)
                    } else {
                        self.make_token(TokenKind::LtEq)
                    }
                }
                Some('>') => {
                    self.advance();
                    self.make_token(TokenKind::NotEq)
                }
                Some('<') => {
                    self.advance();
                    self.make_token(TokenKind::LeftShift)
                }
                _ => self.make_token(TokenKind::Lt),
            },
            '>' => match self.peek() {
                Some('=') => {
                    self.advance();
                    self.make_token(TokenKind::GtEq)
                }
                Some('>') => {
                    self.advance();
                    if self.peek() == Some('>') {
                        self.advance();
                        self.make_token(TokenKind::UnsignedRightShift)
                    } else {
                        self.make_token(TokenKind::RightShift)
                    }
                }
                _ => self.make_token(TokenKind::Gt),
            },
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    self.make_token(TokenKind::NotEq)
                } else {
                    self.make_token(TokenKind::Bang)
                }
            }
            '|' => {
                if self.peek() == Some('|') {
                    self.advance();
                    self.make_token(TokenKind::Concat)
                } else {
                    self.make_token(TokenKind::BitOr)
                }
            }

            // String literals
            '\'' => {
                self.pos = self.start;
                self.scan_string('\'')
            }

            // Quoted identifiers
            '"' | '`' => {
                self.pos = self.start;
                self.scan_quoted_identifier(c)
            }

            // Binary literals
            'X' | 'x' if self.peek() == Some('\'') => {
                self.pos = self.start;
                self.scan_blob()
            }

            // Numbers
            c if c.is_ascii_digit() => {
                self.pos = self.start;
                self.scan_number()
            }

            // Identifiers and keywords
            c if c.is_alphabetic() || c == '_' => {
                self.pos = self.start;
                self.scan_identifier()
            }

            _ => self.make_token(TokenKind::Error(format!("Unexpected character: {c}"))),
        }
    }

    /// Tokenizes the entire input, returning all tokens and collected hints.
    #[must_use]
    pub fn tokenize(mut self) -> Scanned {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Scanned {
            tokens,
            hints: self.hints,
        }
    }
}

/// Splits the body of a hint comment into `(name, value)` pairs.
///
/// Accepts `name(value) name2(value2)` optionally separated by commas;
/// values may contain balanced parentheses and are trimmed.
fn parse_hint_body(body: &str) -> Result<Vec<(String, String)>, String> {
    let mut hints = Vec::new();
    let mut rest = body.trim_start();
    while !rest.is_empty() {
        let name_len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if name_len == 0 {
            return Err(format!("Malformed query hint near '{}'", rest.trim_end()));
        }
        let name = &rest[..name_len];
        let Some(args) = rest[name_len..].trim_start().strip_prefix('(') else {
            return Err(format!("Expected '(' after query hint {name}"));
        };

        let mut depth = 1usize;
        let mut close = None;
        for (i, c) in args.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(i);
                        break;
                    }
                }
                _ => {}
            }
        }
        let Some(close) = close else {
            return Err(format!("Unclosed value for query hint {name}"));
        };

        hints.push((String::from(name), String::from(args[..close].trim())));
        rest = args[close + 1..].trim_start();
        if let Some(after) = rest.strip_prefix(',') {
            rest = after.trim_start();
        }
    }
    Ok(hints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Keyword;

    fn tokenize(input: &str) -> Vec<Token> {
        Lexer::new(input).tokenize().tokens
    }

    fn token_kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    fn num(text: &str) -> TokenKind {
        TokenKind::Number(String::from(text))
    }

    #[test]
    fn test_empty_input() {
        let tokens = tokenize("   \n\t  ");
        assert_eq!(tokens.len(), 1);
        assert!(matches!(tokens[0].kind, TokenKind::Eof));
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            token_kinds("SELECT -- comment\n/* block */ FROM"),
            vec![
                TokenKind::Keyword(Keyword::Select),
                TokenKind::Keyword(Keyword::From),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_block_comment() {
        let kinds = token_kinds("SELECT /* never closed");
        assert!(matches!(&kinds[1], TokenKind::Error(m) if m.contains("block comment")));
    }

    #[test]
    fn test_keywords_case_insensitive() {
        assert_eq!(
            token_kinds("select FROM wHeRe"),
            vec![
                TokenKind::Keyword(Keyword::Select),
                TokenKind::Keyword(Keyword::From),
                TokenKind::Keyword(Keyword::Where),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_identifiers_keep_case() {
        assert_eq!(
            token_kinds("Foo bar_baz _qux"),
            vec![
                TokenKind::Identifier(String::from("Foo")),
                TokenKind::Identifier(String::from("bar_baz")),
                TokenKind::Identifier(String::from("_qux")),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_quoted_identifiers() {
        assert_eq!(
            token_kinds("\"column name\" `select` `a``b` \"x\"\"y\""),
            vec![
                TokenKind::QuotedIdentifier(String::from("column name")),
                TokenKind::QuotedIdentifier(String::from("select")),
                TokenKind::QuotedIdentifier(String::from("a`b")),
                TokenKind::QuotedIdentifier(String::from("x\"y")),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers_keep_text() {
        assert_eq!(
            token_kinds("42 3.14 1e10 2.5E-3 .5 10L 7bd 2.0D 1F 3S 4Y"),
            vec![
                num("42"),
                num("3.14"),
                num("1e10"),
                num("2.5E-3"),
                num(".5"),
                num("10L"),
                num("7bd"),
                num("2.0D"),
                num("1F"),
                num("3S"),
                num("4Y"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_trailing_decimal_point() {
        assert_eq!(
            token_kinds("SELECT 1. FROM t"),
            vec![
                TokenKind::Keyword(Keyword::Select),
                num("1."),
                TokenKind::Keyword(Keyword::From),
                TokenKind::Identifier(String::from("t")),
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            token_kinds("1.,2.e3"),
            vec![num("1."), TokenKind::Comma, num("2.e3"), TokenKind::Eof]
        );
    }

    #[test]
    fn test_number_requires_delimiter() {
        let kinds = token_kinds("SELECT 123abc");
        assert!(matches!(&kinds[1], TokenKind::Error(m) if m.contains("123abc")));
        assert_eq!(
            token_kinds("1+2"),
            vec![num("1"), TokenKind::Plus, num("2"), TokenKind::Eof]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            token_kinds("'hello' 'it''s'"),
            vec![
                TokenKind::String(String::from("hello")),
                TokenKind::String(String::from("it's")),
                TokenKind::Eof,
            ]
        );
        let kinds = token_kinds("'open");
        assert!(matches!(&kinds[0], TokenKind::Error(_)));
    }

    #[test]
    fn test_blob() {
        let tokens = tokenize("X'48454C4C4F'");
        assert!(
            matches!(&tokens[0].kind, TokenKind::Blob(b) if b == &[0x48, 0x45, 0x4C, 0x4C, 0x4F])
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            token_kinds("+ - * / % = == != <> <=> < <= > >= << >> >>> || | & ^ ~ !"),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Percent,
                TokenKind::Eq,
                TokenKind::Eq,
                TokenKind::NotEq,
                TokenKind::NotEq,
                TokenKind::NullSafeEq,
                TokenKind::Lt,
                TokenKind::LtEq,
                TokenKind::Gt,
                TokenKind::GtEq,
                TokenKind::LeftShift,
                TokenKind::RightShift,
                TokenKind::UnsignedRightShift,
                TokenKind::Concat,
                TokenKind::BitOr,
                TokenKind::BitAnd,
                TokenKind::BitXor,
                TokenKind::BitNot,
                TokenKind::Bang,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_delimiters() {
        assert_eq!(
            token_kinds("( ) [ ] { } , ; . : ?"),
            vec![
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBracket,
                TokenKind::RightBracket,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::Comma,
                TokenKind::Semicolon,
                TokenKind::Dot,
                TokenKind::Colon,
                TokenKind::Question,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_span_tracking() {
        let tokens = tokenize("SELECT id");
        assert_eq!(tokens[0].span, Span::new(0, 6));
        assert_eq!(tokens[1].span, Span::new(7, 9));
    }

    #[test]
    fn test_block_hint_comment() {
        let scanned = Lexer::new("SELECT /*+ joinType( hash ), index(idx1) */ a").tokenize();
        assert_eq!(scanned.hints.len(), 2);
        assert_eq!(scanned.hints[0].name, "joinType");
        assert_eq!(scanned.hints[0].value, "hash");
        assert_eq!(scanned.hints[1].name, "index");
        assert_eq!(scanned.hints[1].value, "idx1");
        // both hints precede token #1 (`a`)
        assert!(scanned.hints.iter().all(|h| h.token_index == 1));
    }

    #[test]
    fn test_line_hint_comment() {
        let scanned = Lexer::new("SELECT a --+ columnStore(true)\nFROM t").tokenize();
        assert_eq!(scanned.hints.len(), 1);
        assert_eq!(scanned.hints[0].name, "columnStore");
        assert_eq!(scanned.hints[0].value, "true");
        assert_eq!(scanned.hints[0].token_index, 2);
    }

    #[test]
    fn test_plain_comments_have_no_hints() {
        let scanned = Lexer::new("SELECT /* index(x) */ a -- joinType(y)").tokenize();
        assert!(scanned.hints.is_empty());
    }

    #[test]
    fn test_malformed_hint_is_error() {
        let kinds = token_kinds("SELECT /*+ broken */ a");
        assert!(matches!(&kinds[1], TokenKind::Error(m) if m.contains("broken")));
    }

    #[test]
    fn test_hint_body_nested_parens() {
        let hints = parse_hint_body(" index( f(a, b) ) ").unwrap();
        assert_eq!(hints, vec![(String::from("index"), String::from("f(a, b)"))]);
    }
}
