//! Dart tokenizer
//!
//! Produces a flat token stream with byte offsets. Comments are dropped.
//! String literals keep the tokens of their `$name` / `${expr}` interpolations
//! so usages inside strings are still visible to the usage scanner.

use super::common::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Number,
    Str,
    Punct,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub start: usize,
    pub end: usize,
    /// 1-indexed
    pub line: usize,
    /// 1-indexed, in bytes
    pub column: usize,
    /// Tokens of interpolated expressions (string literals only)
    pub interpolation: Vec<Token>,
}

impl Token {
    pub fn is(&self, text: &str) -> bool {
        self.text == text && self.kind != TokenKind::Str
    }

    pub fn is_ident(&self) -> bool {
        self.kind == TokenKind::Ident
    }

    /// Content of a string literal without quotes, prefix or escapes
    pub fn string_value(&self) -> Option<String> {
        if self.kind != TokenKind::Str {
            return None;
        }
        let raw = self.text.strip_prefix('r').unwrap_or(&self.text);
        let quote_len = if raw.starts_with("'''") || raw.starts_with("\"\"\"") {
            3
        } else {
            1
        };
        if raw.len() < quote_len * 2 {
            return None;
        }
        Some(raw[quote_len..raw.len() - quote_len].to_string())
    }
}

const PUNCTUATORS: &[&str] = &[
    "...?", "...", "?..", "??=", "~/=", "<<=", "?.", "??", "..", "=>", "==", "!=", "<=", ">=",
    "&&", "||", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", "~/",
];

/// Tokenize Dart source
pub fn tokenize(source: &str) -> Result<Vec<Token>, ProviderError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    lexer.lex_into(&mut tokens, false)?;
    Ok(tokens)
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line_starts: Vec<usize>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            src.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            line_starts,
        }
    }

    fn position(&self, offset: usize) -> (usize, usize) {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        (line_idx + 1, offset - self.line_starts[line_idx] + 1)
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> ProviderError {
        let (line, column) = self.position(offset);
        ProviderError::Syntax {
            message: message.into(),
            line,
            column,
        }
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn make(&self, kind: TokenKind, start: usize, end: usize) -> Token {
        let (line, column) = self.position(start);
        Token {
            kind,
            text: self.src[start..end].to_string(),
            start,
            end,
            line,
            column,
            interpolation: Vec::new(),
        }
    }

    /// Lex tokens until end of input, or until an unmatched `}` when `in_interpolation`
    fn lex_into(
        &mut self,
        out: &mut Vec<Token>,
        in_interpolation: bool,
    ) -> Result<(), ProviderError> {
        let mut depth = 0usize;
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            match b {
                b' ' | b'\t' | b'\r' | b'\n' => self.pos += 1,
                b'/' if self.peek(1) == Some(b'/') => self.skip_line_comment(),
                b'/' if self.peek(1) == Some(b'*') => self.skip_block_comment()?,
                b'\'' | b'"' => {
                    let token = self.lex_string(self.pos, false)?;
                    out.push(token);
                }
                b'r' if matches!(self.peek(1), Some(b'\'') | Some(b'"')) => {
                    let start = self.pos;
                    self.pos += 1;
                    let token = self.lex_string(start, true)?;
                    out.push(token);
                }
                b'0'..=b'9' => {
                    let token = self.lex_number();
                    out.push(token);
                }
                b'.' if matches!(self.peek(1), Some(b'0'..=b'9')) => {
                    let token = self.lex_number();
                    out.push(token);
                }
                _ if is_ident_start(b) => {
                    let start = self.pos;
                    while self.pos < self.bytes.len() && is_ident_part(self.bytes[self.pos]) {
                        self.pos += 1;
                    }
                    out.push(self.make(TokenKind::Ident, start, self.pos));
                }
                _ if b >= 0x80 => {
                    // Non-ASCII outside strings and comments: skip the whole char
                    let ch_len = self.src[self.pos..]
                        .chars()
                        .next()
                        .map(char::len_utf8)
                        .unwrap_or(1);
                    self.pos += ch_len;
                }
                _ => {
                    if in_interpolation {
                        if b == b'{' {
                            depth += 1;
                        } else if b == b'}' {
                            if depth == 0 {
                                self.pos += 1;
                                return Ok(());
                            }
                            depth -= 1;
                        }
                    }
                    let token = self.lex_punct();
                    out.push(token);
                }
            }
        }
        if in_interpolation {
            return Err(self.error(self.pos, "unterminated string interpolation"));
        }
        Ok(())
    }

    fn skip_line_comment(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), ProviderError> {
        let start = self.pos;
        let mut depth = 0usize;
        while self.pos < self.bytes.len() {
            if self.bytes[self.pos] == b'/' && self.peek(1) == Some(b'*') {
                depth += 1;
                self.pos += 2;
            } else if self.bytes[self.pos] == b'*' && self.peek(1) == Some(b'/') {
                depth -= 1;
                self.pos += 2;
                if depth == 0 {
                    return Ok(());
                }
            } else {
                self.pos += 1;
            }
        }
        Err(self.error(start, "unterminated block comment"))
    }

    fn lex_number(&mut self) -> Token {
        let start = self.pos;
        if self.bytes[self.pos] == b'0' && matches!(self.peek(1), Some(b'x') | Some(b'X')) {
            self.pos += 2;
            while self.pos < self.bytes.len()
                && (self.bytes[self.pos].is_ascii_hexdigit() || self.bytes[self.pos] == b'_')
            {
                self.pos += 1;
            }
            return self.make(TokenKind::Number, start, self.pos);
        }
        self.eat_digits();
        if self.peek(0) == Some(b'.') && matches!(self.peek(1), Some(b'0'..=b'9')) {
            self.pos += 1;
            self.eat_digits();
        }
        if matches!(self.peek(0), Some(b'e') | Some(b'E')) {
            let sign = matches!(self.peek(1), Some(b'+') | Some(b'-'));
            let digit_at = if sign { 2 } else { 1 };
            if matches!(self.peek(digit_at), Some(b'0'..=b'9')) {
                self.pos += digit_at;
                self.eat_digits();
            }
        }
        self.make(TokenKind::Number, start, self.pos)
    }

    fn eat_digits(&mut self) {
        while self.pos < self.bytes.len()
            && (self.bytes[self.pos].is_ascii_digit() || self.bytes[self.pos] == b'_')
        {
            self.pos += 1;
        }
    }

    fn lex_punct(&mut self) -> Token {
        let start = self.pos;
        let rest = &self.src[self.pos..];
        let len = PUNCTUATORS
            .iter()
            .find(|p| rest.starts_with(*p))
            .map(|p| p.len())
            .unwrap_or(1);
        self.pos += len;
        self.make(TokenKind::Punct, start, self.pos)
    }

    /// Lex a string literal; `start` includes an `r` prefix when `raw`
    fn lex_string(&mut self, start: usize, raw: bool) -> Result<Token, ProviderError> {
        let quote = self.bytes[self.pos];
        let triple = self.peek(1) == Some(quote) && self.peek(2) == Some(quote);
        self.pos += if triple { 3 } else { 1 };

        let mut interpolation = Vec::new();
        loop {
            let Some(b) = self.peek(0) else {
                return Err(self.error(start, "unterminated string literal"));
            };
            if b == quote {
                if !triple {
                    self.pos += 1;
                    break;
                }
                if self.peek(1) == Some(quote) && self.peek(2) == Some(quote) {
                    self.pos += 3;
                    break;
                }
                self.pos += 1;
                continue;
            }
            match b {
                b'\n' if !triple => {
                    return Err(self.error(start, "unterminated string literal"));
                }
                b'\\' if !raw => self.pos += 2,
                b'$' if !raw => {
                    if self.peek(1) == Some(b'{') {
                        self.pos += 2;
                        self.lex_into(&mut interpolation, true)?;
                    } else if self.peek(1).map(is_interpolation_start).unwrap_or(false) {
                        self.pos += 1;
                        let ident_start = self.pos;
                        while self.pos < self.bytes.len()
                            && is_interpolation_part(self.bytes[self.pos])
                        {
                            self.pos += 1;
                        }
                        interpolation.push(self.make(TokenKind::Ident, ident_start, self.pos));
                    } else {
                        self.pos += 1;
                    }
                }
                _ => self.pos += 1,
            }
        }

        let end = self.pos.min(self.bytes.len());
        let mut token = self.make(TokenKind::Str, start, end);
        token.interpolation = interpolation;
        Ok(token)
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_ident_part(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn is_interpolation_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_interpolation_part(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(source: &str) -> Vec<String> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            texts("final x = a?.b ?? 3;"),
            vec!["final", "x", "=", "a", "?.", "b", "??", "3", ";"]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            texts("/// doc\nclass A {} /* block /* nested */ */ // tail"),
            vec!["class", "A", "{", "}"]
        );
    }

    #[test]
    fn test_string_interpolation_tokens() {
        let tokens = tokenize("var s = 'hi $name and ${user.id}';").unwrap();
        let string = tokens.iter().find(|t| t.kind == TokenKind::Str).unwrap();
        let inner: Vec<_> = string.interpolation.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(inner, vec!["name", "user", ".", "id"]);
        assert_eq!(tokens.last().unwrap().text, ";");
    }

    #[test]
    fn test_raw_and_triple_strings() {
        let tokens = tokenize("r'$notInterp' '''multi\nline''' \"a\"").unwrap();
        assert_eq!(tokens.len(), 3);
        assert!(tokens[0].interpolation.is_empty());
        assert_eq!(tokens[0].string_value().as_deref(), Some("$notInterp"));
        assert_eq!(tokens[1].string_value().as_deref(), Some("multi\nline"));
        assert_eq!(tokens[2].string_value().as_deref(), Some("a"));
    }

    #[test]
    fn test_generic_closers_are_single() {
        assert_eq!(
            texts("Map<String, List<int>> m;"),
            vec!["Map", "<", "String", ",", "List", "<", "int", ">", ">", "m", ";"]
        );
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("a\n  bb").unwrap();
        assert_eq!((tokens[1].line, tokens[1].column), (2, 3));
        assert_eq!(tokens[1].start, 4);
    }

    #[test]
    fn test_unterminated_string_is_error() {
        assert!(tokenize("var s = 'oops;\n").is_err());
        assert!(tokenize("/* never closed").is_err());
    }
}
