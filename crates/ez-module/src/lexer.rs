//! JavaScript tokenizer.
//!
//! Only tokenizes far enough to find top-level statement boundaries: string,
//! template and regex literals are single opaque tokens, comments and
//! whitespace are skipped but recorded as "newline before" on the next token.

use std::fmt;

/// Multi-character punctuators, longest first.
const PUNCTUATORS: &[&str] = &[
    ">>>=", "...", "===", "!==", "**=", "<<=", ">>=", ">>>", "&&=", "||=", "??=", "=>", "==",
    "!=", "<=", ">=", "&&", "||", "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=",
    "|=", "^=", "**", "<<", ">>",
];

/// Keywords after which a `/` starts a regular expression literal.
const REGEX_PRECEDING_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "yield",
    "await",
];

/// Token category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword.
    Ident,
    /// Operator or bracket.
    Punct,
    /// Single or double quoted string literal (quotes included).
    Str,
    /// Template literal including any `${}` substitutions.
    Template,
    /// Regular expression literal including flags.
    Regex,
    /// Numeric literal.
    Number,
}

/// A token, addressed by byte offsets into the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    /// A line terminator appears between the previous token and this one.
    pub newline_before: bool,
}

impl Token {
    /// Source text of this token.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    /// True if this token is the given punctuator.
    pub fn is_punct(&self, source: &str, p: &str) -> bool {
        self.kind == TokenKind::Punct && self.text(source) == p
    }

    /// True if this token is the given identifier or keyword.
    pub fn is_ident(&self, source: &str, name: &str) -> bool {
        self.kind == TokenKind::Ident && self.text(source) == name
    }
}

/// Tokenizer failure, with a 1-based position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {line}, column {column}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub line: usize,
    pub column: usize,
}

/// What went wrong while tokenizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    UnterminatedString,
    UnterminatedTemplate,
    UnterminatedComment,
    UnterminatedRegex,
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            LexErrorKind::UnterminatedString => "unterminated string literal",
            LexErrorKind::UnterminatedTemplate => "unterminated template literal",
            LexErrorKind::UnterminatedComment => "unterminated block comment",
            LexErrorKind::UnterminatedRegex => "unterminated regular expression",
        };
        f.write_str(msg)
    }
}

/// Compute the 1-based line and column of a byte offset.
pub fn position(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset.min(source.len())];
    let line = before.matches('\n').count() + 1;
    let column = match before.rfind('\n') {
        Some(nl) => before[nl + 1..].chars().count() + 1,
        None => before.chars().count() + 1,
    };
    (line, column)
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b >= 0x80
}

fn is_ident_part(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn error(&self, kind: LexErrorKind, offset: usize) -> LexError {
        let (line, column) = position(self.source, offset);
        LexError { kind, line, column }
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    /// Scan the next token, or `None` at end of input.
    fn next_token(&mut self, previous: Option<&Token>) -> Result<Option<Token>, LexError> {
        let newline_before = self.skip_trivia()?;
        let Some(b) = self.peek(0) else {
            return Ok(None);
        };
        let start = self.pos;

        let kind = match b {
            b'\'' | b'"' => {
                self.scan_string(b)?;
                TokenKind::Str
            }
            b'`' => {
                self.scan_template()?;
                TokenKind::Template
            }
            b'/' if regex_allowed(self.source, previous) => {
                self.scan_regex()?;
                TokenKind::Regex
            }
            b'0'..=b'9' => {
                self.scan_number();
                TokenKind::Number
            }
            b'.' if self.peek(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.scan_number();
                TokenKind::Number
            }
            b if is_ident_start(b) => {
                while self.peek(0).is_some_and(is_ident_part) {
                    self.pos += 1;
                }
                TokenKind::Ident
            }
            _ => {
                self.scan_punct();
                TokenKind::Punct
            }
        };

        // Escapes may step past the end on malformed input.
        self.pos = self.pos.min(self.source.len());
        Ok(Some(Token {
            kind,
            start,
            end: self.pos,
            newline_before,
        }))
    }

    /// Skip whitespace and comments, reporting whether a line break was seen.
    fn skip_trivia(&mut self) -> Result<bool, LexError> {
        let mut newline = false;
        while let Some(b) = self.peek(0) {
            match b {
                b'\n' | b'\r' => {
                    newline = true;
                    self.pos += 1;
                }
                b' ' | b'\t' | 0x0b | 0x0c => self.pos += 1,
                b'/' if self.peek(1) == Some(b'/') => {
                    while let Some(c) = self.peek(0) {
                        if c == b'\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                b'/' if self.peek(1) == Some(b'*') => {
                    let start = self.pos;
                    self.pos += 2;
                    loop {
                        match self.peek(0) {
                            None => {
                                return Err(self.error(LexErrorKind::UnterminatedComment, start))
                            }
                            Some(b'*') if self.peek(1) == Some(b'/') => {
                                self.pos += 2;
                                break;
                            }
                            Some(c) => {
                                if c == b'\n' {
                                    newline = true;
                                }
                                self.pos += 1;
                            }
                        }
                    }
                }
                // U+00A0, U+FEFF and U+2028/2029 are rare enough in config
                // sources that any other non-ASCII byte starts an identifier.
                0xc2 if self.peek(1) == Some(0xa0) => self.pos += 2,
                0xef if self.peek(1) == Some(0xbb) && self.peek(2) == Some(0xbf) => self.pos += 3,
                0xe2 if self.peek(1) == Some(0x80) && matches!(self.peek(2), Some(0xa8 | 0xa9)) => {
                    newline = true;
                    self.pos += 3;
                }
                _ => break,
            }
        }
        Ok(newline)
    }

    fn scan_string(&mut self, quote: u8) -> Result<(), LexError> {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek(0) {
                None | Some(b'\n') => {
                    return Err(self.error(LexErrorKind::UnterminatedString, start))
                }
                Some(b'\\') => self.pos += 2,
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn scan_template(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek(0) {
                None => return Err(self.error(LexErrorKind::UnterminatedTemplate, start)),
                Some(b'\\') => self.pos += 2,
                Some(b'`') => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(b'$') if self.peek(1) == Some(b'{') => {
                    self.pos += 2;
                    self.skip_substitution(start)?;
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Skip a `${ ... }` body up to and including its closing brace. The body
    /// is tokenized like top-level code so regex literals stay opaque.
    fn skip_substitution(&mut self, template_start: usize) -> Result<(), LexError> {
        let mut depth = 0usize;
        let mut previous: Option<Token> = None;
        loop {
            let Some(tok) = self.next_token(previous.as_ref())? else {
                return Err(self.error(LexErrorKind::UnterminatedTemplate, template_start));
            };
            if tok.kind == TokenKind::Punct {
                match tok.text(self.source) {
                    "{" => depth += 1,
                    "}" if depth == 0 => return Ok(()),
                    "}" => depth -= 1,
                    _ => {}
                }
            }
            previous = Some(tok);
        }
    }

    fn scan_regex(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        self.pos += 1;
        let mut in_class = false;
        loop {
            match self.peek(0) {
                None | Some(b'\n') => {
                    return Err(self.error(LexErrorKind::UnterminatedRegex, start))
                }
                Some(b'\\') => self.pos += 2,
                Some(b'[') => {
                    in_class = true;
                    self.pos += 1;
                }
                Some(b']') => {
                    in_class = false;
                    self.pos += 1;
                }
                Some(b'/') if !in_class => {
                    self.pos += 1;
                    while self.peek(0).is_some_and(is_ident_part) {
                        self.pos += 1;
                    }
                    return Ok(());
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn scan_number(&mut self) {
        let start = self.pos;
        let hex = matches!(self.source.get(start..start + 2), Some("0x" | "0X"));
        while let Some(b) = self.peek(0) {
            if b.is_ascii_alphanumeric() || b == b'.' || b == b'_' {
                self.pos += 1;
            } else if (b == b'+' || b == b'-')
                && !hex
                && self.pos > start
                && matches!(self.bytes[self.pos - 1], b'e' | b'E')
            {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn scan_punct(&mut self) {
        let rest = &self.source[self.pos..];
        let len = PUNCTUATORS
            .iter()
            .find(|p| rest.starts_with(*p))
            .map(|p| p.len())
            .unwrap_or(1);
        self.pos += len;
    }
}

/// A `/` starts a regex literal when an operand is expected.
fn regex_allowed(source: &str, previous: Option<&Token>) -> bool {
    match previous {
        None => true,
        Some(tok) => match tok.kind {
            TokenKind::Punct => !matches!(tok.text(source), ")" | "]" | "}" | "++" | "--"),
            TokenKind::Ident => REGEX_PRECEDING_KEYWORDS.contains(&tok.text(source)),
            _ => false,
        },
    }
}

/// Tokenize a JavaScript source text.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer {
        source,
        bytes: source.as_bytes(),
        pos: 0,
    };
    let mut tokens: Vec<Token> = Vec::new();
    while let Some(tok) = lexer.next_token(tokens.last())? {
        tokens.push(tok);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(source: &str) -> Vec<String> {
        tokenize(source)
            .unwrap()
            .iter()
            .map(|t| t.text(source).to_string())
            .collect()
    }

    #[test]
    fn test_basic_declaration() {
        let src = r#"export const a = () => "x""#;
        assert_eq!(
            texts(src),
            vec!["export", "const", "a", "=", "(", ")", "=>", "\"x\""]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let src = "// header\nconst /* inline */ a = 1";
        assert_eq!(texts(src), vec!["const", "a", "=", "1"]);
        let tokens = tokenize(src).unwrap();
        assert!(tokens[0].newline_before);
        assert!(!tokens[1].newline_before);
    }

    #[test]
    fn test_template_with_nested_substitution() {
        let src = "const s = `a ${ {x: `b ${1}`}.x } c`;";
        let t = texts(src);
        assert_eq!(t.len(), 5);
        assert_eq!(t[3], "`a ${ {x: `b ${1}`}.x } c`");
    }

    #[test]
    fn test_regex_inside_substitution() {
        let src = "export const esc = (s) => `<b>${s.replace(/'/g, \"&#39;\")}</b>`";
        let tokens = tokenize(src).unwrap();
        let last = tokens.last().unwrap();
        assert_eq!(last.kind, TokenKind::Template);
        assert_eq!(last.text(src), "`<b>${s.replace(/'/g, \"&#39;\")}</b>`");
    }

    #[test]
    fn test_division_inside_substitution() {
        let src = "const p = `${(cents / 100).toFixed(2)} / ${n}`";
        let t = texts(src);
        assert_eq!(t.len(), 4);
        assert_eq!(t[3], "`${(cents / 100).toFixed(2)} / ${n}`");
    }

    #[test]
    fn test_template_keeps_html_opaque() {
        let src = "export const p = () => `<p style=\"a;b\">{x}</p>`";
        let t = texts(src);
        assert_eq!(t.last().unwrap(), "`<p style=\"a;b\">{x}</p>`");
    }

    #[test]
    fn test_regex_vs_division() {
        let src = "const r = /a[/]b/g; const d = x / 2;";
        let tokens = tokenize(src).unwrap();
        assert_eq!(tokens[3].kind, TokenKind::Regex);
        assert_eq!(tokens[3].text(src), "/a[/]b/g");
        let slash = tokens.iter().find(|t| t.text(src) == "/").unwrap();
        assert_eq!(slash.kind, TokenKind::Punct);
    }

    #[test]
    fn test_longest_punctuator() {
        assert_eq!(texts("a === b"), vec!["a", "===", "b"]);
        assert_eq!(texts("a?.b"), vec!["a", "?.", "b"]);
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("const a = 'oops\nconst b = 1").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 11);
    }

    #[test]
    fn test_unterminated_template() {
        let err = tokenize("const a = `oops ${x").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedTemplate);
    }

    #[test]
    fn test_non_ascii_identifier_and_string() {
        let src = "const 名 = '用户须知'";
        assert_eq!(texts(src), vec!["const", "名", "=", "'用户须知'"]);
    }
}
