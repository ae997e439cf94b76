//! Top-level statement splitter and classifier.
//!
//! A module is split into top-level statements. Each statement keeps the
//! trivia (whitespace and comments) that precedes it, so concatenating
//! `leading + text` for every statement plus the trailing trivia reproduces
//! the source exactly.

use std::ops::Range;

use serde::Serialize;

use crate::lexer::{position, tokenize, LexError, Token, TokenKind};

/// Namespaces whose members are treated as globals.
pub const GLOBAL_NAMESPACES: &[&str] = &["window", "globalThis", "self"];

/// Tokens that cannot end an expression: a line break after one of these
/// never terminates the statement.
const CONTINUATION_PUNCT: &[&str] = &[
    "=", ",", ".", "?.", "=>", "+", "-", "*", "/", "%", "**", "&&", "||", "??", "?", ":", "!",
    "~", "<", ">", "<=", ">=", "==", "===", "!=", "!==", "&", "|", "^", "<<", ">>", ">>>", "+=",
    "-=", "*=", "/=", "%=", "**=", "<<=", ">>=", ">>>=", "&=", "|=", "^=", "&&=", "||=", "??=",
    "...", "(", "[", "{",
];

/// Keywords that always need something after them.
const CONTINUATION_KEYWORDS: &[&str] = &[
    "import",
    "export",
    "from",
    "const",
    "let",
    "var",
    "new",
    "typeof",
    "instanceof",
    "in",
    "function",
    "class",
    "extends",
    "default",
    "void",
    "delete",
    "async",
    "else",
    "do",
];

/// Keywords whose parenthesized header is followed by a body statement.
const HEADER_KEYWORDS: &[&str] = &["if", "for", "while", "with"];

/// Tokens that continue the previous line's expression when they start a line.
const LEADING_CONTINUATION_PUNCT: &[&str] = &[
    ".", "?.", "=", ",", "=>", "+", "-", "*", "/", "%", "**", "&&", "||", "??", "?", ":", "<",
    ">", "<=", ">=", "==", "===", "!=", "!==", "&", "|", "^", "<<", ">>", ">>>", "+=", "-=",
    "*=", "/=", "%=", "**=", "&&=", "||=", "??=", "(", "[",
];

/// Parse failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("{0}")]
    Lex(#[from] LexError),

    #[error("unbalanced '{token}' at line {line}, column {column}")]
    Unbalanced {
        token: String,
        line: usize,
        column: usize,
    },

    #[error("unclosed '{token}' opened at line {line}, column {column}")]
    Unclosed {
        token: String,
        line: usize,
        column: usize,
    },
}

/// Declaration keyword of an exported binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    Const,
    Let,
    Var,
    Function,
    AsyncFunction,
    Class,
}

impl DeclKind {
    /// Keyword as written in source.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclKind::Const => "const",
            DeclKind::Let => "let",
            DeclKind::Var => "var",
            DeclKind::Function => "function",
            DeclKind::AsyncFunction => "async function",
            DeclKind::Class => "class",
        }
    }
}

/// One specifier of an import statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImportSpecifier {
    /// `import { imported as local }` (local == imported without `as`).
    Named { imported: String, local: String },
    /// `import local from ...`
    Default { local: String },
    /// `import * as local from ...`
    Namespace { local: String },
}

impl ImportSpecifier {
    /// The local binding this specifier introduces.
    pub fn local(&self) -> &str {
        match self {
            ImportSpecifier::Named { local, .. }
            | ImportSpecifier::Default { local }
            | ImportSpecifier::Namespace { local } => local,
        }
    }
}

/// Classification of a top-level statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    /// `import ... from "source"` or `import "source"`.
    Import {
        specifiers: Vec<ImportSpecifier>,
        source: String,
    },
    /// `export const|let|var|function|class ...`
    ExportDecl {
        kind: DeclKind,
        names: Vec<String>,
        /// Byte range of the `export` keyword plus the trivia after it.
        marker: Range<usize>,
        /// Byte offset just after the declaration's `=`, when it is a single
        /// `const|let|var name =` declarator.
        initializer: Option<usize>,
    },
    /// `export { a, b as c }`
    ExportList { names: Vec<String> },
    /// `export default ...`
    ExportDefault,
    /// `export * from ...` or `export { ... } from ...`
    ExportFrom { source: String },
    /// `<namespace>.<name> = ...` or `<namespace>["<name>"] = ...`
    GlobalAssign {
        namespace: String,
        name: String,
        /// Byte offset just after the `=`.
        value_start: usize,
    },
    /// Anything else.
    Other,
}

/// A top-level statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub kind: StatementKind,
    /// Trivia between the previous statement and this one.
    pub leading: Range<usize>,
    /// The statement itself, including a terminating `;` if present.
    pub span: Range<usize>,
    /// 1-based line of the first token.
    pub line: usize,
}

/// A parsed module: statements in source order over the owned source text.
#[derive(Debug, Clone)]
pub struct ParsedModule {
    source: String,
    statements: Vec<Statement>,
    trailing: Range<usize>,
}

impl ParsedModule {
    /// Parse a module source text.
    pub fn parse(source: impl Into<String>) -> Result<Self, ParseError> {
        let source = source.into();
        let tokens = tokenize(&source)?;
        let ranges = split_statements(&source, &tokens)?;

        let mut statements = Vec::with_capacity(ranges.len());
        let mut cursor = 0usize;
        for range in ranges {
            let toks = &tokens[range];
            let start = toks[0].start;
            let end = toks[toks.len() - 1].end;
            statements.push(Statement {
                kind: classify(&source, toks),
                leading: cursor..start,
                span: start..end,
                line: position(&source, start).0,
            });
            cursor = end;
        }
        let trailing = cursor..source.len();

        Ok(Self {
            source,
            statements,
            trailing,
        })
    }

    /// The original source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Statements in source order.
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Text of a byte range of the source.
    pub fn slice(&self, range: &Range<usize>) -> &str {
        &self.source[range.clone()]
    }

    /// Trivia after the last statement.
    pub fn trailing(&self) -> &str {
        &self.source[self.trailing.clone()]
    }

    /// Statements importing from `source`.
    pub fn imports_from<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a Statement> + 'a {
        self.statements.iter().filter(move |s| {
            matches!(&s.kind, StatementKind::Import { source: src, .. } if src == source)
        })
    }

    /// Number of import statements.
    pub fn import_count(&self) -> usize {
        self.statements
            .iter()
            .filter(|s| matches!(s.kind, StatementKind::Import { .. }))
            .count()
    }

    /// Number of statements carrying an export marker.
    pub fn export_count(&self) -> usize {
        self.statements
            .iter()
            .filter(|s| {
                matches!(
                    s.kind,
                    StatementKind::ExportDecl { .. }
                        | StatementKind::ExportList { .. }
                        | StatementKind::ExportDefault
                        | StatementKind::ExportFrom { .. }
                )
            })
            .count()
    }

    /// Number of statements assigning `<namespace>.<name>`.
    pub fn global_assign_count(&self, namespace: &str, name: &str) -> usize {
        self.statements
            .iter()
            .filter(|s| is_global_assign(&s.kind, namespace, name))
            .count()
    }
}

/// True if the statement assigns `<namespace>.<name>`.
pub fn is_global_assign(kind: &StatementKind, namespace: &str, name: &str) -> bool {
    matches!(
        kind,
        StatementKind::GlobalAssign { namespace: ns, name: n, .. } if ns == namespace && n == name
    )
}

fn closing_for(open: &str) -> &'static str {
    match open {
        "(" => ")",
        "[" => "]",
        _ => "}",
    }
}

/// Group token indices into top-level statements.
///
/// A line break never ends a statement right after a control header such as
/// `if (...)` or after `else`/`do`, so a braceless body stays with its header.
/// A `do` body likewise runs on through its trailing `while (...)`.
fn split_statements(source: &str, tokens: &[Token]) -> Result<Vec<Range<usize>>, ParseError> {
    let mut statements = Vec::new();
    // Open brackets, each flagged when it opens a control header.
    let mut stack: Vec<(&Token, bool)> = Vec::new();
    let mut start: Option<usize> = None;
    let mut header_close: Option<usize> = None;

    for (i, tok) in tokens.iter().enumerate() {
        // A line break may end the statement before this token.
        if let Some(s) = start {
            if stack.is_empty() && tok.newline_before && i > s && header_close != Some(i - 1) {
                let prev = &tokens[i - 1];
                let closes_do = tokens[s].is_ident(source, "do") && tok.is_ident(source, "while");
                let ends = can_end_statement(source, prev) && !continues_statement(source, tok);
                if ends && !closes_do {
                    statements.push(s..i);
                    start = None;
                }
            }
        }

        if start.is_none() {
            start = Some(i);
        }

        if tok.kind == TokenKind::Punct {
            match tok.text(source) {
                "(" => {
                    let header = i > 0 && opens_header(source, tokens, start, i - 1);
                    stack.push((tok, header));
                }
                "[" | "{" => stack.push((tok, false)),
                close @ (")" | "]" | "}") => {
                    let matches = stack
                        .last()
                        .is_some_and(|(open, _)| closing_for(open.text(source)) == close);
                    if !matches {
                        let (line, column) = position(source, tok.start);
                        return Err(ParseError::Unbalanced {
                            token: close.to_string(),
                            line,
                            column,
                        });
                    }
                    if let Some((_, true)) = stack.pop() {
                        header_close = Some(i);
                    }
                }
                ";" if stack.is_empty() => {
                    if let Some(s) = start.take() {
                        statements.push(s..i + 1);
                    }
                }
                _ => {}
            }
        }
    }

    if let Some((open, _)) = stack.first() {
        let (line, column) = position(source, open.start);
        return Err(ParseError::Unclosed {
            token: open.text(source).to_string(),
            line,
            column,
        });
    }

    if let Some(s) = start {
        statements.push(s..tokens.len());
    }

    Ok(statements)
}

/// True if the `(` after `tokens[keyword]` opens a control header. The
/// trailing `while (...)` of a `do` loop ends its statement instead.
fn opens_header(source: &str, tokens: &[Token], start: Option<usize>, keyword: usize) -> bool {
    let tok = &tokens[keyword];
    if tok.kind != TokenKind::Ident || !HEADER_KEYWORDS.contains(&tok.text(source)) {
        return false;
    }
    let in_do_loop = start.is_some_and(|s| s < keyword && tokens[s].is_ident(source, "do"));
    !(in_do_loop && tok.text(source) == "while")
}

fn can_end_statement(source: &str, prev: &Token) -> bool {
    match prev.kind {
        TokenKind::Punct => !CONTINUATION_PUNCT.contains(&prev.text(source)),
        TokenKind::Ident => !CONTINUATION_KEYWORDS.contains(&prev.text(source)),
        _ => true,
    }
}

fn continues_statement(source: &str, next: &Token) -> bool {
    match next.kind {
        TokenKind::Punct => LEADING_CONTINUATION_PUNCT.contains(&next.text(source)),
        TokenKind::Template => true,
        TokenKind::Ident => matches!(next.text(source), "in" | "instanceof" | "else"),
        _ => false,
    }
}

/// Strip the quotes from a string literal token.
fn string_value(source: &str, tok: &Token) -> Option<String> {
    if tok.kind != TokenKind::Str {
        return None;
    }
    let text = tok.text(source);
    Some(text[1..text.len() - 1].to_string())
}

/// Classify a statement from its tokens.
fn classify(source: &str, toks: &[Token]) -> StatementKind {
    let first = &toks[0];
    let second = toks.get(1);

    if first.is_ident(source, "import") {
        // `import(...)` and `import.meta` are expressions.
        let is_expression =
            second.is_some_and(|t| t.is_punct(source, "(") || t.is_punct(source, "."));
        if !is_expression {
            if let Some(kind) = classify_import(source, &toks[1..]) {
                return kind;
            }
        }
        return StatementKind::Other;
    }

    if first.is_ident(source, "export") {
        if let Some(next) = second {
            let marker = first.start..next.start;
            return classify_export(source, &toks[1..], marker);
        }
        return StatementKind::Other;
    }

    if let Some(kind) = classify_global_assign(source, toks) {
        return kind;
    }

    StatementKind::Other
}

fn classify_import(source: &str, toks: &[Token]) -> Option<StatementKind> {
    // Side-effect import: `import "x"`
    if let Some(src) = toks.first().and_then(|t| string_value(source, t)) {
        return Some(StatementKind::Import {
            specifiers: Vec::new(),
            source: src,
        });
    }

    let from_idx = toks.iter().position(|t| t.is_ident(source, "from"))?;
    let src = toks.get(from_idx + 1).and_then(|t| string_value(source, t))?;
    let specifiers = parse_import_specifiers(source, &toks[..from_idx])?;

    Some(StatementKind::Import {
        specifiers,
        source: src,
    })
}

fn parse_import_specifiers(source: &str, toks: &[Token]) -> Option<Vec<ImportSpecifier>> {
    let mut specifiers = Vec::new();
    let mut i = 0;

    while i < toks.len() {
        let tok = &toks[i];
        if tok.is_punct(source, ",") {
            i += 1;
        } else if tok.is_punct(source, "*") {
            // * as ns
            let local = toks.get(i + 2)?;
            if !toks.get(i + 1)?.is_ident(source, "as") || local.kind != TokenKind::Ident {
                return None;
            }
            specifiers.push(ImportSpecifier::Namespace {
                local: local.text(source).to_string(),
            });
            i += 3;
        } else if tok.is_punct(source, "{") {
            let close = i + toks[i..].iter().position(|t| t.is_punct(source, "}"))?;
            specifiers.extend(parse_named_list(source, &toks[i + 1..close])?.into_iter().map(
                |(imported, local)| ImportSpecifier::Named { imported, local },
            ));
            i = close + 1;
        } else if tok.kind == TokenKind::Ident {
            specifiers.push(ImportSpecifier::Default {
                local: tok.text(source).to_string(),
            });
            i += 1;
        } else {
            return None;
        }
    }

    Some(specifiers)
}

/// Parse the inside of `{ a, b as c }` into `(name, alias)` pairs.
fn parse_named_list(source: &str, toks: &[Token]) -> Option<Vec<(String, String)>> {
    let mut names = Vec::new();
    for group in toks.split(|t| t.is_punct(source, ",")) {
        match group {
            [] => {}
            [name] => {
                let n = name_text(source, name)?;
                names.push((n.clone(), n));
            }
            [name, as_kw, alias] if as_kw.is_ident(source, "as") => {
                names.push((name_text(source, name)?, name_text(source, alias)?));
            }
            _ => return None,
        }
    }
    Some(names)
}

fn name_text(source: &str, tok: &Token) -> Option<String> {
    match tok.kind {
        TokenKind::Ident => Some(tok.text(source).to_string()),
        TokenKind::Str => string_value(source, tok),
        _ => None,
    }
}

fn classify_export(source: &str, toks: &[Token], marker: Range<usize>) -> StatementKind {
    let head = &toks[0];
    let text = head.text(source);

    if head.is_ident(source, "default") {
        return StatementKind::ExportDefault;
    }

    if head.is_punct(source, "*") || head.is_punct(source, "{") {
        if let Some(from_idx) = toks.iter().position(|t| t.is_ident(source, "from")) {
            let src = toks
                .get(from_idx + 1)
                .and_then(|t| string_value(source, t))
                .unwrap_or_default();
            return StatementKind::ExportFrom { source: src };
        }
        if head.is_punct(source, "{") {
            let close = toks
                .iter()
                .position(|t| t.is_punct(source, "}"))
                .unwrap_or(toks.len());
            let names = parse_named_list(source, &toks[1..close])
                .map(|pairs| pairs.into_iter().map(|(_, exported)| exported).collect())
                .unwrap_or_default();
            return StatementKind::ExportList { names };
        }
        return StatementKind::Other;
    }

    let decl = match text {
        "const" => Some(DeclKind::Const),
        "let" => Some(DeclKind::Let),
        "var" => Some(DeclKind::Var),
        "function" => Some(DeclKind::Function),
        "class" => Some(DeclKind::Class),
        "async" if toks.get(1).is_some_and(|t| t.is_ident(source, "function")) => {
            Some(DeclKind::AsyncFunction)
        }
        _ => None,
    };

    let Some(kind) = decl else {
        return StatementKind::Other;
    };

    let (names, initializer) = match kind {
        DeclKind::Const | DeclKind::Let | DeclKind::Var => {
            let names = declarator_names(source, &toks[1..]);
            let initializer = match &toks[1..] {
                [name, eq, ..] if name.kind == TokenKind::Ident && eq.is_punct(source, "=") => {
                    let single = !toks[1..]
                        .iter()
                        .scan(0i32, |depth, t| {
                            match t.text(source) {
                                "(" | "[" | "{" if t.kind == TokenKind::Punct => *depth += 1,
                                ")" | "]" | "}" if t.kind == TokenKind::Punct => *depth -= 1,
                                _ => {}
                            }
                            Some((*depth, *t))
                        })
                        .any(|(depth, t)| depth == 0 && t.is_punct(source, ","));
                    single.then_some(eq.end)
                }
                _ => None,
            };
            (names, initializer)
        }
        DeclKind::Function | DeclKind::AsyncFunction | DeclKind::Class => {
            let name = toks
                .iter()
                .skip(1)
                .find(|t| t.kind == TokenKind::Ident && !t.is_ident(source, "function"))
                .map(|t| t.text(source).to_string());
            (name.into_iter().collect(), None)
        }
    };

    StatementKind::ExportDecl {
        kind,
        names,
        marker,
        initializer,
    }
}

/// Names bound by a `const|let|var` declaration list.
fn declarator_names(source: &str, toks: &[Token]) -> Vec<String> {
    let mut names = Vec::new();
    let mut depth = 0i32;
    let mut expect_binding = true;

    for (i, tok) in toks.iter().enumerate() {
        let text = tok.text(source);
        if tok.kind == TokenKind::Punct {
            match text {
                "(" | "[" | "{" => {
                    // Destructuring pattern: collect the bound identifiers.
                    if depth == 0 && expect_binding {
                        names.extend(pattern_names(source, &toks[i..]));
                        expect_binding = false;
                    }
                    depth += 1;
                }
                ")" | "]" | "}" => depth -= 1,
                "," if depth == 0 => expect_binding = true,
                _ => {}
            }
        } else if depth == 0 && expect_binding && tok.kind == TokenKind::Ident {
            names.push(text.to_string());
            expect_binding = false;
        }
    }

    names
}

/// Identifiers bound by a destructuring pattern starting at `toks[0]`.
fn pattern_names(source: &str, toks: &[Token]) -> Vec<String> {
    let mut names = Vec::new();
    let mut depth = 0i32;
    let mut in_default = false;

    for (i, tok) in toks.iter().enumerate() {
        let text = tok.text(source);
        if tok.kind == TokenKind::Punct {
            match text {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                "=" => in_default = true,
                "," => in_default = false,
                _ => {}
            }
            continue;
        }
        if tok.kind != TokenKind::Ident || in_default {
            continue;
        }
        // `{ key: binding }` binds the value side, not the key.
        let is_key = toks.get(i + 1).is_some_and(|t| t.is_punct(source, ":"));
        if !is_key {
            names.push(text.to_string());
        }
    }

    names
}

fn classify_global_assign(source: &str, toks: &[Token]) -> Option<StatementKind> {
    let ns = &toks[0];
    if ns.kind != TokenKind::Ident || !GLOBAL_NAMESPACES.contains(&ns.text(source)) {
        return None;
    }

    let (name, eq) = match toks.get(1..) {
        Some([dot, name, eq, ..]) if dot.is_punct(source, ".") && name.kind == TokenKind::Ident => {
            (name.text(source).to_string(), eq)
        }
        Some([open, key, close, eq, ..])
            if open.is_punct(source, "[") && close.is_punct(source, "]") =>
        {
            (string_value(source, key)?, eq)
        }
        _ => return None,
    };

    if !eq.is_punct(source, "=") {
        return None;
    }

    Some(StatementKind::GlobalAssign {
        namespace: ns.text(source).to_string(),
        name,
        value_start: eq.end,
    })
}
