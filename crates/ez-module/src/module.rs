//! Constants and config module descriptions.

use serde::Serialize;

use crate::parser::{DeclKind, ParseError, ParsedModule, Statement, StatementKind};

/// A binding exported by the constants module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedBinding {
    pub name: String,
    pub kind: DeclKind,
    /// 1-based line of the declaration.
    pub line: usize,
}

/// An export form that cannot be turned into a local definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnsupportedExport {
    /// `export default` or `export ... from`.
    pub form: String,
    pub line: usize,
}

/// The constants module: plain definitions behind export markers.
#[derive(Debug, Clone)]
pub struct ConstantsModule {
    parsed: ParsedModule,
}

impl ConstantsModule {
    /// Parse the constants module source.
    pub fn parse(source: impl Into<String>) -> Result<Self, ParseError> {
        Ok(Self {
            parsed: ParsedModule::parse(source)?,
        })
    }

    /// The underlying statements.
    pub fn parsed(&self) -> &ParsedModule {
        &self.parsed
    }

    /// Every binding declared behind an export marker or listed in `export { }`.
    pub fn bindings(&self) -> Vec<ExportedBinding> {
        let mut bindings = Vec::new();
        for stmt in self.parsed.statements() {
            if let StatementKind::ExportDecl { kind, names, .. } = &stmt.kind {
                bindings.extend(names.iter().map(|name| ExportedBinding {
                    name: name.clone(),
                    kind: *kind,
                    line: stmt.line,
                }));
            }
        }
        bindings
    }

    /// True if `name` is exported, either by declaration or by an export list.
    pub fn exports(&self, name: &str) -> bool {
        self.parsed.statements().iter().any(|stmt| match &stmt.kind {
            StatementKind::ExportDecl { names, .. } | StatementKind::ExportList { names } => {
                names.iter().any(|n| n == name)
            }
            _ => false,
        })
    }

    /// Export forms that stripping cannot express.
    pub fn unsupported_exports(&self) -> Vec<UnsupportedExport> {
        self.parsed
            .statements()
            .iter()
            .filter_map(|stmt| {
                let form = match &stmt.kind {
                    StatementKind::ExportDefault => "export default".to_string(),
                    StatementKind::ExportFrom { source } => format!("export from '{}'", source),
                    _ => return None,
                };
                Some(UnsupportedExport {
                    form,
                    line: stmt.line,
                })
            })
            .collect()
    }

    /// Import statements inside the constants module (sources).
    pub fn imports(&self) -> Vec<(String, usize)> {
        self.parsed
            .statements()
            .iter()
            .filter_map(|stmt| match &stmt.kind {
                StatementKind::Import { source, .. } => Some((source.clone(), stmt.line)),
                _ => None,
            })
            .collect()
    }

    /// Render the module with every top-level export marker removed.
    ///
    /// Export declarations keep their declaration, export lists are dropped
    /// (their bindings are already local), and import statements and the
    /// unsupported export forms are dropped as well. Trailing whitespace is
    /// trimmed.
    pub fn strip_exports(&self) -> String {
        let mut out = String::with_capacity(self.parsed.source().len());
        let mut break_before = false;
        for stmt in self.parsed.statements() {
            let raw = self.parsed.slice(&stmt.leading);
            let leading = if break_before {
                ensure_line_break(raw)
            } else {
                raw.to_string()
            };
            match &stmt.kind {
                StatementKind::ExportDecl { marker, .. } => {
                    out.push_str(&leading);
                    out.push_str(self.parsed.slice(&(stmt.span.start..marker.start)));
                    out.push_str(self.parsed.slice(&(marker.end..stmt.span.end)));
                }
                StatementKind::ExportList { .. }
                | StatementKind::ExportDefault
                | StatementKind::ExportFrom { .. }
                | StatementKind::Import { .. } => {
                    break_before |= push_dropped_trivia(&mut out, &leading);
                    continue;
                }
                _ => {
                    out.push_str(&leading);
                    out.push_str(self.parsed.slice(&stmt.span));
                }
            }
            break_before = false;
        }
        out.push_str(self.parsed.trailing());
        out.truncate(out.trim_end().len());
        out
    }
}

/// The config module: one `config` export plus whatever else it needs.
#[derive(Debug, Clone)]
pub struct ConfigModule {
    parsed: ParsedModule,
}

impl ConfigModule {
    /// Parse the config module source.
    pub fn parse(source: impl Into<String>) -> Result<Self, ParseError> {
        Ok(Self {
            parsed: ParsedModule::parse(source)?,
        })
    }

    /// The underlying statements.
    pub fn parsed(&self) -> &ParsedModule {
        &self.parsed
    }

    /// Statements declaring `export const|let|var <name> = ...`.
    pub fn config_exports<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Statement> + 'a {
        self.parsed.statements().iter().filter(move |stmt| {
            matches!(
                &stmt.kind,
                StatementKind::ExportDecl {
                    kind: DeclKind::Const | DeclKind::Let | DeclKind::Var,
                    names,
                    initializer: Some(_),
                    ..
                } if names.len() == 1 && names[0] == name
            )
        })
    }
}

/// Keep comments that preceded a dropped statement; pure whitespace goes too.
/// Returns true if anything was written.
pub(crate) fn push_dropped_trivia(out: &mut String, leading: &str) -> bool {
    let kept = leading.trim_end();
    if kept.trim_start().is_empty() {
        return false;
    }
    out.push_str(kept);
    true
}

/// Make sure `leading` puts the following statement on a new line.
pub(crate) fn ensure_line_break(leading: &str) -> String {
    let rest = leading.trim_start_matches([' ', '\t']);
    if rest.starts_with('\n') || rest.starts_with("\r\n") {
        rest.to_string()
    } else {
        format!("\n{}", rest)
    }
}
