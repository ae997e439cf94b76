//! Splice plan and renderer.
//!
//! The plan combines the constants bindings, the config module statements and
//! one "assign to runtime config" directive. Rendering walks the config module
//! in order, inlining the constants in place of their import, dropping stray
//! assignments to the runtime config global and rewriting the config export.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::module::{ensure_line_break, push_dropped_trivia, ConfigModule, ConstantsModule};
use crate::parser::{is_global_assign, ImportSpecifier, ParseError, ParsedModule, StatementKind};

/// Where the config value ends up at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignDirective {
    /// Global namespace object (`window`).
    pub namespace: String,
    /// Global property name (`EZ_CONFIG`).
    pub global_name: String,
    /// Name of the exported config binding (`config`).
    pub export_name: String,
}

impl Default for AssignDirective {
    fn default() -> Self {
        Self {
            namespace: "window".to_string(),
            global_name: "EZ_CONFIG".to_string(),
            export_name: "config".to_string(),
        }
    }
}

impl AssignDirective {
    /// The assignment target, e.g. `window.EZ_CONFIG`.
    pub fn target(&self) -> String {
        format!("{}.{}", self.namespace, self.global_name)
    }
}

/// Splice options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpliceOptions {
    /// Module path the config module imports the constants from.
    pub constants_path: String,
    pub directive: AssignDirective,
    /// Contract violations are errors instead of warnings.
    pub strict: bool,
}

impl Default for SpliceOptions {
    fn default() -> Self {
        Self {
            constants_path: "@/config/constant".to_string(),
            directive: AssignDirective::default(),
            strict: true,
        }
    }
}

/// A contract violation: an error in strict mode, a warning otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Violation {
    /// The config module never imports the constants module.
    MissingConstantsImport { path: String },
    /// No `export const <name> =` statement.
    MissingConfigExport { name: String },
    /// More than one config export; only the first is rewritten.
    DuplicateConfigExport { name: String, line: usize },
    /// Import of a module other than the constants module.
    UnresolvedImport { source: String, line: usize },
    /// Default or namespace import of the constants module.
    UnsupportedImport { local: String, line: usize },
    /// Imported name the constants module does not export.
    MissingBinding { name: String, line: usize },
    /// `export default` or a re-export that cannot become a local definition.
    UnsupportedExport { form: String, line: usize },
    /// The rendered output still contains import statements.
    ResidualImports { count: usize },
    /// The rendered output does not assign the global exactly once.
    GlobalAssignCount { target: String, count: usize },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::MissingConstantsImport { path } => {
                write!(f, "no import of '{}' found in config module", path)
            }
            Violation::MissingConfigExport { name } => {
                write!(f, "no 'export const {} = ...' found in config module", name)
            }
            Violation::DuplicateConfigExport { name, line } => {
                write!(f, "duplicate export of '{}' at line {}", name, line)
            }
            Violation::UnresolvedImport { source, line } => {
                write!(f, "import of '{}' at line {} cannot be inlined", source, line)
            }
            Violation::UnsupportedImport { local, line } => write!(
                f,
                "default or namespace import '{}' at line {} is not supported",
                local, line
            ),
            Violation::MissingBinding { name, line } => write!(
                f,
                "'{}' imported at line {} is not exported by the constants module",
                name, line
            ),
            Violation::UnsupportedExport { form, line } => {
                write!(f, "'{}' at line {} cannot be inlined", form, line)
            }
            Violation::ResidualImports { count } => {
                write!(f, "output still contains {} import statement(s)", count)
            }
            Violation::GlobalAssignCount { target, count } => write!(
                f,
                "output assigns {} {} time(s), expected exactly once",
                target, count
            ),
        }
    }
}

/// Splice failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpliceError {
    #[error("constants module: {0}")]
    ConstantsParse(ParseError),

    #[error("config module: {0}")]
    ConfigParse(ParseError),

    #[error("spliced output: {0}")]
    OutputParse(ParseError),

    #[error("{0}")]
    Contract(Violation),
}

/// Rendered splice output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Spliced {
    pub text: String,
    /// Violations tolerated in lenient mode.
    pub warnings: Vec<Violation>,
}

/// A planned splice over two parsed modules.
#[derive(Debug, Clone)]
pub struct SplicePlan {
    constants: ConstantsModule,
    config: ConfigModule,
    options: SpliceOptions,
}

impl SplicePlan {
    /// Parse both module sources into a plan.
    pub fn new(
        config_source: impl Into<String>,
        constants_source: impl Into<String>,
        options: SpliceOptions,
    ) -> Result<Self, SpliceError> {
        let constants =
            ConstantsModule::parse(constants_source).map_err(SpliceError::ConstantsParse)?;
        let config = ConfigModule::parse(config_source).map_err(SpliceError::ConfigParse)?;
        Ok(Self {
            constants,
            config,
            options,
        })
    }

    /// The parsed constants module.
    pub fn constants(&self) -> &ConstantsModule {
        &self.constants
    }

    /// The parsed config module.
    pub fn config(&self) -> &ConfigModule {
        &self.config
    }

    /// Render the spliced output.
    pub fn render(&self) -> Result<Spliced, SpliceError> {
        let mut violations = Violations::new(self.options.strict);
        let directive = &self.options.directive;
        let parsed = self.config.parsed();

        for export in self.constants.unsupported_exports() {
            violations.report(Violation::UnsupportedExport {
                form: export.form,
                line: export.line,
            })?;
        }
        for (source, line) in self.constants.imports() {
            violations.report(Violation::UnresolvedImport { source, line })?;
        }

        if parsed.imports_from(&self.options.constants_path).next().is_none() {
            violations.report(Violation::MissingConstantsImport {
                path: self.options.constants_path.clone(),
            })?;
        }

        let mut config_exports = self.config.config_exports(&directive.export_name);
        let config_stmt = config_exports.next();
        if config_stmt.is_none() {
            violations.report(Violation::MissingConfigExport {
                name: directive.export_name.clone(),
            })?;
        }
        for extra in config_exports {
            violations.report(Violation::DuplicateConfigExport {
                name: directive.export_name.clone(),
                line: extra.line,
            })?;
        }

        let capacity = parsed.source().len() + self.constants.parsed().source().len();
        let mut out = String::with_capacity(capacity);
        let mut inlined = false;
        // The next emitted statement must start on a fresh line.
        let mut break_before = false;

        for stmt in parsed.statements() {
            let raw = parsed.slice(&stmt.leading);
            let leading = if break_before {
                ensure_line_break(raw)
            } else {
                raw.to_string()
            };

            match &stmt.kind {
                StatementKind::Import { specifiers, source }
                    if *source == self.options.constants_path =>
                {
                    let aliases = self.check_specifiers(specifiers, stmt.line, &mut violations)?;
                    if inlined {
                        push_dropped_trivia(&mut out, &leading);
                    } else {
                        out.push_str(&leading);
                        out.push_str(&self.constants.strip_exports());
                        inlined = true;
                    }
                    for (imported, local) in aliases {
                        out.push_str(&format!("\nconst {} = {};", local, imported));
                    }
                    break_before = true;
                    continue;
                }
                StatementKind::Import { source, .. } => {
                    violations.report(Violation::UnresolvedImport {
                        source: source.clone(),
                        line: stmt.line,
                    })?;
                    out.push_str(&leading);
                    out.push_str(parsed.slice(&stmt.span));
                }
                kind if is_global_assign(kind, &directive.namespace, &directive.global_name) => {
                    break_before |= push_dropped_trivia(&mut out, &leading);
                    continue;
                }
                StatementKind::ExportDecl {
                    initializer: Some(value_start),
                    ..
                } if config_stmt.is_some_and(|c| std::ptr::eq(c, stmt)) => {
                    out.push_str(&leading);
                    out.push_str(&directive.target());
                    out.push_str(" =");
                    out.push_str(&parsed.source()[*value_start..stmt.span.end]);
                }
                StatementKind::ExportDecl { marker, .. } => {
                    out.push_str(&leading);
                    out.push_str(parsed.slice(&(stmt.span.start..marker.start)));
                    out.push_str(parsed.slice(&(marker.end..stmt.span.end)));
                }
                StatementKind::ExportList { .. } => {
                    break_before |= push_dropped_trivia(&mut out, &leading);
                    continue;
                }
                StatementKind::ExportDefault | StatementKind::ExportFrom { .. } => {
                    let form = match &stmt.kind {
                        StatementKind::ExportFrom { source } => format!("export from '{}'", source),
                        _ => "export default".to_string(),
                    };
                    violations.report(Violation::UnsupportedExport {
                        form,
                        line: stmt.line,
                    })?;
                    break_before |= push_dropped_trivia(&mut out, &leading);
                    continue;
                }
                _ => {
                    out.push_str(&leading);
                    out.push_str(parsed.slice(&stmt.span));
                }
            }
            break_before = false;
        }
        out.push_str(parsed.trailing());

        self.check_output(&out, &mut violations)?;

        Ok(Spliced {
            text: out,
            warnings: violations.into_warnings(),
        })
    }

    /// Validate the constants import's specifiers, returning `(imported, local)`
    /// pairs that need an alias binding.
    fn check_specifiers(
        &self,
        specifiers: &[ImportSpecifier],
        line: usize,
        violations: &mut Violations,
    ) -> Result<Vec<(String, String)>, SpliceError> {
        let mut aliases = Vec::new();
        for spec in specifiers {
            match spec {
                ImportSpecifier::Named { imported, local } => {
                    if !self.constants.exports(imported) {
                        violations.report(Violation::MissingBinding {
                            name: imported.clone(),
                            line,
                        })?;
                    }
                    if imported != local {
                        aliases.push((imported.clone(), local.clone()));
                    }
                }
                ImportSpecifier::Default { local } | ImportSpecifier::Namespace { local } => {
                    violations.report(Violation::UnsupportedImport {
                        local: local.clone(),
                        line,
                    })?;
                }
            }
        }
        Ok(aliases)
    }

    /// The output must be a classic script assigning the global exactly once.
    fn check_output(&self, text: &str, violations: &mut Violations) -> Result<(), SpliceError> {
        let output = ParsedModule::parse(text).map_err(SpliceError::OutputParse)?;
        let directive = &self.options.directive;

        let imports = output.import_count();
        if imports > 0 && !violations.has_unresolved_import() {
            violations.report(Violation::ResidualImports { count: imports })?;
        }

        let count = output.global_assign_count(&directive.namespace, &directive.global_name);
        if count != 1 && !violations.has_missing_export() {
            violations.report(Violation::GlobalAssignCount {
                target: directive.target(),
                count,
            })?;
        }
        Ok(())
    }
}

/// Collects violations, failing on the first one in strict mode.
struct Violations {
    strict: bool,
    warnings: Vec<Violation>,
}

impl Violations {
    fn new(strict: bool) -> Self {
        Self {
            strict,
            warnings: Vec::new(),
        }
    }

    fn report(&mut self, violation: Violation) -> Result<(), SpliceError> {
        if self.strict {
            return Err(SpliceError::Contract(violation));
        }
        self.warnings.push(violation);
        Ok(())
    }

    fn has_unresolved_import(&self) -> bool {
        self.warnings
            .iter()
            .any(|v| matches!(v, Violation::UnresolvedImport { .. }))
    }

    fn has_missing_export(&self) -> bool {
        self.warnings
            .iter()
            .any(|v| matches!(v, Violation::MissingConfigExport { .. }))
    }

    fn into_warnings(self) -> Vec<Violation> {
        self.warnings
    }
}

/// Splice a config module and a constants module with the given options.
pub fn splice(
    config_source: &str,
    constants_source: &str,
    options: &SpliceOptions,
) -> Result<Spliced, SpliceError> {
    SplicePlan::new(config_source, constants_source, options.clone())?.render()
}
