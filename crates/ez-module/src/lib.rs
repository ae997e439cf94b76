//! Statement-level model of JavaScript config modules.
//!
//! Parses a constants module and a config module into top-level statements,
//! then renders a self-contained classic script: constants inlined in place of
//! their import, export markers stripped, and the config export rewritten as a
//! single assignment to a runtime global.

mod lexer;
mod module;
mod parser;
mod splice;

pub use lexer::{tokenize, LexError, LexErrorKind, Token, TokenKind};
pub use module::{ConfigModule, ConstantsModule, ExportedBinding, UnsupportedExport};
pub use parser::{
    is_global_assign, DeclKind, ImportSpecifier, ParseError, ParsedModule, Statement,
    StatementKind, GLOBAL_NAMESPACES,
};
pub use splice::{
    splice, AssignDirective, SpliceError, SpliceOptions, SplicePlan, Spliced, Violation,
};
