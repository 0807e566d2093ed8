//! Template rendering engine.
//!
//! Templates are tokenized and parsed into a small syntax tree, then
//! interpreted against a render context. Inheritance (`extends`/`block`) is
//! resolved on text before parsing; see [`crate::services::TemplateLoader`].

mod ast;
mod cleanup;
mod compiled;
mod expression;
mod functions;
pub(crate) mod inheritance;
mod interpreter;
mod lexer;
mod parser;
mod scope;
mod template_renderer;

pub use ast::{Branch, Node, ParseError, walk};
pub use compiled::CompiledTemplate;
pub use expression::{ExpressionError, evaluate, try_evaluate};
pub use functions::{FunctionError, KNOWN_FUNCTIONS, call_function};
pub use interpreter::{IncludeResolver, NoIncludes};
pub use parser::{MAX_NESTING_DEPTH, parse};
pub use scope::Lookup;
pub(crate) use lexer::count_tags;
pub use template_renderer::{DEFAULT_MAX_INCLUDE_DEPTH, TemplateRenderer};
pub(crate) use template_renderer::{fallback_document, split_header};
