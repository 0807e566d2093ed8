//! Business logic services.
//!
//! Services orchestrate the template store, cache and renderer and provide
//! high-level operations: rendering and validating templates, building
//! contexts from captured messages and assembling vault notes.

mod cache;
mod context_builder;
mod defaults;
mod note_assembler;
mod template_engine;
mod template_loader;

pub use cache::{CacheStats, ChainStamp, DEFAULT_CACHE_CAPACITY, TemplateCache};
pub use context_builder::ContextBuilder;
pub use defaults::DEFAULT_TEMPLATES;
pub use note_assembler::NoteAssembler;
pub use template_engine::TemplateEngine;
pub use template_loader::TemplateLoader;
