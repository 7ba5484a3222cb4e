pub mod catalog;
pub mod codegen;
pub mod context;
pub mod expressions;
pub mod sheet;

pub use catalog::{InstructionDescriptor, InstructionRegistry};
pub use codegen::{CodeGenerator, GeneratedCode};
pub use context::GenerationContext;
pub use expressions::compile_expression;
pub use sheet::{load_events_document, save_events_document, LoadedEvents};
