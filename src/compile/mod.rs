//! Field compilation.
//!
//! Context-specific projections of a field list: display pairs, CSV cells,
//! API objects, email lines and spam-check variables.

pub mod context;
pub mod email;
pub mod projection;
pub mod spam;

pub use context::{Context, Shape};
pub use email::email_lines;
pub use projection::{
    compile, field_label, render_value, CompiledField, Compiler, FileView, FilesView, Projection,
    RenderedValue,
};
pub use spam::spam_check_vars;
