//! Query language over note metadata, and the `.base` views built on it.

pub mod ast;
pub mod eval;
mod lexer;
pub mod parser;
pub mod value;
pub mod view;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use eval::{
    eval_query, evaluate, field_value, filter_notes, group_by, matches, sort_notes, Direction,
    Filters, NoteGroup, UNCATEGORIZED,
};
pub use parser::parse_expression;
pub use value::Value;
pub use view::{apply_view, render_base, render_view, BaseFile, ViewConfig, ViewResult};
