//! Parser for the Container Linux Config dialect (a YAML subset)

pub mod ast;
mod grammar;
pub mod layout;
pub mod lexer;

pub use ast::*;
pub use grammar::parse;
pub use layout::Token;
