pub mod ast;
pub mod parser;

pub use crate::{
  ast::{AstBuilder, Node, NodeKind, Program},
  parser::{parse, ParseError},
};
