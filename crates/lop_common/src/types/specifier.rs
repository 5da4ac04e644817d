use std::fmt::Display;

use lop_utils::rstr::Rstr;

/// What an import clause names: a concrete binding or the whole namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Specifier {
  Star,
  Literal(Rstr),
}

impl Specifier {
  pub fn is_star(&self) -> bool {
    matches!(self, Self::Star)
  }

  pub fn as_literal(&self) -> Option<&Rstr> {
    match self {
      Self::Literal(name) => Some(name),
      Self::Star => None,
    }
  }
}

impl Display for Specifier {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Star => f.write_str("*"),
      Self::Literal(name) => f.write_str(name),
    }
  }
}

impl From<&str> for Specifier {
  fn from(value: &str) -> Self {
    if value == "*" { Self::Star } else { Self::Literal(value.into()) }
  }
}
