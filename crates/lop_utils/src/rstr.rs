use std::{borrow::Borrow, fmt::Display, ops::Deref};

use arcstr::ArcStr;

/// An immutable, cheaply clonable string used for binding names, export names
/// and import specifiers. Cloning only bumps a reference count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rstr(ArcStr);

impl Rstr {
  pub fn new(value: &str) -> Self {
    Self(ArcStr::from(value))
  }

  pub fn as_str(&self) -> &str {
    self.0.as_str()
  }

  pub fn inner(&self) -> &ArcStr {
    &self.0
  }
}

impl Deref for Rstr {
  type Target = str;

  fn deref(&self) -> &Self::Target {
    self.as_str()
  }
}

impl Borrow<str> for Rstr {
  fn borrow(&self) -> &str {
    self.as_str()
  }
}

impl AsRef<str> for Rstr {
  fn as_ref(&self) -> &str {
    self.as_str()
  }
}

impl Display for Rstr {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    self.0.fmt(f)
  }
}

impl From<&str> for Rstr {
  fn from(value: &str) -> Self {
    Self(value.into())
  }
}

impl From<String> for Rstr {
  fn from(value: String) -> Self {
    Self(value.into())
  }
}

impl From<ArcStr> for Rstr {
  fn from(value: ArcStr) -> Self {
    Self(value)
  }
}
