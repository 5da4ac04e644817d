/// A piece of output the joiner can take ownership of, borrowed or owned.
pub trait Source {
  fn content(&self) -> &str;
}

impl Source for &str {
  fn content(&self) -> &str {
    self
  }
}

impl Source for String {
  fn content(&self) -> &str {
    self
  }
}
