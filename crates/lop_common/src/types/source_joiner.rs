use super::source::Source;

/// Joins retained source fragments with single newlines, sizing the output
/// buffer up front.
#[derive(Default)]
pub struct SourceJoiner<'source> {
  inner: Vec<Box<dyn Source + 'source>>,
}

impl<'source> SourceJoiner<'source> {
  pub fn append_source<T: Source + 'source>(&mut self, source: T) {
    self.inner.push(Box::new(source));
  }

  pub fn is_empty(&self) -> bool {
    self.inner.is_empty()
  }

  pub fn join(&self) -> String {
    if self.inner.is_empty() {
      return String::new();
    }

    let size_hint =
      self.inner.iter().map(|source| source.content().len()).sum::<usize>() + self.inner.len() - 1;
    let mut ret = String::with_capacity(size_hint);

    for (index, source) in self.inner.iter().enumerate() {
      ret.push_str(source.content());
      if index < self.inner.len() - 1 {
        ret.push('\n');
      }
    }

    ret
  }
}

#[test]
fn join_inserts_single_newlines() {
  let mut joiner = SourceJoiner::default();
  joiner.append_source("const a = 1;");
  joiner.append_source("console.log(a);".to_string());
  assert_eq!(joiner.join(), "const a = 1;\nconsole.log(a);");
}
