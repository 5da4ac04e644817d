fn is_identifier_start(c: char) -> bool {
  c == '$' || c == '_' || c.is_alphabetic()
}

fn is_identifier_part(c: char) -> bool {
  c == '$' || c == '_' || c.is_alphanumeric() || c == '\u{200c}' || c == '\u{200d}'
}

pub fn is_validate_identifier_name(name: &str) -> bool {
  let mut chars = name.chars();
  match chars.next() {
    Some(c) if is_identifier_start(c) => chars.all(is_identifier_part),
    _ => false,
  }
}

/// Rewrite an arbitrary string into something usable as a JS identifier,
/// replacing every illegal char run with `_`.
pub fn legitimize_identifier_name(name: &str) -> String {
  let mut legitimized = String::with_capacity(name.len());
  let mut chars = name.chars();
  match chars.next() {
    Some(first) if is_identifier_start(first) => legitimized.push(first),
    Some(_) => legitimized.push('_'),
    None => return "_".to_string(),
  }
  for c in chars {
    legitimized.push(if is_identifier_part(c) { c } else { '_' });
  }
  legitimized
}

#[test]
fn test_is_validate_identifier_name() {
  assert!(is_validate_identifier_name("foo"));
  assert!(is_validate_identifier_name("$_a1"));
  assert!(!is_validate_identifier_name("1aaaa"));
  assert!(!is_validate_identifier_name("a-b"));
  assert!(!is_validate_identifier_name(""));
}

#[test]
fn test_legitimize_identifier_name() {
  assert_eq!(legitimize_identifier_name("foo"), "foo");
  assert_eq!(legitimize_identifier_name("./foo-bar.js"), "__foo_bar_js");
  assert_eq!(legitimize_identifier_name("123"), "_23");
}
