use memchr::memchr_iter;

/// Zero-based line, zero-based column of a byte offset, the shape error
/// payloads carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
  pub line: u32,
  pub column: u32,
}

pub fn lines_count(str: &str) -> u32 {
  u32::try_from(memchr_iter(b'\n', str.as_bytes()).count()).unwrap()
}

/// Locate `offset` inside `source`. Offsets past the end clamp to the last
/// position so damaged spans still produce a usable location.
pub fn locate(source: &str, offset: usize) -> Location {
  let offset = offset.min(source.len());
  let before = &source.as_bytes()[..offset];
  let line = u32::try_from(memchr_iter(b'\n', before).count()).unwrap();
  let line_start = before.iter().rposition(|&b| b == b'\n').map_or(0, |pos| pos + 1);
  let column = u32::try_from(source[line_start..offset].chars().count()).unwrap();
  Location { line, column }
}

/// Render the offending line with a caret marker, the frame attached to
/// diagnostics.
pub fn code_frame(source: &str, offset: usize) -> String {
  let location = locate(source, offset);
  let line = source.lines().nth(location.line as usize).unwrap_or("");
  let gutter = format!("{}: ", location.line + 1);
  let mut frame = String::with_capacity(line.len() * 2 + 16);
  frame.push_str(&gutter);
  frame.push_str(line);
  frame.push('\n');
  frame.push_str(&" ".repeat(gutter.len() + location.column as usize));
  frame.push('^');
  frame
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_lines_count() {
    assert_eq!(lines_count("a\nb\nc"), 2);
    assert_eq!(lines_count("a\nb\nc\n"), 3);
    assert_eq!(lines_count("a"), 0);
  }

  #[test]
  fn test_locate() {
    let source = "const a = 1;\nconst b = 2;\n";
    assert_eq!(locate(source, 0), Location { line: 0, column: 0 });
    assert_eq!(locate(source, 13), Location { line: 1, column: 0 });
    assert_eq!(locate(source, 19), Location { line: 1, column: 6 });
    // Past the end clamps.
    assert_eq!(locate(source, 9999), Location { line: 2, column: 0 });
  }

  #[test]
  fn test_code_frame_points_at_offset() {
    let frame = code_frame("const a = 1;\nconst b = 2;", 19);
    assert!(frame.starts_with("2: const b = 2;"));
    assert!(frame.ends_with('^'));
  }
}
