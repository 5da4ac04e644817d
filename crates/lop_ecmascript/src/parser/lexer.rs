use lop_utils::rstr::Rstr;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
  Ident(Rstr),
  Str(Rstr),
  Num(f64),
  /// Backtick seen; the parser pulls the template body itself.
  TemplateStart,
  LParen,
  RParen,
  LBrace,
  RBrace,
  LBracket,
  RBracket,
  Semi,
  Comma,
  Dot,
  DotDotDot,
  Arrow,
  Colon,
  Question,
  QuestionDot,
  QuestionQuestion,
  Assign,
  Plus,
  Minus,
  Star,
  StarStar,
  Slash,
  Percent,
  PlusPlus,
  MinusMinus,
  EqEq,
  EqEqEq,
  NotEq,
  NotEqEq,
  Lt,
  LtEq,
  Gt,
  GtEq,
  Shl,
  Shr,
  UShr,
  AmpAmp,
  PipePipe,
  Amp,
  Pipe,
  Caret,
  Tilde,
  Bang,
  /// Any compound assignment (`+=`, `&&=`, `>>>=`, ...). The analysis only
  /// distinguishes plain from compound writes.
  CompoundAssign,
  Eof,
}

impl Token {
  pub fn is_ident(&self, name: &str) -> bool {
    matches!(self, Token::Ident(id) if id.as_str() == name)
  }
}

#[derive(Debug, Clone)]
pub struct Lexer<'s> {
  source: &'s str,
  bytes: &'s [u8],
  pos: usize,
  /// Whether a line terminator preceded the token about to be produced.
  pub newline_before: bool,
}

fn is_ident_start(c: char) -> bool {
  c == '$' || c == '_' || c.is_alphabetic()
}

fn is_ident_part(c: char) -> bool {
  c == '$' || c == '_' || c.is_alphanumeric()
}

impl<'s> Lexer<'s> {
  pub fn new(source: &'s str) -> Self {
    Self { source, bytes: source.as_bytes(), pos: 0, newline_before: false }
  }

  pub fn pos(&self) -> usize {
    self.pos
  }

  fn peek_char(&self) -> Option<char> {
    self.source[self.pos..].chars().next()
  }

  fn bump(&mut self) -> Option<char> {
    let c = self.peek_char()?;
    self.pos += c.len_utf8();
    Some(c)
  }

  fn eat(&mut self, byte: u8) -> bool {
    if self.bytes.get(self.pos) == Some(&byte) {
      self.pos += 1;
      true
    } else {
      false
    }
  }

  /// Accumulates `newline_before`; the parser clears the flag before
  /// pulling each token so repeated calls stay idempotent.
  pub fn skip_trivia(&mut self) {
    loop {
      match self.bytes.get(self.pos) {
        Some(b' ' | b'\t' | b'\r') => self.pos += 1,
        Some(b'\n') => {
          self.newline_before = true;
          self.pos += 1;
        }
        Some(b'/') if self.bytes.get(self.pos + 1) == Some(&b'/') => {
          while !matches!(self.bytes.get(self.pos), None | Some(b'\n')) {
            self.pos += 1;
          }
        }
        Some(b'/') if self.bytes.get(self.pos + 1) == Some(&b'*') => {
          self.pos += 2;
          while self.pos < self.bytes.len() {
            if self.bytes[self.pos] == b'*' && self.bytes.get(self.pos + 1) == Some(&b'/') {
              self.pos += 2;
              break;
            }
            if self.bytes[self.pos] == b'\n' {
              self.newline_before = true;
            }
            self.pos += 1;
          }
        }
        _ => break,
      }
    }
  }

  /// Produce the next token. `start` of the token is `self.pos()` right
  /// after `skip_trivia`; callers record it before calling.
  pub fn next_token(&mut self) -> Result<Token, (String, usize)> {
    self.skip_trivia();
    let Some(c) = self.peek_char() else {
      return Ok(Token::Eof);
    };

    if is_ident_start(c) {
      let start = self.pos;
      while self.peek_char().is_some_and(is_ident_part) {
        self.bump();
      }
      return Ok(Token::Ident(self.source[start..self.pos].into()));
    }

    if c.is_ascii_digit() || (c == '.' && self.bytes.get(self.pos + 1).is_some_and(u8::is_ascii_digit))
    {
      return self.read_number();
    }

    match c {
      '"' | '\'' => return self.read_string(c),
      '`' => {
        self.bump();
        return Ok(Token::TemplateStart);
      }
      _ => {}
    }

    self.bump();
    let token = match c {
      '(' => Token::LParen,
      ')' => Token::RParen,
      '{' => Token::LBrace,
      '}' => Token::RBrace,
      '[' => Token::LBracket,
      ']' => Token::RBracket,
      ';' => Token::Semi,
      ',' => Token::Comma,
      ':' => Token::Colon,
      '~' => Token::Tilde,
      '.' => {
        if self.bytes.get(self.pos) == Some(&b'.') && self.bytes.get(self.pos + 1) == Some(&b'.') {
          self.pos += 2;
          Token::DotDotDot
        } else {
          Token::Dot
        }
      }
      '?' => {
        if self.eat(b'?') {
          if self.eat(b'=') { Token::CompoundAssign } else { Token::QuestionQuestion }
        } else if self.eat(b'.') {
          Token::QuestionDot
        } else {
          Token::Question
        }
      }
      '=' => {
        if self.eat(b'=') {
          if self.eat(b'=') { Token::EqEqEq } else { Token::EqEq }
        } else if self.eat(b'>') {
          Token::Arrow
        } else {
          Token::Assign
        }
      }
      '!' => {
        if self.eat(b'=') {
          if self.eat(b'=') { Token::NotEqEq } else { Token::NotEq }
        } else {
          Token::Bang
        }
      }
      '+' => {
        if self.eat(b'+') {
          Token::PlusPlus
        } else if self.eat(b'=') {
          Token::CompoundAssign
        } else {
          Token::Plus
        }
      }
      '-' => {
        if self.eat(b'-') {
          Token::MinusMinus
        } else if self.eat(b'=') {
          Token::CompoundAssign
        } else {
          Token::Minus
        }
      }
      '*' => {
        if self.eat(b'*') {
          if self.eat(b'=') { Token::CompoundAssign } else { Token::StarStar }
        } else if self.eat(b'=') {
          Token::CompoundAssign
        } else {
          Token::Star
        }
      }
      '/' => {
        if self.eat(b'=') { Token::CompoundAssign } else { Token::Slash }
      }
      '%' => {
        if self.eat(b'=') { Token::CompoundAssign } else { Token::Percent }
      }
      '<' => {
        if self.eat(b'<') {
          if self.eat(b'=') { Token::CompoundAssign } else { Token::Shl }
        } else if self.eat(b'=') {
          Token::LtEq
        } else {
          Token::Lt
        }
      }
      '>' => {
        if self.eat(b'>') {
          if self.eat(b'>') {
            if self.eat(b'=') { Token::CompoundAssign } else { Token::UShr }
          } else if self.eat(b'=') {
            Token::CompoundAssign
          } else {
            Token::Shr
          }
        } else if self.eat(b'=') {
          Token::GtEq
        } else {
          Token::Gt
        }
      }
      '&' => {
        if self.eat(b'&') {
          if self.eat(b'=') { Token::CompoundAssign } else { Token::AmpAmp }
        } else if self.eat(b'=') {
          Token::CompoundAssign
        } else {
          Token::Amp
        }
      }
      '|' => {
        if self.eat(b'|') {
          if self.eat(b'=') { Token::CompoundAssign } else { Token::PipePipe }
        } else if self.eat(b'=') {
          Token::CompoundAssign
        } else {
          Token::Pipe
        }
      }
      '^' => {
        if self.eat(b'=') { Token::CompoundAssign } else { Token::Caret }
      }
      other => return Err((format!("Unexpected character `{other}`"), self.pos - other.len_utf8())),
    };
    Ok(token)
  }

  fn read_number(&mut self) -> Result<Token, (String, usize)> {
    let start = self.pos;
    if self.bytes[self.pos] == b'0'
      && matches!(self.bytes.get(self.pos + 1), Some(b'x' | b'X'))
    {
      self.pos += 2;
      while self.bytes.get(self.pos).is_some_and(u8::is_ascii_hexdigit) {
        self.pos += 1;
      }
      let digits = &self.source[start + 2..self.pos];
      let value = u64::from_str_radix(digits, 16)
        .map_err(|_| ("Invalid hex literal".to_string(), start))?;
      #[allow(clippy::cast_precision_loss)]
      return Ok(Token::Num(value as f64));
    }

    while self.bytes.get(self.pos).is_some_and(u8::is_ascii_digit) {
      self.pos += 1;
    }
    if self.bytes.get(self.pos) == Some(&b'.') {
      self.pos += 1;
      while self.bytes.get(self.pos).is_some_and(u8::is_ascii_digit) {
        self.pos += 1;
      }
    }
    if matches!(self.bytes.get(self.pos), Some(b'e' | b'E')) {
      self.pos += 1;
      if matches!(self.bytes.get(self.pos), Some(b'+' | b'-')) {
        self.pos += 1;
      }
      while self.bytes.get(self.pos).is_some_and(u8::is_ascii_digit) {
        self.pos += 1;
      }
    }
    let text = &self.source[start..self.pos];
    text
      .parse::<f64>()
      .map(Token::Num)
      .map_err(|_| (format!("Invalid number literal `{text}`"), start))
  }

  fn read_string(&mut self, quote: char) -> Result<Token, (String, usize)> {
    let start = self.pos;
    self.bump();
    let mut value = String::new();
    loop {
      match self.bump() {
        None | Some('\n') => return Err(("Unterminated string literal".to_string(), start)),
        Some(c) if c == quote => break,
        Some('\\') => match self.bump() {
          None => return Err(("Unterminated string literal".to_string(), start)),
          Some('n') => value.push('\n'),
          Some('t') => value.push('\t'),
          Some('r') => value.push('\r'),
          Some('0') => value.push('\0'),
          Some('\n') => {}
          Some(other) => value.push(other),
        },
        Some(c) => value.push(c),
      }
    }
    Ok(Token::Str(value.into()))
  }

  /// After `TemplateStart` or a `}` closing an interpolation: read raw text
  /// until `` ` `` (returns `(quasi, false)`) or `${` (returns
  /// `(quasi, true)`).
  pub fn read_template_chunk(&mut self) -> Result<(Rstr, bool), (String, usize)> {
    let start = self.pos;
    let mut value = String::new();
    loop {
      match self.bump() {
        None => return Err(("Unterminated template literal".to_string(), start)),
        Some('`') => return Ok((value.into(), false)),
        Some('$') if self.peek_char() == Some('{') => {
          self.bump();
          return Ok((value.into(), true));
        }
        Some('\\') => match self.bump() {
          None => return Err(("Unterminated template literal".to_string(), start)),
          Some('n') => value.push('\n'),
          Some('t') => value.push('\t'),
          Some('`') => value.push('`'),
          Some(other) => value.push(other),
        },
        Some(c) => value.push(c),
      }
    }
  }
}
