mod lexer;

use lop_common::{NodeIdx, Span};
use lop_utils::rstr::Rstr;

use crate::ast::{
  AssignOp, AstBuilder, BinaryOp, Class, Function, LogicalOp, NodeKind, Program, PropertyKind,
  UnaryOp, VarDeclKind,
};

use self::lexer::{Lexer, Token};

#[derive(Debug, Clone)]
pub struct ParseError {
  pub message: String,
  /// Byte offset of the offending token.
  pub pos: usize,
}

type Result<T> = std::result::Result<T, ParseError>;

/// Parse one module source into a [`Program`]. This is the default
/// implementation behind the graph's `context_parse` hook; callers may
/// substitute their own parser as long as node spans are byte offsets.
pub fn parse(source: &str) -> std::result::Result<Program, ParseError> {
  Parser::new(source).parse_program()
}

struct Parser<'s> {
  source: &'s str,
  lexer: Lexer<'s>,
  token: Token,
  token_start: usize,
  token_end: usize,
  prev_end: usize,
  builder: AstBuilder,
}

impl<'s> Parser<'s> {
  fn new(source: &'s str) -> Self {
    Parser {
      source,
      lexer: Lexer::new(source),
      token: Token::Eof,
      token_start: 0,
      token_end: 0,
      prev_end: 0,
      builder: AstBuilder::default(),
    }
  }

  fn bump(&mut self) -> Result<()> {
    self.prev_end = self.token_end;
    self.lexer.newline_before = false;
    self.lexer.skip_trivia();
    self.token_start = self.lexer.pos();
    self.token =
      self.lexer.next_token().map_err(|(message, pos)| ParseError { message, pos })?;
    self.token_end = self.lexer.pos();
    Ok(())
  }

  fn error<T>(&self, message: impl Into<String>) -> Result<T> {
    Err(ParseError { message: message.into(), pos: self.token_start })
  }

  fn eat(&mut self, token: &Token) -> Result<bool> {
    if &self.token == token {
      self.bump()?;
      Ok(true)
    } else {
      Ok(false)
    }
  }

  fn expect(&mut self, token: &Token, what: &str) -> Result<()> {
    if &self.token == token {
      self.bump()
    } else {
      self.error(format!("Expected {what}"))
    }
  }

  fn is_kw(&self, name: &str) -> bool {
    self.token.is_ident(name)
  }

  fn eat_kw(&mut self, name: &str) -> Result<bool> {
    if self.is_kw(name) {
      self.bump()?;
      Ok(true)
    } else {
      Ok(false)
    }
  }

  fn expect_ident(&mut self, what: &str) -> Result<(Rstr, Span)> {
    let span = Span::new(self.token_start as u32, self.token_end as u32);
    match std::mem::replace(&mut self.token, Token::Eof) {
      Token::Ident(name) => {
        self.bump()?;
        Ok((name, span))
      }
      other => {
        self.token = other;
        self.error(format!("Expected {what}"))
      }
    }
  }

  fn span_from(&self, start: usize) -> Span {
    Span::new(start as u32, self.prev_end as u32)
  }

  fn peek(&self) -> Token {
    let mut lookahead = self.lexer.clone();
    lookahead.skip_trivia();
    lookahead.next_token().unwrap_or(Token::Eof)
  }

  /// Statement terminator: explicit `;`, or a position where ASI applies.
  fn eat_semi(&mut self) -> Result<()> {
    if self.eat(&Token::Semi)? {
      return Ok(());
    }
    if matches!(self.token, Token::RBrace | Token::Eof) || self.lexer.newline_before {
      return Ok(());
    }
    self.error("Expected `;`")
  }

  fn parse_program(mut self) -> std::result::Result<Program, ParseError> {
    self.bump()?;
    let mut body = Vec::new();
    while self.token != Token::Eof {
      body.push(self.parse_statement()?);
    }
    let end = self.source.len();
    Ok(self.builder.finish(Span::new(0, end as u32), body))
  }

  // ---------------------------------------------------------------- statements

  fn parse_statement(&mut self) -> Result<NodeIdx> {
    let start = self.token_start;
    match &self.token {
      Token::LBrace => {
        let body = self.parse_block_body()?;
        Ok(self.builder.push(self.span_from(start), NodeKind::BlockStatement { body }))
      }
      Token::Semi => {
        self.bump()?;
        Ok(self.builder.push(self.span_from(start), NodeKind::EmptyStatement))
      }
      Token::Ident(name) => match name.as_str() {
        "import" if !matches!(self.peek(), Token::LParen | Token::Dot) => {
          self.parse_import_declaration()
        }
        "export" => self.parse_export_declaration(),
        "const" | "let" | "var"
          if matches!(self.peek(), Token::Ident(_) | Token::LBrace | Token::LBracket) =>
        {
          let declaration = self.parse_variable_declaration()?;
          self.eat_semi()?;
          Ok(declaration)
        }
        "function" => self.parse_function_declaration(false),
        "async" if self.peek().is_ident("function") && !self.lexer.newline_before => {
          self.bump()?;
          self.parse_function_declaration(true)
        }
        "class" => self.parse_class_declaration(),
        "if" => self.parse_if_statement(),
        "while" => self.parse_while_statement(),
        "for" => self.parse_for_statement(),
        "try" => self.parse_try_statement(),
        "throw" => {
          self.bump()?;
          let argument = self.parse_expression()?;
          self.eat_semi()?;
          Ok(self.builder.push(self.span_from(start), NodeKind::ThrowStatement { argument }))
        }
        "return" => {
          self.bump()?;
          let argument = if matches!(self.token, Token::Semi | Token::RBrace | Token::Eof)
            || self.lexer.newline_before
          {
            None
          } else {
            Some(self.parse_expression()?)
          };
          self.eat_semi()?;
          Ok(self.builder.push(self.span_from(start), NodeKind::ReturnStatement { argument }))
        }
        "break" | "continue" => {
          let is_break = name.as_str() == "break";
          self.bump()?;
          let label = if let Token::Ident(label) = &self.token {
            if self.lexer.newline_before {
              None
            } else {
              let label = label.clone();
              self.bump()?;
              Some(label)
            }
          } else {
            None
          };
          self.eat_semi()?;
          let kind = if is_break {
            NodeKind::BreakStatement { label }
          } else {
            NodeKind::ContinueStatement { label }
          };
          Ok(self.builder.push(self.span_from(start), kind))
        }
        _ if matches!(self.peek(), Token::Colon) => {
          let (label, _) = self.expect_ident("label")?;
          self.bump()?;
          let body = self.parse_statement()?;
          Ok(self.builder.push(self.span_from(start), NodeKind::LabeledStatement { label, body }))
        }
        _ => self.parse_expression_statement(),
      },
      _ => self.parse_expression_statement(),
    }
  }

  fn parse_expression_statement(&mut self) -> Result<NodeIdx> {
    let start = self.token_start;
    let expression = self.parse_expression()?;
    self.eat_semi()?;
    Ok(self.builder.push(self.span_from(start), NodeKind::ExpressionStatement { expression }))
  }

  fn parse_block_body(&mut self) -> Result<Vec<NodeIdx>> {
    self.expect(&Token::LBrace, "`{`")?;
    let mut body = Vec::new();
    while self.token != Token::RBrace {
      if self.token == Token::Eof {
        return self.error("Unexpected end of input, expected `}`");
      }
      body.push(self.parse_statement()?);
    }
    self.bump()?;
    Ok(body)
  }

  fn parse_block_statement(&mut self) -> Result<NodeIdx> {
    let start = self.token_start;
    let body = self.parse_block_body()?;
    Ok(self.builder.push(self.span_from(start), NodeKind::BlockStatement { body }))
  }

  fn parse_variable_declaration(&mut self) -> Result<NodeIdx> {
    let start = self.token_start;
    let kind = match &self.token {
      Token::Ident(kw) if kw.as_str() == "var" => VarDeclKind::Var,
      Token::Ident(kw) if kw.as_str() == "let" => VarDeclKind::Let,
      Token::Ident(kw) if kw.as_str() == "const" => VarDeclKind::Const,
      _ => return self.error("Expected a variable declaration keyword"),
    };
    self.bump()?;

    let mut declarations = Vec::new();
    loop {
      let declarator_start = self.token_start;
      let id = self.parse_binding_pattern()?;
      let init = if self.eat(&Token::Assign)? { Some(self.parse_assignment()?) } else { None };
      declarations.push(
        self.builder.push(self.span_from(declarator_start), NodeKind::VariableDeclarator {
          id,
          init,
        }),
      );
      if !self.eat(&Token::Comma)? {
        break;
      }
    }
    Ok(self.builder.push(self.span_from(start), NodeKind::VariableDeclaration {
      kind,
      declarations,
    }))
  }

  fn parse_binding_pattern(&mut self) -> Result<NodeIdx> {
    let start = self.token_start;
    let pattern = match &self.token {
      Token::LBrace => {
        self.bump()?;
        let mut properties = Vec::new();
        while self.token != Token::RBrace {
          if self.eat(&Token::DotDotDot)? {
            let argument = self.parse_binding_pattern()?;
            properties
              .push(self.builder.push(self.span_from(start), NodeKind::RestElement { argument }));
          } else {
            let property_start = self.token_start;
            let (name, key_span) = self.expect_ident("binding name")?;
            let key = self.builder.identifier(key_span, name.clone());
            let value = if self.eat(&Token::Colon)? {
              self.parse_binding_pattern()?
            } else {
              self.builder.identifier(key_span, name)
            };
            let value = if self.eat(&Token::Assign)? {
              let right = self.parse_assignment()?;
              self.builder.push(self.span_from(property_start), NodeKind::AssignmentPattern {
                left: value,
                right,
              })
            } else {
              value
            };
            properties.push(self.builder.push(self.span_from(property_start), NodeKind::Property {
              key,
              value,
              kind: PropertyKind::Init,
              computed: false,
              shorthand: true,
            }));
          }
          if !self.eat(&Token::Comma)? {
            break;
          }
        }
        self.expect(&Token::RBrace, "`}`")?;
        self.builder.push(self.span_from(start), NodeKind::ObjectPattern { properties })
      }
      Token::LBracket => {
        self.bump()?;
        let mut elements = Vec::new();
        while self.token != Token::RBracket {
          if self.token == Token::Comma {
            elements.push(None);
            self.bump()?;
            continue;
          }
          if self.eat(&Token::DotDotDot)? {
            let argument = self.parse_binding_pattern()?;
            elements.push(Some(
              self.builder.push(self.span_from(start), NodeKind::RestElement { argument }),
            ));
          } else {
            elements.push(Some(self.parse_binding_pattern()?));
          }
          if self.token != Token::RBracket {
            self.expect(&Token::Comma, "`,`")?;
          }
        }
        self.bump()?;
        self.builder.push(self.span_from(start), NodeKind::ArrayPattern { elements })
      }
      Token::Ident(_) => {
        let (name, span) = self.expect_ident("binding name")?;
        self.builder.identifier(span, name)
      }
      _ => return self.error("Expected a binding pattern"),
    };

    if self.eat(&Token::Assign)? {
      let right = self.parse_assignment()?;
      return Ok(
        self
          .builder
          .push(self.span_from(start), NodeKind::AssignmentPattern { left: pattern, right }),
      );
    }
    Ok(pattern)
  }

  fn parse_function_declaration(&mut self, is_async: bool) -> Result<NodeIdx> {
    let start = self.token_start;
    self.bump()?; // `function`
    let is_generator = self.eat(&Token::Star)?;
    let (name, name_span) = self.expect_ident("function name")?;
    let id = self.builder.identifier(name_span, name);
    let params = self.parse_params()?;
    let body = self.parse_block_statement()?;
    Ok(self.builder.push(
      self.span_from(start),
      NodeKind::FunctionDeclaration(Function {
        id: Some(id),
        params,
        body,
        is_async,
        is_generator,
      }),
    ))
  }

  fn parse_params(&mut self) -> Result<Vec<NodeIdx>> {
    self.expect(&Token::LParen, "`(`")?;
    let mut params = Vec::new();
    while self.token != Token::RParen {
      if self.eat(&Token::DotDotDot)? {
        let start = self.token_start;
        let argument = self.parse_binding_pattern()?;
        params.push(self.builder.push(self.span_from(start), NodeKind::RestElement { argument }));
      } else {
        params.push(self.parse_binding_pattern()?);
      }
      if !self.eat(&Token::Comma)? {
        break;
      }
    }
    self.expect(&Token::RParen, "`)`")?;
    Ok(params)
  }

  fn parse_class_declaration(&mut self) -> Result<NodeIdx> {
    let start = self.token_start;
    let class = self.parse_class_tail()?;
    Ok(self.builder.push(self.span_from(start), NodeKind::ClassDeclaration(class)))
  }

  /// `class` has already been observed; consumes from the keyword on.
  fn parse_class_tail(&mut self) -> Result<Class> {
    self.bump()?; // `class`
    let id = if let Token::Ident(name) = &self.token {
      if name.as_str() == "extends" {
        None
      } else {
        let (name, span) = self.expect_ident("class name")?;
        Some(self.builder.identifier(span, name))
      }
    } else {
      None
    };
    let super_class = if self.eat_kw("extends")? { Some(self.parse_unary()?) } else { None };

    self.expect(&Token::LBrace, "`{`")?;
    let mut body = Vec::new();
    while self.token != Token::RBrace {
      if self.eat(&Token::Semi)? {
        continue;
      }
      let member_start = self.token_start;
      let mut is_static = false;
      if self.is_kw("static") && !matches!(self.peek(), Token::LParen | Token::Assign) {
        is_static = true;
        self.bump()?;
      }
      let (key, computed) = self.parse_property_key()?;
      if self.token == Token::LParen {
        let params = self.parse_params()?;
        let fn_body = self.parse_block_statement()?;
        let value = self.builder.push(
          self.span_from(member_start),
          NodeKind::FunctionExpression(Function {
            id: None,
            params,
            body: fn_body,
            is_async: false,
            is_generator: false,
          }),
        );
        body.push(self.builder.push(self.span_from(member_start), NodeKind::MethodDefinition {
          key,
          value,
          computed,
          is_static,
        }));
      } else {
        let value = if self.eat(&Token::Assign)? { Some(self.parse_assignment()?) } else { None };
        self.eat_semi()?;
        body.push(self.builder.push(self.span_from(member_start), NodeKind::PropertyDefinition {
          key,
          value,
          computed,
          is_static,
        }));
      }
    }
    self.bump()?;
    Ok(Class { id, super_class, body })
  }

  fn parse_property_key(&mut self) -> Result<(NodeIdx, bool)> {
    match &self.token {
      Token::LBracket => {
        self.bump()?;
        let key = self.parse_assignment()?;
        self.expect(&Token::RBracket, "`]`")?;
        Ok((key, true))
      }
      Token::Str(value) => {
        let value = value.clone();
        let span = Span::new(self.token_start as u32, self.token_end as u32);
        self.bump()?;
        Ok((self.builder.string(span, value), false))
      }
      Token::Num(value) => {
        let value = *value;
        let span = Span::new(self.token_start as u32, self.token_end as u32);
        self.bump()?;
        Ok((self.builder.number(span, value), false))
      }
      _ => {
        let (name, span) = self.expect_ident("property name")?;
        Ok((self.builder.identifier(span, name), false))
      }
    }
  }

  fn parse_if_statement(&mut self) -> Result<NodeIdx> {
    let start = self.token_start;
    self.bump()?;
    self.expect(&Token::LParen, "`(`")?;
    let test = self.parse_expression()?;
    self.expect(&Token::RParen, "`)`")?;
    let consequent = self.parse_statement()?;
    let alternate = if self.eat_kw("else")? { Some(self.parse_statement()?) } else { None };
    Ok(self.builder.push(self.span_from(start), NodeKind::IfStatement {
      test,
      consequent,
      alternate,
    }))
  }

  fn parse_while_statement(&mut self) -> Result<NodeIdx> {
    let start = self.token_start;
    self.bump()?;
    self.expect(&Token::LParen, "`(`")?;
    let test = self.parse_expression()?;
    self.expect(&Token::RParen, "`)`")?;
    let body = self.parse_statement()?;
    Ok(self.builder.push(self.span_from(start), NodeKind::WhileStatement { test, body }))
  }

  fn parse_for_statement(&mut self) -> Result<NodeIdx> {
    let start = self.token_start;
    self.bump()?;
    let is_await = self.eat_kw("await")?;
    self.expect(&Token::LParen, "`(`")?;

    // Empty init: a plain `for (;;)` loop.
    if self.eat(&Token::Semi)? {
      return self.parse_for_tail(start, None, is_await);
    }

    let left = if matches!(&self.token, Token::Ident(kw) if matches!(kw.as_str(), "var" | "let" | "const"))
    {
      let kind = match &self.token {
        Token::Ident(kw) if kw.as_str() == "var" => VarDeclKind::Var,
        Token::Ident(kw) if kw.as_str() == "let" => VarDeclKind::Let,
        _ => VarDeclKind::Const,
      };
      let decl_start = self.token_start;
      self.bump()?;
      let id = self.parse_binding_pattern()?;
      if self.is_kw("of") || self.is_kw("in") {
        let is_of = self.is_kw("of");
        self.bump()?;
        let right = self.parse_assignment()?;
        self.expect(&Token::RParen, "`)`")?;
        let body = self.parse_statement()?;
        let declarator = self
          .builder
          .push(self.span_from(decl_start), NodeKind::VariableDeclarator { id, init: None });
        let left = self.builder.push(self.span_from(decl_start), NodeKind::VariableDeclaration {
          kind,
          declarations: vec![declarator],
        });
        let kind = if is_of {
          NodeKind::ForOfStatement { left, right, body, is_await }
        } else {
          NodeKind::ForInStatement { left, right, body }
        };
        return Ok(self.builder.push(self.span_from(start), kind));
      }
      // Plain C-style loop: finish this declarator, then any further ones.
      let init = if self.eat(&Token::Assign)? { Some(self.parse_assignment()?) } else { None };
      let mut declarations = vec![
        self.builder.push(self.span_from(decl_start), NodeKind::VariableDeclarator { id, init }),
      ];
      while self.eat(&Token::Comma)? {
        let declarator_start = self.token_start;
        let id = self.parse_binding_pattern()?;
        let init = if self.eat(&Token::Assign)? { Some(self.parse_assignment()?) } else { None };
        declarations.push(
          self
            .builder
            .push(self.span_from(declarator_start), NodeKind::VariableDeclarator { id, init }),
        );
      }
      self.builder.push(self.span_from(decl_start), NodeKind::VariableDeclaration {
        kind,
        declarations,
      })
    } else {
      let expression = self.parse_expression()?;
      if self.is_kw("of") {
        self.bump()?;
        let right = self.parse_assignment()?;
        self.expect(&Token::RParen, "`)`")?;
        let body = self.parse_statement()?;
        return Ok(self.builder.push(self.span_from(start), NodeKind::ForOfStatement {
          left: expression,
          right,
          body,
          is_await,
        }));
      }
      // `for (x in y)` parses `x in y` as a binary expression; unpick it.
      if self.token == Token::RParen {
        if let NodeKind::BinaryExpression { operator: BinaryOp::In, left, right } =
          self.builder.kind(expression)
        {
          let (left, right) = (*left, *right);
          self.bump()?;
          let body = self.parse_statement()?;
          return Ok(
            self.builder.push(self.span_from(start), NodeKind::ForInStatement { left, right, body }),
          );
        }
      }
      expression
    };

    self.expect(&Token::Semi, "`;`")?;
    self.parse_for_tail(start, Some(left), is_await)
  }

  fn parse_for_tail(
    &mut self,
    start: usize,
    init: Option<NodeIdx>,
    _is_await: bool,
  ) -> Result<NodeIdx> {
    let test = if self.token == Token::Semi { None } else { Some(self.parse_expression()?) };
    self.expect(&Token::Semi, "`;`")?;
    let update = if self.token == Token::RParen { None } else { Some(self.parse_expression()?) };
    self.expect(&Token::RParen, "`)`")?;
    let body = self.parse_statement()?;
    Ok(self.builder.push(self.span_from(start), NodeKind::ForStatement {
      init,
      test,
      update,
      body,
    }))
  }

  fn parse_try_statement(&mut self) -> Result<NodeIdx> {
    let start = self.token_start;
    self.bump()?;
    let block = self.parse_block_statement()?;
    let handler = if self.is_kw("catch") {
      let clause_start = self.token_start;
      self.bump()?;
      let param = if self.eat(&Token::LParen)? {
        let param = self.parse_binding_pattern()?;
        self.expect(&Token::RParen, "`)`")?;
        Some(param)
      } else {
        None
      };
      let body = self.parse_block_statement()?;
      Some(self.builder.push(self.span_from(clause_start), NodeKind::CatchClause { param, body }))
    } else {
      None
    };
    let finalizer = if self.eat_kw("finally")? { Some(self.parse_block_statement()?) } else { None };
    if handler.is_none() && finalizer.is_none() {
      return self.error("Missing catch or finally clause");
    }
    Ok(self.builder.push(self.span_from(start), NodeKind::TryStatement {
      block,
      handler,
      finalizer,
    }))
  }

  // ------------------------------------------------------- module declarations

  fn parse_import_declaration(&mut self) -> Result<NodeIdx> {
    let start = self.token_start;
    self.bump()?; // `import`

    let mut specifiers = Vec::new();
    if let Token::Str(_) = &self.token {
      // Bare side-effect import.
      let source = self.parse_string_literal()?;
      self.eat_semi()?;
      return Ok(
        self
          .builder
          .push(self.span_from(start), NodeKind::ImportDeclaration { specifiers, source }),
      );
    }

    loop {
      match &self.token {
        Token::Ident(_) => {
          let specifier_start = self.token_start;
          let (name, span) = self.expect_ident("import binding")?;
          let local = self.builder.identifier(span, name);
          specifiers.push(
            self
              .builder
              .push(self.span_from(specifier_start), NodeKind::ImportDefaultSpecifier { local }),
          );
        }
        Token::Star => {
          let specifier_start = self.token_start;
          self.bump()?;
          if !self.eat_kw("as")? {
            return self.error("Expected `as` after `*`");
          }
          let (name, span) = self.expect_ident("namespace binding")?;
          let local = self.builder.identifier(span, name);
          specifiers.push(
            self
              .builder
              .push(self.span_from(specifier_start), NodeKind::ImportNamespaceSpecifier { local }),
          );
        }
        Token::LBrace => {
          self.bump()?;
          while self.token != Token::RBrace {
            let specifier_start = self.token_start;
            let (imported, imported_span) = self.parse_module_export_name()?;
            let local = if self.eat_kw("as")? {
              let (name, span) = self.expect_ident("import binding")?;
              self.builder.identifier(span, name)
            } else {
              self.builder.identifier(imported_span, imported.clone())
            };
            specifiers.push(self.builder.push(
              self.span_from(specifier_start),
              NodeKind::ImportSpecifier { imported, local },
            ));
            if !self.eat(&Token::Comma)? {
              break;
            }
          }
          self.expect(&Token::RBrace, "`}`")?;
        }
        _ => return self.error("Expected an import clause"),
      }
      if !self.eat(&Token::Comma)? {
        break;
      }
    }

    if !self.eat_kw("from")? {
      return self.error("Expected `from`");
    }
    let source = self.parse_string_literal()?;
    self.eat_semi()?;
    Ok(self.builder.push(self.span_from(start), NodeKind::ImportDeclaration {
      specifiers,
      source,
    }))
  }

  /// Import/export names may be arbitrary strings (`export { x as "a b" }`).
  fn parse_module_export_name(&mut self) -> Result<(Rstr, Span)> {
    if let Token::Str(value) = &self.token {
      let value = value.clone();
      let span = Span::new(self.token_start as u32, self.token_end as u32);
      self.bump()?;
      Ok((value, span))
    } else {
      self.expect_ident("export name")
    }
  }

  fn parse_string_literal(&mut self) -> Result<NodeIdx> {
    match std::mem::replace(&mut self.token, Token::Eof) {
      Token::Str(value) => {
        let span = Span::new(self.token_start as u32, self.token_end as u32);
        self.bump()?;
        Ok(self.builder.string(span, value))
      }
      other => {
        self.token = other;
        self.error("Expected a string literal")
      }
    }
  }

  fn parse_export_declaration(&mut self) -> Result<NodeIdx> {
    let start = self.token_start;
    self.bump()?; // `export`

    if self.eat_kw("default")? {
      let declaration = match &self.token {
        Token::Ident(kw) if kw.as_str() == "function" => self.parse_default_function(false)?,
        Token::Ident(kw)
          if kw.as_str() == "async"
            && self.peek().is_ident("function")
            && !self.lexer.newline_before =>
        {
          self.bump()?;
          self.parse_default_function(true)?
        }
        Token::Ident(kw) if kw.as_str() == "class" => {
          let class_start = self.token_start;
          let class = self.parse_class_tail()?;
          self.builder.push(self.span_from(class_start), NodeKind::ClassDeclaration(class))
        }
        _ => {
          let expression = self.parse_assignment()?;
          self.eat_semi()?;
          expression
        }
      };
      return Ok(
        self.builder.push(self.span_from(start), NodeKind::ExportDefaultDeclaration { declaration }),
      );
    }

    if self.eat(&Token::Star)? {
      let exported = if self.eat_kw("as")? {
        let (name, _) = self.parse_module_export_name()?;
        Some(name)
      } else {
        None
      };
      if !self.eat_kw("from")? {
        return self.error("Expected `from`");
      }
      let source = self.parse_string_literal()?;
      self.eat_semi()?;
      return Ok(
        self.builder.push(self.span_from(start), NodeKind::ExportAllDeclaration {
          exported,
          source,
        }),
      );
    }

    if self.token == Token::LBrace {
      self.bump()?;
      let mut specifiers = Vec::new();
      while self.token != Token::RBrace {
        let specifier_start = self.token_start;
        let (local, _) = self.parse_module_export_name()?;
        let exported = if self.eat_kw("as")? { self.parse_module_export_name()?.0 } else { local.clone() };
        specifiers.push(self.builder.push(self.span_from(specifier_start), NodeKind::ExportSpecifier {
          local,
          exported,
        }));
        if !self.eat(&Token::Comma)? {
          break;
        }
      }
      self.expect(&Token::RBrace, "`}`")?;
      let source = if self.eat_kw("from")? { Some(self.parse_string_literal()?) } else { None };
      self.eat_semi()?;
      return Ok(self.builder.push(self.span_from(start), NodeKind::ExportNamedDeclaration {
        declaration: None,
        specifiers,
        source,
      }));
    }

    // `export <declaration>`
    let declaration = match &self.token {
      Token::Ident(kw) if matches!(kw.as_str(), "const" | "let" | "var") => {
        let declaration = self.parse_variable_declaration()?;
        self.eat_semi()?;
        declaration
      }
      Token::Ident(kw) if kw.as_str() == "function" => self.parse_function_declaration(false)?,
      Token::Ident(kw)
        if kw.as_str() == "async"
          && self.peek().is_ident("function")
          && !self.lexer.newline_before =>
      {
        self.bump()?;
        self.parse_function_declaration(true)?
      }
      Token::Ident(kw) if kw.as_str() == "class" => self.parse_class_declaration()?,
      _ => return self.error("Expected a declaration after `export`"),
    };
    Ok(self.builder.push(self.span_from(start), NodeKind::ExportNamedDeclaration {
      declaration: Some(declaration),
      specifiers: Vec::new(),
      source: None,
    }))
  }

  fn parse_default_function(&mut self, is_async: bool) -> Result<NodeIdx> {
    let start = self.token_start;
    self.bump()?; // `function`
    let is_generator = self.eat(&Token::Star)?;
    let id = if let Token::Ident(_) = &self.token {
      let (name, span) = self.expect_ident("function name")?;
      Some(self.builder.identifier(span, name))
    } else {
      None
    };
    let params = self.parse_params()?;
    let body = self.parse_block_statement()?;
    let kind = if id.is_some() {
      NodeKind::FunctionDeclaration(Function { id, params, body, is_async, is_generator })
    } else {
      NodeKind::FunctionExpression(Function { id, params, body, is_async, is_generator })
    };
    Ok(self.builder.push(self.span_from(start), kind))
  }

  // -------------------------------------------------------------- expressions

  fn parse_expression(&mut self) -> Result<NodeIdx> {
    let start = self.token_start;
    let first = self.parse_assignment()?;
    if self.token != Token::Comma {
      return Ok(first);
    }
    let mut expressions = vec![first];
    while self.eat(&Token::Comma)? {
      expressions.push(self.parse_assignment()?);
    }
    Ok(self.builder.push(self.span_from(start), NodeKind::SequenceExpression { expressions }))
  }

  fn parse_assignment(&mut self) -> Result<NodeIdx> {
    if let Some(arrow) = self.try_parse_arrow()? {
      return Ok(arrow);
    }

    let start = self.token_start;
    let left = self.parse_conditional()?;
    let operator = match self.token {
      Token::Assign => AssignOp::Assign,
      Token::CompoundAssign => AssignOp::Compound,
      _ => return Ok(left),
    };
    self.bump()?;
    let right = self.parse_assignment()?;
    Ok(self.builder.push(self.span_from(start), NodeKind::AssignmentExpression {
      operator,
      left,
      right,
    }))
  }

  /// Arrow functions need unbounded lookahead to tell `(a, b) => a` from a
  /// parenthesized expression; scan tokens without building nodes.
  fn try_parse_arrow(&mut self) -> Result<Option<NodeIdx>> {
    let is_async = self.is_kw("async")
      && !self.lexer.newline_before
      && matches!(self.peek(), Token::Ident(_) | Token::LParen)
      && !self.peek().is_ident("function");

    let (arrow_ahead, skip_async) = if is_async {
      let mut lookahead = self.lexer.clone();
      let first = lookahead.next_token().unwrap_or(Token::Eof);
      (Self::scan_arrow(first, &mut lookahead), true)
    } else {
      (Self::scan_arrow(self.token.clone(), &mut self.lexer.clone()), false)
    };

    if !arrow_ahead {
      return Ok(None);
    }

    let start = self.token_start;
    if skip_async {
      self.bump()?;
    }

    let params = if let Token::Ident(_) = &self.token {
      let (name, span) = self.expect_ident("parameter")?;
      vec![self.builder.identifier(span, name)]
    } else {
      self.parse_params()?
    };
    self.expect(&Token::Arrow, "`=>`")?;
    let body = if self.token == Token::LBrace {
      self.parse_block_statement()?
    } else {
      self.parse_assignment()?
    };
    Ok(Some(self.builder.push(
      self.span_from(start),
      NodeKind::ArrowFunctionExpression(Function {
        id: None,
        params,
        body,
        is_async,
        is_generator: false,
      }),
    )))
  }

  /// `first` is the token at the potential parameter list start; `lexer` is
  /// positioned right after it.
  fn scan_arrow(first: Token, lexer: &mut Lexer) -> bool {
    match first {
      Token::Ident(name) => {
        if matches!(
          name.as_str(),
          "if" | "for" | "while" | "return" | "typeof" | "void" | "delete" | "new" | "in"
        ) {
          return false;
        }
        matches!(lexer.next_token(), Ok(Token::Arrow))
      }
      Token::LParen => {
        let mut depth = 1usize;
        loop {
          match lexer.next_token() {
            Ok(Token::LParen) => depth += 1,
            Ok(Token::RParen) => {
              depth -= 1;
              if depth == 0 {
                return matches!(lexer.next_token(), Ok(Token::Arrow));
              }
            }
            Ok(Token::Eof) | Err(_) => return false,
            Ok(_) => {}
          }
        }
      }
      _ => false,
    }
  }

  fn parse_conditional(&mut self) -> Result<NodeIdx> {
    let start = self.token_start;
    let test = self.parse_binary(0)?;
    if !self.eat(&Token::Question)? {
      return Ok(test);
    }
    let consequent = self.parse_assignment()?;
    self.expect(&Token::Colon, "`:`")?;
    let alternate = self.parse_assignment()?;
    Ok(self.builder.push(self.span_from(start), NodeKind::ConditionalExpression {
      test,
      consequent,
      alternate,
    }))
  }

  fn binary_precedence(&self) -> Option<(u8, Option<BinaryOp>, Option<LogicalOp>)> {
    let (precedence, binary, logical) = match &self.token {
      Token::QuestionQuestion => (1, None, Some(LogicalOp::Nullish)),
      Token::PipePipe => (1, None, Some(LogicalOp::Or)),
      Token::AmpAmp => (2, None, Some(LogicalOp::And)),
      Token::Pipe => (3, Some(BinaryOp::BitOr), None),
      Token::Caret => (4, Some(BinaryOp::BitXor), None),
      Token::Amp => (5, Some(BinaryOp::BitAnd), None),
      Token::EqEq => (6, Some(BinaryOp::EqEq), None),
      Token::NotEq => (6, Some(BinaryOp::NotEq), None),
      Token::EqEqEq => (6, Some(BinaryOp::StrictEq), None),
      Token::NotEqEq => (6, Some(BinaryOp::StrictNotEq), None),
      Token::Lt => (7, Some(BinaryOp::Lt), None),
      Token::LtEq => (7, Some(BinaryOp::LtEq), None),
      Token::Gt => (7, Some(BinaryOp::Gt), None),
      Token::GtEq => (7, Some(BinaryOp::GtEq), None),
      Token::Ident(kw) if kw.as_str() == "instanceof" => (7, Some(BinaryOp::Instanceof), None),
      Token::Ident(kw) if kw.as_str() == "in" => (7, Some(BinaryOp::In), None),
      Token::Shl => (8, Some(BinaryOp::Shl), None),
      Token::Shr => (8, Some(BinaryOp::Shr), None),
      Token::UShr => (8, Some(BinaryOp::UShr), None),
      Token::Plus => (9, Some(BinaryOp::Add), None),
      Token::Minus => (9, Some(BinaryOp::Sub), None),
      Token::Star => (10, Some(BinaryOp::Mul), None),
      Token::Slash => (10, Some(BinaryOp::Div), None),
      Token::Percent => (10, Some(BinaryOp::Rem), None),
      Token::StarStar => (11, Some(BinaryOp::Exp), None),
      _ => return None,
    };
    Some((precedence, binary, logical))
  }

  fn parse_binary(&mut self, min_precedence: u8) -> Result<NodeIdx> {
    let start = self.token_start;
    let mut left = self.parse_unary()?;
    while let Some((precedence, binary, logical)) = self.binary_precedence() {
      if precedence < min_precedence {
        break;
      }
      self.bump()?;
      // `**` is right-associative, everything else left.
      let next_min = if binary == Some(BinaryOp::Exp) { precedence } else { precedence + 1 };
      let right = self.parse_binary(next_min)?;
      let kind = if let Some(operator) = logical {
        NodeKind::LogicalExpression { operator, left, right }
      } else {
        NodeKind::BinaryExpression { operator: binary.unwrap(), left, right }
      };
      left = self.builder.push(self.span_from(start), kind);
    }
    Ok(left)
  }

  fn parse_unary(&mut self) -> Result<NodeIdx> {
    let start = self.token_start;
    let operator = match &self.token {
      Token::Bang => Some(UnaryOp::Not),
      Token::Tilde => Some(UnaryOp::BitNot),
      Token::Plus => Some(UnaryOp::Plus),
      Token::Minus => Some(UnaryOp::Minus),
      Token::Ident(kw) if kw.as_str() == "typeof" => Some(UnaryOp::Typeof),
      Token::Ident(kw) if kw.as_str() == "void" => Some(UnaryOp::Void),
      Token::Ident(kw) if kw.as_str() == "delete" => Some(UnaryOp::Delete),
      _ => None,
    };
    if let Some(operator) = operator {
      self.bump()?;
      let argument = self.parse_unary()?;
      return Ok(
        self.builder.push(self.span_from(start), NodeKind::UnaryExpression { operator, argument }),
      );
    }

    if self.is_kw("await") {
      self.bump()?;
      let argument = self.parse_unary()?;
      return Ok(self.builder.push(self.span_from(start), NodeKind::AwaitExpression { argument }));
    }

    if matches!(self.token, Token::PlusPlus | Token::MinusMinus) {
      self.bump()?;
      let argument = self.parse_unary()?;
      return Ok(
        self
          .builder
          .push(self.span_from(start), NodeKind::UpdateExpression { prefix: true, argument }),
      );
    }

    let mut expression = self.parse_call_chain()?;
    if matches!(self.token, Token::PlusPlus | Token::MinusMinus) && !self.lexer.newline_before {
      self.bump()?;
      expression = self.builder.push(self.span_from(start), NodeKind::UpdateExpression {
        prefix: false,
        argument: expression,
      });
    }
    Ok(expression)
  }

  fn parse_call_chain(&mut self) -> Result<NodeIdx> {
    let start = self.token_start;
    let mut expression = self.parse_primary()?;
    loop {
      match &self.token {
        Token::Dot => {
          self.bump()?;
          let (name, span) = self.expect_ident("property name")?;
          let property = self.builder.identifier(span, name);
          expression = self.builder.push(self.span_from(start), NodeKind::MemberExpression {
            object: expression,
            property,
            computed: false,
            optional: false,
          });
        }
        Token::QuestionDot => {
          self.bump()?;
          if self.token == Token::LParen {
            let arguments = self.parse_arguments()?;
            expression = self.builder.push(self.span_from(start), NodeKind::CallExpression {
              callee: expression,
              arguments,
              optional: true,
            });
          } else {
            let (name, span) = self.expect_ident("property name")?;
            let property = self.builder.identifier(span, name);
            expression = self.builder.push(self.span_from(start), NodeKind::MemberExpression {
              object: expression,
              property,
              computed: false,
              optional: true,
            });
          }
        }
        Token::LBracket => {
          self.bump()?;
          let property = self.parse_expression()?;
          self.expect(&Token::RBracket, "`]`")?;
          expression = self.builder.push(self.span_from(start), NodeKind::MemberExpression {
            object: expression,
            property,
            computed: true,
            optional: false,
          });
        }
        Token::LParen => {
          let arguments = self.parse_arguments()?;
          expression = self.builder.push(self.span_from(start), NodeKind::CallExpression {
            callee: expression,
            arguments,
            optional: false,
          });
        }
        _ => break,
      }
    }
    Ok(expression)
  }

  fn parse_arguments(&mut self) -> Result<Vec<NodeIdx>> {
    self.expect(&Token::LParen, "`(`")?;
    let mut arguments = Vec::new();
    while self.token != Token::RParen {
      if self.eat(&Token::DotDotDot)? {
        let start = self.token_start;
        let argument = self.parse_assignment()?;
        arguments.push(self.builder.push(self.span_from(start), NodeKind::SpreadElement { argument }));
      } else {
        arguments.push(self.parse_assignment()?);
      }
      if !self.eat(&Token::Comma)? {
        break;
      }
    }
    self.expect(&Token::RParen, "`)`")?;
    Ok(arguments)
  }

  fn parse_primary(&mut self) -> Result<NodeIdx> {
    let start = self.token_start;
    match &self.token {
      Token::Num(value) => {
        let value = *value;
        self.bump()?;
        Ok(self.builder.number(self.span_from(start), value))
      }
      Token::Str(value) => {
        let value = value.clone();
        self.bump()?;
        Ok(self.builder.string(self.span_from(start), value))
      }
      Token::TemplateStart => self.parse_template(),
      Token::LParen => {
        self.bump()?;
        let expression = self.parse_expression()?;
        self.expect(&Token::RParen, "`)`")?;
        Ok(expression)
      }
      Token::LBracket => {
        self.bump()?;
        let mut elements = Vec::new();
        while self.token != Token::RBracket {
          if self.token == Token::Comma {
            elements.push(None);
            self.bump()?;
            continue;
          }
          if self.eat(&Token::DotDotDot)? {
            let spread_start = self.token_start;
            let argument = self.parse_assignment()?;
            elements.push(Some(
              self.builder.push(self.span_from(spread_start), NodeKind::SpreadElement { argument }),
            ));
          } else {
            elements.push(Some(self.parse_assignment()?));
          }
          if self.token != Token::RBracket {
            self.expect(&Token::Comma, "`,`")?;
          }
        }
        self.bump()?;
        Ok(self.builder.push(self.span_from(start), NodeKind::ArrayExpression { elements }))
      }
      Token::LBrace => self.parse_object_literal(),
      Token::Ident(name) => match name.as_str() {
        "true" | "false" => {
          let value = name.as_str() == "true";
          self.bump()?;
          Ok(self.builder.push(self.span_from(start), NodeKind::BooleanLiteral { value }))
        }
        "null" => {
          self.bump()?;
          Ok(self.builder.push(self.span_from(start), NodeKind::NullLiteral))
        }
        "undefined" => {
          self.bump()?;
          let argument = self.builder_zero(start);
          Ok(self.builder.push(self.span_from(start), NodeKind::UnaryExpression {
            operator: UnaryOp::Void,
            argument,
          }))
        }
        "this" => {
          self.bump()?;
          Ok(self.builder.push(self.span_from(start), NodeKind::ThisExpression))
        }
        "import" => {
          self.bump()?;
          if self.eat(&Token::Dot)? {
            let (name, _) = self.expect_ident("meta property")?;
            if name.as_str() != "meta" {
              return self.error("Expected `import.meta`");
            }
            return Ok(self.builder.push(self.span_from(start), NodeKind::MetaProperty));
          }
          self.expect(&Token::LParen, "`(`")?;
          let source = self.parse_assignment()?;
          // Trailing arguments (import attributes) are accepted and dropped.
          while self.eat(&Token::Comma)? && self.token != Token::RParen {
            self.parse_assignment()?;
          }
          self.expect(&Token::RParen, "`)`")?;
          Ok(self.builder.push(self.span_from(start), NodeKind::ImportExpression { source }))
        }
        "new" => {
          self.bump()?;
          let callee = self.parse_member_only()?;
          let arguments =
            if self.token == Token::LParen { self.parse_arguments()? } else { Vec::new() };
          Ok(self.builder.push(self.span_from(start), NodeKind::NewExpression {
            callee,
            arguments,
          }))
        }
        "function" => {
          self.bump()?;
          let is_generator = self.eat(&Token::Star)?;
          let id = if let Token::Ident(_) = &self.token {
            let (name, span) = self.expect_ident("function name")?;
            Some(self.builder.identifier(span, name))
          } else {
            None
          };
          let params = self.parse_params()?;
          let body = self.parse_block_statement()?;
          Ok(self.builder.push(
            self.span_from(start),
            NodeKind::FunctionExpression(Function {
              id,
              params,
              body,
              is_async: false,
              is_generator,
            }),
          ))
        }
        "async" if self.peek().is_ident("function") => {
          self.bump()?;
          self.bump()?;
          let is_generator = self.eat(&Token::Star)?;
          let id = if let Token::Ident(_) = &self.token {
            let (name, span) = self.expect_ident("function name")?;
            Some(self.builder.identifier(span, name))
          } else {
            None
          };
          let params = self.parse_params()?;
          let body = self.parse_block_statement()?;
          Ok(self.builder.push(
            self.span_from(start),
            NodeKind::FunctionExpression(Function {
              id,
              params,
              body,
              is_async: true,
              is_generator,
            }),
          ))
        }
        "class" => {
          let class = self.parse_class_tail()?;
          Ok(self.builder.push(self.span_from(start), NodeKind::ClassExpression(class)))
        }
        _ => {
          let (name, span) = self.expect_ident("expression")?;
          Ok(self.builder.identifier(span, name))
        }
      },
      _ => self.error("Unexpected token"),
    }
  }

  /// `undefined` parses as `void 0`; build the inner zero literal.
  fn builder_zero(&mut self, start: usize) -> NodeIdx {
    self.builder.number(self.span_from(start), 0.0)
  }

  /// Member chain without call arguments, for `new X.Y()` callees.
  fn parse_member_only(&mut self) -> Result<NodeIdx> {
    let start = self.token_start;
    let mut expression = self.parse_primary()?;
    loop {
      match &self.token {
        Token::Dot => {
          self.bump()?;
          let (name, span) = self.expect_ident("property name")?;
          let property = self.builder.identifier(span, name);
          expression = self.builder.push(self.span_from(start), NodeKind::MemberExpression {
            object: expression,
            property,
            computed: false,
            optional: false,
          });
        }
        Token::LBracket => {
          self.bump()?;
          let property = self.parse_expression()?;
          self.expect(&Token::RBracket, "`]`")?;
          expression = self.builder.push(self.span_from(start), NodeKind::MemberExpression {
            object: expression,
            property,
            computed: true,
            optional: false,
          });
        }
        _ => break,
      }
    }
    Ok(expression)
  }

  fn parse_template(&mut self) -> Result<NodeIdx> {
    let start = self.token_start;
    // The lexer already consumed the opening backtick.
    let mut quasis = Vec::new();
    let mut expressions = Vec::new();
    loop {
      let (quasi, has_expression) =
        self.lexer.read_template_chunk().map_err(|(message, pos)| ParseError { message, pos })?;
      quasis.push(quasi);
      if !has_expression {
        break;
      }
      self.bump()?;
      expressions.push(self.parse_expression()?);
      if self.token != Token::RBrace {
        return self.error("Expected `}` in template literal");
      }
      // The `}` resumes raw template scanning; do not tokenize past it.
    }
    self.token_end = self.lexer.pos();
    self.bump()?;
    Ok(self.builder.push(self.span_from(start), NodeKind::TemplateLiteral { quasis, expressions }))
  }

  fn parse_object_literal(&mut self) -> Result<NodeIdx> {
    let start = self.token_start;
    self.expect(&Token::LBrace, "`{`")?;
    let mut properties = Vec::new();
    while self.token != Token::RBrace {
      let property_start = self.token_start;
      if self.eat(&Token::DotDotDot)? {
        let argument = self.parse_assignment()?;
        properties.push(
          self.builder.push(self.span_from(property_start), NodeKind::SpreadElement { argument }),
        );
      } else {
        let mut kind = PropertyKind::Init;
        if (self.is_kw("get") || self.is_kw("set"))
          && !matches!(self.peek(), Token::Colon | Token::Comma | Token::RBrace | Token::LParen)
        {
          kind = if self.is_kw("get") { PropertyKind::Get } else { PropertyKind::Set };
          self.bump()?;
        }
        let (key, computed) = self.parse_property_key()?;
        if self.token == Token::LParen {
          let params = self.parse_params()?;
          let body = self.parse_block_statement()?;
          let value = self.builder.push(
            self.span_from(property_start),
            NodeKind::FunctionExpression(Function {
              id: None,
              params,
              body,
              is_async: false,
              is_generator: false,
            }),
          );
          properties.push(self.builder.push(self.span_from(property_start), NodeKind::Property {
            key,
            value,
            kind,
            computed,
            shorthand: false,
          }));
        } else if self.eat(&Token::Colon)? {
          let value = self.parse_assignment()?;
          properties.push(self.builder.push(self.span_from(property_start), NodeKind::Property {
            key,
            value,
            kind: PropertyKind::Init,
            computed,
            shorthand: false,
          }));
        } else {
          // Shorthand `{ a }` — the key doubles as the value reference.
          let value = match self.builder.kind(key) {
            NodeKind::Identifier { name } => {
              let name = name.clone();
              self.builder.identifier(self.builder.span(key), name)
            }
            _ => return self.error("Expected `:` after property key"),
          };
          properties.push(self.builder.push(self.span_from(property_start), NodeKind::Property {
            key,
            value,
            kind: PropertyKind::Init,
            computed: false,
            shorthand: true,
          }));
        }
      }
      if !self.eat(&Token::Comma)? {
        break;
      }
    }
    self.expect(&Token::RBrace, "`}`")?;
    Ok(self.builder.push(self.span_from(start), NodeKind::ObjectExpression { properties }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn body_kinds(source: &str) -> Vec<&'static str> {
    let program = parse(source).unwrap();
    program
      .body
      .iter()
      .map(|idx| match program.kind(*idx) {
        NodeKind::ImportDeclaration { .. } => "import",
        NodeKind::ExportNamedDeclaration { .. } => "export",
        NodeKind::ExportDefaultDeclaration { .. } => "export default",
        NodeKind::ExportAllDeclaration { .. } => "export *",
        NodeKind::VariableDeclaration { .. } => "var",
        NodeKind::FunctionDeclaration(_) => "function",
        NodeKind::ExpressionStatement { .. } => "expr",
        NodeKind::ClassDeclaration(_) => "class",
        _ => "other",
      })
      .collect()
  }

  #[test]
  fn parses_module_shapes() {
    assert_eq!(
      body_kinds(
        "import a, { b as c } from './x';\nexport const d = 1;\nexport * as e from './y';\nconsole.log(a, c, d);"
      ),
      vec!["import", "export", "export *", "expr"]
    );
  }

  #[test]
  fn parses_export_forms() {
    assert_eq!(body_kinds("export default function foo() {}"), vec!["export default"]);
    assert_eq!(body_kinds("export default 1 + 2;"), vec!["export default"]);
    assert_eq!(body_kinds("export { a, b as c } from './m';"), vec!["export"]);
    assert_eq!(body_kinds("export function f() {} export class C {}"), vec!["export", "export"]);
  }

  #[test]
  fn parses_expressions() {
    assert_eq!(
      body_kinds("a.b.c(1, ...rest); x = y ? 1 : 2; (p, q); let n = `tpl ${1 + 2}`;"),
      vec!["expr", "expr", "expr", "var"]
    );
  }

  #[test]
  fn parses_arrows_and_sequences() {
    let program = parse("const f = (a, b) => a + b, g = x => (x, x + 1);").unwrap();
    assert_eq!(program.body.len(), 1);
    let NodeKind::VariableDeclaration { declarations, .. } = program.kind(program.body[0]) else {
      panic!("expected declaration");
    };
    assert_eq!(declarations.len(), 2);
  }

  #[test]
  fn parses_dynamic_import_and_meta() {
    assert_eq!(body_kinds("import('./a').then(m => m.x); import.meta.url;"), vec!["expr", "expr"]);
  }

  #[test]
  fn reports_offsets_on_errors() {
    let err = parse("const = 1;").unwrap_err();
    assert_eq!(err.pos, 6);
    let err = parse("import { a } './b';").unwrap_err();
    assert!(err.message.contains("from"));
  }

  #[test]
  fn links_parents() {
    let program = parse("const a = foo();").unwrap();
    let declaration = program.body[0];
    let NodeKind::VariableDeclaration { declarations, .. } = program.kind(declaration) else {
      panic!("expected declaration");
    };
    assert_eq!(program.node(declarations[0]).parent, Some(declaration));
    assert_eq!(program.node(declaration).parent, None);
  }
}
