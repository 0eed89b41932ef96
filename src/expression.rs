// src/expression.rs
use crate::parser::{ParseError, Parser};

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    StrictEq,
    StrictNe,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    This,
    Ident(String),
    Object(Vec<(String, Expr)>),
    Array(Vec<Expr>),
    Member { object: Box<Expr>, property: String },
    Call { callee: Box<Expr>, args: Vec<Expr> },
    New { callee: Box<Expr>, args: Vec<Expr> },
    Binary { op: BinOp, left: Box<Expr>, right: Box<Expr> },
}

impl Expr {
    /// Source-like name for error messages, e.g. `person.dog.sayHello`.
    pub fn describe(&self) -> String {
        match self {
            Expr::Ident(name) => name.clone(),
            Expr::This => "this".to_string(),
            Expr::Member { object, property } => format!("{}.{property}", object.describe()),
            Expr::Call { callee, .. } => format!("{}(...)", callee.describe()),
            _ => "expression".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `var x = e`: a property of the global context.
    Var(String, Expr),
    /// `let x = e`: visible to the script only.
    Let(String, Expr),
    Assign { target: Expr, value: Expr },
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Set by a leading `"use strict"` directive.
    pub strict: bool,
    pub body: Vec<Stmt>,
}

const RESERVED: &[&str] = &["var", "let", "new", "this", "true", "false", "null", "undefined"];

pub fn parse_program(input: &str) -> Result<Program, ParseError> {
    let mut p = EParser::new(input);
    let mut body = Vec::new();
    loop {
        p.skip_ws();
        while p.parser.consume_char(';') {
            p.skip_ws();
        }
        if p.eof() {
            break;
        }
        body.push(p.parse_stmt()?);
        p.skip_ws();
        if !p.eof() && !p.parser.consume_char(';') {
            return Err(p.parser.error("expected ';'"));
        }
    }
    let strict = matches!(
        body.first(),
        Some(Stmt::Expr(Expr::Literal(Literal::Str(s)))) if s == "use strict"
    );
    Ok(Program { strict, body })
}

/// Parses a single expression; trailing input is an error.
pub fn parse_expr(input: &str) -> Result<Expr, ParseError> {
    let mut p = EParser::new(input);
    let expr = p.parse_expr()?;
    p.skip_ws();
    if !p.eof() {
        return Err(p.parser.error("trailing input"));
    }
    Ok(expr)
}

struct EParser<'a> {
    parser: Parser<'a>,
}

impl<'a> EParser<'a> {
    fn new(s: &'a str) -> Self {
        Self {
            parser: Parser::new(s),
        }
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        self.skip_ws();
        let start = self.parser.pos();
        if let Ok(word) = self.parser.parse_identifier() {
            if word == "var" || word == "let" {
                self.skip_ws();
                let name = self.parse_binding_name()?;
                self.skip_ws();
                self.parser.expect('=')?;
                let value = self.parse_expr()?;
                return Ok(if word == "var" { Stmt::Var(name, value) } else { Stmt::Let(name, value) });
            }
        }
        self.parser.reset(start);

        let expr = self.parse_expr()?;
        self.skip_ws();
        if self.parser.peek_str("==") {
            return Err(self.parser.error("loose equality is not supported, use '==='"));
        }
        if self.parser.consume_char('=') {
            if !matches!(expr, Expr::Ident(_) | Expr::Member { .. }) {
                return Err(self.parser.error("invalid assignment target"));
            }
            let value = self.parse_expr()?;
            return Ok(Stmt::Assign { target: expr, value });
        }
        Ok(Stmt::Expr(expr))
    }

    fn parse_binding_name(&mut self) -> Result<String, ParseError> {
        let name = self.parser.parse_identifier()?;
        if RESERVED.contains(&name.as_str()) {
            return Err(self.parser.error(format!("'{name}' cannot be used as a name")));
        }
        Ok(name)
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;
        loop {
            self.skip_ws();
            let op = if self.parser.consume_str("===") {
                BinOp::StrictEq
            } else if self.parser.consume_str("!==") {
                BinOp::StrictNe
            } else {
                break;
            };
            let right = self.parse_additive()?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_postfix()?;
        loop {
            self.skip_ws();
            let op = if self.parser.consume_char('+') {
                BinOp::Add
            } else if self.parser.consume_char('-') {
                BinOp::Sub
            } else {
                break;
            };
            let right = self.parse_postfix()?;
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            self.skip_ws();
            if self.parser.consume_char('.') {
                self.skip_ws();
                let property = self.parser.parse_identifier()?;
                expr = Expr::Member { object: Box::new(expr), property };
            } else if self.parser.peek_char() == Some('(') {
                let args = self.parse_args()?;
                expr = Expr::Call { callee: Box::new(expr), args };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        self.skip_ws();
        match self.parser.peek_char() {
            Some('"') | Some('\'') => {
                return Ok(Expr::Literal(Literal::Str(self.parser.parse_quoted_string()?)));
            }
            Some(c) if c.is_ascii_digit() => {
                return Ok(Expr::Literal(Literal::Number(self.parser.parse_number_literal()?)));
            }
            Some('-') => {
                self.parser.consume_char('-');
                let n = self.parser.parse_number_literal()?;
                return Ok(Expr::Literal(Literal::Number(-n)));
            }
            Some('(') => {
                self.parser.consume_char('(');
                let inner = self.parse_expr()?;
                self.skip_ws();
                self.parser.expect(')')?;
                return Ok(inner);
            }
            Some('{') => return self.parse_object(),
            Some('[') => {
                self.parser.consume_char('[');
                let items = self.parse_list(']')?;
                return Ok(Expr::Array(items));
            }
            _ => {}
        }
        let name = self.parser.parse_identifier()?;
        Ok(match name.as_str() {
            "this" => Expr::This,
            "true" => Expr::Literal(Literal::Bool(true)),
            "false" => Expr::Literal(Literal::Bool(false)),
            "null" => Expr::Literal(Literal::Null),
            "undefined" => Expr::Literal(Literal::Undefined),
            "new" => self.parse_new()?,
            "var" | "let" => return Err(self.parser.error(format!("unexpected '{name}'"))),
            _ => Expr::Ident(name),
        })
    }

    /// `new` callee: a primary followed by member accesses, then optional arguments.
    fn parse_new(&mut self) -> Result<Expr, ParseError> {
        let mut callee = self.parse_primary()?;
        loop {
            self.skip_ws();
            if !self.parser.consume_char('.') {
                break;
            }
            self.skip_ws();
            let property = self.parser.parse_identifier()?;
            callee = Expr::Member { object: Box::new(callee), property };
        }
        let args = if self.parser.peek_char() == Some('(') { self.parse_args()? } else { Vec::new() };
        Ok(Expr::New { callee: Box::new(callee), args })
    }

    fn parse_object(&mut self) -> Result<Expr, ParseError> {
        self.parser.expect('{')?;
        let mut props = Vec::new();
        loop {
            self.skip_ws();
            if self.parser.consume_char('}') {
                break;
            }
            let key = match self.parser.peek_char() {
                Some('"') | Some('\'') => self.parser.parse_quoted_string()?,
                _ => self.parser.parse_identifier()?,
            };
            self.skip_ws();
            self.parser.expect(':')?;
            let value = self.parse_expr()?;
            props.push((key, value));
            self.skip_ws();
            if !self.parser.consume_char(',') {
                self.skip_ws();
                self.parser.expect('}')?;
                break;
            }
        }
        Ok(Expr::Object(props))
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.parser.expect('(')?;
        self.parse_list(')')
    }

    /// Comma-separated expressions up to `close`; a trailing comma is allowed.
    fn parse_list(&mut self, close: char) -> Result<Vec<Expr>, ParseError> {
        let mut out = Vec::new();
        loop {
            self.skip_ws();
            if self.parser.consume_char(close) {
                break;
            }
            out.push(self.parse_expr()?);
            self.skip_ws();
            if !self.parser.consume_char(',') {
                self.parser.expect(close)?;
                break;
            }
        }
        Ok(out)
    }

    fn skip_ws(&mut self) {
        self.parser.skip_ws();
    }

    fn eof(&self) -> bool {
        self.parser.eof()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ident(s: &str) -> Box<Expr> {
        Box::new(Expr::Ident(s.into()))
    }

    #[test]
    fn nested_member_call() {
        let expr = parse_expr("person2.dog.sayHello()").unwrap();
        let dog = Expr::Member { object: ident("person2"), property: "dog".into() };
        let method = Expr::Member { object: Box::new(dog), property: "sayHello".into() };
        assert_eq!(expr, Expr::Call { callee: Box::new(method), args: vec![] });
    }

    #[test]
    fn bind_with_prefix_arguments() {
        let expr = parse_expr("addNumbers.bind(Sam, 1, 2)").unwrap();
        let Expr::Call { callee, args } = expr else { panic!("expected call") };
        assert_eq!(callee.describe(), "addNumbers.bind");
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn new_with_member_callee() {
        let expr = parse_expr("new lib.Person('Sam').firstName").unwrap();
        let Expr::Member { object, property } = expr else { panic!("expected member") };
        assert_eq!(property, "firstName");
        assert!(matches!(*object, Expr::New { ref args, .. } if args.len() == 1));
    }

    #[test]
    fn equality_binds_looser_than_addition() {
        let expr = parse_expr("1 + 2 === 3").unwrap();
        assert!(matches!(expr, Expr::Binary { op: BinOp::StrictEq, .. }));
    }

    #[test]
    fn program_statements_and_directive() {
        let program = parse_program(
            r#"
            "use strict";
            // declarations
            var example = "Global";
            let data = { instructor: 'Sam', nested: { a: [1, 2,] }, };
            this.instructor = 'Blake';;
            console.log(data.instructor)
            "#,
        )
        .unwrap();
        assert!(program.strict);
        assert_eq!(program.body.len(), 5);
        assert!(matches!(program.body[1], Stmt::Var(ref n, _) if n == "example"));
        assert!(matches!(program.body[3], Stmt::Assign { .. }));
    }

    #[test]
    fn directive_must_come_first() {
        let program = parse_program("let a = 1; 'use strict'").unwrap();
        assert!(!program.strict);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_program("let = 1").is_err());
        assert!(parse_program("let this = 1").is_err());
        assert!(parse_program("a == b").is_err());
        assert!(parse_program("f() = 1").is_err());
        assert!(parse_program("a b").is_err());
        assert!(parse_expr("{ a 1 }").is_err());
    }
}
