//! Análisis sintáctico.
//!
//! Parser descendente recursivo: cada regla de la gramática corresponde
//! a un método de [`Parser`]. Las expresiones se resuelven por niveles de
//! precedencia (comparación, términos, factores, primarios), todos
//! asociativos a la izquierda.
//!
//! Cuando una expresión inicia con un identificador se observa
//! exactamente el token que le sigue: `[` indica acceso o asignación a
//! arreglo, `=` indica asignación escalar y cualquier otra cosa continúa
//! por la gramática de comparación.
//!
//! El primer error sintáctico aborta el análisis; no hay recuperación.

use std::iter::Peekable;
use thiserror::Error;
use tracing::debug;

use crate::{
    ast::{BinOp, CmpOp, Node, Program, Type},
    lex::{Literal, Token, TokenKind},
    source::{Located, Position},
};

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParserError {
    #[error("{expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },

    #[error("Expected type specifier, found {0}")]
    ExpectedType(String),

    #[error("Expected expression, found {0}")]
    ExpectedExpr(String),

    #[error("Array size must be a non-negative integer, found `{0}`")]
    BadArraySize(String),

    #[error("Abrupt end of program")]
    UnexpectedEof,

    #[error("Nesting exceeds {} levels", MAX_DEPTH)]
    NestingTooDeep,
}

/// Profundidad máxima de sentencias y expresiones anidadas.
///
/// Las fases posteriores recorren el árbol recursivamente, por lo que
/// este límite también acota su uso de pila.
pub const MAX_DEPTH: u32 = 128;

/// Construye el AST de un programa completo.
///
/// Un flujo que no termine en [`TokenKind::Eof`] se trata como si lo
/// hiciera.
pub fn parse<'a, I>(tokens: I) -> Result<Program, Located<ParserError>>
where
    I: IntoIterator<Item = &'a Token>,
    I::IntoIter: Clone,
{
    let mut parser = Parser {
        tokens: tokens.into_iter().peekable(),
        last_known: Position::default(),
        depth: 0,
    };

    let program = parser.program()?;
    debug!(declarations = program.declarations.len(), "parsed program");

    Ok(program)
}

#[derive(Clone)]
struct Parser<'a, I: Iterator<Item = &'a Token> + Clone> {
    tokens: Peekable<I>,
    last_known: Position,
    depth: u32,
}

type Parse<T> = Result<T, Located<ParserError>>;

impl<'a, I: Iterator<Item = &'a Token> + Clone> Parser<'a, I> {
    fn program(&mut self) -> Parse<Program> {
        let mut declarations = Vec::new();
        while !self.at_end() {
            declarations.push(self.declaration()?);
        }

        Ok(Program { declarations })
    }

    fn declaration(&mut self) -> Parse<Node> {
        if let Some(typ) = self.type_specifier() {
            return self.typed_declaration(typ);
        }

        if self.accept(&[TokenKind::Var]).is_some() {
            return self.var_declaration();
        }

        self.statement()
    }

    fn typed_declaration(&mut self, typ: Type) -> Parse<Node> {
        let name = self.identifier("Expected variable name")?;

        if self.accept(&[TokenKind::OpenSquare]).is_some() {
            let size = self.array_size()?;
            self.expect(TokenKind::CloseSquare, "Expected ']' after array size")?;
            self.expect(TokenKind::Semicolon, "Expected ';' after array declaration")?;

            return Ok(Node::ArrayDecl { typ, name, size });
        }

        let initializer = match self.accept(&[TokenKind::Assign]) {
            Some(_) => Some(self.expression()?),
            None => None,
        };

        self.expect(TokenKind::Semicolon, "Expected ';' after variable declaration")?;

        let declaration = Node::VarDecl {
            typ,
            name: name.clone(),
        };

        // La inicialización se separa en declaración y asignación
        Ok(match initializer {
            None => declaration,
            Some(value) => Node::Block(vec![
                declaration,
                Node::Assignment {
                    variable: name,
                    value: Box::new(value),
                },
            ]),
        })
    }

    fn var_declaration(&mut self) -> Parse<Node> {
        let typ = match self.type_specifier() {
            Some(typ) => typ,
            None => {
                let found = self.found();
                return self.fail(ParserError::ExpectedType(found));
            }
        };

        let name = self.identifier("Expected variable name")?;
        self.expect(TokenKind::Semicolon, "Expected ';' after variable declaration")?;

        Ok(Node::VarDecl { typ, name })
    }

    fn array_size(&mut self) -> Parse<u32> {
        let token = self.expect(TokenKind::Number, "Expected array size")?;
        let size = match token.literal() {
            Some(Literal::Number(size)) => Some(*size),
            _ => token.lexeme().parse::<f64>().ok(),
        };

        match size {
            Some(size) if size.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&size) => {
                Ok(size as u32)
            }

            _ => Err(Located::at(
                ParserError::BadArraySize(token.lexeme().to_owned()),
                token.position(),
            )),
        }
    }

    fn statement(&mut self) -> Parse<Node> {
        self.nested(|s| match s.peek_kind() {
            TokenKind::If => s.if_statement(),
            TokenKind::While => s.while_statement(),
            TokenKind::Print => s.print_statement(),
            TokenKind::Read => s.read_statement(),
            TokenKind::OpenCurly => s.block(),
            _ => s.expression_statement(),
        })
    }

    fn if_statement(&mut self) -> Parse<Node> {
        self.next()?;
        self.expect(TokenKind::OpenParen, "Expected '(' after 'if'")?;
        let condition = self.expression()?;
        self.expect(TokenKind::CloseParen, "Expected ')' after if condition")?;

        let then_branch = self.statement()?;
        let else_branch = match self.accept(&[TokenKind::Else]) {
            Some(_) => Some(Box::new(self.statement()?)),
            None => None,
        };

        Ok(Node::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch,
        })
    }

    fn while_statement(&mut self) -> Parse<Node> {
        self.next()?;
        self.expect(TokenKind::OpenParen, "Expected '(' after 'while'")?;
        let condition = self.expression()?;
        self.expect(TokenKind::CloseParen, "Expected ')' after while condition")?;

        let body = self.statement()?;

        Ok(Node::While {
            condition: Box::new(condition),
            body: Box::new(body),
        })
    }

    fn print_statement(&mut self) -> Parse<Node> {
        self.next()?;
        self.expect(TokenKind::OpenParen, "Expected '(' after 'print'")?;
        let value = self.expression()?;
        self.expect(TokenKind::CloseParen, "Expected ')' after expression")?;
        self.expect(TokenKind::Semicolon, "Expected ';' after print statement")?;

        Ok(Node::Print(Box::new(value)))
    }

    fn read_statement(&mut self) -> Parse<Node> {
        self.next()?;
        self.expect(TokenKind::OpenParen, "Expected '(' after 'read'")?;
        let variable = self.identifier("Expected variable name")?;
        self.expect(TokenKind::CloseParen, "Expected ')' after variable name")?;
        self.expect(TokenKind::Semicolon, "Expected ';' after read statement")?;

        Ok(Node::Read(variable))
    }

    fn block(&mut self) -> Parse<Node> {
        self.expect(TokenKind::OpenCurly, "Expected '{'")?;

        let mut statements = Vec::new();
        while !self.check(TokenKind::CloseCurly) && !self.at_end() {
            statements.push(self.declaration()?);
        }

        self.expect(TokenKind::CloseCurly, "Expected '}' after block")?;
        Ok(Node::Block(statements))
    }

    fn expression_statement(&mut self) -> Parse<Node> {
        let expr = self.expression()?;
        self.expect(TokenKind::Semicolon, "Expected ';' after expression")?;

        Ok(expr)
    }

    fn expression(&mut self) -> Parse<Node> {
        self.nested(Self::assignment)
    }

    fn assignment(&mut self) -> Parse<Node> {
        if self.check(TokenKind::Identifier) {
            let after = self.lookahead(|s| {
                s.tokens.next();
                s.peek_kind()
            });

            match after {
                TokenKind::OpenSquare => return self.array_expression(),

                TokenKind::Assign => {
                    let variable = self.next()?.lexeme().to_owned();
                    self.next()?;
                    let value = self.expression()?;

                    return Ok(Node::Assignment {
                        variable,
                        value: Box::new(value),
                    });
                }

                _ => (),
            }
        }

        self.comparison()
    }

    /// `x[i] = valor` o bien `x[i]` como expresión completa.
    fn array_expression(&mut self) -> Parse<Node> {
        let name = self.next()?.lexeme().to_owned();
        self.next()?;

        let index = Box::new(self.expression()?);
        self.expect(TokenKind::CloseSquare, "Expected ']' after array index")?;

        if self.accept(&[TokenKind::Assign]).is_some() {
            let value = Box::new(self.expression()?);
            return Ok(Node::ArrayAssignment { name, index, value });
        }

        Ok(Node::ArrayAccess { name, index })
    }

    fn comparison(&mut self) -> Parse<Node> {
        use TokenKind::*;

        let mut expr = self.term()?;
        while let Some(token) = self.accept(&[Less, LessOrEqual, Greater, GreaterOrEqual, Equal, NotEqual]) {
            let op = match token.kind() {
                Less => CmpOp::Less,
                LessOrEqual => CmpOp::LessOrEqual,
                Greater => CmpOp::Greater,
                GreaterOrEqual => CmpOp::GreaterOrEqual,
                Equal => CmpOp::Equal,
                _ => CmpOp::NotEqual,
            };

            let right = self.term()?;
            expr = Node::Comparison {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn term(&mut self) -> Parse<Node> {
        let mut expr = self.factor()?;
        while let Some(token) = self.accept(&[TokenKind::Plus, TokenKind::Minus]) {
            let op = match token.kind() {
                TokenKind::Plus => BinOp::Add,
                _ => BinOp::Sub,
            };

            let right = self.factor()?;
            expr = Node::BinaryOp {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Parse<Node> {
        let mut expr = self.primary()?;
        while let Some(token) = self.accept(&[TokenKind::Times, TokenKind::Divide]) {
            let op = match token.kind() {
                TokenKind::Times => BinOp::Mul,
                _ => BinOp::Div,
            };

            let right = self.primary()?;
            expr = Node::BinaryOp {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn primary(&mut self) -> Parse<Node> {
        match self.peek_kind() {
            TokenKind::True => {
                self.next()?;
                Ok(Node::Boolean(true))
            }

            TokenKind::False => {
                self.next()?;
                Ok(Node::Boolean(false))
            }

            TokenKind::Number => {
                let token = self.next()?;
                match token.literal() {
                    Some(Literal::Number(value)) => Ok(Node::Number(*value)),
                    _ => match token.lexeme().parse() {
                        Ok(value) => Ok(Node::Number(value)),
                        Err(_) => Err(Located::at(
                            ParserError::ExpectedExpr(token.to_string()),
                            token.position(),
                        )),
                    },
                }
            }

            TokenKind::StringLiteral => {
                let token = self.next()?;
                let text = match token.literal() {
                    Some(Literal::Text(text)) => text.clone(),
                    _ => token.lexeme().trim_matches('"').to_owned(),
                };

                Ok(Node::String(text))
            }

            TokenKind::Identifier => {
                let name = self.next()?.lexeme().to_owned();

                if self.accept(&[TokenKind::OpenSquare]).is_some() {
                    let index = Box::new(self.expression()?);
                    self.expect(TokenKind::CloseSquare, "Expected ']' after array index")?;

                    return Ok(Node::ArrayAccess { name, index });
                }

                if self.accept(&[TokenKind::OpenParen]).is_some() {
                    let arguments = self.arguments()?;
                    self.expect(TokenKind::CloseParen, "Expected ')' after function arguments")?;

                    return Ok(Node::Call { name, arguments });
                }

                Ok(Node::Variable(name))
            }

            TokenKind::OpenParen => {
                self.next()?;
                let expr = self.expression()?;
                self.expect(TokenKind::CloseParen, "Expected ')' after expression")?;

                Ok(expr)
            }

            _ => {
                let found = self.found();
                self.fail(ParserError::ExpectedExpr(found))
            }
        }
    }

    fn arguments(&mut self) -> Parse<Vec<Node>> {
        let mut arguments = Vec::new();
        if self.check(TokenKind::CloseParen) {
            return Ok(arguments);
        }

        loop {
            arguments.push(self.expression()?);
            if self.accept(&[TokenKind::Comma]).is_none() {
                break Ok(arguments);
            }
        }
    }

    fn type_specifier(&mut self) -> Option<Type> {
        let typ = match self.peek_kind() {
            TokenKind::Int => Type::Int,
            TokenKind::Bool => Type::Bool,
            TokenKind::Str => Type::String,
            _ => return None,
        };

        self.next().ok()?;
        Some(typ)
    }

    fn identifier(&mut self, expected: &'static str) -> Parse<String> {
        self.expect(TokenKind::Identifier, expected)
            .map(|token| token.lexeme().to_owned())
    }

    /// Aplica una regla un nivel más adentro, fallando si se excede
    /// [`MAX_DEPTH`].
    fn nested<F>(&mut self, rule: F) -> Parse<Node>
    where
        F: FnOnce(&mut Self) -> Parse<Node>,
    {
        if self.depth >= MAX_DEPTH {
            return self.fail(ParserError::NestingTooDeep);
        }

        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;

        result
    }

    fn lookahead<T, F>(&self, rule: F) -> T
    where
        F: FnOnce(&mut Self) -> T,
    {
        rule(&mut self.clone())
    }

    /// Consume el siguiente token si su clase es alguna de `kinds`.
    fn accept(&mut self, kinds: &[TokenKind]) -> Option<&'a Token> {
        if kinds.contains(&self.peek_kind()) {
            self.next().ok()
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Parse<&'a Token> {
        if self.check(kind) {
            self.next()
        } else {
            let found = self.found();
            self.fail(ParserError::UnexpectedToken { expected, found })
        }
    }

    fn check(&mut self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn at_end(&mut self) -> bool {
        self.check(TokenKind::Eof)
    }

    fn peek_kind(&mut self) -> TokenKind {
        self.tokens.peek().map_or(TokenKind::Eof, |token| token.kind())
    }

    /// Descripción del token actual para mensajes de error.
    fn found(&mut self) -> String {
        match self.tokens.peek() {
            Some(token) => token.to_string(),
            None => String::from("end of input"),
        }
    }

    fn next(&mut self) -> Parse<&'a Token> {
        match self.tokens.peek() {
            Some(&token) if token.kind() != TokenKind::Eof => {
                self.last_known = token.position();
                self.tokens.next();

                Ok(token)
            }

            _ => self.fail(ParserError::UnexpectedEof),
        }
    }

    /// Falla en la posición del token actual.
    fn fail<T>(&mut self, error: ParserError) -> Parse<T> {
        let position = self
            .tokens
            .peek()
            .map_or(self.last_known, |token| token.position());

        Err(Located::at(error, position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::scan_all;

    fn parse_source(source: &str) -> Result<Program, Located<ParserError>> {
        parse(&scan_all(source).unwrap())
    }

    fn statements(source: &str) -> Vec<Node> {
        parse_source(source).unwrap().declarations
    }

    fn var(name: &str) -> Box<Node> {
        Box::new(Node::Variable(String::from(name)))
    }

    fn num(value: f64) -> Box<Node> {
        Box::new(Node::Number(value))
    }

    #[test]
    fn if_else_with_blocks() {
        let program = statements("if (x > 3) { print(x); } else { x = 0; }");

        let expected = Node::If {
            condition: Box::new(Node::Comparison {
                op: CmpOp::Greater,
                left: var("x"),
                right: num(3.0),
            }),
            then_branch: Box::new(Node::Block(vec![Node::Print(var("x"))])),
            else_branch: Some(Box::new(Node::Block(vec![Node::Assignment {
                variable: String::from("x"),
                value: num(0.0),
            }]))),
        };

        assert_eq!(program, [expected]);
    }

    #[test]
    fn initializer_desugars_into_block() {
        let program = statements("int x = 1;");

        let expected = Node::Block(vec![
            Node::VarDecl {
                typ: Type::Int,
                name: String::from("x"),
            },
            Node::Assignment {
                variable: String::from("x"),
                value: num(1.0),
            },
        ]);

        assert_eq!(program, [expected]);
    }

    #[test]
    fn legacy_and_typed_declarations() {
        let program = statements("var bool flag; string s; int a[10];");

        assert_eq!(
            program,
            [
                Node::VarDecl {
                    typ: Type::Bool,
                    name: String::from("flag"),
                },
                Node::VarDecl {
                    typ: Type::String,
                    name: String::from("s"),
                },
                Node::ArrayDecl {
                    typ: Type::Int,
                    name: String::from("a"),
                    size: 10,
                },
            ]
        );
    }

    #[test]
    fn precedence_and_associativity() {
        let program = statements("x = 1 + 2 * 3 - 4;");

        let product = Node::BinaryOp {
            op: BinOp::Mul,
            left: num(2.0),
            right: num(3.0),
        };

        let sum = Node::BinaryOp {
            op: BinOp::Add,
            left: num(1.0),
            right: Box::new(product),
        };

        let expected = Node::Assignment {
            variable: String::from("x"),
            value: Box::new(Node::BinaryOp {
                op: BinOp::Sub,
                left: Box::new(sum),
                right: num(4.0),
            }),
        };

        assert_eq!(program, [expected]);
    }

    #[test]
    fn comparisons_fold_left() {
        let program = statements("a < b == c;");

        let expected = Node::Comparison {
            op: CmpOp::Equal,
            left: Box::new(Node::Comparison {
                op: CmpOp::Less,
                left: var("a"),
                right: var("b"),
            }),
            right: var("c"),
        };

        assert_eq!(program, [expected]);
    }

    #[test]
    fn chained_assignment_is_right_associative() {
        let program = statements("x = y = (2);");

        let expected = Node::Assignment {
            variable: String::from("x"),
            value: Box::new(Node::Assignment {
                variable: String::from("y"),
                value: num(2.0),
            }),
        };

        assert_eq!(program, [expected]);
    }

    #[test]
    fn arrays_and_calls() {
        let program = statements("a[i + 1] = f(2, \"s\"); print(a[0]); g();");

        let assignment = Node::ArrayAssignment {
            name: String::from("a"),
            index: Box::new(Node::BinaryOp {
                op: BinOp::Add,
                left: var("i"),
                right: num(1.0),
            }),
            value: Box::new(Node::Call {
                name: String::from("f"),
                arguments: vec![Node::Number(2.0), Node::String(String::from("s"))],
            }),
        };

        let print = Node::Print(Box::new(Node::ArrayAccess {
            name: String::from("a"),
            index: num(0.0),
        }));

        let call = Node::Call {
            name: String::from("g"),
            arguments: Vec::new(),
        };

        assert_eq!(program, [assignment, print, call]);
    }

    #[test]
    fn while_with_read_body() {
        let program = statements("while (true) read(n);");

        let expected = Node::While {
            condition: Box::new(Node::Boolean(true)),
            body: Box::new(Node::Read(String::from("n"))),
        };

        assert_eq!(program, [expected]);
    }

    #[test]
    fn missing_semicolon() {
        let error = parse_source("x = 1\ny = 2;").unwrap_err();

        assert_eq!(error.position(), Position::new(2, 1));
        assert_eq!(
            error.val().to_string(),
            "Expected ';' after expression, found identifier `y`"
        );
    }

    #[test]
    fn var_requires_type() {
        let error = parse_source("var x;").unwrap_err();
        assert!(matches!(error.val(), ParserError::ExpectedType(_)));
        assert_eq!(error.position(), Position::new(1, 5));
    }

    #[test]
    fn fractional_array_size() {
        let error = parse_source("int a[2.5];").unwrap_err();
        assert_eq!(error.val(), &ParserError::BadArraySize(String::from("2.5")));
    }

    #[test]
    fn expression_expected() {
        let error = parse_source("print();").unwrap_err();
        assert_eq!(error.val(), &ParserError::ExpectedExpr(String::from("`)`")));

        let error = parse_source("{ x = 1;").unwrap_err();
        assert_eq!(
            error.val().to_string(),
            "Expected '}' after block, found end of input"
        );
    }

    #[test]
    fn empty_program() {
        assert_eq!(parse_source("").unwrap(), Program::default());
        assert_eq!(parse(&Vec::<Token>::new()).unwrap(), Program::default());
    }

    #[test]
    fn nesting_is_bounded() {
        let deep = format!("x = {}1{};", "(".repeat(400), ")".repeat(400));
        let error = parse_source(&deep).unwrap_err();
        assert_eq!(error.val(), &ParserError::NestingTooDeep);
        assert_eq!(error.position().line(), 1);

        let blocks = format!("{}{}", "{".repeat(400), "}".repeat(400));
        let error = parse_source(&blocks).unwrap_err();
        assert_eq!(error.val(), &ParserError::NestingTooDeep);
    }

    #[test]
    fn moderate_nesting_is_accepted() {
        let source = format!("x = {}1{};", "(".repeat(60), ")".repeat(60));
        assert_eq!(statements(&source).len(), 1);

        let source = format!("{}print(1);{}", "{".repeat(60), "}".repeat(60));
        assert_eq!(statements(&source).len(), 1);
    }
}
