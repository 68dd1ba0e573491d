//! Análisis semántico.
//!
//! Se verifica únicamente la consistencia entre declaraciones y usos
//! de variables, sobre una única tabla de símbolos plana para todo el
//! programa: declarar dentro de un bloque o condicional escribe en la
//! misma tabla y no existe ocultamiento de nombres.
//!
//! Los errores no son fatales. El recorrido nunca se detiene antes de
//! tiempo y todos los errores se reportan en orden de aparición.

use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, trace};

use crate::ast::{Node, Program, Type};

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    #[error("{0} already declared")]
    AlreadyDeclared(String),

    #[error("{0} not declared")]
    NotDeclared(String),
}

impl SemanticError {
    /// Nombre de la variable involucrada.
    pub fn name(&self) -> &str {
        match self {
            SemanticError::AlreadyDeclared(name) => name,
            SemanticError::NotDeclared(name) => name,
        }
    }
}

/// Tabla de símbolos plana: nombre de variable a tipo declarado.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    symbols: HashMap<String, Type>,
}

impl SymbolTable {
    pub fn lookup(&self, name: &str) -> Option<Type> {
        self.symbols.get(name).copied()
    }

    /// Inserta un nombre nuevo. Una redeclaración no altera la tabla.
    pub fn declare(&mut self, name: &str, typ: Type) -> Result<(), SemanticError> {
        if self.symbols.contains_key(name) {
            return Err(SemanticError::AlreadyDeclared(name.to_owned()));
        }

        self.symbols.insert(name.to_owned(), typ);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Analiza un programa completo.
///
/// Una lista vacía significa que el programa fue aceptado. El estado
/// (tabla y errores) se construye de cero en cada llamada.
pub fn analyze(program: &Program) -> Vec<SemanticError> {
    let mut context = Context::default();
    for declaration in &program.declarations {
        context.scan(declaration);
    }

    debug!(
        symbols = context.scope.len(),
        errors = context.errors.len(),
        "semantic analysis finished"
    );

    context.errors
}

impl Program {
    /// Equivalente a [`analyze`].
    pub fn analyze(&self) -> Vec<SemanticError> {
        analyze(self)
    }
}

#[derive(Default)]
struct Context {
    scope: SymbolTable,
    errors: Vec<SemanticError>,
}

impl Context {
    fn scan(&mut self, node: &Node) {
        match node {
            Node::VarDecl { typ, name } => {
                trace!(%name, %typ, "declaration");
                if let Err(error) = self.scope.declare(name, *typ) {
                    self.errors.push(error);
                }
            }

            Node::Assignment { variable, value } => {
                self.require(variable);
                self.scan(value);
            }

            Node::Variable(name) | Node::Read(name) => self.require(name),

            Node::BinaryOp { left, right, .. } | Node::Comparison { left, right, .. } => {
                self.scan(left);
                self.scan(right);
            }

            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.scan(condition);
                self.scan(then_branch);

                if let Some(else_branch) = else_branch {
                    self.scan(else_branch);
                }
            }

            Node::While { condition, body } => {
                self.scan(condition);
                self.scan(body);
            }

            Node::Block(statements) => {
                for statement in statements {
                    self.scan(statement);
                }
            }

            Node::Print(value) => self.scan(value),

            // Arreglos y llamadas no se validan, solo sus hijos
            Node::ArrayDecl { .. } => (),
            Node::ArrayAccess { index, .. } => self.scan(index),
            Node::ArrayAssignment { index, value, .. } => {
                self.scan(index);
                self.scan(value);
            }

            Node::Call { arguments, .. } => {
                for argument in arguments {
                    self.scan(argument);
                }
            }

            Node::Number(_) | Node::Boolean(_) | Node::String(_) => (),
        }
    }

    fn require(&mut self, name: &str) {
        if self.scope.lookup(name).is_none() {
            self.errors.push(SemanticError::NotDeclared(name.to_owned()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lex::scan_all, parse::parse};

    fn errors(source: &str) -> Vec<String> {
        let tokens = scan_all(source).unwrap();
        let program = parse(&tokens).unwrap();

        analyze(&program).iter().map(ToString::to_string).collect()
    }

    #[test]
    fn declared_before_use_is_accepted() {
        let source = "
            int x = 1;
            var string name;
            bool done;
            read(name);
            while (x < 10) {
                x = x + 1;
                if (x == 5) done = true;
            }
            print(name);
        ";

        assert!(errors(source).is_empty());
    }

    #[test]
    fn undeclared_use_is_reported_once() {
        assert_eq!(errors("int a; print(a + b);"), ["b not declared"]);
        assert_eq!(errors("read(z);"), ["z not declared"]);
    }

    #[test]
    fn double_declaration_is_reported_once() {
        assert_eq!(errors("int x; bool x; x = 1;"), ["x already declared"]);
    }

    #[test]
    fn errors_are_collected_in_order() {
        assert_eq!(
            errors("x = y; int y; int y; print(w > 1);"),
            [
                "x not declared",
                "y not declared",
                "y already declared",
                "w not declared"
            ]
        );
    }

    #[test]
    fn table_is_flat() {
        // Una declaración dentro de un bloque sigue visible al salir de él
        assert!(errors("if (true) { int inner; } inner = 3;").is_empty());
        assert_eq!(errors("{ int k; } { int k; }"), ["k already declared"]);
    }

    #[test]
    fn arrays_and_calls_only_check_children() {
        assert!(errors("int a[3]; b[0] = 1; print(f(2));").is_empty());
        assert_eq!(
            errors("a[i] = v; print(g(q));"),
            ["i not declared", "v not declared", "q not declared"]
        );
    }

    #[test]
    fn state_does_not_leak_between_calls() {
        let tokens = scan_all("int x;").unwrap();
        let program = parse(&tokens).unwrap();

        assert!(program.analyze().is_empty());
        assert!(program.analyze().is_empty());
    }

    #[test]
    fn symbol_table_rejects_redeclaration() {
        let mut table = SymbolTable::default();
        assert!(table.declare("x", Type::Int).is_ok());
        assert_eq!(
            table.declare("x", Type::Bool),
            Err(SemanticError::AlreadyDeclared(String::from("x")))
        );
        assert_eq!(table.lookup("x"), Some(Type::Int));
        assert_eq!(table.len(), 1);
    }
}
