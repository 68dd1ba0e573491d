//! Generación de código intermedio.
//!
//! El AST se recorre en post-orden: los operandos de una operación se
//! evalúan antes que la operación misma. Cada expresión produce un
//! [`Operand`] (variable, temporal o literal) junto con las instrucciones
//! necesarias para calcularlo.
//!
//! Los contadores de temporales y etiquetas viven en un contexto local a
//! cada llamada a [`generate`], de modo que toda traducción numera desde
//! `t0` y `L0`.
//!
//! No se realiza validación alguna. Se asume un árbol que ya superó el
//! análisis semántico.

use tracing::debug;

use crate::{
    ast::{Node, Program},
    ir::{Instruction, Label, Operand, Operator, Temp},
};

/// Traduce un programa completo a código de tres direcciones.
pub fn generate(program: &Program) -> Vec<Instruction> {
    let mut context = Context::default();
    for declaration in &program.declarations {
        context.lower(declaration);
    }

    debug!(
        instructions = context.code.len(),
        temps = context.temps,
        labels = context.labels,
        "generated intermediate code"
    );

    context.code
}

impl Program {
    /// Equivalente a [`generate`].
    pub fn lower(&self) -> Vec<Instruction> {
        generate(self)
    }
}

#[derive(Default)]
struct Context {
    code: Vec<Instruction>,
    temps: u32,
    labels: u32,
}

impl Context {
    /// Traduce un nodo. Las sentencias no producen operando.
    fn lower(&mut self, node: &Node) -> Option<Operand> {
        match node {
            Node::Number(value) => Some(Operand::Constant(value.to_string())),
            Node::Boolean(value) => Some(Operand::Constant(value.to_string())),
            Node::String(value) => Some(Operand::Constant(format!("\"{}\"", value))),
            Node::Variable(name) => Some(Operand::Variable(name.clone())),

            Node::BinaryOp { op, left, right } => {
                Some(self.binary(Operator::Arithmetic(*op), left, right))
            }

            Node::Comparison { op, left, right } => {
                Some(self.binary(Operator::Relational(*op), left, right))
            }

            Node::Assignment { variable, value } => {
                let value = self.value(value);
                self.emit(Instruction::Copy {
                    target: variable.clone(),
                    value,
                });

                Some(Operand::Variable(variable.clone()))
            }

            Node::Print(value) => {
                let value = self.value(value);
                self.emit(Instruction::Print(value));
                None
            }

            Node::Read(variable) => {
                self.emit(Instruction::Read(variable.clone()));
                None
            }

            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.value(condition);
                let otherwise = self.label();
                let end = self.label();

                self.emit(Instruction::JumpUnless {
                    condition,
                    target: otherwise,
                });

                self.lower(then_branch);
                self.emit(Instruction::Jump(end));

                // La etiqueta del `else` se emite aunque no exista rama
                self.emit(Instruction::SetLabel(otherwise));
                if let Some(else_branch) = else_branch {
                    self.lower(else_branch);
                }

                self.emit(Instruction::SetLabel(end));
                None
            }

            Node::While { condition, body } => {
                let start = self.label();
                let end = self.label();

                self.emit(Instruction::SetLabel(start));
                let condition = self.value(condition);
                self.emit(Instruction::JumpUnless {
                    condition,
                    target: end,
                });

                self.lower(body);
                self.emit(Instruction::Jump(start));
                self.emit(Instruction::SetLabel(end));
                None
            }

            Node::Block(statements) => {
                for statement in statements {
                    self.lower(statement);
                }

                None
            }

            Node::VarDecl { .. } | Node::ArrayDecl { .. } => None,

            // Arreglos y llamadas no se traducen; solo sus hijos
            Node::ArrayAccess { index, .. } => {
                self.lower(index);
                Some(Operand::Unknown)
            }

            Node::ArrayAssignment { index, value, .. } => {
                self.lower(index);
                self.lower(value);
                Some(Operand::Unknown)
            }

            Node::Call { arguments, .. } => {
                for argument in arguments {
                    self.lower(argument);
                }

                Some(Operand::Unknown)
            }
        }
    }

    fn value(&mut self, node: &Node) -> Operand {
        self.lower(node).unwrap_or(Operand::Unknown)
    }

    fn binary(&mut self, op: Operator, left: &Node, right: &Node) -> Operand {
        let left = self.value(left);
        let right = self.value(right);
        let target = self.temp();

        self.emit(Instruction::Binary {
            target,
            left,
            op,
            right,
        });

        Operand::Temp(target)
    }

    fn emit(&mut self, instruction: Instruction) {
        self.code.push(instruction);
    }

    fn temp(&mut self) -> Temp {
        let temp = Temp(self.temps);
        self.temps += 1;
        temp
    }

    fn label(&mut self) -> Label {
        let label = Label(self.labels);
        self.labels += 1;
        label
    }
}
