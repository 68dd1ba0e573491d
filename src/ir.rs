//! Código intermedio de tres direcciones.
//!
//! Cada instrucción tiene a lo sumo un operador y hasta dos operandos
//! fuente. Las instrucciones no tienen identidad más allá de su posición
//! en la secuencia que produce [`crate::codegen::generate`].

use std::fmt::{self, Display};

use crate::ast::{BinOp, CmpOp};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Label(pub u32);

impl Display for Label {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "L{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Temp(pub u32);

impl Display for Temp {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "t{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Variable(String),
    Temp(Temp),

    /// Literal ya convertido a su forma textual.
    Constant(String),

    /// Valor de una forma que no se traduce (arreglos y llamadas).
    Unknown,
}

impl Display for Operand {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Variable(name) => fmt.write_str(name),
            Operand::Temp(temp) => temp.fmt(fmt),
            Operand::Constant(text) => fmt.write_str(text),
            Operand::Unknown => fmt.write_str("?"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operator {
    Arithmetic(BinOp),
    Relational(CmpOp),
}

impl Display for Operator {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Arithmetic(op) => op.fmt(fmt),
            Operator::Relational(op) => op.fmt(fmt),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    /// `R = A`
    Copy { target: String, value: Operand },

    /// `R = A OP B`
    Binary {
        target: Temp,
        left: Operand,
        op: Operator,
        right: Operand,
    },

    /// `if !A goto R`: salta cuando la condición es falsa.
    JumpUnless { condition: Operand, target: Label },

    /// `goto R`
    Jump(Label),

    /// `R:`
    SetLabel(Label),

    /// `print A`
    Print(Operand),

    /// `read R`
    Read(String),
}

impl Instruction {
    /// Nombre que la instrucción define o al que salta.
    pub fn result(&self) -> Option<String> {
        match self {
            Instruction::Copy { target, .. } => Some(target.clone()),
            Instruction::Binary { target, .. } => Some(target.to_string()),
            Instruction::JumpUnless { target, .. } => Some(target.to_string()),
            Instruction::Jump(label) | Instruction::SetLabel(label) => Some(label.to_string()),
            Instruction::Print(_) => None,
            Instruction::Read(variable) => Some(variable.clone()),
        }
    }

    pub fn operator(&self) -> String {
        match self {
            Instruction::Copy { .. } => String::from("="),
            Instruction::Binary { op, .. } => op.to_string(),
            Instruction::JumpUnless { .. } => String::from("if"),
            Instruction::Jump(_) => String::from("goto"),
            Instruction::SetLabel(_) => String::from("label"),
            Instruction::Print(_) => String::from("print"),
            Instruction::Read(_) => String::from("read"),
        }
    }

    /// Primer operando; la negación de los saltos condicionales
    /// forma parte del texto.
    pub fn arg1(&self) -> Option<String> {
        match self {
            Instruction::Copy { value, .. } => Some(value.to_string()),
            Instruction::Binary { left, .. } => Some(left.to_string()),
            Instruction::JumpUnless { condition, .. } => Some(format!("!{}", condition)),
            Instruction::Print(value) => Some(value.to_string()),
            Instruction::Jump(_) | Instruction::SetLabel(_) | Instruction::Read(_) => None,
        }
    }

    pub fn arg2(&self) -> Option<String> {
        match self {
            Instruction::Binary { right, .. } => Some(right.to_string()),
            _ => None,
        }
    }
}

impl Display for Instruction {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Copy { target, value } => write!(fmt, "{} = {}", target, value),
            Instruction::Binary {
                target,
                left,
                op,
                right,
            } => write!(fmt, "{} = {} {} {}", target, left, op, right),

            Instruction::JumpUnless { condition, target } => {
                write!(fmt, "if !{} goto {}", condition, target)
            }

            Instruction::Jump(label) => write!(fmt, "goto {}", label),
            Instruction::SetLabel(label) => write!(fmt, "{}:", label),
            Instruction::Print(value) => write!(fmt, "print {}", value),
            Instruction::Read(variable) => write!(fmt, "read {}", variable),
        }
    }
}
