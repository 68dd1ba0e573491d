//! Árbol sintáctico abstracto.
//!
//! El conjunto de nodos es cerrado y lo fija la gramática. Cada fase
//! posterior (análisis semántico, generación de código) recorre el árbol
//! con un `match` exhaustivo sobre [`Node`], de modo que agregar una
//! variante obliga a actualizar a todos los consumidores.
//!
//! Todo nodo pertenece exclusivamente a su padre, ya sea como campo
//! (`Box`) o como elemento de una lista (`Vec`). No existen nodos
//! compartidos ni referencias hacia arriba.

use std::fmt::{self, Display};

/// Raíz del árbol: la secuencia de declaraciones del programa.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub declarations: Vec<Node>,
}

/// Tipo declarado de una variable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Bool,
    String,
}

impl Display for Type {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => fmt.write_str("int"),
            Type::Bool => fmt.write_str("bool"),
            Type::String => fmt.write_str("string"),
        }
    }
}

/// Operador aritmético.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl Display for BinOp {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        };

        fmt.write_str(symbol)
    }
}

/// Operador relacional.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Equal,
    NotEqual,
}

impl Display for CmpOp {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CmpOp::Less => "<",
            CmpOp::LessOrEqual => "<=",
            CmpOp::Greater => ">",
            CmpOp::GreaterOrEqual => ">=",
            CmpOp::Equal => "==",
            CmpOp::NotEqual => "!=",
        };

        fmt.write_str(symbol)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// `int x;` o `var int x;`
    VarDecl { typ: Type, name: String },

    /// `int x[10];`
    ArrayDecl { typ: Type, name: String, size: u32 },

    Assignment { variable: String, value: Box<Node> },

    /// `x[i] = valor`
    ArrayAssignment {
        name: String,
        index: Box<Node>,
        value: Box<Node>,
    },

    BinaryOp {
        op: BinOp,
        left: Box<Node>,
        right: Box<Node>,
    },

    Comparison {
        op: CmpOp,
        left: Box<Node>,
        right: Box<Node>,
    },

    Variable(String),

    ArrayAccess { name: String, index: Box<Node> },

    Number(f64),

    Boolean(bool),

    String(String),

    If {
        condition: Box<Node>,
        then_branch: Box<Node>,
        else_branch: Option<Box<Node>>,
    },

    While { condition: Box<Node>, body: Box<Node> },

    Block(Vec<Node>),

    Print(Box<Node>),

    Read(String),

    /// Llamada `f(a, b)`. Solo existe a nivel sintáctico.
    Call { name: String, arguments: Vec<Node> },
}

/// Volcado indentado del árbol, un nodo por línea.
impl Display for Program {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(fmt, "Program")?;
        for declaration in &self.declarations {
            dump(declaration, 1, fmt)?;
        }

        Ok(())
    }
}

fn dump(node: &Node, depth: usize, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
    let indent = depth * 2;
    macro_rules! emit {
        ($($format:tt)*) => {{
            write!(fmt, "{:indent$}", "", indent = indent)?;
            writeln!(fmt, $($format)*)
        }};
    }

    match node {
        Node::VarDecl { typ, name } => emit!("VarDeclaration: {} {}", typ, name),
        Node::ArrayDecl { typ, name, size } => {
            emit!("ArrayDeclaration: {} {}[{}]", typ, name, size)
        }

        Node::Assignment { variable, value } => {
            emit!("Assignment: {} =", variable)?;
            dump(value, depth + 1, fmt)
        }

        Node::ArrayAssignment { name, index, value } => {
            emit!("ArrayAssignment: {}[", name)?;
            dump(index, depth + 1, fmt)?;
            emit!("] =")?;
            dump(value, depth + 1, fmt)
        }

        Node::BinaryOp { op, left, right } => {
            emit!("BinaryOp: {}", op)?;
            dump(left, depth + 1, fmt)?;
            dump(right, depth + 1, fmt)
        }

        Node::Comparison { op, left, right } => {
            emit!("Comparison: {}", op)?;
            dump(left, depth + 1, fmt)?;
            dump(right, depth + 1, fmt)
        }

        Node::Variable(name) => emit!("Variable: {}", name),
        Node::ArrayAccess { name, index } => {
            emit!("ArrayAccess: {}[", name)?;
            dump(index, depth + 1, fmt)?;
            emit!("]")
        }

        Node::Number(value) => emit!("Number: {}", value),
        Node::Boolean(value) => emit!("Boolean: {}", value),
        Node::String(value) => emit!("String: {:?}", value),

        Node::If {
            condition,
            then_branch,
            else_branch,
        } => {
            emit!("If:")?;
            emit!("  Condition:")?;
            dump(condition, depth + 2, fmt)?;
            emit!("  Then:")?;
            dump(then_branch, depth + 2, fmt)?;

            if let Some(else_branch) = else_branch {
                emit!("  Else:")?;
                dump(else_branch, depth + 2, fmt)?;
            }

            Ok(())
        }

        Node::While { condition, body } => {
            emit!("While:")?;
            emit!("  Condition:")?;
            dump(condition, depth + 2, fmt)?;
            emit!("  Body:")?;
            dump(body, depth + 2, fmt)
        }

        Node::Block(statements) => {
            emit!("Block:")?;
            for statement in statements {
                dump(statement, depth + 1, fmt)?;
            }

            Ok(())
        }

        Node::Print(value) => {
            emit!("Print:")?;
            dump(value, depth + 1, fmt)
        }

        Node::Read(variable) => emit!("Read: {}", variable),

        Node::Call { name, arguments } => {
            emit!("Call: {}(", name)?;
            for argument in arguments {
                dump(argument, depth + 1, fmt)?;
            }

            emit!(")")
        }
    }
}
