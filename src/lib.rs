//! Compilador de un pequeño lenguaje imperativo de enseñanza a código
//! intermedio de tres direcciones.
//!
//! # Fases
//! Cada programa deriva de un único texto fuente. Este texto se somete
//! primero a análisis léxico en [`lex`], de lo cual se obtiene una
//! secuencia de tokens. Los tokens se disponen en un AST ([`ast`]) por
//! medio de análisis sintáctico en [`parse`]. El árbol sintáctico es
//! validado por análisis semántico en [`semantic`] y finalmente traducido
//! a la representación intermedia descrita en [`ir`] por [`codegen`].
//!
//! Cada fase consume por completo la salida de la anterior. Los errores
//! léxicos y sintácticos son fatales; los semánticos se acumulan.
//!
//! ```
//! let compilation = minitac::compile("<doc>", "int x; x = 1 + 2;").unwrap();
//! let code: Vec<_> = compilation.code.iter().map(ToString::to_string).collect();
//!
//! assert_eq!(code, ["t0 = 1 + 2", "x = t0"]);
//! ```

pub mod ast;
pub mod codegen;
pub mod error;
pub mod ir;
pub mod lex;
pub mod parse;
pub mod semantic;
pub mod source;

use tracing::info;

use crate::{
    ast::Program,
    error::Diagnostics,
    ir::Instruction,
    lex::Token,
    source::Source,
};

pub use crate::{codegen::generate, lex::scan_all, parse::parse, semantic::analyze};

/// Artefactos de una compilación exitosa.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub tokens: Vec<Token>,
    pub program: Program,
    pub code: Vec<Instruction>,
}

/// Ejecuta la pipeline completa sobre un texto fuente.
///
/// Nunca se genera código para un árbol con errores semánticos
/// pendientes. `name` identifica el origen en los reportes de error.
pub fn compile(name: &str, text: &str) -> Result<Compilation, Diagnostics> {
    let source = || Source::new(name, text);

    let tokens = scan_all(text)
        .map_err(|error| Diagnostics::from(error).kind("Lexical error").with_source(source()))?;

    let program = parse(&tokens)
        .map_err(|error| Diagnostics::from(error).kind("Syntax error").with_source(source()))?;

    let errors = analyze(&program);
    if !errors.is_empty() {
        return Err(Diagnostics::from(errors).kind("Semantic error"));
    }

    let code = generate(&program);
    info!(%name, instructions = code.len(), "compilation succeeded");

    Ok(Compilation {
        tokens,
        program,
        code,
    })
}
