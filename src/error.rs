//! Reporte de errores legible por humanos.
//!
//! Cada fase produce su propio tipo de error; [`Diagnostics`] los
//! agrupa y los presenta junto a la línea del código fuente donde
//! ocurrieron, si se conoce.

use crate::{
    semantic::SemanticError,
    source::{Located, Position, Source},
};

use std::{
    error::Error,
    fmt::{self, Display},
    iter,
};

mod sealed {
    pub trait Sealed {}
}

/// Un error que puede o no tener una posición asociada.
pub trait LocatedError: sealed::Sealed {
    fn error(&self) -> &(dyn Error + 'static);
    fn position(&self) -> Option<Position>;
}

pub struct Diagnostics {
    kind: &'static str,
    source: Option<Source>,
    errors: Vec<Box<dyn 'static + LocatedError>>,
}

impl Diagnostics {
    pub fn kind(self, kind: &'static str) -> Self {
        Diagnostics { kind, ..self }
    }

    /// Asocia el texto fuente para citar líneas en el reporte.
    pub fn with_source(self, source: Source) -> Self {
        Diagnostics {
            source: Some(source),
            ..self
        }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Mensajes de error sin formato adicional, en orden.
    pub fn messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(|error| error.error().to_string())
            .collect()
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Diagnostics {
            kind: "error",
            source: None,
            errors: Default::default(),
        }
    }
}

impl<E: 'static + LocatedError> From<E> for Diagnostics {
    fn from(error: E) -> Self {
        Diagnostics {
            errors: vec![Box::new(error)],
            ..Default::default()
        }
    }
}

impl<E: 'static + LocatedError> From<Vec<E>> for Diagnostics {
    fn from(errors: Vec<E>) -> Self {
        let errors = errors
            .into_iter()
            .map(|error| {
                let error: Box<dyn LocatedError> = Box::new(error);
                error
            })
            .collect();

        Diagnostics {
            errors,
            ..Default::default()
        }
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Diagnostics")
            .field("kind", &self.kind)
            .field("errors", &self.messages())
            .finish()
    }
}

impl Display for Diagnostics {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Diagnostics {
            kind,
            source,
            errors,
        } = self;

        if errors.is_empty() {
            return writeln!(fmt, "No errors were reported");
        }

        for error in errors {
            writeln!(fmt, "{}: {}", kind, error.error())?;

            let position = match error.position() {
                Some(position) => position,
                None => {
                    writeln!(fmt)?;
                    continue;
                }
            };

            let (source, line) = match source {
                Some(source) => (source, source.line(position.line())),
                None => {
                    writeln!(fmt, " --> {}", position)?;
                    writeln!(fmt)?;
                    continue;
                }
            };

            writeln!(fmt, " --> {}:{}", source.name(), position)?;

            if let Some(line) = line {
                let digits = position.line().to_string().chars().count();
                let skip = (position.column() - 1) as usize;

                // Los tabuladores se replican para que el `^` quede alineado
                let mut padding: String = line
                    .chars()
                    .take(skip)
                    .map(|c| if c == '\t' { '\t' } else { ' ' })
                    .collect();

                let missing = skip.saturating_sub(padding.chars().count());
                padding.extend(iter::repeat(' ').take(missing));

                writeln!(fmt, "{:digits$} |", "", digits = digits)?;
                writeln!(fmt, "{:>digits$} | {}", position.line(), line, digits = digits)?;
                writeln!(fmt, "{:digits$} | {}^", "", padding, digits = digits)?;
            }

            writeln!(fmt)?;
        }

        let error_or_errors = if errors.len() == 1 { "error" } else { "errors" };
        writeln!(
            fmt,
            "Build failed with {} {}",
            errors.len(),
            error_or_errors
        )
    }
}

impl<E: Error + 'static> sealed::Sealed for Located<E> {}

impl<E: Error + 'static> LocatedError for Located<E> {
    fn error(&self) -> &(dyn Error + 'static) {
        self.as_ref()
    }

    fn position(&self) -> Option<Position> {
        Some(Located::position(self))
    }
}

impl sealed::Sealed for SemanticError {}

impl LocatedError for SemanticError {
    fn error(&self) -> &(dyn Error + 'static) {
        self
    }

    fn position(&self) -> Option<Position> {
        None
    }
}
