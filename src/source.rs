//! Rastreo de ubicaciones originales en código fuente.
//!
//! Los distintos objetos internos que el compilador construye
//! deben llevar cuenta de la posición en el código fuente original
//! donde se originan, lo cual permite determinar el punto exacto
//! en donde ocurre un error léxico o sintáctico.

use std::fmt::{self, Debug, Display, Formatter};

/// Un objeto cualquiera con una posición original asociada.
#[derive(Debug, Clone, PartialEq)]
pub struct Located<T> {
    position: Position,
    value: T,
}

impl<T> Located<T> {
    /// Obtiene el valor.
    pub fn val(&self) -> &T {
        &self.value
    }

    /// Obtiene la posición.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Descarta la posición y toma ownership del valor.
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Descompone y toma ownership de las dos partes.
    pub fn split(self) -> (Position, T) {
        (self.position, self.value)
    }

    /// Construye a partir de un valor y una posición.
    pub fn at(value: T, position: Position) -> Self {
        Located { value, position }
    }

    /// Transforma el valor con la misma posición.
    pub fn map<U, F>(self, map: F) -> Located<U>
    where
        F: FnOnce(T) -> U,
    {
        Located {
            value: map(self.value),
            position: self.position,
        }
    }
}

impl<T> AsRef<T> for Located<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

impl<T: Display> Display for Located<T> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} at line {}, column {}", self.value, self.position.line, self.position.column)
    }
}

impl<T: std::error::Error> std::error::Error for Located<T> {}

/// Una posición línea-columna en un archivo.
///
/// Ambas componentes inician en 1.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct Position {
    line: u32,
    column: u32,
}

impl Position {
    /// Construye una posición arbitraria.
    pub fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }

    /// Obtiene el número de línea.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Obtiene el número de columna.
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Incrementa el número de columna.
    pub fn advance(self) -> Position {
        Position {
            line: self.line,
            column: self.column + 1,
        }
    }

    /// Incrementa el número de línea y retorna a la columna 1.
    pub fn newline(self) -> Position {
        Position {
            line: self.line + 1,
            column: 1,
        }
    }

    /// Posición que ocupará el carácter siguiente a `c`.
    pub fn after(self, c: char) -> Position {
        match c {
            '\n' => self.newline(),
            _ => self.advance(),
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position { line: 1, column: 1 }
    }
}

impl Display for Position {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.line, self.column)
    }
}

impl Debug for Position {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        <Self as Display>::fmt(self, formatter)
    }
}

/// Texto fuente completo junto a un nombre de origen.
///
/// Se utiliza para citar líneas del programa original al reportar
/// errores en [`crate::error::Diagnostics`].
#[derive(Debug, Clone)]
pub struct Source {
    name: String,
    lines: Vec<String>,
}

impl Source {
    /// Construye a partir de un nombre de origen y el texto completo.
    pub fn new<S: Into<String>>(name: S, text: &str) -> Self {
        Source {
            name: name.into(),
            lines: text.lines().map(String::from).collect(),
        }
    }

    /// Nombre de origen, usualmente una ruta o `<stdin>`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Obtiene una línea por número, si existe.
    pub fn line(&self, line: u32) -> Option<&str> {
        let index = (line as usize).checked_sub(1)?;
        self.lines.get(index).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_follow_newlines() {
        let position = Position::default().after('a').after('b');
        assert_eq!((position.line(), position.column()), (1, 3));

        let position = position.after('\n');
        assert_eq!((position.line(), position.column()), (2, 1));
    }

    #[test]
    fn located_display_names_position() {
        let located = Located::at("oops", Position::new(3, 7));
        assert_eq!(located.to_string(), "oops at line 3, column 7");
        assert_eq!(located.map(str::len).into_inner(), 4);
    }

    #[test]
    fn source_lines_are_one_based() {
        let source = Source::new("<test>", "int x;\nx = 1;\n");
        assert_eq!(source.line(1), Some("int x;"));
        assert_eq!(source.line(2), Some("x = 1;"));
        assert_eq!(source.line(0), None);
        assert_eq!(source.line(3), None);
    }
}
