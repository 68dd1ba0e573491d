//! Análisis léxico.
//!
//! # Tokenization
//! Esta es la primera fase del compilador. Descompone el texto fuente
//! en unidades léxicas denominadas tokens. Los espacios en blanco se
//! descartan durante esta operación. Cada token emitido está asociado
//! a una posición en el código fuente original, lo cual permite rastrear
//! errores tanto en los mismos como en constructos de fases posteriores.
//!
//! # Contenido de un token
//! Todo token preserva su lexema original. Las constantes literales
//! además se resuelven a sus valores: números a `f64`, cadenas a su
//! contenido sin comillas y `true`/`false` a booleanos.
//!
//! # Reglas importantes del lenguaje
//! - Los identificadores empiezan con una letra o `_` y continúan con
//!   letras, dígitos o `_`.
//! - Las palabras clave distinguen mayúsculas de minúsculas.
//! - Las cadenas no procesan secuencias de escape y pueden abarcar
//!   varias líneas.
//! - Los números no tienen signo ni exponente; la parte decimal es
//!   opcional, pero de existir el `.` debe ir seguido de un dígito.
//!
//! # Errores
//! Cualquier error léxico es fatal: el lexer se detiene en el primer
//! carácter inesperado o cadena sin terminar.

use crate::source::{Located, Position};
use std::{
    fmt::{self, Display},
    iter::Peekable,
    mem,
    str::Chars,
};

use thiserror::Error;
use tracing::{debug, trace};

/// Error de escaneo.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexerError {
    /// Carácter desconocido o inesperado en el flujo de entrada.
    #[error("Unexpected character {0:?}")]
    BadChar(char),

    /// Se alcanzó el final de la entrada dentro de una cadena.
    #[error("Unterminated string literal")]
    UnterminatedString,

    /// Una constante numérica no pudo convertirse a su valor.
    #[error("Malformed numeric literal `{0}`")]
    BadNumber(String),
}

/// Clase de un token.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Palabras clave
    Var,
    If,
    Else,
    While,
    Print,
    Read,
    True,
    False,

    // Tipos
    Int,
    Bool,
    Str,

    // Operadores
    Plus,
    Minus,
    Times,
    Divide,
    Assign,
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,

    // Delimitadores
    OpenParen,
    CloseParen,
    OpenCurly,
    CloseCurly,
    OpenSquare,
    CloseSquare,
    Semicolon,
    Comma,

    // Literales
    Identifier,
    Number,
    StringLiteral,

    /// Centinela de fin de entrada, siempre el último token.
    Eof,
}

impl TokenKind {
    /// Resuelve un término contra la tabla de palabras clave.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        use TokenKind::*;

        const KEYWORDS: &[(&str, TokenKind)] = &[
            ("var",    Var),
            ("if",     If),
            ("else",   Else),
            ("while",  While),
            ("print",  Print),
            ("read",   Read),
            ("true",   True),
            ("false",  False),
            ("int",    Int),
            ("bool",   Bool),
            ("string", Str),
        ];

        KEYWORDS
            .iter()
            .find(|&&(name, _)| name == word)
            .map(|&(_, kind)| kind)
    }

    /// Determina si esta clase corresponde a una palabra clave.
    pub fn is_keyword(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Var | If | Else | While | Print | Read | True | False | Int | Bool | Str
        )
    }
}

impl Display for TokenKind {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;

        let string = match self {
            Var            => "`var`",
            If             => "`if`",
            Else           => "`else`",
            While          => "`while`",
            Print          => "`print`",
            Read           => "`read`",
            True           => "`true`",
            False          => "`false`",
            Int            => "`int`",
            Bool           => "`bool`",
            Str            => "`string`",
            Plus           => "`+`",
            Minus          => "`-`",
            Times          => "`*`",
            Divide         => "`/`",
            Assign         => "`=`",
            Equal          => "`==`",
            NotEqual       => "`!=`",
            Less           => "`<`",
            LessOrEqual    => "`<=`",
            Greater        => "`>`",
            GreaterOrEqual => "`>=`",
            OpenParen      => "`(`",
            CloseParen     => "`)`",
            OpenCurly      => "`{`",
            CloseCurly     => "`}`",
            OpenSquare     => "`[`",
            CloseSquare    => "`]`",
            Semicolon      => "`;`",
            Comma          => "`,`",
            Identifier     => "identifier",
            Number         => "number",
            StringLiteral  => "string literal",
            Eof            => "end of input",
        };

        fmt.write_str(string)
    }
}

/// Valor resuelto de una constante literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Display for Literal {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(number) => write!(fmt, "{}", number),
            Literal::Text(text) => write!(fmt, "{:?}", text),
            Literal::Bool(boolean) => write!(fmt, "{}", boolean),
        }
    }
}

/// Objeto resultante del análisis léxico.
///
/// Un token contiene suficiente información para describir completamente
/// a una entidad léxica en el programa fuente. Los tokens son inmutables
/// una vez construidos.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    kind: TokenKind,
    lexeme: String,
    literal: Option<Literal>,
    position: Position,
}

impl Token {
    /// Construye un token a partir de sus partes.
    pub fn new(
        kind: TokenKind,
        lexeme: impl Into<String>,
        literal: Option<Literal>,
        position: Position,
    ) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            literal,
            position,
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Texto original exacto del token, comillas incluidas para cadenas.
    pub fn lexeme(&self) -> &str {
        &self.lexeme
    }

    pub fn literal(&self) -> Option<&Literal> {
        self.literal.as_ref()
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn line(&self) -> u32 {
        self.position.line()
    }

    pub fn column(&self) -> u32 {
        self.position.column()
    }
}

impl Display for Token {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Identifier => write!(fmt, "identifier `{}`", self.lexeme),
            TokenKind::Number => write!(fmt, "number `{}`", self.lexeme),
            TokenKind::StringLiteral => write!(fmt, "string literal {}", self.lexeme),
            TokenKind::Eof => fmt.write_str("end of input"),
            kind if kind.is_keyword() => write!(fmt, "keyword {}", kind),
            kind => kind.fmt(fmt),
        }
    }
}

/// Máquina de estados para análisis léxico.
///
/// Un lexer puede encontrarse en uno de diversos estados. La
/// salida del lexer, así como su siguiente estado, se define
/// a partir de tanto su estado actual como el siguiente carácter
/// encontrado en la entrada.
pub struct Lexer<'a> {
    source: Peekable<Chars<'a>>,
    state: State,
    lexeme: String,
    literal: Option<Literal>,
    start: Position,
    next: Position,
    finished: bool,
}

/// Posibles estados del lexer.
enum State {
    /// Estado que ocurre antes de encontrar el inicio de un token.
    Start,

    /// Estado de completitud; siempre emite el token incluido
    /// y pasa a [`State::Start`].
    Complete(TokenKind),

    /// Se encontró uno de `=`, `!`, `<` o `>`.
    ///
    /// Si sigue `=` se forma el operador de dos caracteres.
    Relational(char),

    /// Dentro de una cadena, acumulando su contenido.
    Text(String),

    /// Parte entera de una constante numérica.
    Integer,

    /// Parte decimal de una constante numérica, tras el `.`.
    Fraction,

    /// Término que puede ser un identificador o una palabra clave.
    Word,
}

impl<'a> Lexer<'a> {
    /// Crea un lexer en estado inicial a partir de un texto fuente.
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source: source.chars().peekable(),
            state: State::Start,
            lexeme: String::new(),
            literal: None,
            start: Position::default(),
            next: Position::default(),
            finished: false,
        }
    }

    /// Reduce la entrada a una secuencia completa de tokens,
    /// terminada en [`TokenKind::Eof`], o al primer error encontrado.
    pub fn try_exhaustive(self) -> Result<Vec<Token>, Located<LexerError>> {
        self.collect()
    }

    /// Intenta construir un siguiente token.
    ///
    /// Retorna `Ok(None)` al agotarse la entrada.
    fn lex(&mut self) -> Result<Option<TokenKind>, LexerError> {
        use {State::*, TokenKind::*};

        let kind = loop {
            let next_char = self.source.peek().copied();

            // La posición de origen se mueve junto a la posición
            // siguiente siempre que no se haya encontrado una
            // frontera de token
            if let Start = self.state {
                self.start = self.next;
                self.lexeme.clear();
            }

            // Switch table principal, determina cambios de estado
            // y de salida del lexer a partir de combinaciones del
            // estado actual y el siguiente carácter
            match (&mut self.state, next_char) {
                // Tokens triviales
                (Start, None) => return Ok(None),
                (Start, Some('(')) => self.state = Complete(OpenParen),
                (Start, Some(')')) => self.state = Complete(CloseParen),
                (Start, Some('{')) => self.state = Complete(OpenCurly),
                (Start, Some('}')) => self.state = Complete(CloseCurly),
                (Start, Some('[')) => self.state = Complete(OpenSquare),
                (Start, Some(']')) => self.state = Complete(CloseSquare),
                (Start, Some(';')) => self.state = Complete(Semicolon),
                (Start, Some(',')) => self.state = Complete(Comma),
                (Start, Some('+')) => self.state = Complete(Plus),
                (Start, Some('-')) => self.state = Complete(Minus),
                (Start, Some('*')) => self.state = Complete(Times),
                (Start, Some('/')) => self.state = Complete(Divide),

                // Operadores que pueden extenderse con `=`
                (Start, Some(c @ ('=' | '!' | '<' | '>'))) => self.state = Relational(c),

                (Start, Some('"')) => self.state = Text(String::new()),

                // Identificadores, palabras clave y constantes numéricas
                (Start, Some(c)) if c.is_ascii_digit() => self.state = Integer,
                (Start, Some(c)) if is_word_start(c) => self.state = Word,

                // Espacios en blanco y caracteres inesperados
                (Start, Some(' ' | '\t' | '\r' | '\n')) => (),
                (Start, Some(c)) => break Err(LexerError::BadChar(c)),

                // Emisión retardada de tokens cualesquiera
                (Complete(kind), _) => break Ok(*kind),

                (Relational(c), Some('=')) => {
                    let kind = match *c {
                        '=' => Equal,
                        '!' => NotEqual,
                        '<' => LessOrEqual,
                        _ => GreaterOrEqual,
                    };

                    self.state = Complete(kind);
                }

                // `!` no forma un operador por sí solo
                (Relational(c), _) => {
                    break match *c {
                        '=' => Ok(Assign),
                        '<' => Ok(Less),
                        '>' => Ok(Greater),
                        other => Err(LexerError::BadChar(other)),
                    }
                }

                // Las cadenas terminan únicamente con otra comilla
                (Text(_), None) => break Err(LexerError::UnterminatedString),
                (Text(text), Some('"')) => {
                    self.literal = Some(Literal::Text(mem::take(text)));
                    self.state = Complete(StringLiteral);
                }

                (Text(text), Some(c)) => text.push(c),

                // El `.` solo pertenece a la constante si le sigue un dígito
                (Integer, Some(c)) if c.is_ascii_digit() => (),
                (Integer, Some('.')) if digit_follows(&self.source) => self.state = Fraction,
                (Fraction, Some(c)) if c.is_ascii_digit() => (),

                // Si sigue algo que no es un dígito, la constante ha terminado
                (Integer | Fraction, _) => {
                    break match self.lexeme.parse::<f64>() {
                        Ok(value) => {
                            self.literal = Some(Literal::Number(value));
                            Ok(Number)
                        }

                        Err(_) => Err(LexerError::BadNumber(self.lexeme.clone())),
                    }
                }

                // Extensión de términos
                (Word, Some(c)) if is_word_char(c) => (),

                // Si sigue algo que no puede formar parte del término, ha terminado
                (Word, _) => {
                    let kind = TokenKind::keyword(&self.lexeme).unwrap_or(Identifier);
                    match kind {
                        True => self.literal = Some(Literal::Bool(true)),
                        False => self.literal = Some(Literal::Bool(false)),
                        _ => (),
                    }

                    break Ok(kind);
                }
            }

            // Si no hubo `break`, aquí se consume el carácter que
            // se observó con lookahead anteriormente
            if let Some(c) = self.source.next() {
                self.lexeme.push(c);
                self.next = self.next.after(c);
            }
        };

        kind.map(Some)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, Located<LexerError>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.lex() {
            Ok(Some(kind)) => {
                self.state = State::Start;

                let token = Token {
                    kind,
                    lexeme: mem::take(&mut self.lexeme),
                    literal: self.literal.take(),
                    position: self.start,
                };

                trace!(kind = ?token.kind, lexeme = %token.lexeme, at = %token.position, "token");
                Some(Ok(token))
            }

            Ok(None) => {
                self.finished = true;
                Some(Ok(Token::new(TokenKind::Eof, "", None, self.next)))
            }

            Err(error) => {
                self.finished = true;
                Some(Err(Located::at(error, self.start)))
            }
        }
    }
}

/// Escanea un texto fuente completo.
///
/// La secuencia resultante siempre termina en exactamente un
/// token [`TokenKind::Eof`].
pub fn scan_all(source: &str) -> Result<Vec<Token>, Located<LexerError>> {
    let tokens = Lexer::new(source).try_exhaustive()?;
    debug!(tokens = tokens.len(), "scanned source");

    Ok(tokens)
}

/// Determina si un carácter puede iniciar un término.
fn is_word_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Determina si un carácter puede pertenecer a un término.
fn is_word_char(c: char) -> bool {
    is_word_start(c) || c.is_ascii_digit()
}

/// Observa el carácter posterior al siguiente sin consumir nada.
fn digit_follows(source: &Peekable<Chars<'_>>) -> bool {
    matches!(source.clone().nth(1), Some(c) if c.is_ascii_digit())
}
