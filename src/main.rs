//! Punto de entrada ("driver").
//!
//! Este módulo orquesta las diferentes fases del proceso de
//! compilación y expone una CLI.

use anyhow::{self, bail, Context};
use bitflags::bitflags;
use clap::{crate_version, Arg, Command};
use minitac::Compilation;
use tracing::Level;

use std::{
    fs::{self, File},
    io::{self, Read, Write},
};

bitflags! {
    /// Artefactos a escribir en la salida.
    struct Emit: u32 {
        /// Secuencia de tokens, uno por línea.
        const TOKENS = 0x01;

        /// Volcado indentado del AST.
        const AST = 0x02;

        /// Código de tres direcciones.
        const CODE = 0x04;
    }
}

fn main() -> anyhow::Result<()> {
    // Parsing de CLI
    let args = Command::new("minitac")
        .version(crate_version!())
        .about("Compiles the teaching language to three-address code")
        .arg(
            Arg::new("input")
                .value_name("FILE")
                .default_value("-")
                .help("Source file ('-' for stdin)"),
        )
        .arg(
            Arg::new("emit")
                .long("emit")
                .value_name("ARTIFACT")
                .takes_value(true)
                .multiple_occurrences(true)
                .use_value_delimiter(true)
                .possible_values(["tokens", "ast", "code"])
                .default_value("code")
                .help("Artifacts to print"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .takes_value(true)
                .value_name("FILE")
                .default_value("-")
                .help("Output file ('-' for stdout)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .multiple_occurrences(true)
                .help("Increase log verbosity"),
        )
        .get_matches();

    let level = match args.occurrences_of("verbose") {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    // Se extraen argumentos necesarios
    let input = args.value_of("input").unwrap_or("-");
    let output = args.value_of("output").unwrap_or("-");

    let mut emit = Emit::empty();
    for artifact in args.values_of("emit").into_iter().flatten() {
        emit |= match artifact {
            "tokens" => Emit::TOKENS,
            "ast" => Emit::AST,
            _ => Emit::CODE,
        };
    }

    let (name, text) = match input {
        "-" => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read from stdin")?;

            ("<stdin>", text)
        }

        path => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to open for reading: {}", path))?;

            (path, text)
        }
    };

    let compilation = match minitac::compile(name, &text) {
        Ok(compilation) => compilation,
        Err(diagnostics) => {
            eprint!("{}", diagnostics);
            bail!("Could not compile {}", name);
        }
    };

    match output {
        // Salida a stdout
        "-" => {
            let stdout = io::stdout();
            write_artifacts(&compilation, emit, &mut stdout.lock())
                .context("Failed to write to stdout")?;
        }

        // Salida a archivo
        path => {
            let mut file = File::create(path)
                .with_context(|| format!("Failed to open for writing: {}", path))?;

            write_artifacts(&compilation, emit, &mut file)
                .with_context(|| format!("Failed to write to file: {}", path))?;
        }
    }

    Ok(())
}

fn write_artifacts<W: Write>(compilation: &Compilation, emit: Emit, output: &mut W) -> io::Result<()> {
    let headers = emit.bits().count_ones() > 1;

    if emit.contains(Emit::TOKENS) {
        if headers {
            writeln!(output, "# tokens")?;
        }

        for token in &compilation.tokens {
            write!(output, "{}\t{:?}\t{}", token.position(), token.kind(), token.lexeme())?;
            match token.literal() {
                Some(literal) => writeln!(output, "\t{}", literal)?,
                None => writeln!(output)?,
            }
        }
    }

    if emit.contains(Emit::AST) {
        if headers {
            writeln!(output, "# ast")?;
        }

        write!(output, "{}", compilation.program)?;
    }

    if emit.contains(Emit::CODE) {
        if headers {
            writeln!(output, "# code")?;
        }

        for instruction in &compilation.code {
            writeln!(output, "{}", instruction)?;
        }
    }

    output.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(source: &str, emit: Emit) -> String {
        let compilation = minitac::compile("<test>", source).unwrap();
        let mut output = Vec::new();
        write_artifacts(&compilation, emit, &mut output).unwrap();

        String::from_utf8(output).unwrap()
    }

    #[test]
    fn single_artifact_has_no_header() {
        assert_eq!(render("int x = 4;", Emit::CODE), "x = 4\n");
    }

    #[test]
    fn tokens_carry_positions_and_literals() {
        let output = render("int x;\nx = 4;", Emit::TOKENS);
        let lines: Vec<_> = output.lines().collect();

        assert_eq!(lines[0], "1:1\tInt\tint");
        assert_eq!(lines[5], "2:5\tNumber\t4\t4");
        assert_eq!(lines.last(), Some(&"2:7\tEof\t"));
    }

    #[test]
    fn combined_artifacts_are_headed_in_order() {
        let output = render("int x = 4;", Emit::TOKENS | Emit::CODE);

        assert!(output.starts_with("# tokens\n1:1\tInt\tint\n"));
        assert!(output.ends_with("# code\nx = 4\n"));
        assert!(!output.contains("# ast"));

        let output = render("int x = 4;", Emit::all());
        let tokens = output.find("# tokens").unwrap();
        let ast = output.find("# ast\nProgram\n").unwrap();
        let code = output.find("# code\n").unwrap();
        assert!(tokens < ast && ast < code);
    }
}
