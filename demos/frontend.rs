use minitac::{analyze, error::Diagnostics, generate, parse, scan_all, source::Source};

use std::io::Read;

fn main() -> std::io::Result<()> {
    let mut text = String::new();
    std::io::stdin().lock().read_to_string(&mut text)?;

    let source = Source::new("<stdin>", &text);

    let diagnostics = match scan_all(&text) {
        Err(error) => Diagnostics::from(error).kind("Lexical error").with_source(source),

        Ok(tokens) => {
            print!("Tokens: {:#?}\n\n", tokens);

            match parse(&tokens) {
                Err(error) => Diagnostics::from(error).kind("Syntax error").with_source(source),

                Ok(program) => {
                    print!("Ast:\n{}\n", program);

                    let errors = analyze(&program);
                    if errors.is_empty() {
                        for instruction in generate(&program) {
                            println!("{}", instruction);
                        }

                        Diagnostics::default()
                    } else {
                        Diagnostics::from(errors).kind("Semantic error")
                    }
                }
            }
        }
    };

    if !diagnostics.is_empty() {
        eprint!("{}", diagnostics);
    }

    Ok(())
}
