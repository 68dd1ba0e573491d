use minitac::lex::Lexer;

use std::io::Read;

fn main() -> std::io::Result<()> {
    let mut text = String::new();
    std::io::stdin().lock().read_to_string(&mut text)?;

    match Lexer::new(&text).try_exhaustive() {
        Err(error) => eprintln!("{:#?}", error),
        Ok(tokens) => {
            println!("Tokens: {:#?}", tokens);
            println!();
            println!("{:#?}", minitac::parse(&tokens));
        }
    }

    Ok(())
}
