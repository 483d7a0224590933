// File: src/main.rs
//
// Main entry point for the Soutk programming language interpreter.
// Handles command-line argument parsing and dispatches to the appropriate
// subcommand (run, repl, or examples).

use clap::{Parser as ClapParser, Subcommand};
use soutk::interpreter::Interpreter;
use soutk::repl::Repl;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(ClapParser)]
#[command(
    name = "soutk",
    about = "Soutk: a small spellcasting-flavored scripting language",
    version = env!("CARGO_PKG_VERSION"),
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
#[command(arg_required_else_help = true)]
enum Commands {
    /// Run a Soutk script file
    Run {
        /// Path to the .stk file
        file: PathBuf,
    },

    /// Launch the interactive Soutk REPL
    Repl,

    /// Print a few example programs to get started
    Examples,
}

const EXAMPLES: &str = r#"// hello.stk
summon name = "wanderer"
chant "Greetings, " + name + "!"

// countdown.stk
stride i from 1 to 3: {
    chant i
}

// spellbook.stk
spell double(x): {
    return x * 2
}
summon answer = double(21)
chant answer

// warded.stk
ward: {
    chant 1 / 0
}
rescue problem: {
    chant "caught: " + problem
}
"#;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { file } => {
            let source = match fs::read_to_string(&file) {
                Ok(source) => source,
                Err(e) => {
                    eprintln!("Could not read '{}': {}", file.display(), e);
                    return ExitCode::FAILURE;
                }
            };
            let mut interpreter = Interpreter::new();
            interpreter.source_file = Some(file.display().to_string());
            if let Err(e) = interpreter.run(&source) {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }

        Commands::Repl => match Repl::new() {
            Ok(mut repl) => {
                if let Err(e) = repl.run() {
                    eprintln!("REPL error: {}", e);
                    return ExitCode::FAILURE;
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Could not start REPL: {}", e);
                ExitCode::FAILURE
            }
        },

        Commands::Examples => {
            println!("{}", EXAMPLES);
            ExitCode::SUCCESS
        }
    }
}
