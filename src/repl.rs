// File: src/repl.rs
//
// Interactive REPL (Read-Eval-Print Loop) for the Soutk programming language.
// Provides an interactive shell for executing Soutk code with:
// - Multi-line input support for spells, loops, and enchantments
// - Command history with up/down arrow navigation
// - Special commands (:help, :clear, :quit, :vars)
// - Persistent interpreter state across inputs

use crate::interpreter::Interpreter;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// REPL session that maintains interpreter state and handles user interaction
pub struct Repl {
    interpreter: Interpreter,
    editor: DefaultEditor,
}

impl Repl {
    /// Creates a new REPL session with a fresh interpreter
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let editor = DefaultEditor::new()?;
        Ok(Repl { interpreter: Interpreter::new(), editor })
    }

    fn show_banner(&self) {
        println!("{}", format!("Soutk {} - Interactive Shell", env!("CARGO_PKG_VERSION")).bright_cyan());
        println!(
            "  {} Use {} for commands or {} to leave",
            "Welcome!".bright_green(),
            ":help".bright_yellow(),
            ":quit".bright_yellow()
        );
        println!("  {} Blocks continue until their braces balance", "Tip:".bright_magenta());
        println!();
    }

    /// Starts the REPL loop
    pub fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.show_banner();

        let mut buffer = String::new();

        loop {
            let prompt = if buffer.is_empty() {
                "soutk> ".bright_green().to_string()
            } else {
                "....>  ".bright_blue().to_string()
            };

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let _ = self.editor.add_history_entry(line.as_str());

                    if buffer.is_empty() && line.trim().starts_with(':') {
                        if self.handle_command(line.trim()) {
                            continue;
                        }
                        break;
                    }

                    buffer.push_str(&line);
                    buffer.push('\n');

                    // Keep reading while a block is still open
                    if brace_depth(&buffer) > 0 {
                        continue;
                    }

                    let source = std::mem::take(&mut buffer);
                    if source.trim().is_empty() {
                        continue;
                    }
                    if let Err(e) = self.interpreter.run(&source) {
                        eprintln!("{}", e);
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl-C abandons the pending input
                    buffer.clear();
                }
                Err(ReadlineError::Eof) => break,
                Err(e) => {
                    eprintln!("Input error: {}", e);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handles a `:command`. Returns false when the REPL should exit.
    fn handle_command(&mut self, command: &str) -> bool {
        match command {
            ":help" => {
                println!("  {}  show this help", ":help".bright_yellow());
                println!("  {}  list defined variables", ":vars".bright_yellow());
                println!("  {} reset the interpreter state", ":clear".bright_yellow());
                println!("  {}  leave the shell", ":quit".bright_yellow());
                true
            }
            ":vars" => {
                let mut names: Vec<String> = self
                    .interpreter
                    .env
                    .visible_names()
                    .map(|name| name.to_string())
                    .collect();
                names.sort();
                names.dedup();
                if names.is_empty() {
                    println!("(no variables defined)");
                } else {
                    for name in names {
                        if let Some(value) = self.interpreter.env.get(&name) {
                            println!("  {} = {}", name.bright_cyan(), value);
                        }
                    }
                }
                true
            }
            ":clear" => {
                self.interpreter = Interpreter::new();
                println!("State cleared.");
                true
            }
            ":quit" | ":exit" => false,
            other => {
                println!("Unknown command '{}'. Try {}.", other, ":help".bright_yellow());
                true
            }
        }
    }
}

/// Net brace depth of the pending input, ignoring braces inside string
/// literals and // comments.
fn brace_depth(source: &str) -> i32 {
    let mut depth = 0;
    for line in source.lines() {
        let mut chars = line.chars().peekable();
        let mut in_string: Option<char> = None;
        while let Some(c) = chars.next() {
            match in_string {
                Some(quote) => {
                    if c == quote {
                        in_string = None;
                    }
                }
                None => match c {
                    '"' | '\'' => in_string = Some(c),
                    '/' if chars.peek() == Some(&'/') => break,
                    '{' => depth += 1,
                    '}' => depth -= 1,
                    _ => {}
                },
            }
        }
    }
    depth
}
