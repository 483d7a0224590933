// File: src/interpreter/host.rs
//
// Host I/O capability boundary. The core engine never touches stdin, stdout,
// or the filesystem directly; everything flows through a HostIo handed to
// the interpreter at construction time. Tests swap in a recording host to
// capture output and script input lines.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// The capabilities Soutk borrows from its host: read a line, read a file,
/// write a file, print.
pub trait HostIo {
    /// Blocking read of one line. Returns the empty string on end-of-input
    /// or interrupt rather than failing.
    fn read_line(&self, prompt: &str) -> String;
    fn read_file(&self, path: &str) -> io::Result<String>;
    fn write_file(&self, path: &str, data: &str) -> io::Result<()>;
    fn append_file(&self, path: &str, data: &str) -> io::Result<()>;
    /// Print one line to the host's output stream.
    fn print(&self, line: &str);
}

/// Production host: real stdin/stdout and the process filesystem.
pub struct StdHost;

impl HostIo for StdHost {
    fn read_line(&self, prompt: &str) -> String {
        if !prompt.is_empty() {
            print!("{}", prompt);
            let _ = io::stdout().flush();
        }
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => String::new(),
            Ok(_) => line.trim().to_string(),
        }
    }

    fn read_file(&self, path: &str) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write_file(&self, path: &str, data: &str) -> io::Result<()> {
        std::fs::write(path, data)
    }

    fn append_file(&self, path: &str, data: &str) -> io::Result<()> {
        let mut file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(data.as_bytes())
    }

    fn print(&self, line: &str) {
        println!("{}", line);
    }
}

/// In-memory host for tests: scripted input lines, captured output, and a
/// real filesystem passthrough for file operations.
pub struct CapturingHost {
    pub input: RefCell<VecDeque<String>>,
    pub output: RefCell<Vec<String>>,
}

impl CapturingHost {
    pub fn new() -> Self {
        CapturingHost { input: RefCell::new(VecDeque::new()), output: RefCell::new(Vec::new()) }
    }

    pub fn with_input(lines: &[&str]) -> Self {
        let host = Self::new();
        host.input.borrow_mut().extend(lines.iter().map(|s| s.to_string()));
        host
    }

    pub fn output_lines(&self) -> Vec<String> {
        self.output.borrow().clone()
    }
}

impl Default for CapturingHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostIo for CapturingHost {
    fn read_line(&self, _prompt: &str) -> String {
        self.input.borrow_mut().pop_front().unwrap_or_default()
    }

    fn read_file(&self, path: &str) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write_file(&self, path: &str, data: &str) -> io::Result<()> {
        std::fs::write(path, data)
    }

    fn append_file(&self, path: &str, data: &str) -> io::Result<()> {
        let mut file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(data.as_bytes())
    }

    fn print(&self, line: &str) {
        self.output.borrow_mut().push(line.to_string());
    }
}
