use crate::interpreter::{Error, Interpreter};
use ansi_term::Colour::Red;
use linefeed::{DefaultTerminal, Interface, ReadResult, Terminal};
use std::path::PathBuf;

pub fn setup() -> std::io::Result<Interface<DefaultTerminal>> {
    let interface = linefeed::Interface::new("bootstrap-scheme")?;
    interface.set_prompt("> ")?;
    if let Some(path) = history_path() {
        interface.load_history(path).ok();
    };
    Ok(interface)
}

fn history_path() -> Option<PathBuf> {
    match dirs::data_dir() {
        Some(mut path) => {
            path.push(".bootstrap_scheme_history");
            Some(path)
        }
        None => None,
    }
}

pub fn save_history<T: Terminal>(interface: &Interface<T>) -> std::io::Result<()> {
    match history_path() {
        Some(path) => interface.save_history(path),
        None => Ok(()),
    }
}

/// One expression per line; an error ends the expression, not the session.
pub fn repl<T: Terminal>(interface: &Interface<T>, interpreter: &mut Interpreter) {
    loop {
        match interface.read_line() {
            Ok(ReadResult::Eof) => break,
            Ok(ReadResult::Signal(sig)) => {
                writeln!(interface, "Received signal {:?}", sig).ok();
            }
            Ok(ReadResult::Input(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                interface.add_history_unique(line.clone());
                match interpreter.rep(&line) {
                    Ok(output) => {
                        writeln!(interface, "{}", output).ok();
                    }
                    Err(error) => {
                        writeln!(interface, "{}", render_error(&error)).ok();
                    }
                }
            }
            Err(e) => {
                writeln!(interface, "Error: {}", e).ok();
                break;
            }
        }
    }
}

fn render_error(error: &Error) -> String {
    let text = error.to_string();
    if atty::is(atty::Stream::Stdout) {
        Red.paint(text).to_string()
    } else {
        text
    }
}

pub fn run(interpreter: &mut Interpreter) -> std::io::Result<()> {
    let interface = setup()?;
    println!("Welcome to Bootstrap Scheme. Use ctrl-d to exit.");
    repl(&interface, interpreter);
    save_history(&interface)
}
