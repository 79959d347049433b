use std::fs;
use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::Parser as ClapParser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use rlox::error::LoxError;
use rlox::interpreter::Interpreter;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Script to execute; starts the interactive prompt when omitted
    script: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Cli = match Cli::try_parse() {
        Ok(args) => args,

        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{}", e);
            return Ok(());
        }

        Err(_) => {
            eprintln!("Usage: rlox [script]");
            process::exit(64);
        }
    };

    match args.script {
        Some(path) => run_file(&path),

        None => run_prompt(),
    }
}

fn run_file(path: &PathBuf) -> anyhow::Result<()> {
    let source: String = fs::read_to_string(path)?;

    let mut interpreter = Interpreter::new();

    if let Err(errors) = interpreter.run(&source) {
        let mut had_runtime_error = false;

        for e in &errors {
            eprintln!("{}", e);

            if matches!(e, LoxError::Runtime { .. }) {
                had_runtime_error = true;
            }
        }

        if had_runtime_error {
            process::exit(70);
        }

        process::exit(65);
    }

    Ok(())
}

fn run_prompt() -> anyhow::Result<()> {
    let mut editor = DefaultEditor::new()?;
    let mut interpreter = Interpreter::new();

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());

                // Diagnostics never terminate the session.
                if let Err(errors) = interpreter.run(&line) {
                    for e in &errors {
                        eprintln!("{}", e);
                    }
                }
            }

            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => break,

            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
