use std::fs;
use std::path::Path;
use std::process::ExitCode;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use slang::{Slang, SlangError};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut slang = Slang::new();

    let result = match args.len() {
        0 => run_repl(&mut slang),
        1 => run_file(&mut slang, Path::new(&args[0])),
        _ => {
            eprintln!("Usage: slang [script]");
            return ExitCode::from(64);
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(65)
        }
    }
}

fn run_file(slang: &mut Slang, path: &Path) -> Result<ExitCode, SlangError> {
    let source = fs::read_to_string(path)?;

    let errors = slang.run_script(&source, std::io::stdout());
    for error in &errors {
        eprintln!("{error}");
    }

    if errors.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(65))
    }
}

fn run_repl(slang: &mut Slang) -> Result<ExitCode, SlangError> {
    let mut rl = DefaultEditor::new().expect("Failed to start the REPL");

    loop {
        match rl.readline("slang> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                for error in slang.run_line(&line, std::io::stdout()) {
                    eprintln!("{error}");
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C - exit
                break;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                break;
            }
            Err(err) => {
                eprintln!("REPL read failed: {err:?}");
                break;
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
