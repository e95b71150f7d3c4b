use std::{
    io::{stdin, stdout, Write},
    path::PathBuf,
    process::ExitCode,
};

use clap::Parser;

use interpreter::{InterpretError, Interpreter};

#[derive(clap::Parser)]
struct Args {
    /// Script to run. Starts a prompt when omitted.
    file: Option<PathBuf>,
}

fn run_file(path: PathBuf, interpreter: &mut Interpreter) -> anyhow::Result<ExitCode> {
    let source = std::fs::read_to_string(path)?;
    Ok(match interpreter.run_source(&source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            match e {
                InterpretError::CompileError(_) => ExitCode::from(65),
                InterpretError::RuntimeError(_) => ExitCode::from(70),
            }
        }
    })
}

fn run_prompt(interpreter: &mut Interpreter) -> anyhow::Result<ExitCode> {
    loop {
        print!("> ");
        stdout().flush()?;
        let mut line = String::new();
        if stdin().read_line(&mut line)? == 0 {
            return Ok(ExitCode::SUCCESS);
        }
        if let Err(e) = interpreter.run_source(&line) {
            report(&e);
        }
    }
}

fn report(error: &InterpretError) {
    match error {
        InterpretError::CompileError(e) => eprintln!("{e}"),
        InterpretError::RuntimeError(e) => match e.line() {
            Some(line) => eprintln!("{e}\n[line {line}]"),
            None => eprintln!("{e}"),
        },
    }
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();
    let args = Args::parse();

    let mut interpreter = Interpreter::new(stdout());
    log::debug!("Interpreter ready");

    match args.file {
        Some(file) => run_file(file, &mut interpreter),
        None => run_prompt(&mut interpreter),
    }
}
