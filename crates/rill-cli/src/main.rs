use std::io::{self, BufRead, Write};
use std::{env, fs, process::ExitCode};

use rill::diagnostics;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    match args.get(1) {
        Some(file_path) => run_file(file_path),
        None => run_repl(),
    }
}

fn run_file(file_path: &str) -> ExitCode {
    let source = match read_file(file_path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    match rill::run(&source) {
        Ok(value) => {
            println!("{value}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", diagnostics::render(&source, &err));
            ExitCode::FAILURE
        }
    }
}

fn run_repl() -> ExitCode {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("rill> ");
        if stdout.flush().is_err() {
            return ExitCode::FAILURE;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => return ExitCode::SUCCESS, // EOF
            Ok(_) => {}
            Err(err) => {
                eprintln!("error reading stdin: {err}");
                return ExitCode::FAILURE;
            }
        }

        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        match rill::run(line) {
            Ok(value) => println!("{value}"),
            Err(err) => eprintln!("{}", diagnostics::render(line, &err)),
        }
    }
}

fn read_file(file_path: &str) -> Result<String, String> {
    match fs::metadata(file_path) {
        Ok(metadata) => {
            if !metadata.is_file() {
                return Err(format!("{file_path} is not a file"));
            }
        }
        Err(err) => return Err(format!("reading {file_path}: {err}")),
    }
    fs::read_to_string(file_path).map_err(|err| format!("reading {file_path}: {err}"))
}
