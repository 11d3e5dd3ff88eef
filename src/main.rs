use std::io::{self, BufRead, Write};

use anyhow::Context;
use log::debug;
use schemer::{Config, Expr, Interpreter, SchemeError, Strategy};

/// Environment variable naming a JSON configuration file.
const CONFIG_VARIABLE: &str = "SCHEMER_CONFIG";

fn load_config() -> anyhow::Result<Config> {
    match std::env::var_os(CONFIG_VARIABLE) {
        Some(path) => Config::load(&path).with_context(|| format!("reading configuration from {:?}", path)),
        None => Ok(Config::default()),
    }
}

/// Reads lines until they hold complete datums, then evaluates them.
fn repl(interpreter: &Interpreter) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut buffer = String::new();

    loop {
        stdout.write_all(if buffer.is_empty() { b"> " } else { b"... " })?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 { return Ok(()); }
        buffer.push_str(&line);

        match interpreter.eval_str(&buffer) {
            Err(SchemeError::Incomplete) => continue,
            Ok(Expr::Void) => {}
            Ok(value) => println!("{}", value),
            Err(error) => println!("Error: {}", error),
        }
        buffer.clear();
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut config = load_config()?;
    let mut files = vec![];
    for argument in std::env::args().skip(1) {
        match argument.as_str() {
            "--recursive" => config.strategy = Strategy::Recursive,
            "--stack" => config.strategy = Strategy::Stack,
            _ => files.push(argument),
        }
    }

    let interpreter = Interpreter::with_config(config)?;
    if files.is_empty() {
        return repl(&interpreter);
    }

    for file in files {
        debug!("Running {}", file);
        let source = std::fs::read_to_string(&file).with_context(|| format!("reading {}", file))?;
        interpreter.eval_str(&source).with_context(|| format!("evaluating {}", file))?;
    }

    Ok(())
}
