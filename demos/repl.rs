use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt};
use schemer::{Interpreter, SchemeError};

async fn query(stdout: &mut io::Stdout, lines: &mut io::Lines<io::BufReader<io::Stdin>>, prompt: &str) -> io::Result<Option<String>> {
    stdout.write_all(prompt.as_bytes()).await?;
    stdout.flush().await?;
    lines.next_line().await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let interpreter = Interpreter::new()?;
    let mut lines = io::BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    // Lines accumulate until the reader stops asking for more input
    let mut pending = String::new();

    while let Some(line) = query(&mut stdout, &mut lines, if pending.is_empty() { "> " } else { "... " }).await? {
        pending.push_str(&line);
        pending.push('\n');

        match interpreter.eval_str(&pending) {
            Err(SchemeError::Incomplete) => continue,
            Ok(value) => println!("{}", value),
            Err(err) => println!("Error: {}", err),
        }
        pending.clear();
    }

    Ok(())
}
