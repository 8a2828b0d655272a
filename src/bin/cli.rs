//! PlainDB - interactive shell
//!
//! ```bash
//! # Interactive session over ./data
//! plaindb --data-dir ./data
//!
//! # Run one statement
//! plaindb -c "USE shop; SELECT * FROM items;"
//!
//! # Run a script, printing JSON
//! plaindb -f setup.sql -o json
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use plaindb::{Config, OutputFormat, QueryResult, Session};

const PROMPT: &str = "plaindb> ";
const CONTINUATION_PROMPT: &str = "    ...> ";

/// PlainDB command-line shell
#[derive(Parser, Debug)]
#[command(
    name = "plaindb",
    author = "PlainDB Team",
    version,
    about = "Shell for PlainDB, a relational store kept in plain text files"
)]
struct Args {
    /// Directory holding the databases
    #[arg(short = 'd', long, env = "PLAINDB_DATA_DIR", value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Execute the given statements and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Execute statements from file and exit
    #[arg(short = 'f', long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, value_enum)]
    output: Option<OutputFormatArg>,

    /// Skip fsync when replacing table files
    #[arg(long)]
    no_sync: bool,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Configuration file path (JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

/// Output format argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    /// Header line and rows, as stored in table files
    Text,
    /// One JSON object per statement
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Text => OutputFormat::Text,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(&args)?;
    debug!(?config, "loaded configuration");
    let mut shell = Shell::new(config);

    if let Some(command) = &args.command {
        shell.run_source(command.as_bytes(), true)
    } else if let Some(path) = &args.file {
        let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
        shell.run_source(BufReader::new(file), false)
    } else if io::stdin().is_terminal() {
        shell.run_interactive()
    } else {
        shell.run_source(io::stdin().lock(), false)
    }
}

/// Logs go to stderr so query output on stdout stays clean
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("plaindb=debug")
    } else {
        EnvFilter::try_from_env("PLAINDB_LOG").unwrap_or_else(|_| EnvFilter::new("plaindb=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    // Command line overrides the file
    if let Some(data_dir) = &args.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(output) = args.output {
        config.output_format = output.into();
    }
    if args.no_sync {
        config.sync_writes = false;
    }

    Ok(config)
}

/// What a line of input asked for
#[derive(Debug, PartialEq)]
enum Input {
    /// Complete statements, in order
    Statements(Vec<String>),
    /// `.exit` outside a statement
    Exit,
}

/// Collects lines until statements are terminated by `;`
#[derive(Debug, Default)]
struct StatementBuffer {
    pending: String,
    in_string: bool,
}

impl StatementBuffer {
    fn is_empty(&self) -> bool {
        self.pending.trim().is_empty()
    }

    fn push_line(&mut self, line: &str) -> Input {
        let trimmed = line.trim();
        if self.is_empty() {
            if trimmed == ".exit" || trimmed == ".quit" {
                return Input::Exit;
            }
            if trimmed.starts_with("--") {
                return Input::Statements(Vec::new());
            }
        }

        let mut statements = Vec::new();
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\'' => self.in_string = !self.in_string,
                // rest of the line is a comment
                '-' if !self.in_string && chars.peek() == Some(&'-') => break,
                ';' if !self.in_string => {
                    self.pending.push(';');
                    let statement = std::mem::take(&mut self.pending);
                    if statement.trim() != ";" {
                        statements.push(statement.trim().to_string());
                    }
                    continue;
                }
                _ => {}
            }
            self.pending.push(c);
        }
        self.pending.push('\n');
        Input::Statements(statements)
    }

    /// Whatever is left once input ends
    fn finish(&mut self) -> Option<String> {
        self.in_string = false;
        let rest = std::mem::take(&mut self.pending);
        let rest = rest.trim();
        (!rest.is_empty()).then(|| rest.to_string())
    }
}

struct Shell {
    session: Session,
    output: OutputFormat,
    history_file: Option<PathBuf>,
}

impl Shell {
    fn new(config: Config) -> Self {
        Self {
            session: Session::from_config(&config),
            output: config.output_format,
            history_file: config.history_file,
        }
    }

    fn print(&self, result: &QueryResult) -> Result<()> {
        match self.output {
            OutputFormat::Text => {
                let rendered = result.to_string();
                if !rendered.is_empty() {
                    println!("{}", rendered);
                }
            }
            OutputFormat::Json => println!("{}", serde_json::to_string(result)?),
        }
        Ok(())
    }

    /// Run one statement and print its outcome. Returns whether it succeeded.
    fn execute(&mut self, sql: &str) -> Result<bool> {
        match self.session.execute(sql) {
            Ok(result) => {
                self.print(&result)?;
                Ok(true)
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                Ok(false)
            }
        }
    }

    fn execute_all(&mut self, statements: Vec<String>) -> Result<usize> {
        let mut failed = 0;
        for sql in statements {
            if !self.execute(&sql)? {
                failed += 1;
            }
        }
        Ok(failed)
    }

    /// Run statements from a non-interactive source. Unless `stop_on_error`
    /// is set, later lines still run after a failed statement. Any failure
    /// makes the run fail.
    fn run_source(&mut self, reader: impl BufRead, stop_on_error: bool) -> Result<()> {
        let mut buffer = StatementBuffer::default();
        let mut failed = 0;

        for line in reader.lines() {
            let line = line.context("failed to read input")?;
            match buffer.push_line(&line) {
                Input::Statements(statements) => failed += self.execute_all(statements)?,
                Input::Exit => break,
            }
            if stop_on_error && failed > 0 {
                break;
            }
        }
        if let Some(rest) = buffer.finish() {
            failed += self.execute_all(vec![rest])?;
        }

        if failed > 0 {
            bail!("{} statement(s) failed", failed);
        }
        Ok(())
    }

    fn run_interactive(&mut self) -> Result<()> {
        let mut editor = DefaultEditor::new()?;
        if let Some(path) = &self.history_file {
            if path.exists() {
                editor.load_history(path).ok();
            }
        }

        println!("PlainDB v{}", env!("CARGO_PKG_VERSION"));
        println!("End statements with ';'. Type .exit to quit.\n");

        let mut buffer = StatementBuffer::default();
        loop {
            let prompt = if buffer.is_empty() {
                PROMPT
            } else {
                CONTINUATION_PROMPT
            };

            match editor.readline(prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        editor.add_history_entry(line.as_str()).ok();
                    }
                    match buffer.push_line(&line) {
                        Input::Statements(statements) => {
                            self.execute_all(statements)?;
                        }
                        Input::Exit => break,
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    buffer = StatementBuffer::default();
                    println!("^C");
                }
                Err(ReadlineError::Eof) => break,
                Err(e) => {
                    error!("readline error: {}", e);
                    break;
                }
            }
        }

        if let Some(path) = &self.history_file {
            if let Err(e) = editor.save_history(path) {
                debug!("failed to save history: {}", e);
            }
        }
        println!("Goodbye!");
        Ok(())
    }
}
