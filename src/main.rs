use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use log::info;
use tracing_subscriber::filter::LevelFilter;

use grub_pbkdf2::config::FileConfig;
use grub_pbkdf2::entropy::RandomDevice;
use grub_pbkdf2::params::{self, parse_count, Overrides};
use grub_pbkdf2::prompt::TtyConsole;
use grub_pbkdf2::{Controller, Error};

const PROGNAME: &str = "grub-mkpasswd-pbkdf2";

/// Generate a PBKDF2 password hash for use in a GRUB configuration file.
#[derive(Parser, Debug)]
#[command(name = PROGNAME, version)]
struct Cli {
    /// Number of PBKDF2 iterations
    #[arg(short = 'c', long = "iteration-count", alias = "iteration_count", value_name = "NUMBER")]
    iteration_count: Option<String>,

    /// Length of generated hash in bytes
    #[arg(short = 'l', long, value_name = "NUMBER")]
    buflen: Option<String>,

    /// Length of salt in bytes
    #[arg(short = 's', long, alias = "salt", value_name = "NUMBER")]
    saltlen: Option<String>,

    /// Device to read the salt from
    #[arg(long, value_name = "PATH")]
    random_device: Option<PathBuf>,

    /// TOML file with defaults for the options above
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// More diagnostics on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{PROGNAME}: error: {}", diagnostic(&e));
            ExitCode::FAILURE
        }
    }
}

// The error and its causes on one line.
fn diagnostic(e: &Error) -> String {
    let mut line = e.to_string();
    let mut cause = std::error::Error::source(e);
    while let Some(inner) = cause {
        line.push_str(": ");
        line.push_str(&inner.to_string());
        cause = inner.source();
    }
    line
}

fn count<T: TryFrom<u64>>(name: &'static str, value: &Option<String>) -> Result<Option<T>, Error> {
    value.as_deref().map(|s| parse_count(name, s)).transpose()
}

fn run(cli: &Cli) -> Result<(), Error> {
    let overrides = Overrides {
        iteration_count: count("iteration count", &cli.iteration_count)?,
        buflen: count("buflen", &cli.buflen)?,
        saltlen: count("saltlen", &cli.saltlen)?,
        random_device: cli.random_device.clone(),
    };
    let file = cli
        .config
        .as_deref()
        .map(FileConfig::from_file)
        .transpose()?;
    let resolved = params::resolve(&overrides, file.as_ref())?;

    let mut controller = Controller::new(
        resolved.params,
        TtyConsole::open().map_err(|e| Error::input_io("no terminal and no stdin", e))?,
        RandomDevice::new(resolved.random_device),
    );
    let credential = controller.run().map_err(|failure| {
        info!("Gave up at stage {}", failure.stage);
        failure.error
    })?;

    println!("Your PBKDF2 is {credential}");
    Ok(())
}
