use clap::{Parser as ClapParser, Subcommand};
use cfn_script::cli::{self, CliError, CompileOptions, DecompileOptions};
use cfn_script::Format;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(ClapParser)]
#[command(name = "cfn-script")]
#[command(about = "cfn-script - compile scripts to CloudFormation-style templates, and back")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile source text into a template document
    Compile {
        /// Source file (reads from stdin if not provided)
        input: Option<PathBuf>,

        /// Output file (writes to stdout if not provided)
        output: Option<PathBuf>,

        /// Output document format
        #[arg(short, long, value_enum, default_value_t = Format::Yaml)]
        format: Format,
    },

    /// Decompile a JSON or YAML template document into source text
    Decompile {
        /// Template file (reads from stdin if not provided)
        input: Option<PathBuf>,

        /// Output file (writes to stdout if not provided)
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compile {
            input,
            output,
            format,
        } => run_compile(input, output, format),
        Commands::Decompile { input, output } => run_decompile(input, output),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_compile(
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    format: Format,
) -> Result<(), CliError> {
    let options = CompileOptions {
        source: read_input(input)?,
        format,
    };
    let document = cli::execute_compile(&options)?;
    write_output(output, &document)
}

fn run_decompile(input: Option<PathBuf>, output: Option<PathBuf>) -> Result<(), CliError> {
    let options = DecompileOptions {
        document: read_input(input)?,
    };
    let source = cli::execute_decompile(&options)?;
    write_output(output, &source)
}

fn read_input(path: Option<PathBuf>) -> Result<String, CliError> {
    match path {
        Some(path) => Ok(fs::read_to_string(path)?),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).map_err(CliError::Io)?;
            Ok(buffer)
        }
        None => Err(CliError::NoInput),
    }
}

/// Only called once the whole transform succeeded.
fn write_output(path: Option<PathBuf>, text: &str) -> Result<(), CliError> {
    match path {
        Some(path) => Ok(fs::write(path, text)?),
        None => {
            print!("{}", text);
            Ok(())
        }
    }
}
