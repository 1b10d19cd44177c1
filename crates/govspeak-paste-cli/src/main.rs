use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use govspeak_paste::{Options, PasteService};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "govspeak-paste")]
#[command(about = "Convert pasted HTML into Govspeak")]
#[command(version)]
struct Cli {
    /// HTML file to convert (reads stdin when omitted or `-`)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Write Govspeak to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Marker for unordered list items (-, * or +)
    #[arg(long, env = "GOVSPEAK_PASTE_BULLET", default_value_t = '-')]
    bullet: char,

    /// Spaces used to indent nested lists and continuation lines
    #[arg(long, env = "GOVSPEAK_PASTE_INDENT_WIDTH", default_value_t = 3)]
    indent_width: usize,

    /// Extra tags to strip with their content (comma separated)
    #[arg(long, env = "GOVSPEAK_PASTE_REMOVE", value_delimiter = ',', value_name = "TAGS")]
    remove: Vec<String>,

    /// Increase verbosity (-v debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn options(&self) -> Options {
        let mut options = Options {
            bullet_list_marker: self.bullet,
            list_indent: " ".repeat(self.indent_width),
            ..Default::default()
        };
        for tag in &self.remove {
            let tag = tag.trim().to_lowercase();
            if !tag.is_empty() && !options.is_removed(&tag) {
                options.remove.push(tag);
            }
        }
        options
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let service = PasteService::with_options(cli.options()).context("Invalid options")?;

    let html = read_input(cli.input.as_deref())?;
    tracing::debug!(input_bytes = html.len(), "Read HTML");

    let govspeak = service.convert_html(&html);
    write_output(cli.output.as_deref(), &govspeak)
}

/// Log to stderr so stdout only ever carries Govspeak
fn init_tracing(verbose: u8) {
    let default_level = if verbose > 0 { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => {
            let mut html = String::new();
            io::stdin()
                .read_to_string(&mut html)
                .context("Failed to read stdin")?;
            Ok(html)
        }
    }
}

fn write_output(path: Option<&Path>, govspeak: &str) -> Result<()> {
    match path {
        Some(path) => fs::write(path, format!("{govspeak}\n"))
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{govspeak}").context("Failed to write stdout")?;
            stdout.flush().context("Failed to write stdout")
        }
    }
}
