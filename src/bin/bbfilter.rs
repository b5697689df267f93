//! bbfilter CLI - render BBCode from a file or stdin to HTML on stdout.

use std::{
    io::{self, Read, Write},
    path::PathBuf,
};

use bbfilter::{try_render, ColorCheck, ConfigError, RenderError, RenderOptions, RenderOverrides};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Render BBCode to sanitized HTML.
#[derive(Parser)]
#[command(name = "bbfilter", version, about)]
struct Cli {
    /// Input file. Reads stdin when omitted or `-`.
    input: Option<PathBuf>,

    /// TOML file with render options (top level or a `[render]` table).
    #[arg(short, long, env = "BBFILTER_CONFIG")]
    config: Option<PathBuf>,

    /// CSS class prefix for generated elements.
    #[arg(long)]
    class_prefix: Option<String>,

    /// Turn line breaks into `<br>`.
    #[arg(long)]
    newlines: bool,

    /// Emit `data-*` attributes given on tags.
    #[arg(long)]
    allow_data: bool,

    /// Emit `class=` values given on tags.
    #[arg(long)]
    allow_classes: bool,

    /// Use the legacy color check.
    #[arg(long)]
    legacy_color: bool,

    /// Do not expand tags inside code blocks.
    #[arg(long)]
    verbatim_code: bool,

    /// Refuse input longer than this many bytes.
    #[arg(long)]
    max_input: Option<usize>,

    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Render(#[from] RenderError),
}

impl Cli {
    fn options(&self) -> Result<RenderOptions, ConfigError> {
        let base = match &self.config {
            Some(path) => RenderOptions::from_toml_file(path)?,
            None => RenderOptions::default(),
        };

        let merged = base.merge(RenderOverrides {
            class_prefix: self.class_prefix.clone(),
            convert_newlines: self.newlines.then_some(true),
            allow_data_attributes: self.allow_data.then_some(true),
            allow_custom_classes: self.allow_classes.then_some(true),
            color_check: self.legacy_color.then_some(ColorCheck::Legacy),
            verbatim_code: self.verbatim_code.then_some(true),
            max_input_len: self.max_input,
            ..Default::default()
        });
        merged.validate()?;
        Ok(merged)
    }

    fn read_input(&self) -> io::Result<String> {
        match &self.input {
            Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path),
            _ => {
                let mut buf = String::new();
                io::stdin().read_to_string(&mut buf)?;
                Ok(buf)
            }
        }
    }

    fn execute(&self) -> Result<(), CliError> {
        let options = self.options()?;
        let content = self.read_input()?;
        tracing::debug!(bytes = content.len(), "rendering");

        let html = try_render(&content, &options)?;
        let mut stdout = io::stdout().lock();
        stdout.write_all(html.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Err(err) = cli.execute() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
