//! CLI argument definitions using clap.

use crate::config::ConfigOverrides;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "kiln")]
#[command(author, version, about = "Build a linked static site from a markdown vault", long_about = None)]
pub struct Cli {
    /// Path to the vault (defaults to the current directory)
    #[arg(long, global = true)]
    pub vault: Option<PathBuf>,

    /// Output as JSON (default)
    #[arg(long, global = true, conflicts_with_all = ["yaml", "toml"])]
    pub json: bool,

    /// Output as YAML
    #[arg(long, global = true, conflicts_with_all = ["json", "toml"])]
    pub yaml: bool,

    /// Output as TOML
    #[arg(long, global = true, conflicts_with_all = ["json", "yaml"])]
    pub toml: bool,

    /// Only report errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (can be repeated)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output directory for generated files
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Public base URL; only its path becomes the address prefix
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Write every page as `<name>/index.html`
    #[arg(long, global = true)]
    pub flat_urls: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output_format(&self) -> OutputFormat {
        if self.yaml {
            OutputFormat::Yaml
        } else if self.toml {
            OutputFormat::Toml
        } else {
            OutputFormat::Json
        }
    }

    pub fn vault_dir(&self) -> PathBuf {
        self.vault.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            output_dir: self.output.clone(),
            base_url: self.base_url.clone(),
            flat_urls: self.flat_urls,
        }
    }

    /// `--quiet` wins over `-v`.
    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            return log::LevelFilter::Error;
        }
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Toml,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the whole vault into the output directory
    Generate(GenerateArgs),

    /// Resolve a link target the way `[[...]]` does
    Resolve(ResolveArgs),

    /// List the notes linking to a note
    Backlinks(BacklinksArgs),

    /// Print the link graph
    Graph(GraphArgs),

    /// Filter notes with query expressions
    Query(QueryArgs),

    /// Evaluate a view of a `.base` file
    View(ViewArgs),

    /// Render a single note to HTML
    Render(RenderArgs),
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Build everything but write nothing
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Link target, e.g. `Note`, `folder/Note#Heading`
    pub token: String,
}

#[derive(Args, Debug)]
pub struct BacklinksArgs {
    /// Note path or name
    pub note: String,
}

#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Only nodes and links touching this note
    #[arg(long)]
    pub note: Option<String>,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Expressions that must all hold
    #[arg(required = true)]
    pub exprs: Vec<String>,

    /// Expressions of which at least one must hold
    #[arg(long = "or")]
    pub any: Vec<String>,

    /// Expressions that must not hold
    #[arg(long = "not")]
    pub none: Vec<String>,

    /// Group results by a field
    #[arg(long)]
    pub group_by: Option<String>,

    /// Sort results by a field
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort (and group) descending
    #[arg(long)]
    pub desc: bool,
}

#[derive(Args, Debug)]
pub struct ViewArgs {
    /// The `.base` file, by vault path or name
    pub file: String,

    /// View name (defaults to the first view)
    #[arg(long)]
    pub name: Option<String>,

    /// Print the rendered HTML instead of structured rows
    #[arg(long)]
    pub html: bool,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Note path or name
    pub note: String,
}
