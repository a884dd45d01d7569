use clap::{Parser, Subcommand};
use std::path::PathBuf;
use anyhow::Result;

use crate::core::Engine;

#[derive(Parser)]
#[command(name = "callscope")]
#[command(about = "Static call-graph analysis for Python source trees")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a file and its imports into a flat call graph
    Analyze {
        /// Entry source file
        file: PathBuf,

        /// Import search base (defaults to the entry file's directory)
        #[arg(short, long)]
        base: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(long)]
        format: Option<String>,
    },

    /// List the functions defined in a file or directory
    Functions {
        /// Source file, or a directory to walk
        path: PathBuf,
    },

    /// Display the call tree rooted at a function
    Tree {
        /// Entry source file
        file: PathBuf,

        /// Root function name
        #[arg(short, long)]
        function: String,

        /// Duplicate shared dependencies instead of re-parenting them
        #[arg(long)]
        expand_shared: bool,

        /// Print the post-order processing order instead of the tree
        #[arg(long)]
        flat: bool,
    },

    /// Print an inclusive 1-indexed line range from a file
    Extract {
        file: PathBuf,
        start: usize,
        end: usize,
    },

    /// Replace an inclusive 1-indexed line range in a file
    Patch {
        file: PathBuf,
        start: usize,
        end: usize,

        /// File holding the replacement text (stdin when omitted)
        #[arg(short, long)]
        replacement: Option<PathBuf>,
    },
}

impl Cli {
    pub async fn execute(self, engine: Engine) -> Result<()> {
        match self.command {
            Commands::Analyze { file, base, format } => {
                engine.analyze(file, base, format).await
            }
            Commands::Functions { path } => {
                engine.functions(path).await
            }
            Commands::Tree { file, function, expand_shared, flat } => {
                engine.tree(file, function, expand_shared, flat).await
            }
            Commands::Extract { file, start, end } => {
                engine.extract(file, start, end).await
            }
            Commands::Patch { file, start, end, replacement } => {
                engine.patch(file, start, end, replacement).await
            }
        }
    }
}
