// src/core/engine.rs
use std::io::Read;
use std::path::{Path, PathBuf};
use anyhow::Result;
use chrono::{DateTime, Utc};
use ignore::WalkBuilder;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::CallscopeError;
use super::analyzer::{build_tree, Analyzer, CallGraphMap, Label, TreeMode};
use super::snippet;

/// Main orchestration engine for Callscope
pub struct Engine {
    config: Config,
    analyzer: Analyzer,
}

/// JSON payload emitted by `analyze --format json`
#[derive(Debug, Serialize)]
struct AnalysisReport {
    entry: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    generated_at: Option<DateTime<Utc>>,
    function_count: usize,
    functions: CallGraphMap,
}

impl Engine {
    /// Create a new engine instance from an optional config path
    pub async fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load_or_default(config_path)?;

        debug!("Loaded configuration: {:?}", config);

        let analyzer = Analyzer::new(config.analysis.clone());

        Ok(Self { config, analyzer })
    }

    /// Analyze a file's import closure and print the merged call graph
    pub async fn analyze(
        &self,
        file: PathBuf,
        base: Option<PathBuf>,
        format: Option<String>,
    ) -> Result<()> {
        info!("🔍 Analyzing call graph for {}", file.display());

        let graph = self.analyzer.analyze_with_base(&file, base.as_deref())?;
        info!("Found {} function(s)", graph.len());

        let format = format.unwrap_or_else(|| self.config.output.format.clone());
        match format.as_str() {
            "json" => {
                let report = AnalysisReport {
                    entry: file,
                    generated_at: self.config.output.include_timestamp.then(Utc::now),
                    function_count: graph.len(),
                    functions: graph,
                };
                println!("{}", serde_json::to_string_pretty(&report)
                    .map_err(CallscopeError::Serialization)?);
            }
            _ => {
                let mut entries: Vec<_> = graph.functions.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                for (name, entry) in entries {
                    println!("{}", Label::from_entry(name, entry).encode());
                    for edge in &entry.calls {
                        println!("  -> {}", Label::from_edge(edge).encode());
                    }
                }
            }
        }

        Ok(())
    }

    /// List the functions defined in a file, or in every source file
    /// under a directory
    pub async fn functions(&self, path: PathBuf) -> Result<()> {
        if path.is_dir() {
            self.functions_in_dir(&path)
        } else {
            for name in self.analyzer.function_names(&path)? {
                println!("{}", name);
            }
            Ok(())
        }
    }

    fn functions_in_dir(&self, dir: &Path) -> Result<()> {
        let extension = self.config.analysis.source_extension.as_str();

        let walker = WalkBuilder::new(dir)
            .hidden(false)
            .git_ignore(true)
            .build();

        for entry in walker {
            let entry = entry.map_err(|e| CallscopeError::FileSystem(e.to_string()))?;
            let path = entry.path();

            if !path.is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(extension)
            {
                continue;
            }

            match self.analyzer.function_names(path) {
                Ok(names) if names.is_empty() => {}
                Ok(names) => {
                    println!("{}:", path.display());
                    for name in names {
                        println!("  {}", name);
                    }
                }
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }

        Ok(())
    }

    /// Build and display the call tree rooted at a chosen function
    pub async fn tree(
        &self,
        file: PathBuf,
        function: String,
        expand_shared: bool,
        flat: bool,
    ) -> Result<()> {
        let graph = self.analyzer.analyze(&file)?;

        let mode = if expand_shared {
            TreeMode::Expand
        } else {
            TreeMode::Reparent
        };
        let tree = build_tree(&graph, &function, mode)?;

        if flat {
            for label in tree.flatten() {
                println!("{}", label);
            }
        } else {
            println!("Call tree for '{}':", function);
            print!("{}", tree.render());
        }

        Ok(())
    }

    /// Print an inclusive line range from a file
    pub async fn extract(&self, file: PathBuf, start: usize, end: usize) -> Result<()> {
        print!("{}", snippet::extract(&file, start, end)?);
        Ok(())
    }

    /// Replace an inclusive line range; replacement text comes from a
    /// file or stdin
    pub async fn patch(
        &self,
        file: PathBuf,
        start: usize,
        end: usize,
        replacement: Option<PathBuf>,
    ) -> Result<()> {
        let new_text = match replacement {
            Some(path) => std::fs::read_to_string(path)?,
            None => {
                let mut buffer = String::new();
                std::io::stdin().read_to_string(&mut buffer)?;
                buffer
            }
        };

        snippet::replace(&file, start, end, &new_text)?;
        info!("✅ Replaced lines {}-{} of {}", start, end, file.display());
        Ok(())
    }
}
