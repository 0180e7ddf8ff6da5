//! Codeblock CLI - module discovery and compilation for documentation code blocks.

mod compile;
mod resolve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "codeblock")]
#[command(about = "Resolve and compile runnable documentation code blocks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the editor module manifest for code block imports as JSON
    Resolve {
        /// Import names (treated as one code block)
        imports: Vec<String>,

        /// JSON file with an array of code blocks ({ "imports": [...] })
        #[arg(long, conflicts_with = "imports")]
        blocks: Option<PathBuf>,

        /// Root of the installed package tree
        #[arg(long, default_value = "node_modules")]
        package_root: PathBuf,

        /// Emit only the first entry per import name
        #[arg(long)]
        dedupe: bool,
    },

    /// Compile a code block into a single bundle
    Compile {
        /// Path to the code block source
        source: PathBuf,

        /// Source language tag (typescript, javascript)
        #[arg(short, long, default_value = "javascript")]
        language: String,

        /// Project root with webpack and the transpile loader installed
        #[arg(long, default_value = ".")]
        project_root: PathBuf,

        /// Path to node (defaults to the one in PATH)
        #[arg(long)]
        node: Option<PathBuf>,

        /// Give up after this many seconds (0 = no limit)
        #[arg(long, default_value = "0")]
        timeout_secs: u64,

        /// Print the bundle with its diagnostics as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Helper to format codeblock-core errors with recovery hints
    let format_error = |err: anyhow::Error| -> anyhow::Error {
        if let Some(core_err) = err.downcast_ref::<codeblock_core::Error>() {
            anyhow::anyhow!("{}", core_err.with_hint())
        } else {
            err
        }
    };

    match cli.command {
        Commands::Resolve {
            imports,
            blocks,
            package_root,
            dedupe,
        } => {
            resolve::execute(imports, blocks.as_deref(), package_root, dedupe)
                .map_err(format_error)?;
        }

        Commands::Compile {
            source,
            language,
            project_root,
            node,
            timeout_secs,
            json,
        } => {
            let args = compile::CompileArgs {
                source,
                language,
                project_root,
                node,
                timeout_secs,
                json,
            };
            compile::execute(args).await.map_err(format_error)?;
        }
    }

    Ok(())
}
