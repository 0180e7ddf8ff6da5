//! Compile command implementation for Codeblock CLI.
//!
//! Bundles one code block through the project's webpack. Ctrl-C cancels the
//! toolchain and still removes the staging area.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use codeblock_core::compile::{CompileOptions, CompilerConfig, EphemeralCompiler};
use tokio_util::sync::CancellationToken;

/// Arguments of the compile command.
pub struct CompileArgs {
    pub source: PathBuf,
    pub language: String,
    pub project_root: PathBuf,
    pub node: Option<PathBuf>,
    pub timeout_secs: u64,
    pub json: bool,
}

/// Compile a code block and print the bundle on stdout.
pub async fn execute(args: CompileArgs) -> anyhow::Result<()> {
    let source = fs::read_to_string(&args.source)
        .with_context(|| format!("failed to read {}", args.source.display()))?;

    let config = CompilerConfig {
        node_path: args.node,
        ..CompilerConfig::for_project(&args.project_root)
    };
    let compiler = EphemeralCompiler::new(config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling compilation");
            on_interrupt.cancel();
        }
    });

    let options = CompileOptions {
        timeout: timeout_from_secs(args.timeout_secs),
        cancel,
    };
    let bundle = compiler
        .compile_with(&source, &args.language, options)
        .await?;

    tracing::info!("Compiled {} in {}ms", args.source.display(), bundle.compile_time_ms);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&bundle)?);
    } else {
        for diagnostic in &bundle.diagnostics {
            eprintln!("{:?}: {}", diagnostic.level, diagnostic.message);
        }
        print!("{}", bundle.code);
    }

    Ok(())
}

/// Zero means no limit.
fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_from_secs() {
        assert_eq!(timeout_from_secs(0), None);
        assert_eq!(timeout_from_secs(30), Some(Duration::from_secs(30)));
    }
}
