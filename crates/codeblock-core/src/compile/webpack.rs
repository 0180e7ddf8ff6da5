//! webpack toolchain driven through `node`.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

use super::toolchain::{Toolchain, ToolchainReport};
use super::types::{BundleRequest, CompilerConfig};

/// Driver script run with `node -e`.
const DRIVER_SCRIPT: &str = include_str!("webpack_driver.js");

/// Environment variable carrying the JSON bundle request to the driver.
const REQUEST_ENV: &str = "CODEBLOCK_BUNDLE_REQUEST";

/// Bundles code blocks with the project's installed webpack.
#[derive(Debug, Clone)]
pub struct WebpackToolchain {
    /// Path to node
    node_path: PathBuf,

    /// Directory node runs in; webpack and the loader resolve from here
    project_root: PathBuf,
}

impl WebpackToolchain {
    /// Create a toolchain from the compiler config, locating `node`.
    pub fn new(config: &CompilerConfig) -> Result<Self> {
        let node_path = match &config.node_path {
            Some(path) => path.clone(),
            None => Self::find_node()?,
        };

        Ok(Self {
            node_path,
            project_root: config.project_root.clone(),
        })
    }

    /// Get the node path.
    pub fn node_path(&self) -> &Path {
        &self.node_path
    }

    /// Find node in PATH.
    fn find_node() -> Result<PathBuf> {
        which::which("node").map_err(|_| Error::Compilation("node not found in PATH".to_string()))
    }

    fn command(&self, request: &BundleRequest) -> Result<Command> {
        let request_json = serde_json::to_string(request)
            .map_err(|e| Error::Compilation(format!("failed to encode bundle request: {e}")))?;

        let mut command = Command::new(&self.node_path);
        command
            .arg("-e")
            .arg(DRIVER_SCRIPT)
            .current_dir(&self.project_root)
            .env(REQUEST_ENV, request_json)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        Ok(command)
    }
}

impl Toolchain for WebpackToolchain {
    fn name(&self) -> &str {
        "webpack"
    }

    async fn bundle(
        &self,
        request: &BundleRequest,
        cancel: &CancellationToken,
    ) -> Result<ToolchainReport> {
        let mut child = self.command(request)?.spawn().map_err(|e| {
            Error::Compilation(format!("failed to run {}: {e}", self.node_path.display()))
        })?;

        let stdout_task = tokio::spawn(read_pipe(child.stdout.take()));
        let stderr_task = tokio::spawn(read_pipe(child.stderr.take()));
        let readers = [stdout_task.abort_handle(), stderr_task.abort_handle()];

        // A leftover grandchild can hold the pipes open after node exits, so
        // draining them has to stay cancellable too.
        let finished = async {
            let status = child.wait().await;
            let (stdout, stderr) = tokio::join!(stdout_task, stderr_task);
            (status, stdout.unwrap_or_default(), stderr.unwrap_or_default())
        };

        let waited = tokio::select! {
            finished = finished => Some(finished),
            _ = cancel.cancelled() => None,
        };

        let Some((status, stdout, stderr)) = waited else {
            if matches!(child.try_wait(), Ok(None))
                && let Err(e) = child.kill().await
            {
                tracing::warn!("Failed to kill webpack process: {}", e);
            }
            readers.iter().for_each(|reader| reader.abort());
            return Err(Error::Cancelled);
        };

        let status =
            status.map_err(|e| Error::Compilation(format!("failed to wait for webpack: {e}")))?;

        if !status.success() {
            return Err(Error::Compilation(failure_message(status, &stderr)));
        }

        if !stderr.trim().is_empty() {
            tracing::debug!("webpack stderr: {}", stderr.trim());
        }

        Ok(parse_driver_output(&stdout))
    }
}

async fn read_pipe<R>(pipe: Option<R>) -> String
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut buf = String::new();
    if let Some(mut pipe) = pipe
        && let Err(e) = pipe.read_to_string(&mut buf).await
    {
        tracing::debug!("Failed to read toolchain output: {}", e);
    }
    buf
}

fn failure_message(status: ExitStatus, stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("webpack exited with {status}")
    } else {
        format!("webpack exited with {status}: {stderr}")
    }
}

/// The report is the driver's last output line; anything before it is
/// loader chatter.
fn parse_driver_output(stdout: &str) -> ToolchainReport {
    let mut lines = stdout.lines().filter(|line| !line.trim().is_empty());
    let Some(report) = lines.next_back() else {
        return ToolchainReport::default();
    };

    let chatter: Vec<&str> = lines.collect();
    if !chatter.is_empty() {
        tracing::debug!("webpack output: {}", chatter.join("\n"));
    }

    ToolchainReport::parse(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::toolchain::DiagnosticLevel;

    #[test]
    fn test_explicit_node_path() {
        let config = CompilerConfig {
            node_path: Some(PathBuf::from("/opt/node/bin/node")),
            ..CompilerConfig::default()
        };
        let toolchain = WebpackToolchain::new(&config).unwrap();
        assert_eq!(toolchain.node_path(), Path::new("/opt/node/bin/node"));
        assert_eq!(toolchain.name(), "webpack");
    }

    #[test]
    fn test_driver_disables_minification() {
        assert!(DRIVER_SCRIPT.contains("minimizer: []"));
        assert!(DRIVER_SCRIPT.contains("splitChunks: false"));
        assert!(DRIVER_SCRIPT.contains(REQUEST_ENV));
    }

    #[test]
    fn test_parse_driver_output_uses_last_line() {
        let stdout = "ts-loader: Using typescript@5.4\n{\"errors\":[\"boom\"],\"warnings\":[]}\n";
        let report = parse_driver_output(stdout);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].level, DiagnosticLevel::Error);
        assert_eq!(report.diagnostics[0].message, "boom");
    }

    #[test]
    fn test_parse_driver_output_empty() {
        assert!(parse_driver_output("\n\n").diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_missing_node_is_compilation_error() {
        let temp = tempfile::TempDir::new().expect("Failed to create temp dir");
        let config = CompilerConfig {
            node_path: Some(temp.path().join("no-such-node")),
            ..CompilerConfig::for_project(temp.path())
        };
        let toolchain = WebpackToolchain::new(&config).unwrap();
        let staging = crate::compile::StagingArea::create(temp.path()).await.unwrap();
        let request = BundleRequest::new(staging.path().join("index.js"), &staging, &config);

        let err = toolchain
            .bundle(&request, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Compilation(_)));
    }
}
