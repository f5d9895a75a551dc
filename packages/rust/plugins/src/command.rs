//! `command` plugin: delegate entry extraction to an external program.
//!
//! The program receives one JSON request on stdin and must print one JSON
//! response on stdout before exiting with status 0. Its stderr goes to the
//! parent's stderr.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use docsetbuilder_core::{Plugin, PluginContext};
use docsetbuilder_shared::{DocsetEntries, DocsetError, ManifestFragment, PluginOutput, Result};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::{ChildStdin, Command};
use tracing::{debug, info};

use crate::parse_options;

const NAME: &str = "command";

#[derive(Debug, Deserialize)]
struct CommandOptions {
    command: String,
    #[serde(default)]
    args: Vec<String>,
}

/// Written to the program's stdin.
#[derive(Debug, Serialize)]
struct CommandRequest<'a> {
    cli_args: &'a BTreeMap<String, String>,
    plugin_options: &'a serde_json::Value,
    working_dir: &'a Path,
    /// Scratch directory reserved for this run (not yet created).
    temp_dir: PathBuf,
    dry_run: bool,
    docset_identifier: &'a str,
}

/// Read from the program's stdout.
#[derive(Debug, Deserialize)]
struct CommandResponse {
    #[serde(default)]
    entries: DocsetEntries,
    #[serde(default)]
    manifest: Option<ManifestFragment>,
    /// Trees the program wants copied into the package.
    #[serde(default)]
    include: Vec<IncludeRequest>,
}

#[derive(Debug, Deserialize)]
struct IncludeRequest {
    path: String,
    root_dir_name: Option<String>,
}

/// Runs `options.command` with `options.args` in the working directory.
#[derive(Debug, Default)]
pub struct CommandPlugin;

#[async_trait]
impl Plugin for CommandPlugin {
    fn name(&self) -> &str {
        NAME
    }

    async fn execute(&self, ctx: &PluginContext<'_>) -> Result<PluginOutput> {
        let options: CommandOptions = parse_options(NAME, ctx.plugin_options)?;

        let request = CommandRequest {
            cli_args: ctx.cli_args,
            plugin_options: ctx.plugin_options,
            working_dir: ctx.working_dir,
            temp_dir: ctx.create_tmp_folder(),
            dry_run: ctx.dry_run(),
            docset_identifier: &ctx.main_options.identifier,
        };
        let json = serde_json::to_string(&request)
            .map_err(|e| DocsetError::plugin(NAME, format!("failed to serialize request: {e}")))?;

        info!(cmd = %options.command, args = ?options.args, "spawning plugin command");
        let mut child = Command::new(&options.command)
            .args(&options.args)
            .current_dir(ctx.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                DocsetError::plugin(
                    NAME,
                    format!("failed to spawn `{}`: {e}", options.command),
                )
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| DocsetError::plugin(NAME, "failed to capture command stdin"))?;

        // The program may exit or close stdin without reading the request.
        let (written, output) = tokio::join!(write_request(stdin, &json), child.wait_with_output());
        let output =
            output.map_err(|e| DocsetError::plugin(NAME, format!("failed to wait for command: {e}")))?;
        match written {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                debug!("command closed stdin before reading the request");
            }
            Err(e) => {
                return Err(DocsetError::plugin(NAME, format!("failed to write request: {e}")));
            }
        }
        if !output.status.success() {
            return Err(DocsetError::plugin(
                NAME,
                format!("`{}` exited with {}", options.command, output.status),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let response: CommandResponse = serde_json::from_str(stdout.trim()).map_err(|e| {
            DocsetError::plugin(
                NAME,
                format!(
                    "invalid command response: {e} (got: {})",
                    stdout.chars().take(200).collect::<String>()
                ),
            )
        })?;

        for include in &response.include {
            let source = ctx.resolve_path(&include.path);
            debug!(source = %source.display(), "command requested include");
            ctx.include(&source, include.root_dir_name.as_deref()).await?;
        }

        info!(entries = response.entries.len(), "command plugin finished");
        Ok(PluginOutput {
            entries: response.entries,
            manifest: response.manifest,
        })
    }
}

async fn write_request(mut stdin: ChildStdin, json: &str) -> std::io::Result<()> {
    stdin.write_all(json.as_bytes()).await?;
    stdin.write_all(b"\n").await?;
    stdin.shutdown().await
}
