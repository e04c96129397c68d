// Copyright 2024. The Tessera Project Contributors
//
// Redistribution and use in source and binary forms, with or without modification, are permitted provided that the
// following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this list of conditions and the following
// disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice, this list of conditions and the
// following disclaimer in the documentation and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its contributors may be used to endorse or promote
// products derived from this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES,
// INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
// SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY,
// WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE
// USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! The Tessera node binary: CLI parsing, configuration/logging bootstrap, and the
//! `construct-offline` / `construct-online` / `close` lifecycle of [`Node`] (§4.1).

mod node;
mod routed_host;
mod supernode_transport;

use std::{path::PathBuf, process};

use clap::Parser;
use log::*;
use multiaddr::Multiaddr;
use node::{Node, RoutingChoice};
use tessera_common::{
    config::RepositoryConfig,
    exit_codes::{ExitCode, ExitError},
    logging::initialize_logging,
};
use tessera_repo::Repository;

const LOG_TARGET: &str = "tessera::node::app";

const DEFAULT_LOG_TEMPLATE: &str = r#"
refresh_rate: 30 seconds
appenders:
  stdout:
    kind: console
    encoder:
      pattern: "{d(%Y-%m-%dT%H:%M:%S%.3f)} {l:<5} {t} - {m}{n}"
root:
  level: info
  appenders:
    - stdout
"#;

#[derive(Parser, Debug)]
#[command(name = "tessera_node", about = "A Tessera content-addressed network node")]
struct Cli {
    /// Directory holding the node's repository (config, datastore, blockstore, identity).
    #[arg(long, short = 'b', default_value = "~/.tessera", env = "TESSERA_BASE_PATH")]
    base_path: PathBuf,

    /// Path to the repository's config file, relative to `base_path` unless absolute.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Path to a log4rs YAML config, relative to `base_path` unless absolute. Falls back to a
    /// bundled console-only template if the file is absent.
    #[arg(long, default_value = "log4rs.yml")]
    log_config: PathBuf,

    /// Construct the node without opening a peer host; name-system reads/writes stay local.
    #[arg(long)]
    offline: bool,

    /// Use the supernode client instead of the embedded DHT for routing.
    #[arg(long)]
    supernode: Vec<Multiaddr>,
}

impl Cli {
    fn resolve(&self, base_path: &std::path::Path, p: &std::path::Path) -> PathBuf {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            base_path.join(p)
        }
    }
}

fn main() {
    if let Err(err) = main_inner() {
        eprintln!("{}", err);
        if let Some(hint) = err.exit_code.hint() {
            eprintln!();
            eprintln!("{}", hint);
        }
        error!(target: LOG_TARGET, "exiting with code ({}): {}", err.exit_code as i32, err);
        process::exit(err.exit_code as i32);
    }
}

fn main_inner() -> Result<(), ExitError> {
    let cli = Cli::parse();
    let base_path = expand_base_path(&cli.base_path);
    std::fs::create_dir_all(&base_path).map_err(|e| ExitError::new(ExitCode::IoError, e))?;

    let log_config_path = cli.resolve(&base_path, &cli.log_config);
    initialize_logging(&log_config_path, DEFAULT_LOG_TEMPLATE).map_err(|e| ExitError::new(ExitCode::IoError, e))?;

    info!(target: LOG_TARGET, "starting tessera node, base path {}", base_path.display());

    let config_path = cli.resolve(&base_path, &cli.config);
    let config = RepositoryConfig::load(&config_path).map_err(|e| ExitError::new(ExitCode::ConfigError, e))?;

    let repo_path = base_path.join("repo");
    let repository = Repository::open(&repo_path).map_err(|e| ExitError::new(ExitCode::IoError, e))?;
    let mut node = Node::new(repository);

    if cli.offline {
        node.construct_offline(&config)?;
        info!(target: LOG_TARGET, "node constructed offline; mode = {:?}", node.mode());
        return Ok(());
    }

    let routing_choice = if cli.supernode.is_empty() {
        RoutingChoice::Dht
    } else {
        RoutingChoice::Supernode {
            servers: cli.supernode.clone(),
        }
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| ExitError::new(ExitCode::UnknownError, e))?;

    runtime.block_on(async move {
        node.construct_online(&config, routing_choice).await?;
        info!(target: LOG_TARGET, "node online; identity = {}", node.identity().unwrap().identifier());

        wait_for_shutdown_signal().await;

        info!(target: LOG_TARGET, "shutdown signal received, closing node");
        node.close().await
    })
}

/// Expands a leading `~` to the user's home directory, the way the teacher's installer resolves
/// configured paths. Left untouched if there is no leading `~` or no resolvable home directory.
fn expand_base_path(path: &std::path::Path) -> PathBuf {
    let raw = path.to_string_lossy();
    if let Some(rest) = raw.strip_prefix('~') {
        if let Some(home) = dirs_next::home_dir() {
            let rest = rest.strip_prefix('/').unwrap_or(rest);
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = sigterm.recv() => {},
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
