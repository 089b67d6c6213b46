// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Flat `key=value` configuration files and the `-i <path>` command-line convention shared
//! by every krpc binary, grounded on `Krpc_Application.cpp`/`Krpc_Config.cpp` (spec.md §6).

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::process;

pub const RPC_SERVER_IP: &str = "rpcserverip";
pub const RPC_SERVER_PORT: &str = "rpcserverport";
pub const ZOOKEEPER_IP: &str = "zookeeperip";
pub const ZOOKEEPER_PORT: &str = "zookeeperport";

/// A parsed configuration file. Built once in `main` via [`Config::from_cli`] and passed
/// down explicitly, rather than kept as a lazily-initialized process-wide singleton the
/// way the original's `KrpcApplication` is (spec.md §9, Open Question — a global mutable
/// singleton has no clean Rust equivalent worth forcing, so callers just hold a `Config`).
#[derive(Debug, Default, Clone)]
pub struct Config {
    entries: HashMap<String, String>,
}

impl Config {
    /// Parses a `key=value` file. `#`-prefixed and blank lines are ignored; keys and
    /// values are trimmed of leading/trailing spaces and a trailing `\r`.
    pub fn load_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(Self::parse(&contents))
    }

    fn parse(contents: &str) -> Self {
        let mut entries = HashMap::new();
        for line in contents.lines() {
            let line = trim_line(line);
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some(eq) = line.find('=') else { continue };
            let key = trim_line(&line[..eq]).to_string();
            let value = trim_line(&line[eq + 1..]).to_string();
            entries.insert(key, value);
        }
        Self { entries }
    }

    /// Returns the value for `key`, or an empty string if it was never set.
    pub fn load(&self, key: &str) -> &str {
        self.entries.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn rpc_server_addr(&self) -> String {
        format!("{}:{}", self.load(RPC_SERVER_IP), self.load(RPC_SERVER_PORT))
    }

    pub fn zookeeper_addr(&self) -> String {
        format!("{}:{}", self.load(ZOOKEEPER_IP), self.load(ZOOKEEPER_PORT))
    }

    /// Re-renders the parsed entries as `key=value` lines, for round-trip testing.
    pub fn to_file_contents(&self) -> String {
        let mut lines: Vec<String> = self
            .entries
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        lines.sort();
        lines.join("\n")
    }

    /// Parses `-i <path>` out of `argv` (including the program name at index 0) and loads
    /// the config file it names. Any other argument, or `-i` with nothing after it, prints
    /// the framework's usage line and exits with status 1 — exactly
    /// `KrpcApplication::Init`'s behavior on malformed arguments.
    pub fn from_cli(argv: &[String]) -> Self {
        let mut config_file = None;
        let mut args = argv.iter().skip(1);

        while let Some(arg) = args.next() {
            if arg == "-i" {
                match args.next() {
                    Some(path) => config_file = Some(path.as_str()),
                    None => usage_and_exit(),
                }
            } else {
                usage_and_exit();
            }
        }

        let Some(config_file) = config_file else {
            usage_and_exit();
        };

        match Self::load_file(config_file) {
            Ok(config) => config,
            Err(e) => {
                log::error!("could not open config file {config_file}: {e}");
                process::exit(1);
            }
        }
    }
}

fn trim_line(s: &str) -> &str {
    s.trim_start_matches(' ').trim_end_matches('\r').trim_end_matches(' ')
}

fn usage_and_exit() -> ! {
    println!("格式： command -i <配置文件路径>");
    process::exit(1);
}
