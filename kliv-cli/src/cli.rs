//! Command line arguments.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kliv_client::content::DEFAULT_UPLOAD_DIR;
use kliv_client::{ClientConfig, Method};
use kliv_types::Params;
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "kliv")]
#[command(about = "Operator command line for the Kliv backend API", version)]
pub struct Args {
    /// API root, e.g. https://app.example.com/api
    #[arg(long, env = "KLIV_API_ROOT", global = true)]
    pub api_root: Option<String>,

    /// JSON client configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Sign in with this email before running the command
    #[arg(long, env = "KLIV_EMAIL", global = true)]
    pub email: Option<String>,

    #[arg(long, env = "KLIV_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List tables
    Tables,
    /// Select rows
    Query {
        table: String,
        #[arg(value_parser = parse_filter)]
        filters: Vec<(String, String)>,
    },
    /// Fetch one row by _row_id
    Get { table: String, id: String },
    /// Count rows matching filters
    Count {
        table: String,
        #[arg(value_parser = parse_filter)]
        filters: Vec<(String, String)>,
    },
    /// Insert a JSON row or array of rows
    Insert {
        table: String,
        #[arg(value_parser = parse_json)]
        data: Value,
    },
    /// Update rows matching filters
    Update {
        table: String,
        #[arg(value_parser = parse_json)]
        data: Value,
        #[arg(required = true, value_parser = parse_filter)]
        filters: Vec<(String, String)>,
    },
    /// Delete rows matching filters
    Delete {
        table: String,
        #[arg(required = true, value_parser = parse_filter)]
        filters: Vec<(String, String)>,
    },
    /// Content files
    Files {
        #[command(subcommand)]
        command: FilesCommand,
    },
    /// Invoke a remote function
    Invoke {
        name: String,
        #[arg(long, value_parser = parse_method)]
        method: Option<Method>,
        #[arg(long, value_parser = parse_json)]
        data: Option<Value>,
        #[arg(long = "query", value_parser = parse_filter)]
        query: Vec<(String, String)>,
    },
    /// Show the signed-in user
    Whoami,
    /// User administration
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },
    /// List groups
    Groups,
}

#[derive(Subcommand, Debug)]
pub enum FilesCommand {
    /// List files, optionally under a prefix
    List { prefix: Option<String> },
    /// Upload local files, one at a time
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(long, default_value = DEFAULT_UPLOAD_DIR)]
        dir: String,
    },
    /// Delete a file
    Rm { path: String },
    /// Move or rename a file
    Mv { old: String, new: String },
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// List users, with optional paging and a JSON search filter
    List {
        #[arg(long)]
        start: Option<u64>,
        #[arg(long)]
        end: Option<u64>,
        #[arg(long, value_parser = parse_json)]
        search: Option<Value>,
    },
    Get { uuid: String },
    Delete { uuid: String },
    Update {
        uuid: String,
        #[arg(value_parser = parse_json)]
        data: Value,
    },
}

impl Args {
    /// Loads `--config` if given, then applies flag overrides.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("invalid config file {}", path.display()))?
            }
            None => ClientConfig::default(),
        };
        if let Some(root) = &self.api_root {
            config.api_root = root.clone();
        }
        if let Some(secs) = self.timeout {
            config.timeout_secs = Some(secs);
        }
        Ok(config)
    }

    /// Email and password, when both are given.
    pub fn credentials(&self) -> Result<Option<(&str, &str)>> {
        match (&self.email, &self.password) {
            (Some(email), Some(password)) => Ok(Some((email.as_str(), password.as_str()))),
            (None, None) => Ok(None),
            _ => anyhow::bail!("--email and --password must be given together"),
        }
    }
}

pub fn to_params(pairs: &[(String, String)]) -> Params {
    pairs.iter().cloned().collect()
}

fn parse_filter(s: &str) -> kliv_types::Result<(String, String)> {
    Params::parse_pair(s)
}

fn parse_json(s: &str) -> serde_json::Result<Value> {
    serde_json::from_str(s)
}

fn parse_method(s: &str) -> Result<Method, String> {
    Method::from_bytes(s.to_ascii_uppercase().as_bytes()).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("kliv").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn query_filters_split_on_first_equals() {
        let args = parse(&["query", "posts", "status=eq.active", "tag=a=b"]);
        match args.command {
            Command::Query { table, filters } => {
                assert_eq!(table, "posts");
                assert_eq!(
                    filters,
                    vec![
                        ("status".to_string(), "eq.active".to_string()),
                        ("tag".to_string(), "a=b".to_string()),
                    ]
                );
                assert_eq!(
                    to_params(&filters).to_query_string(),
                    "status=eq.active&tag=a%3Db"
                );
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn malformed_filters_are_rejected() {
        assert!(Args::try_parse_from(["kliv", "query", "posts", "status"]).is_err());
        assert!(Args::try_parse_from(["kliv", "query", "posts", "=x"]).is_err());
    }

    #[test]
    fn delete_requires_a_filter() {
        assert!(Args::try_parse_from(["kliv", "delete", "posts"]).is_err());
        let args = parse(&["delete", "posts", "_row_id=eq.4"]);
        assert!(matches!(args.command, Command::Delete { .. }));
    }

    #[test]
    fn insert_parses_json() {
        let args = parse(&["insert", "posts", r#"{"title":"Hi"}"#]);
        match args.command {
            Command::Insert { data, .. } => assert_eq!(data, json!({"title": "Hi"})),
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Args::try_parse_from(["kliv", "insert", "posts", "{oops"]).is_err());
    }

    #[test]
    fn invoke_options() {
        let args = parse(&[
            "invoke", "report", "--method", "put", "--data", "[1,2]", "--query", "format=csv",
        ]);
        match args.command {
            Command::Invoke {
                name,
                method,
                data,
                query,
            } => {
                assert_eq!(name, "report");
                assert_eq!(method, Some(Method::PUT));
                assert_eq!(data, Some(json!([1, 2])));
                assert_eq!(query, vec![("format".to_string(), "csv".to_string())]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn upload_defaults_to_uploads_dir() {
        let args = parse(&["files", "upload", "a.png", "b.png"]);
        match args.command {
            Command::Files {
                command: FilesCommand::Upload { paths, dir },
            } => {
                assert_eq!(paths.len(), 2);
                assert_eq!(dir, "/content/uploads/");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn flags_override_config() {
        let args = parse(&["--api-root", "https://x.example.com/api", "--timeout", "5", "tables"]);
        let config = args.client_config().unwrap();
        assert_eq!(config.api_root, "https://x.example.com/api");
        assert_eq!(config.timeout_secs, Some(5));
    }

    #[test]
    fn config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");
        std::fs::write(&path, r#"{"api_root": "https://file.example.com/api", "timeout_secs": 9}"#).unwrap();

        let args = parse(&["--config", path.to_str().unwrap(), "--timeout", "2", "groups"]);
        let config = args.client_config().unwrap();
        assert_eq!(config.api_root, "https://file.example.com/api");
        assert_eq!(config.timeout_secs, Some(2));
    }

    #[test]
    fn credentials_must_be_paired() {
        let args = parse(&["--email", "a@b.c", "--password", "pw", "whoami"]);
        assert_eq!(args.credentials().unwrap(), Some(("a@b.c", "pw")));
        let args = parse(&["--email", "a@b.c", "whoami"]);
        assert!(args.credentials().is_err());
    }
}
