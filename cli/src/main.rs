//! ytbatch CLI — build, inspect and execute `execute_batch` requests.
//!
//! Usage:
//! ```bash
//! # Validate a request file and print the envelope that would be sent
//! ytbatch encode --file requests.json
//!
//! # Pair a saved response with its requests
//! ytbatch decode --requests requests.json --results results.json --strict
//!
//! # Run a batch against the current cluster of a config file
//! ytbatch exec --config clusters.yaml --file requests.json --token $YT_TOKEN
//! ```

mod logging;

use std::env;
use std::fs;
use std::process;

use anyhow::{bail, Context, Result};
use serde_json::Value;

use ytbatch_core::{
    codec, BatchClient, BatchEnvelope, BatchResults, CommandKind, DecodeOptions, ResultItem,
    SubRequest, YtConfig,
};
use ytbatch_http::{HttpBatchClient, HttpClientConfig};

use crate::logging::{init_tracing, LogConfig};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    init_tracing(&LogConfig {
        level: if has_flag(&args, "--verbose") { "debug".into() } else { "warn".into() },
        json: has_flag(&args, "--log-json"),
        ..LogConfig::default()
    });

    let result = match args[1].as_str() {
        "encode" => cmd_encode(&args[2..]),
        "decode" => cmd_decode(&args[2..]),
        "clusters" => cmd_clusters(&args[2..]),
        "exec" => cmd_exec(&args[2..]).await,
        "commands" => {
            cmd_commands();
            Ok(())
        }
        "version" | "--version" | "-V" => {
            println!("ytbatch {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn print_usage() {
    println!("ytbatch {}", env!("CARGO_PKG_VERSION"));
    println!("Build, inspect and execute cluster command batches\n");
    println!("USAGE:");
    println!("    ytbatch <COMMAND> [FLAGS]\n");
    println!("COMMANDS:");
    println!("    encode     Validate a request file and print its envelope");
    println!("    decode     Pair a saved result array with its requests");
    println!("    clusters   List clusters from a config file");
    println!("    exec       Execute a batch against a cluster");
    println!("    commands   List supported command tags");
    println!("    version    Print version");
    println!("    help       Print this help\n");
    println!("FLAGS:");
    println!("    --file <PATH>       Request file (array of sub-requests or envelope)");
    println!("    --requests <PATH>   Request file for decode");
    println!("    --results <PATH>    Raw result array for decode");
    println!("    --config <PATH>     Cluster config (.json / .yaml)");
    println!("    --cluster <ID>      Cluster id (default: current cluster)");
    println!("    --token <TOKEN>     OAuth token (default: $YT_TOKEN)");
    println!("    --strict            Check outputs against each command's shape");
    println!("    --verbose           Debug logging to stderr");
    println!("    --log-json          JSON log lines");
}

fn cmd_encode(args: &[String]) -> Result<()> {
    let path = parse_flag(args, "--file").context("--file is required")?;
    let requests = read_requests(&path)?;
    let envelope = codec::encode(requests);
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

fn cmd_decode(args: &[String]) -> Result<()> {
    for item in &decode_files(args)? {
        println!("{}", render_item(item));
    }
    Ok(())
}

fn decode_files(args: &[String]) -> Result<BatchResults> {
    let requests_path = parse_flag(args, "--requests").context("--requests is required")?;
    let results_path = parse_flag(args, "--results").context("--results is required")?;

    let requests = read_requests(&requests_path)?;
    let text = fs::read_to_string(&results_path)
        .with_context(|| format!("cannot read {results_path}"))?;
    let raw: Vec<Value> = serde_json::from_str(&text)
        .with_context(|| format!("{results_path} is not a JSON array"))?;

    Ok(codec::decode_with(raw, &requests, decode_options(args))?)
}

fn cmd_clusters(args: &[String]) -> Result<()> {
    let path = parse_flag(args, "--config").context("--config is required")?;
    let config = YtConfig::load(&path).with_context(|| format!("cannot load {path}"))?;

    println!("Configured clusters:\n");
    for id in config.cluster_ids() {
        let cluster = config.cluster(id)?;
        let marker = if id == config.cluster { "*" } else { " " };
        println!("{marker} {:<16} {:<24} {}", id, cluster.name, cluster.base_url());
        if let Some(description) = &cluster.description {
            println!("    {description}");
        }
    }
    Ok(())
}

async fn cmd_exec(args: &[String]) -> Result<()> {
    let config_path = parse_flag(args, "--config").context("--config is required")?;
    let file = parse_flag(args, "--file").context("--file is required")?;

    let config =
        YtConfig::load(&config_path).with_context(|| format!("cannot load {config_path}"))?;
    let cluster = match parse_flag(args, "--cluster") {
        Some(id) => config.cluster(&id)?,
        None => config.current_cluster()?,
    };
    let requests = read_requests(&file)?;

    let http_config = HttpClientConfig {
        token: parse_flag(args, "--token").or_else(|| env::var("YT_TOKEN").ok()),
        ..HttpClientConfig::default()
    };
    let transport = HttpBatchClient::for_cluster(cluster, http_config)?;
    let client = BatchClient::new(transport).with_options(decode_options(args));

    tracing::info!(cluster = %cluster.id, size = requests.len(), "executing batch");
    let results = client.execute(requests).await?;
    println!("{}", serde_json::to_string_pretty(&results)?);

    let failed = results.failures().count();
    if failed > 0 {
        eprintln!("{failed} of {} sub-requests failed", results.len());
    }
    Ok(())
}

fn cmd_commands() {
    println!("Supported commands:\n");
    for kind in CommandKind::ALL {
        println!("  {:<26} output: {}", kind.as_str(), kind.expected_output());
    }
}

fn decode_options(args: &[String]) -> DecodeOptions {
    if has_flag(args, "--strict") {
        DecodeOptions::strict()
    } else {
        DecodeOptions::default()
    }
}

fn read_requests(path: &str) -> Result<Vec<SubRequest>> {
    let text = fs::read_to_string(path).with_context(|| format!("cannot read {path}"))?;
    parse_requests(&text).with_context(|| format!("invalid request file {path}"))
}

/// Accepts either a bare array of sub-requests or a `{"requests": [...]}` envelope.
fn parse_requests(text: &str) -> Result<Vec<SubRequest>> {
    let value: Value = serde_json::from_str(text)?;
    if value.is_array() {
        Ok(serde_json::from_value(value)?)
    } else if value.get("requests").is_some() {
        let envelope: BatchEnvelope = serde_json::from_value(value)?;
        Ok(envelope.into_requests())
    } else {
        bail!("expected an array of sub-requests or an object with `requests`")
    }
}

fn render_item(item: &ResultItem) -> String {
    match &item.outcome {
        Ok(output) => format!("{}\t{}\tok\t{}", item.index, item.command, output),
        Err(error) => format!("{}\t{}\terror\t{}", item.index, item.command, error),
    }
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == flag)?;
    args.get(pos + 1).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use ytbatch_core::ClusterError;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn flags() {
        let a = args(&["--file", "r.json", "--strict"]);
        assert_eq!(parse_flag(&a, "--file").as_deref(), Some("r.json"));
        assert!(parse_flag(&a, "--config").is_none());
        assert!(has_flag(&a, "--strict"));
        assert_eq!(decode_options(&a), DecodeOptions::strict());
    }

    #[test]
    fn parse_requests_array_and_envelope() {
        let array = r#"[{"command": "exists", "parameters": {"path": "//a"}}]"#;
        assert_eq!(parse_requests(array).unwrap()[0].kind(), CommandKind::Exists);

        let envelope = r#"{"requests": [{"command": "list", "parameters": {"path": "//b"}}]}"#;
        assert_eq!(parse_requests(envelope).unwrap()[0].kind(), CommandKind::List);

        assert!(parse_requests(r#"{"command": "get"}"#).is_err());
    }

    fn demo(name: &str) -> String {
        format!("{}/../demos/{name}", env!("CARGO_MANIFEST_DIR"))
    }

    #[test]
    fn decode_demo_files() {
        let a = args(&["--requests", &demo("requests.json"), "--results", &demo("results.json")]);
        let results = decode_files(&a).unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.get(0).unwrap().is_ok());
        assert_eq!(results.get(1).unwrap().command, CommandKind::Exists);
        assert_eq!(results.get(1).unwrap().error().unwrap().code, 500);
        assert_eq!(results.failures().count(), 1);
        cmd_decode(&a).unwrap();

        let strict = args(&[
            "--requests",
            &demo("requests.json"),
            "--results",
            &demo("results.json"),
            "--strict",
        ]);
        assert!(decode_files(&strict).is_ok());
    }

    #[test]
    fn decode_needs_both_files() {
        assert!(decode_files(&args(&["--requests", &demo("requests.json")])).is_err());
        let missing =
            args(&["--requests", &demo("requests.json"), "--results", &demo("none.json")]);
        assert!(decode_files(&missing).is_err());
    }

    #[test]
    fn render_lines() {
        let ok = ResultItem { index: 0, command: CommandKind::Exists, outcome: Ok(json!(false)) };
        assert_eq!(render_item(&ok), "0\texists\tok\tfalse");

        let failed = ResultItem {
            index: 1,
            command: CommandKind::Get,
            outcome: Err(ClusterError::new(500, "no such node")),
        };
        assert_eq!(render_item(&failed), "1\tget\terror\tno such node (code 500)");
    }
}
