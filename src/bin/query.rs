// =============================================================================
// query — read-only CLI client for the monitor daemon's HTTP API
// =============================================================================
//
// A thin `reqwest`-based client mirroring the REST surface in §6.1. No
// business logic lives here — every command just shapes a request and
// prints the response body, per §1's framing of CLI front-ends as
// collaborator wiring outside the specified core.
// =============================================================================

use std::env;

use anyhow::{bail, Context, Result};

fn usage() -> &'static str {
    "usage: query <health|metrics|alerts> [--base-url <url>] [--name <name>] [--limit <n>]"
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("warn").init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first().cloned() else {
        println!("{}", usage());
        return Ok(());
    };

    let base_url = arg_value(&args, "--base-url").unwrap_or_else(|| "http://127.0.0.1:8080".to_string());
    let client = reqwest::Client::new();

    let url = match command.as_str() {
        "health" => format!("{base_url}/health"),
        "metrics" => {
            let mut url = format!("{base_url}/api/v1/metrics?");
            if let Some(name) = arg_value(&args, "--name") {
                url.push_str(&format!("name={name}&"));
            }
            if let Some(limit) = arg_value(&args, "--limit") {
                url.push_str(&format!("limit={limit}&"));
            }
            url
        }
        "alerts" => format!("{base_url}/api/v1/alerts"),
        other => bail!("unknown command '{other}'\n{}", usage()),
    };

    let response = client.get(&url).send().await.context("request failed")?;
    let status = response.status();
    let body = response.text().await.context("failed to read response body")?;

    println!("{status}");
    println!("{body}");

    Ok(())
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag).and_then(|i| args.get(i + 1)).cloned()
}
