use anyhow::{Context, Result, bail};
use chrono::Utc;
use inkpost_lib::{ApiResponse, AppConfig, AppState, PostResponse, init_logging};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tokio::runtime::Runtime;

#[derive(Debug, Clone, Default)]
struct CliOptions {
    output: Option<PathBuf>,
    pretty: bool,
    with_counts: bool,
    database_url: Option<String>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct FeedReport {
    generated_at_ms: i64,
    post_count: usize,
    with_counts: bool,
    posts: Vec<PostResponse>,
}

fn usage() -> &'static str {
    "Usage: feed_export [--output <path>] [--pretty] [--with-counts] [--database-url <url>]"
}

fn write_output(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))
}

fn emit_payload(target: Option<&Path>, payload: &str) -> Result<()> {
    if let Some(path) = target {
        write_output(path, payload)?;
        println!("Feed written to {}", path.display());
    } else {
        println!("{payload}");
    }
    Ok(())
}

fn main() -> Result<()> {
    init_logging();

    let args: Vec<String> = env::args().skip(1).collect();
    let options = parse_args(args)?;

    let mut config = AppConfig::from_env();
    if let Some(url) = &options.database_url {
        config.database.url = url.clone();
    }
    let database_url = config.database.url.clone();

    let rt = Runtime::new().context("Failed to create Tokio runtime")?;
    let response = rt.block_on(async {
        let state = AppState::new(config)
            .await
            .with_context(|| format!("Failed to open {database_url}"))?;
        let result = state
            .post_handler
            .refresh_feed(options.with_counts)
            .await
            .map(|posts| FeedReport {
                generated_at_ms: Utc::now().timestamp_millis(),
                post_count: posts.len(),
                with_counts: options.with_counts,
                posts,
            });
        Ok::<_, anyhow::Error>(ApiResponse::from_result(result))
    })?;

    let payload = to_json(&response, options.pretty)?;
    emit_payload(options.output.as_deref(), &payload)?;

    if let Some(error) = response.error {
        bail!("Feed export failed: {error}");
    }
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    if pretty {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(serde_json::to_string(value)?)
    }
}

fn parse_args<I>(args: I) -> Result<CliOptions>
where
    I: IntoIterator<Item = String>,
{
    let mut options = CliOptions::default();

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-o" | "--output" => {
                let path = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--output requires a path\n{}", usage()))?;
                options.output = Some(PathBuf::from(path));
            }
            "--pretty" => {
                options.pretty = true;
            }
            "--with-counts" => {
                options.with_counts = true;
            }
            "--database-url" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow::anyhow!("--database-url requires a value\n{}", usage())
                })?;
                options.database_url = Some(value);
            }
            "-h" | "--help" => {
                println!("{}", usage());
                std::process::exit(0);
            }
            other => {
                bail!("Unknown argument: {other}\n{}", usage());
            }
        }
    }

    Ok(options)
}
