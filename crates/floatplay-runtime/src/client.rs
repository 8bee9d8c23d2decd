//! UDS JSON-RPC client for CLI subcommands.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

pub(crate) async fn rpc_call(
    socket_path: &str,
    method: &str,
    params: serde_json::Value,
) -> anyhow::Result<serde_json::Value> {
    let stream = UnixStream::connect(socket_path)
        .await
        .map_err(|e| anyhow::anyhow!("cannot connect to daemon at {socket_path}: {e}"))?;

    let (reader, mut writer) = stream.into_split();

    let request = serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1,
    });
    let mut req = serde_json::to_string(&request)?;
    req.push('\n');
    writer.write_all(req.as_bytes()).await?;
    writer.shutdown().await?;

    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    reader.read_line(&mut line).await?;

    let response: serde_json::Value = serde_json::from_str(line.trim())?;

    if let Some(error) = response.get("error") {
        anyhow::bail!("RPC error: {error}");
    }

    Ok(response["result"].clone())
}

/// `floatplay ls` — table of active detached windows.
pub async fn cmd_ls(socket_path: &str, json: bool) -> anyhow::Result<()> {
    let windows = rpc_call(socket_path, "list_windows", serde_json::json!({})).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&windows)?);
        return Ok(());
    }

    print!("{}", format_window_table(&windows));
    Ok(())
}

/// Pure formatting logic for `ls` output, separated for testability.
pub(crate) fn format_window_table(windows: &serde_json::Value) -> String {
    let arr = match windows.as_array() {
        Some(a) => a,
        None => return "no windows\n".to_string(),
    };
    if arr.is_empty() {
        return "no windows\n".to_string();
    }

    let mut out = format!("{:<5} {:<9} {:>9}  TITLE\n", "ID", "STATE", "POSITION");
    for window in arr {
        let id = window["id"].as_u64().unwrap_or(0);
        let state = if window["playing"].as_bool().unwrap_or(false) {
            "playing"
        } else {
            "paused"
        };
        let position = window["position"].as_f64().unwrap_or(0.0);
        let title = window["title"].as_str().unwrap_or("");
        out.push_str(&format!(
            "{id:<5} {state:<9} {:>8.1}s  {}\n",
            position,
            truncate_title(title, 60)
        ));
    }
    out
}

fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        title.to_string()
    } else {
        let keep: String = title.chars().take(max_len.saturating_sub(1)).collect();
        format!("{keep}\u{2026}")
    }
}

/// `floatplay close <id>`.
pub async fn cmd_close(socket_path: &str, id: u64) -> anyhow::Result<()> {
    let result = rpc_call(socket_path, "close_window", serde_json::json!({ "id": id })).await?;
    if result["closed"].as_bool().unwrap_or(false) {
        println!("closed {id}");
    } else {
        println!("no window {id}");
    }
    Ok(())
}

/// `floatplay close-all`.
pub async fn cmd_close_all(socket_path: &str) -> anyhow::Result<()> {
    let result = rpc_call(socket_path, "close_all", serde_json::json!({})).await?;
    println!("closed {}", result["closed"].as_u64().unwrap_or(0));
    Ok(())
}

/// `floatplay suspend <seconds>`.
pub async fn cmd_suspend(socket_path: &str, seconds: f64) -> anyhow::Result<()> {
    let result = rpc_call(
        socket_path,
        "suspend",
        serde_json::json!({ "seconds": seconds }),
    )
    .await?;
    println!(
        "suspended for {}ms",
        result["suspended_ms"].as_i64().unwrap_or(0)
    );
    Ok(())
}
