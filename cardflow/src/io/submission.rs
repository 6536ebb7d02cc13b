//! Evaluation request files under `.cardflow/requests/`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use super::atomic::write_atomic;
use crate::core::filters::EvaluationRequest;

const REQUEST_PREFIX: &str = "request-";

/// Next unused `request-NNNN.json` path in `dir`.
pub fn next_request_path(dir: &Path) -> Result<PathBuf> {
    let mut highest = 0u32;
    if dir.exists() {
        for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
            let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
            let name = entry.file_name();
            let seq = name
                .to_str()
                .and_then(|name| name.strip_prefix(REQUEST_PREFIX))
                .and_then(|rest| rest.strip_suffix(".json"))
                .and_then(|seq| seq.parse::<u32>().ok());
            if let Some(seq) = seq {
                highest = highest.max(seq);
            }
        }
    }
    let next = highest
        .checked_add(1)
        .ok_or_else(|| anyhow!("request numbers exhausted in {}", dir.display()))?;
    Ok(dir.join(format!("{}{:04}.json", REQUEST_PREFIX, next)))
}

/// Atomically write `request` to `path`.
pub fn write_request(path: &Path, request: &EvaluationRequest, pretty: bool) -> Result<()> {
    let mut buf = if pretty {
        serde_json::to_string_pretty(request)
    } else {
        serde_json::to_string(request)
    }
    .context("serialize evaluation request")?;
    buf.push('\n');
    write_atomic(path, &buf)?;
    tracing::info!(path = %path.display(), cards = request.cards.len(), "wrote evaluation request");
    Ok(())
}
