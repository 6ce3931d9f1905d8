pub mod apply;
pub mod auth;
pub mod identity;
pub mod payload;
pub mod rule;

use std::fs;
use std::io::{self, Read};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Reads a JSON document from `file`, or from stdin when no file is given.
pub(crate) fn read_json<T: DeserializeOwned>(file: &Option<String>) -> Result<T> {
    let content = match file {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            buf
        }
    };
    serde_json::from_str(&content).context("Invalid JSON")
}
