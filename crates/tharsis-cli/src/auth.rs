use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// API token stored per profile.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub server: String,
    pub token: String,
}

impl StoredCredentials {
    /// First and last characters of the token, for display.
    pub fn token_preview(&self) -> String {
        let token = &self.token;
        if token.len() > 20 && token.is_ascii() {
            format!("{}...{}", &token[..8], &token[token.len() - 8..])
        } else {
            "*".repeat(token.len().min(8))
        }
    }
}

fn creds_path(profile: &str) -> Result<PathBuf> {
    Ok(crate::config::home_dir()?.join(format!("credentials.{profile}.json")))
}

pub fn load_credentials(profile: &str) -> Result<Option<StoredCredentials>> {
    let path = creds_path(profile)?;
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    let creds: StoredCredentials = serde_json::from_str(&content)?;
    Ok(Some(creds))
}

pub fn save_credentials(profile: &str, creds: &StoredCredentials) -> Result<()> {
    let path = creds_path(profile)?;
    let content = serde_json::to_string_pretty(creds)?;
    fs::write(path, content)?;
    Ok(())
}

pub fn remove_credentials(profile: &str) -> Result<bool> {
    let path = creds_path(profile)?;
    if path.exists() {
        fs::remove_file(path)?;
        Ok(true)
    } else {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_preview_hides_middle() {
        let creds = StoredCredentials {
            server: "https://t".to_string(),
            token: "abcdefgh-0123456789-ijklmnop".to_string(),
        };
        assert_eq!(creds.token_preview(), "abcdefgh...ijklmnop");

        let short = StoredCredentials {
            server: "https://t".to_string(),
            token: "secret".to_string(),
        };
        assert_eq!(short.token_preview(), "******");
    }
}
