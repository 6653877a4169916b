//! CDS credentials: `.cdsapirc` files with environment and CLI overrides.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

/// Resolved connection settings for the CDS API.
#[derive(Debug, Clone)]
pub struct CdsCredentials {
    /// Base CDS API URL, typically `https://cds.climate.copernicus.eu/api`.
    pub url: String,
    /// API key.
    ///
    /// Supported formats:
    /// - Legacy: `<UID>:<APIKEY>`
    /// - Token-only: `<PERSONAL_ACCESS_TOKEN>` (no colon)
    pub key: String,
    /// Whether to verify TLS certificates.
    pub verify: bool,
}

/// Values that take precedence over the environment and the rc file.
#[derive(Debug, Clone, Default)]
pub struct CredentialOverrides {
    pub url: Option<String>,
    pub key: Option<String>,
    pub verify: Option<bool>,
    /// Explicit rc file, used instead of the default search path.
    pub rc_path: Option<PathBuf>,
}

#[derive(Debug, Default, PartialEq)]
struct RcFile {
    url: Option<String>,
    key: Option<String>,
    verify: Option<bool>,
}

/// Resolves credentials in order of precedence:
/// explicit overrides, `CDSAPI_URL` / `CDSAPI_KEY`, then the first rc file found.
pub fn load_credentials(overrides: &CredentialOverrides) -> Result<CdsCredentials> {
    let mut url = overrides
        .url
        .clone()
        .or_else(|| std::env::var("CDSAPI_URL").ok());
    let mut key = overrides
        .key
        .clone()
        .or_else(|| std::env::var("CDSAPI_KEY").ok());
    let mut verify = overrides.verify;

    let candidates = rc_candidates(overrides.rc_path.as_deref());
    if url.is_none() || key.is_none() || verify.is_none() {
        if let Some(rc_path) = candidates.iter().find(|p| p.exists()) {
            let text = std::fs::read_to_string(rc_path).with_context(|| {
                format!("failed to read configuration file {}", rc_path.display())
            })?;
            let rc = parse_rc(&text);
            log::debug!("loaded CDS configuration from {}", rc_path.display());
            url = url.or(rc.url);
            key = key.or(rc.key);
            verify = verify.or(rc.verify);
        }
    }

    let searched = candidates
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let Some(url) = url else {
        bail!("missing configuration: url (set CDSAPI_URL or put `url:` in one of: {searched})");
    };
    let Some(key) = key else {
        bail!("missing configuration: key (set CDSAPI_KEY or put `key:` in one of: {searched})");
    };

    Ok(CdsCredentials {
        url,
        key,
        verify: verify.unwrap_or(true),
    })
}

fn parse_rc(text: &str) -> RcFile {
    let mut rc = RcFile::default();
    // `key:` may be followed by its value on the next line.
    let mut pending: Option<&str> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // URLs contain colons themselves, so only a bare value continues a pending key.
        let is_entry = line
            .split_once(':')
            .is_some_and(|(k, _)| matches!(k.trim(), "url" | "key" | "verify"));
        if let Some(field) = pending.take() {
            if !is_entry {
                rc.set(field, strip_quotes(line));
                continue;
            }
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v);
            if v.is_empty() {
                pending = Some(match k {
                    "url" => "url",
                    "key" => "key",
                    _ => continue,
                });
            } else {
                rc.set(k, v);
            }
        }
    }

    rc
}

impl RcFile {
    fn set(&mut self, field: &str, value: &str) {
        match field {
            "url" => self.url = Some(value.to_string()),
            "key" => self.key = Some(value.to_string()),
            "verify" => self.verify = Some(value != "0"),
            _ => {}
        }
    }
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    let quoted = s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')));
    if quoted { &s[1..s.len() - 1] } else { s }
}

fn rc_candidates(explicit: Option<&Path>) -> Vec<PathBuf> {
    // 1) --rc / CDSAPI_RC, 2) ./.cdsapirc, 3) ~/.cdsapirc
    if let Some(p) = explicit {
        return vec![p.to_path_buf()];
    }
    if let Ok(p) = std::env::var("CDSAPI_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".cdsapirc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".cdsapirc"));
    }
    v
}
