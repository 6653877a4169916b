use std::time::Duration;

pub(crate) fn retriable_status(code: u16) -> bool {
    matches!(code, 500 | 502 | 503 | 504 | 429 | 408)
}

pub(crate) fn backoff(current: Duration, max: Duration) -> Duration {
    let next = Duration::from_secs_f64((current.as_secs_f64() * 1.5).max(1.0));
    if next > max { max } else { next }
}

/// Splits a legacy `<UID>:<APIKEY>` key. Personal access tokens have no colon.
pub(crate) fn split_key_basic(key: &str) -> Option<(String, String)> {
    let (user, secret) = key.split_once(':')?;
    let (user, secret) = (user.trim(), secret.trim());
    if user.is_empty() || secret.is_empty() {
        return None;
    }
    Some((user.to_string(), secret.to_string()))
}

pub(crate) fn urljoin(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        // Absolute paths are relative to the host, not to the API prefix.
        let host_end = base
            .find("://")
            .and_then(|scheme| base[scheme + 3..].find('/').map(|i| scheme + 3 + i))
            .unwrap_or(base.len());
        format!("{}{}", &base[..host_end], path)
    } else {
        format!("{}/{}", base, path)
    }
}

pub(crate) fn append_query(url: &str, params: &[(&str, &str)]) -> String {
    let query = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    if query.is_empty() {
        return url.to_string();
    }
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}{query}")
}

/// The legacy API has lived under both `/api` and `/api/v2`.
pub(crate) fn api_v2_variant(base: &str) -> Option<String> {
    let b = base.trim_end_matches('/');
    if b.ends_with("/api/v2") {
        return None;
    }
    if b.ends_with("/api") {
        return Some(format!("{}/v2", b));
    }
    if !b.contains("/api/") {
        return Some(format!("{}/api/v2", b));
    }
    None
}
