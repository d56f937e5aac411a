use reqwest::Url;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum BaseUrlError {
    #[error("base url is empty")]
    Empty,
    #[error("unsupported scheme in base url: {0}")]
    Scheme(String),
    #[error("invalid base url {0}: {1}")]
    Invalid(String, String),
}

/// Canonical form used for every request: scheme and host kept, no trailing
/// slash, and no trailing `/api` (routes already start with it).
pub fn canonical_base_url(raw: &str) -> Result<String, BaseUrlError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(BaseUrlError::Empty);
    }

    let with_scheme = if s.contains("://") {
        s.to_string()
    } else {
        format!("http://{}", s)
    };
    let url = Url::parse(&with_scheme)
        .map_err(|e| BaseUrlError::Invalid(s.to_string(), e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(BaseUrlError::Scheme(url.scheme().to_string()));
    }
    if url.host_str().is_none() {
        return Err(BaseUrlError::Invalid(s.to_string(), "missing host".to_string()));
    }

    let mut out = url.as_str().trim_end_matches('/').to_string();
    if let Some(stripped) = out.strip_suffix("/api") {
        out = stripped.to_string();
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{canonical_base_url, BaseUrlError};

    #[test]
    fn adds_scheme_and_strips_trailing_segments() {
        assert_eq!(
            canonical_base_url("localhost:8000").unwrap(),
            "http://localhost:8000"
        );
        assert_eq!(
            canonical_base_url("https://clm.example.com/api/").unwrap(),
            "https://clm.example.com"
        );
        assert_eq!(
            canonical_base_url(" http://127.0.0.1:8000/ ").unwrap(),
            "http://127.0.0.1:8000"
        );
    }

    #[test]
    fn keeps_path_prefixes_other_than_api() {
        assert_eq!(
            canonical_base_url("https://example.com/clm").unwrap(),
            "https://example.com/clm"
        );
    }

    #[test]
    fn rejects_empty_and_foreign_schemes() {
        assert_eq!(canonical_base_url("  "), Err(BaseUrlError::Empty));
        assert_eq!(
            canonical_base_url("ftp://example.com"),
            Err(BaseUrlError::Scheme("ftp".to_string()))
        );
    }
}
