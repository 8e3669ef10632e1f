//! Purpose: Shared blocking HTTP plumbing for the dashboard and equity clients.
//! Exports: `build_agent`, `build_url`, `send`, `read_body`.
//! Role: One place that maps ureq outcomes onto the crate error taxonomy.
//! Invariants: Non-2xx statuses are `Http` errors; transport failures are `Io` errors.
//! Invariants: Response bodies are read whole and capped at the configured size.
use std::io::Read;
use std::time::Duration;

use url::Url;

use crate::core::error::{Error, ErrorKind, Result};

const USER_AGENT: &str = concat!("vaxreport/", env!("CARGO_PKG_VERSION"));

pub(crate) fn build_agent(timeout_secs: u64) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()
}

/// Append percent-encoded path segments to a base URL, keeping any base path.
pub(crate) fn build_url(base_url: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base_url.clone();
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            Error::new(ErrorKind::Usage).with_message(format!("base url {base_url} cannot be a base"))
        })?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url)
}

pub(crate) fn send(
    url: &str,
    request: std::result::Result<ureq::Response, ureq::Error>,
) -> Result<ureq::Response> {
    match request {
        Ok(response) => {
            tracing::debug!(url, status = response.status(), "response");
            Ok(response)
        }
        Err(ureq::Error::Status(code, response)) => {
            let reason = response.status_text().to_string();
            Err(Error::new(ErrorKind::Http)
                .with_message(format!("remote returned status {code} {reason}"))
                .with_path(url))
        }
        Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Io)
            .with_message("request failed")
            .with_path(url)
            .with_source(err)),
    }
}

pub(crate) fn read_body(url: &str, response: ureq::Response, max_bytes: u64) -> Result<String> {
    read_capped(url, response.into_reader(), max_bytes)
}

// The size cap applies to raw bytes, before UTF-8 decoding.
fn read_capped(url: &str, reader: impl Read, max_bytes: u64) -> Result<String> {
    let mut body = Vec::new();
    reader
        .take(max_bytes.saturating_add(1))
        .read_to_end(&mut body)
        .map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read response body")
                .with_path(url)
                .with_source(err)
        })?;
    if body.len() as u64 > max_bytes {
        return Err(Error::new(ErrorKind::Io)
            .with_message(format!("response body exceeds {max_bytes} bytes"))
            .with_path(url)
            .with_hint("Raise max_body_bytes in the config file."));
    }
    String::from_utf8(body).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("response body is not valid UTF-8")
            .with_path(url)
            .with_source(err)
    })
}

#[cfg(test)]
mod tests {
    use super::{build_url, read_capped};
    use crate::core::error::ErrorKind;
    use std::io::Cursor;
    use url::Url;

    #[test]
    fn oversize_body_is_reported_even_mid_character() {
        let body = "ab\u{e9}cd".as_bytes().to_vec();
        let err = read_capped("http://x/", Cursor::new(body), 2).expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.message(), Some("response body exceeds 2 bytes"));
    }

    #[test]
    fn body_within_limit_is_decoded() {
        let body = "ab\u{e9}".as_bytes().to_vec();
        assert_eq!(read_capped("http://x/", Cursor::new(body), 4).expect("read"), "ab\u{e9}");
        let err = read_capped("http://x/", Cursor::new(vec![0xff, 0xfe]), 4).expect_err("should fail");
        assert_eq!(err.message(), Some("response body is not valid UTF-8"));
    }

    #[test]
    fn build_url_appends_to_base_path() {
        let base = Url::parse("https://files.example.gov/data/vaccine-equity/").expect("url");
        let url = build_url(&base, &["age", "vaccines_by_age_los_angeles.json"]).expect("build");
        assert_eq!(
            url.as_str(),
            "https://files.example.gov/data/vaccine-equity/age/vaccines_by_age_los_angeles.json"
        );
    }

    #[test]
    fn build_url_encodes_segments() {
        let base = Url::parse("https://public.tableau.com/").expect("url");
        let url = build_url(&base, &["views", "a b", "c/d"]).expect("build");
        assert_eq!(url.as_str(), "https://public.tableau.com/views/a%20b/c%2Fd");
    }

    #[test]
    fn build_url_rejects_opaque_base() {
        let base = Url::parse("mailto:someone@example.com").expect("url");
        assert!(build_url(&base, &["x"]).is_err());
    }
}
