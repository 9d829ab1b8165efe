//! The single upstream target and how request URIs map onto it.

use axum::http::{HeaderValue, Uri};
use thiserror::Error;
use url::Url;

/// Reasons an upstream URL is rejected at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    #[error("'{url}' is not a valid URL: {source}")]
    Parse {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported scheme '{0}', expected http or https")]
    UnsupportedScheme(String),

    #[error("'{0}' has no host")]
    MissingHost(String),
}

/// Parsed upstream base URL.
///
/// Built once at startup; every forwarded request takes its scheme and
/// authority from here and has its path appended to the base path.
#[derive(Debug, Clone)]
pub struct Upstream {
    url: Url,
    authority: String,
    host_header: HeaderValue,
}

impl Upstream {
    pub fn parse(raw: &str) -> Result<Self, UpstreamError> {
        let url = Url::parse(raw).map_err(|source| UpstreamError::Parse {
            url: raw.to_string(),
            source,
        })?;

        match url.scheme() {
            "http" | "https" => {}
            other => return Err(UpstreamError::UnsupportedScheme(other.to_string())),
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| UpstreamError::MissingHost(raw.to_string()))?;

        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let host_header = HeaderValue::from_str(&authority)
            .map_err(|_| UpstreamError::MissingHost(raw.to_string()))?;

        Ok(Self {
            url,
            authority,
            host_header,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Host plus explicit port, as sent in the `Host` header.
    pub fn host_header(&self) -> &HeaderValue {
        &self.host_header
    }

    /// Absolute URL an inbound request URI is forwarded to.
    ///
    /// The request path is joined onto the base path with exactly one slash
    /// between them; base and request queries are joined with `&`.
    pub fn target_for(&self, uri: &Uri) -> Result<Url, url::ParseError> {
        let path = join_paths(self.url.path(), uri.path());
        let mut target = format!("{}://{}{}", self.scheme(), self.authority, path);

        if let Some(query) = join_queries(self.url.query(), uri.query()) {
            target.push('?');
            target.push_str(&query);
        }

        Url::parse(&target)
    }
}

fn join_paths(base: &str, request: &str) -> String {
    match (base.ends_with('/'), request.starts_with('/')) {
        (true, true) => format!("{}{}", base, &request[1..]),
        (false, false) => format!("{}/{}", base, request),
        _ => format!("{}{}", base, request),
    }
}

fn join_queries(base: Option<&str>, request: Option<&str>) -> Option<String> {
    match (base.filter(|q| !q.is_empty()), request.filter(|q| !q.is_empty())) {
        (Some(b), Some(r)) => Some(format!("{}&{}", b, r)),
        (Some(q), None) | (None, Some(q)) => Some(q.to_string()),
        (None, None) => None,
    }
}
