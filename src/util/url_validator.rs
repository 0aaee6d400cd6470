use thiserror::Error;
use url::Url;

/// Errors that can occur during URL validation.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("URL has no host")]
    MissingHost,
}

fn parse_http(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }
    Ok(url)
}

/// Validates the admin backend base URL.
///
/// The backend usually runs next to podsync on a LAN or on localhost, so
/// private and loopback hosts are accepted; only the scheme and host are
/// checked. Query and fragment are dropped since endpoints are joined onto
/// the path.
///
/// ```
/// use podconfig_tui::util::validate_server_url;
///
/// let url = validate_server_url("http://localhost:8080").unwrap();
/// assert_eq!(url.port(), Some(8080));
/// assert!(validate_server_url("ftp://example.com").is_err());
/// ```
pub fn validate_server_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let mut url = parse_http(url_str)?;
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Validates a server-rendered link before handing it to the system opener.
///
/// Only http(s) is allowed, so a hostile row cannot make `open` launch a
/// `file://` or custom-scheme handler.
pub fn validate_url_for_open(url_str: &str) -> Result<Url, UrlValidationError> {
    parse_http(url_str)
}
