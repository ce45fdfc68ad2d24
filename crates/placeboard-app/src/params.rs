//! Page URL parameters.

/// Parse the `endpoint` parameter from a query string or hash fragment.
///
/// Leading `?` or `#` is ignored and the value is percent-decoded. An empty
/// value counts as absent.
pub fn parse_endpoint(s: &str) -> Option<String> {
    let s = s.trim_start_matches(['?', '#']);
    url::form_urlencoded::parse(s.as_bytes())
        .find(|(key, value)| key == "endpoint" && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}
