//! `Accept` header negotiation.
//!
//! Parses the header into media types ordered by client preference
//! (descending `q`, header order among equals). Types with `q=0` are
//! dropped. A missing header means `*/*`.

use std::cmp::Ordering;

use http::HeaderMap;
use http::header::ACCEPT;

const TEXT_HTML: &str = "text/html";
const APPLICATION_JSON: &str = "application/json";

#[derive(Debug)]
struct Candidate {
    media_type: String,
    quality: f32,
}

/// Media types from every `Accept` header, most preferred first.
pub fn media_types(headers: &HeaderMap) -> Vec<String> {
    let joined = headers
        .get_all(ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect::<Vec<_>>()
        .join(",");

    if joined.trim().is_empty() {
        return vec!["*/*".to_string()];
    }

    let mut candidates: Vec<Candidate> = joined.split(',').filter_map(parse_candidate).collect();
    candidates.sort_by(|a, b| b.quality.partial_cmp(&a.quality).unwrap_or(Ordering::Equal));
    candidates.into_iter().map(|c| c.media_type).collect()
}

/// Whether `text/html` comes before `application/json` in the client's
/// preference order. Neither present, or JSON first, means no.
pub fn prefers_html(headers: &HeaderMap) -> bool {
    media_types(headers)
        .iter()
        .find(|t| *t == TEXT_HTML || *t == APPLICATION_JSON)
        .is_some_and(|t| t == TEXT_HTML)
}

fn parse_candidate(entry: &str) -> Option<Candidate> {
    let mut parts = entry.split(';');
    let media_type = parts.next()?.trim().to_ascii_lowercase();
    if media_type.is_empty() || !media_type.contains('/') {
        return None;
    }

    let mut quality = 1.0;
    for param in parts {
        let Some((name, value)) = param.split_once('=') else {
            continue;
        };
        if name.trim().eq_ignore_ascii_case("q") {
            quality = value.trim().parse::<f32>().ok()?;
        }
    }

    if !(quality > 0.0 && quality <= 1.0) {
        return None;
    }

    Some(Candidate {
        media_type,
        quality,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn accept(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn missing_header_means_anything() {
        assert_eq!(media_types(&HeaderMap::new()), vec!["*/*"]);
        assert!(!prefers_html(&HeaderMap::new()));
    }

    #[test]
    fn browser_accept_prefers_html() {
        let headers = accept("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8");
        assert!(prefers_html(&headers));
    }

    #[test]
    fn json_only_does_not_prefer_html() {
        assert!(!prefers_html(&accept("application/json")));
    }

    #[test]
    fn equal_quality_keeps_header_order() {
        assert!(!prefers_html(&accept("application/json, text/html")));
        assert!(prefers_html(&accept("text/html, application/json")));
    }

    #[test]
    fn quality_overrides_header_order() {
        assert!(prefers_html(&accept("application/json;q=0.5, text/html")));
        assert!(!prefers_html(&accept("text/html;q=0.4, application/json;q=0.9")));
    }

    #[test]
    fn zero_quality_is_excluded() {
        assert!(!prefers_html(&accept("text/html;q=0, */*")));
        assert_eq!(media_types(&accept("text/html;q=0, */*")), vec!["*/*"]);
    }

    #[test]
    fn wildcard_alone_does_not_prefer_html() {
        assert!(!prefers_html(&accept("*/*")));
    }

    #[test]
    fn media_types_are_lowercased_and_trimmed() {
        assert_eq!(
            media_types(&accept("  TEXT/HTML ; charset=utf-8 , Application/JSON;q=0.1")),
            vec!["text/html", "application/json"]
        );
    }

    #[test]
    fn multiple_accept_headers_are_joined() {
        let mut headers = HeaderMap::new();
        headers.append(ACCEPT, HeaderValue::from_static("application/json;q=0.2"));
        headers.append(ACCEPT, HeaderValue::from_static("text/html"));
        assert!(prefers_html(&headers));
    }

    #[test]
    fn malformed_entries_are_skipped() {
        assert_eq!(
            media_types(&accept("garbage, text/html;q=abc, application/json")),
            vec!["application/json"]
        );
    }
}
