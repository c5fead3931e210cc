//! Static knowledge about HTTP status codes: reason phrases, categories and the
//! codes whose responses never carry a body.

use std::fmt;
use std::ops::RangeInclusive;

/// Every standard code mapped to its reason phrase, in ascending order.
const REASONS: [(u16, &str); 40] = [
    (100, "Continue"),
    (101, "Switching Protocols"),
    (200, "OK"),
    (201, "Created"),
    (202, "Accepted"),
    (203, "Non-Authoritative Information"),
    (204, "No Content"),
    (205, "Reset Content"),
    (206, "Partial Content"),
    (300, "Multiple Choices"),
    (301, "Moved Permanently"),
    (302, "Found"),
    (303, "See Other"),
    (304, "Not Modified"),
    (305, "Use Proxy"),
    (307, "Temporary Redirect"),
    (400, "Bad Request"),
    (401, "Unauthorized"),
    (402, "Payment Required"),
    (403, "Forbidden"),
    (404, "Not Found"),
    (405, "Method Not Allowed"),
    (406, "Not Acceptable"),
    (407, "Proxy Authentication Required"),
    (408, "Request Timeout"),
    (409, "Conflict"),
    (410, "Gone"),
    (411, "Length Required"),
    (412, "Precondition Failed"),
    (413, "Request Entity Too Large"),
    (414, "Request-URI Too Large"),
    (415, "Unsupported Media Type"),
    (416, "Requested Range Not Satisfiable"),
    (417, "Expectation Failed"),
    (500, "Internal Server Error"),
    (501, "Not Implemented"),
    (502, "Bad Gateway"),
    (503, "Service Unavailable"),
    (504, "Gateway Timeout"),
    (505, "HTTP Version Not Supported"),
];

const INFORMATIONAL: RangeInclusive<u16> = 100..=199;

/// The class a status code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Informational,
    Success,
    Redirection,
    ClientError,
    ServerError,
    Unknown,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Informational => "informational",
            Category::Success => "success",
            Category::Redirection => "redirection",
            Category::ClientError => "client_error",
            Category::ServerError => "server_error",
            Category::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Returns the reason phrase of a known code.
pub fn reason_for(code: u16) -> Option<&'static str> {
    REASONS.binary_search_by_key(&code, |&(c, _)| c).ok().map(|idx| REASONS[idx].1)
}

pub fn known_code(code: u16) -> bool {
    reason_for(code).is_some()
}

/// All known codes in ascending order.
pub fn codes() -> impl Iterator<Item = u16> {
    REASONS.iter().map(|&(code, _)| code)
}

pub fn response_category(code: u16) -> Category {
    match code {
        100..=199 => Category::Informational,
        200..=299 => Category::Success,
        300..=399 => Category::Redirection,
        400..=499 => Category::ClientError,
        500..=599 => Category::ServerError,
        _ => Category::Unknown,
    }
}

/// Responses with these codes must not carry a message body.
pub fn has_no_body(code: u16) -> bool {
    INFORMATIONAL.contains(&code) || code == 204 || code == 304
}

/// The full set behind [`has_no_body`], in ascending order.
pub fn codes_with_no_body() -> impl Iterator<Item = u16> {
    INFORMATIONAL.chain([204, 304])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn known_codes() {
        assert!(!known_code(573));
        assert!(known_code(100));
        assert_eq!(codes().count(), 40);
    }

    #[test]
    fn table_is_sorted() {
        assert!(REASONS.windows(2).all(|pair| pair[0].0 < pair[1].0));
    }

    #[test]
    fn categories() {
        assert_eq!(response_category(186), Category::Informational);
        assert_eq!(response_category(286), Category::Success);
        assert_eq!(response_category(386), Category::Redirection);
        assert_eq!(response_category(404), Category::ClientError);
        assert_eq!(response_category(486), Category::ClientError);
        assert_eq!(response_category(586), Category::ServerError);
        assert_eq!(response_category(999), Category::Unknown);
        assert_eq!(response_category(42), Category::Unknown);
        assert_eq!(Category::ClientError.to_string(), "client_error");
    }

    #[test]
    fn reasons() {
        assert_eq!(reason_for(402), Some("Payment Required"));
        assert_eq!(reason_for(200), Some("OK"));
        assert_eq!(reason_for(505), Some("HTTP Version Not Supported"));
        assert_eq!(reason_for(420), None);
        assert_eq!(reason_for(999), None);
    }

    #[test]
    fn no_body_codes() {
        let expected: HashSet<u16> = (100..=199).chain([204, 304]).collect();
        let actual: HashSet<u16> = codes_with_no_body().collect();
        assert_eq!(actual, expected);

        assert!(has_no_body(204));
        assert!(has_no_body(304));
        assert!(has_no_body(150));
        assert!(!has_no_body(200));
        assert!(!has_no_body(205));
    }
}
