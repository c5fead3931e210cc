//! Request methods accepted on a request line.

use http::Method;

/// Methods a request line may start with.
pub const METHODS: [&str; 16] = [
    "CONNECT",
    "COPY",
    "DELETE",
    "GET",
    "HEAD",
    "LOCK",
    "MKCOL",
    "MOVE",
    "OPTIONS",
    "PATCH",
    "POST",
    "PROPFIND",
    "PROPPATCH",
    "PUT",
    "TRACE",
    "UNLOCK",
];

const LONGEST_METHOD: usize = 9;

pub fn is_known(token: &[u8]) -> bool {
    METHODS.iter().any(|m| m.as_bytes() == token)
}

/// Returns true if some known method starts with `partial`.
pub fn is_known_prefix(partial: &[u8]) -> bool {
    partial.len() <= LONGEST_METHOD && METHODS.iter().any(|m| m.as_bytes().starts_with(partial))
}

/// Converts a known method token into an [`http::Method`].
pub(crate) fn to_method(token: &str) -> Option<Method> {
    if is_known(token.as_bytes()) { Method::from_bytes(token.as_bytes()).ok() } else { None }
}
