//! Crate internal helpers.

/// Returns early with `$error` if `$predicate` does not hold.
///
/// The `assert!` of fallible code:
///
/// ```ignore
/// ensure!(items.len() % 2 == 0, HeadersError::OddArguments { len: items.len() });
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
