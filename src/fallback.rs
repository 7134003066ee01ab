//! Ordered fallback chains.
//!
//! Both the date patterns and the JSON endpoint variants are "try each
//! candidate in priority order, stop at the first one that works". These two
//! helpers are that loop, once.

use std::future::Future;

/// Return the first `Some` produced by `attempt`, trying `candidates` in order.
pub fn first_match<C, T>(
    candidates: impl IntoIterator<Item = C>,
    mut attempt: impl FnMut(C) -> Option<T>,
) -> Option<T> {
    for candidate in candidates {
        if let Some(found) = attempt(candidate) {
            return Some(found);
        }
    }
    None
}

/// Await `attempt` for each candidate in order and return the first non-empty
/// result. Later candidates are never started once one succeeds.
pub async fn first_non_empty<C, T, F, Fut>(
    candidates: impl IntoIterator<Item = C>,
    mut attempt: F,
) -> Option<Vec<T>>
where
    F: FnMut(C) -> Fut,
    Fut: Future<Output = Vec<T>>,
{
    for candidate in candidates {
        let found = attempt(candidate).await;
        if !found.is_empty() {
            return Some(found);
        }
    }
    None
}
