//! Marker parsing cache

use ahash::AHashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::trace;

use crate::environment::Environment;
use crate::error::Result;
use crate::marker::evaluator::evaluate;
use crate::marker::lexer;
use crate::marker::node::{Node, TRUE};

/// Most parsed markers kept at once; a full cache is emptied before the
/// next insert
pub const MAX_CACHED_MARKERS: usize = 4096;

/// Global marker cache with fast hashing (ahash)
static MARKER_CACHE: Lazy<RwLock<AHashMap<String, Node>>> =
    Lazy::new(|| RwLock::new(AHashMap::with_capacity(256)));

/// Get or parse a marker string, using cache for repeated markers
#[inline]
pub fn get_or_parse(marker: &str) -> Result<Node> {
    // Fast path: check read lock first
    {
        let cache = MARKER_CACHE.read();
        if let Some(node) = cache.get(marker) {
            trace!(marker, "marker cache hit");
            return Ok(node.clone());
        }
    }

    // Slow path: parse and cache; errors are not cached
    let node = lexer::parse(marker)?;
    trace!(marker, "marker cache miss");

    store(&mut MARKER_CACHE.write(), marker, &node, MAX_CACHED_MARKERS);

    Ok(node)
}

fn store(cache: &mut AHashMap<String, Node>, marker: &str, node: &Node, limit: usize) {
    if cache.len() >= limit && !cache.contains_key(marker) {
        trace!(entries = cache.len(), "marker cache full, clearing");
        cache.clear();
    }
    cache.insert(marker.to_string(), node.clone());
}

/// Evaluate a marker string against an environment, using cached trees
///
/// An empty marker places no restriction and evaluates to `True`.
#[inline]
pub fn evaluate_marker(marker: &str, env: &Environment) -> Result<Node> {
    if marker.trim().is_empty() {
        return Ok(TRUE);
    }

    let node = get_or_parse(marker)?;
    Ok(evaluate(&node, env))
}

/// Clear the marker cache
pub fn clear_cache() {
    MARKER_CACHE.write().clear();
}

/// Number of cached markers
pub fn cache_size() -> usize {
    MARKER_CACHE.read().len()
}
