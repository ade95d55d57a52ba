use serde_json::Value;

use super::Result;

/// Identifier of the ACL-list-per-resource cache.
pub const ACLS_IDENTIFIER: &str = "acls";

/// Identifier of the resource-ids-with-ACL-per-account set cache.
pub const ACL_RESOURCES_IDENTIFIER: &str = "acl-resources";

/// Identifier of the parent-ids-per-item cache.
pub const ANCESTORS_IDENTIFIER: &str = "ancestors";

/// Identifier of the usergroups-per-user cache.
pub const USERGROUPS_IDENTIFIER: &str = "usergroups";

/// Returns the namespaced key used by a prefixed cache: `{prefix}-{version}-{key}`.
///
/// This is a plain join. A `-` inside `prefix` or `key` makes the boundaries
/// ambiguous, so `("a-b", 1, "c")` and `("a", 1, ...)` style keys are not
/// guaranteed to be distinguishable.
pub fn namespaced_key(prefix: &str, version: u32, key: &str) -> String {
    format!("{}-{}-{}", prefix, version, key)
}

/// Returns the versioned key used by a typed key/value cache:
/// `{identifier}/{version}/{key}`.
pub fn kv_key(identifier: &str, version: u32, key: &str) -> String {
    format!("{}/{}/{}", identifier, version, key)
}

/// Returns the memoization key for a method invocation.
///
/// The method name and every argument are JSON-encoded independently and
/// joined with `-`.
///
/// # Examples
///
/// ```
/// use persistcache_core::cache::proxy_key;
/// use serde_json::json;
///
/// let key = proxy_key("double", &[json!(21)]).unwrap();
/// assert_eq!(key, "\"double\"-21");
/// ```
pub fn proxy_key(method: &str, args: &[Value]) -> Result<String> {
    let mut parts = Vec::with_capacity(args.len() + 1);
    parts.push(serde_json::to_string(method)?);
    for arg in args {
        parts.push(serde_json::to_string(arg)?);
    }
    Ok(parts.join("-"))
}
