mod error;
mod keys;
mod serialization;
mod traits;

pub use error::{CacheError, Result};
pub use keys::{
    kv_key, namespaced_key, proxy_key, ACLS_IDENTIFIER, ACL_RESOURCES_IDENTIFIER,
    ANCESTORS_IDENTIFIER, USERGROUPS_IDENTIFIER,
};
pub use serialization::{
    deserialize_memoized, deserialize_value, serialize_memoized, serialize_value,
    UNDEFINED_SENTINEL,
};
pub use traits::{GetSet, KeyValueStore};
