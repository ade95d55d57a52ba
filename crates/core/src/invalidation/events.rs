use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cache::CacheError;

/// Discriminant of an [`AnyInvalidateEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidateEventName {
    Acl,
    Account,
    Collection,
    Document,
    Usergroup,
    User,
}

impl InvalidateEventName {
    /// Every event name, in registry order.
    pub const ALL: [InvalidateEventName; 6] = [
        InvalidateEventName::Acl,
        InvalidateEventName::Account,
        InvalidateEventName::Collection,
        InvalidateEventName::Document,
        InvalidateEventName::Usergroup,
        InvalidateEventName::User,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidateEventName::Acl => "acl",
            InvalidateEventName::Account => "account",
            InvalidateEventName::Collection => "collection",
            InvalidateEventName::Document => "document",
            InvalidateEventName::Usergroup => "usergroup",
            InvalidateEventName::User => "user",
        }
    }
}

impl fmt::Display for InvalidateEventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle phase of the write that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    Create,
    Update,
    Delete,
}

impl LifecyclePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecyclePhase::Create => "create",
            LifecyclePhase::Update => "update",
            LifecyclePhase::Delete => "delete",
        }
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecyclePhase {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(LifecyclePhase::Create),
            "update" => Ok(LifecyclePhase::Update),
            "delete" => Ok(LifecyclePhase::Delete),
            other => Err(CacheError::Configuration(format!(
                "unknown lifecycle phase: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AclInvalidateEvent {
    pub acl_id: String,
    pub account_id: String,
    pub resource_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInvalidateEvent {
    pub account_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionInvalidateEvent {
    pub collection_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInvalidateEvent {
    pub document_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsergroupInvalidateEvent {
    pub group_id: String,
    pub user_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInvalidateEvent {
    pub user_id: String,
}

/// A change to a domain entity that may leave cached data stale.
///
/// Serialized as `{"name": "<event name>", ...fields}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase")]
pub enum AnyInvalidateEvent {
    Acl(AclInvalidateEvent),
    Account(AccountInvalidateEvent),
    Collection(CollectionInvalidateEvent),
    Document(DocumentInvalidateEvent),
    Usergroup(UsergroupInvalidateEvent),
    User(UserInvalidateEvent),
}

impl AnyInvalidateEvent {
    pub fn name(&self) -> InvalidateEventName {
        match self {
            AnyInvalidateEvent::Acl(_) => InvalidateEventName::Acl,
            AnyInvalidateEvent::Account(_) => InvalidateEventName::Account,
            AnyInvalidateEvent::Collection(_) => InvalidateEventName::Collection,
            AnyInvalidateEvent::Document(_) => InvalidateEventName::Document,
            AnyInvalidateEvent::Usergroup(_) => InvalidateEventName::Usergroup,
            AnyInvalidateEvent::User(_) => InvalidateEventName::User,
        }
    }

    pub fn acl<I, S>(acl_id: impl Into<String>, account_id: impl Into<String>, resource_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AnyInvalidateEvent::Acl(AclInvalidateEvent {
            acl_id: acl_id.into(),
            account_id: account_id.into(),
            resource_ids: resource_ids.into_iter().map(Into::into).collect(),
        })
    }

    pub fn account(account_id: impl Into<String>) -> Self {
        AnyInvalidateEvent::Account(AccountInvalidateEvent {
            account_id: account_id.into(),
        })
    }

    pub fn collection(collection_id: impl Into<String>) -> Self {
        AnyInvalidateEvent::Collection(CollectionInvalidateEvent {
            collection_id: collection_id.into(),
        })
    }

    pub fn document(document_id: impl Into<String>) -> Self {
        AnyInvalidateEvent::Document(DocumentInvalidateEvent {
            document_id: document_id.into(),
        })
    }

    pub fn usergroup<I, S>(group_id: impl Into<String>, user_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AnyInvalidateEvent::Usergroup(UsergroupInvalidateEvent {
            group_id: group_id.into(),
            user_ids: user_ids.into_iter().map(Into::into).collect(),
        })
    }

    pub fn user(user_id: impl Into<String>) -> Self {
        AnyInvalidateEvent::User(UserInvalidateEvent {
            user_id: user_id.into(),
        })
    }
}

/// Groups events by name, keeping each group's events in input order.
pub fn group_events_by_name(
    events: &[AnyInvalidateEvent],
) -> BTreeMap<InvalidateEventName, Vec<AnyInvalidateEvent>> {
    let mut grouped: BTreeMap<InvalidateEventName, Vec<AnyInvalidateEvent>> = BTreeMap::new();
    for event in events {
        grouped.entry(event.name()).or_default().push(event.clone());
    }
    grouped
}
