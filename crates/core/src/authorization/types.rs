use serde::{Deserialize, Serialize};

/// Kind of resource an ACL rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Document,
    Collection,
    Account,
}

/// Permission granted by an ACL rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionName {
    View,
    Edit,
    Review,
    Publish,
    Admin,
}

/// Kind of principal an ACL is assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssigneeType {
    User,
    Usergroup,
    Account,
    Public,
}

/// A set of resources of one type, e.g. a document and its ancestors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGroup {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub ids: Vec<String>,
}

impl ResourceGroup {
    /// Creates a resource group of the given type.
    pub fn new<I, S>(resource_type: ResourceType, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            resource_type,
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns a copy of this group carrying only `ids`.
    pub fn with_ids(&self, ids: Vec<String>) -> Self {
        Self {
            resource_type: self.resource_type,
            ids,
        }
    }
}

/// A set of principals of one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssigneeGroup {
    #[serde(rename = "type")]
    pub assignee_type: AssigneeType,
    pub ids: Vec<String>,
}

impl AssigneeGroup {
    /// Creates an assignee group of the given type.
    pub fn new<I, S>(assignee_type: AssigneeType, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            assignee_type,
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// Grants permissions on a group of resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclRule {
    pub resource: ResourceGroup,
    pub permissions: Vec<PermissionName>,
}

/// An access control list scoped to one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Acl {
    pub id: String,
    pub account_id: String,
    pub assignees: Vec<AssigneeGroup>,
    pub rules: Vec<AclRule>,
}

impl Acl {
    /// Creates an ACL without assignees or rules.
    pub fn new(id: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            account_id: account_id.into(),
            assignees: Vec::new(),
            rules: Vec::new(),
        }
    }

    /// Adds an assignee group.
    pub fn with_assignee(mut self, assignee: AssigneeGroup) -> Self {
        self.assignees.push(assignee);
        self
    }

    /// Adds a rule.
    pub fn with_rule(mut self, resource: ResourceGroup, permissions: Vec<PermissionName>) -> Self {
        self.rules.push(AclRule {
            resource,
            permissions,
        });
        self
    }

    /// Returns every resource id referenced by this ACL's rules, in rule order.
    pub fn resource_ids(&self) -> Vec<String> {
        self.rules
            .iter()
            .flat_map(|rule| rule.resource.ids.iter().cloned())
            .collect()
    }
}

/// A named group of users within an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usergroup {
    pub id: String,
    pub account_id: String,
    pub name: String,
}

impl Usergroup {
    /// Creates a usergroup.
    pub fn new(
        id: impl Into<String>,
        account_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            account_id: account_id.into(),
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acl_wire_format() {
        let acl = Acl::new("acl-1", "acc-1")
            .with_assignee(AssigneeGroup::new(AssigneeType::User, ["uid-1"]))
            .with_rule(
                ResourceGroup::new(ResourceType::Document, ["doc-1"]),
                vec![PermissionName::View],
            );
        let json = serde_json::to_value(&acl).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "acl-1",
                "accountId": "acc-1",
                "assignees": [{"type": "user", "ids": ["uid-1"]}],
                "rules": [{
                    "resource": {"type": "document", "ids": ["doc-1"]},
                    "permissions": ["view"]
                }]
            })
        );
    }

    #[test]
    fn test_acl_resource_ids_spans_rules() {
        let acl = Acl::new("acl-1", "acc-1")
            .with_rule(
                ResourceGroup::new(ResourceType::Collection, ["col-1", "col-2"]),
                vec![PermissionName::Edit],
            )
            .with_rule(
                ResourceGroup::new(ResourceType::Document, ["doc-1"]),
                vec![PermissionName::View],
            );
        assert_eq!(acl.resource_ids(), vec!["col-1", "col-2", "doc-1"]);
    }

    #[test]
    fn test_resource_group_with_ids_keeps_type() {
        let group = ResourceGroup::new(ResourceType::Collection, ["a", "b"]);
        let subset = group.with_ids(vec!["b".to_string()]);
        assert_eq!(subset.resource_type, ResourceType::Collection);
        assert_eq!(subset.ids, vec!["b"]);
    }
}
