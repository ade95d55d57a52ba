use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::types::{Acl, AssigneeGroup, AssigneeType, PermissionName, ResourceGroup, Usergroup};

/// Collects the ids of all groups, dropping duplicates but keeping first-seen order.
pub fn flatten_resource_ids(groups: &[ResourceGroup]) -> Vec<String> {
    let mut seen = HashSet::new();
    groups
        .iter()
        .flat_map(|group| group.ids.iter())
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

/// Splits every group's ids into those accepted by `is_found` and the rest.
///
/// A group shows up in an output only if it keeps at least one id there, so
/// one input group may be split across both outputs.
pub fn partition_resource_groups<F>(
    groups: &[ResourceGroup],
    is_found: F,
) -> (Vec<ResourceGroup>, Vec<ResourceGroup>)
where
    F: Fn(&str) -> bool,
{
    let mut found = Vec::new();
    let mut not_found = Vec::new();
    for group in groups {
        let (hits, misses): (Vec<String>, Vec<String>) =
            group.ids.iter().cloned().partition(|id| is_found(id));
        if !hits.is_empty() {
            found.push(group.with_ids(hits));
        }
        if !misses.is_empty() {
            not_found.push(group.with_ids(misses));
        }
    }
    (found, not_found)
}

/// Indexes ACLs by every resource id their rules mention.
pub fn group_acls_by_resource_id(acls: &[Acl]) -> BTreeMap<String, Vec<Acl>> {
    let mut grouped: BTreeMap<String, Vec<Acl>> = BTreeMap::new();
    for acl in acls {
        for resource_id in acl.resource_ids() {
            grouped.entry(resource_id).or_default().push(acl.clone());
        }
    }
    grouped
}

/// Drops ACLs with an id already seen, keeping first-seen order.
pub fn dedupe_acls(acls: Vec<Acl>) -> Vec<Acl> {
    let mut seen = HashSet::new();
    acls.into_iter()
        .filter(|acl| seen.insert(acl.id.clone()))
        .collect()
}

/// Keeps ACLs of the given account.
pub fn filter_acls_by_account(acls: Vec<Acl>, account_id: &str) -> Vec<Acl> {
    acls.into_iter()
        .filter(|acl| acl.account_id == account_id)
        .collect()
}

/// Keeps ACLs assigned to at least one of the given principals.
pub fn filter_acls_by_assignees(assignees: &[AssigneeGroup], acls: Vec<Acl>) -> Vec<Acl> {
    acls.into_iter()
        .filter(|acl| {
            acl.assignees.iter().any(|acl_assignee| {
                assignees.iter().any(|wanted| {
                    wanted.assignee_type == acl_assignee.assignee_type
                        && wanted.ids.iter().any(|id| acl_assignee.ids.contains(id))
                })
            })
        })
        .collect()
}

/// Returns the distinct permissions granted by the ACLs, sorted.
pub fn permission_names_for_acls(acls: &[Acl]) -> Vec<PermissionName> {
    acls.iter()
        .flat_map(|acl| acl.rules.iter())
        .flat_map(|rule| rule.permissions.iter().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Keeps usergroups of the given account.
pub fn filter_usergroups_by_account(groups: Vec<Usergroup>, account_id: &str) -> Vec<Usergroup> {
    groups
        .into_iter()
        .filter(|group| group.account_id == account_id)
        .collect()
}

/// Principals a user acts as: each of their usergroups, then the user.
pub fn user_assignees(user_id: &str, groups: &[Usergroup]) -> Vec<AssigneeGroup> {
    groups
        .iter()
        .map(|group| AssigneeGroup::new(AssigneeType::Usergroup, [group.id.as_str()]))
        .chain(std::iter::once(AssigneeGroup::new(
            AssigneeType::User,
            [user_id],
        )))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorization::ResourceType;

    fn doc_group(ids: &[&str]) -> ResourceGroup {
        ResourceGroup::new(ResourceType::Document, ids.iter().copied())
    }

    fn col_group(ids: &[&str]) -> ResourceGroup {
        ResourceGroup::new(ResourceType::Collection, ids.iter().copied())
    }

    #[test]
    fn test_flatten_resource_ids_dedupes_in_order() {
        let groups = vec![doc_group(&["d1", "d2"]), col_group(&["c1", "d2"])];
        assert_eq!(flatten_resource_ids(&groups), vec!["d1", "d2", "c1"]);
    }

    #[test]
    fn test_partition_splits_group_across_outputs() {
        let groups = vec![doc_group(&["d1", "d2"]), col_group(&["c1"])];
        let (found, not_found) = partition_resource_groups(&groups, |id| id == "d1");

        assert_eq!(found, vec![doc_group(&["d1"])]);
        assert_eq!(not_found, vec![doc_group(&["d2"]), col_group(&["c1"])]);
    }

    #[test]
    fn test_partition_all_found() {
        let groups = vec![doc_group(&["d1"]), col_group(&["c1"])];
        let (found, not_found) = partition_resource_groups(&groups, |_| true);
        assert_eq!(found, groups);
        assert!(not_found.is_empty());
    }

    #[test]
    fn test_partition_empty_group_is_dropped() {
        let groups = vec![doc_group(&[])];
        let (found, not_found) = partition_resource_groups(&groups, |_| true);
        assert!(found.is_empty());
        assert!(not_found.is_empty());
    }

    #[test]
    fn test_group_acls_by_resource_id() {
        let acl1 = Acl::new("acl-1", "acc").with_rule(doc_group(&["d1", "d2"]), vec![]);
        let acl2 = Acl::new("acl-2", "acc").with_rule(doc_group(&["d2"]), vec![]);

        let grouped = group_acls_by_resource_id(&[acl1.clone(), acl2.clone()]);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["d1"], vec![acl1.clone()]);
        assert_eq!(grouped["d2"], vec![acl1, acl2]);
    }

    #[test]
    fn test_dedupe_acls() {
        let acl1 = Acl::new("acl-1", "acc");
        let acl2 = Acl::new("acl-2", "acc");
        let deduped = dedupe_acls(vec![acl1.clone(), acl2.clone(), acl1.clone()]);
        assert_eq!(deduped, vec![acl1, acl2]);
    }

    #[test]
    fn test_filter_acls_by_account() {
        let kept = Acl::new("acl-1", "acc-1");
        let dropped = Acl::new("acl-2", "acc-2");
        assert_eq!(filter_acls_by_account(vec![kept.clone(), dropped], "acc-1"), vec![kept]);
    }

    #[test]
    fn test_filter_acls_by_assignees() {
        let for_user = Acl::new("acl-1", "acc")
            .with_assignee(AssigneeGroup::new(AssigneeType::User, ["uid-1"]));
        let for_group = Acl::new("acl-2", "acc")
            .with_assignee(AssigneeGroup::new(AssigneeType::Usergroup, ["gid-1"]));
        let for_other = Acl::new("acl-3", "acc")
            .with_assignee(AssigneeGroup::new(AssigneeType::User, ["uid-2"]));

        let assignees = vec![
            AssigneeGroup::new(AssigneeType::User, ["uid-1"]),
            AssigneeGroup::new(AssigneeType::Usergroup, ["gid-1"]),
        ];
        let matched =
            filter_acls_by_assignees(&assignees, vec![for_user.clone(), for_group.clone(), for_other]);

        assert_eq!(matched, vec![for_user, for_group]);
    }

    #[test]
    fn test_filter_acls_by_assignees_requires_same_type() {
        let acl = Acl::new("acl-1", "acc")
            .with_assignee(AssigneeGroup::new(AssigneeType::Usergroup, ["x"]));
        let assignees = vec![AssigneeGroup::new(AssigneeType::User, ["x"])];
        assert!(filter_acls_by_assignees(&assignees, vec![acl]).is_empty());
    }

    #[test]
    fn test_permission_names_sorted_and_distinct() {
        let acl1 = Acl::new("acl-1", "acc").with_rule(
            doc_group(&["d1"]),
            vec![PermissionName::Edit, PermissionName::View],
        );
        let acl2 = Acl::new("acl-2", "acc").with_rule(doc_group(&["d1"]), vec![PermissionName::View]);
        assert_eq!(
            permission_names_for_acls(&[acl1, acl2]),
            vec![PermissionName::View, PermissionName::Edit]
        );
    }

    #[test]
    fn test_filter_usergroups_by_account() {
        let g1 = Usergroup::new("g1", "acc-1", "Editors");
        let g2 = Usergroup::new("g2", "acc-2", "Readers");
        assert_eq!(filter_usergroups_by_account(vec![g1.clone(), g2], "acc-1"), vec![g1]);
    }

    #[test]
    fn test_user_assignees_lists_groups_before_user() {
        let groups = vec![
            Usergroup::new("g1", "acc", "Editors"),
            Usergroup::new("g2", "acc", "Readers"),
        ];

        assert_eq!(
            user_assignees("u1", &groups),
            vec![
                AssigneeGroup::new(AssigneeType::Usergroup, ["g1"]),
                AssigneeGroup::new(AssigneeType::Usergroup, ["g2"]),
                AssigneeGroup::new(AssigneeType::User, ["u1"]),
            ]
        );
        assert_eq!(
            user_assignees("u1", &[]),
            vec![AssigneeGroup::new(AssigneeType::User, ["u1"])]
        );
    }
}
