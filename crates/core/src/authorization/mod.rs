mod operations;
mod types;

pub use operations::{
    dedupe_acls, filter_acls_by_account, filter_acls_by_assignees, filter_usergroups_by_account,
    flatten_resource_ids, group_acls_by_resource_id, partition_resource_groups,
    permission_names_for_acls, user_assignees,
};
pub use types::{
    Acl, AclRule, AssigneeGroup, AssigneeType, PermissionName, ResourceGroup, ResourceType,
    Usergroup,
};
