//! Role-based access policy
//!
//! Every protected operation is a (resource, action) pair. The pairs and the
//! roles allowed to perform them live in one table; handlers never list
//! roles themselves.

use serde::{Deserialize, Serialize};

use crate::models::{Direction, Role};

/// Resources exposed by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Product,
    Supplier,
    Transaction,
    Order,
    Notification,
    Forecast,
    User,
}

impl Resource {
    pub const ALL: [Resource; 7] = [
        Resource::Product,
        Resource::Supplier,
        Resource::Transaction,
        Resource::Order,
        Resource::Notification,
        Resource::Forecast,
        Resource::User,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Product => "product",
            Resource::Supplier => "supplier",
            Resource::Transaction => "transaction",
            Resource::Order => "order",
            Resource::Notification => "notification",
            Resource::Forecast => "forecast",
            Resource::User => "user",
        }
    }
}

/// Actions that can be performed on resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Create, Action::Read, Action::Update, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

/// One row of the policy table
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub resource: Resource,
    pub action: Action,
    pub roles: &'static [Role],
}

const ANY: &[Role] = &[Role::Admin, Role::Manager, Role::Staff];
const ADMIN_MANAGER: &[Role] = &[Role::Admin, Role::Manager];
const ADMIN: &[Role] = &[Role::Admin];
const NOBODY: &[Role] = &[];

const fn rule(resource: Resource, action: Action, roles: &'static [Role]) -> Rule {
    Rule {
        resource,
        action,
        roles,
    }
}

/// Operation policy. Pairs missing from the table are denied to everyone.
pub const POLICY: &[Rule] = &[
    rule(Resource::Product, Action::Create, ADMIN_MANAGER),
    rule(Resource::Product, Action::Read, ANY),
    rule(Resource::Product, Action::Update, ADMIN_MANAGER),
    rule(Resource::Product, Action::Delete, ADMIN),
    rule(Resource::Supplier, Action::Create, ADMIN_MANAGER),
    rule(Resource::Supplier, Action::Read, ANY),
    rule(Resource::Supplier, Action::Update, ADMIN_MANAGER),
    rule(Resource::Supplier, Action::Delete, ADMIN),
    rule(Resource::Transaction, Action::Create, ANY),
    rule(Resource::Transaction, Action::Read, ANY),
    rule(Resource::Transaction, Action::Update, ADMIN_MANAGER),
    rule(Resource::Transaction, Action::Delete, ADMIN),
    rule(Resource::Order, Action::Create, ADMIN_MANAGER),
    rule(Resource::Order, Action::Read, ANY),
    rule(Resource::Order, Action::Update, ADMIN_MANAGER),
    rule(Resource::Order, Action::Delete, ADMIN),
    rule(Resource::Notification, Action::Read, ANY),
    rule(Resource::Forecast, Action::Read, ANY),
    rule(Resource::User, Action::Create, ADMIN),
];

/// Directions each role may record when creating a movement
pub const MOVEMENT_POLICY: &[(Role, &[Direction])] = &[
    (Role::Admin, &[Direction::In, Direction::Out]),
    (Role::Manager, &[Direction::In, Direction::Out]),
    (Role::Staff, &[Direction::Out]),
];

/// Roles allowed to perform `action` on `resource`
pub fn allowed_roles(resource: Resource, action: Action) -> &'static [Role] {
    POLICY
        .iter()
        .find(|rule| rule.resource == resource && rule.action == action)
        .map(|rule| rule.roles)
        .unwrap_or(NOBODY)
}

/// The role gate
pub fn allowed(required: &[Role], actual: Role) -> bool {
    required.contains(&actual)
}

pub fn is_permitted(role: Role, resource: Resource, action: Action) -> bool {
    allowed(allowed_roles(resource, action), role)
}

/// Whether `role` may record a new movement in `direction`
pub fn may_record(role: Role, direction: Direction) -> bool {
    MOVEMENT_POLICY
        .iter()
        .find(|(r, _)| *r == role)
        .is_some_and(|(_, directions)| directions.contains(&direction))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_matches_access_matrix() {
        use Action::*;
        use Resource::*;
        use Role::*;

        let expected: &[(Resource, Action, &[Role])] = &[
            (Product, Create, &[Admin, Manager]),
            (Product, Read, &[Admin, Manager, Staff]),
            (Product, Update, &[Admin, Manager]),
            (Product, Delete, &[Admin]),
            (Supplier, Create, &[Admin, Manager]),
            (Supplier, Read, &[Admin, Manager, Staff]),
            (Supplier, Update, &[Admin, Manager]),
            (Supplier, Delete, &[Admin]),
            (Transaction, Create, &[Admin, Manager, Staff]),
            (Transaction, Read, &[Admin, Manager, Staff]),
            (Transaction, Update, &[Admin, Manager]),
            (Transaction, Delete, &[Admin]),
            (Order, Create, &[Admin, Manager]),
            (Order, Read, &[Admin, Manager, Staff]),
            (Order, Update, &[Admin, Manager]),
            (Order, Delete, &[Admin]),
        ];

        for (resource, action, roles) in expected {
            for role in Role::ALL {
                assert_eq!(
                    is_permitted(role, *resource, *action),
                    roles.contains(&role),
                    "{:?} {:?} {:?}",
                    role,
                    resource,
                    action
                );
            }
        }
    }

    #[test]
    fn test_unlisted_pairs_are_denied() {
        for role in Role::ALL {
            assert!(!is_permitted(role, Resource::Notification, Action::Delete));
            assert!(!is_permitted(role, Resource::Forecast, Action::Create));
        }
        assert!(allowed_roles(Resource::User, Action::Read).is_empty());
    }

    #[test]
    fn test_policy_has_no_duplicate_rows() {
        for (i, a) in POLICY.iter().enumerate() {
            for b in &POLICY[i + 1..] {
                assert!(!(a.resource == b.resource && a.action == b.action));
            }
        }
    }

    #[test]
    fn test_staff_may_only_record_out() {
        assert!(may_record(Role::Staff, Direction::Out));
        assert!(!may_record(Role::Staff, Direction::In));
        for role in [Role::Admin, Role::Manager] {
            assert!(may_record(role, Direction::In));
            assert!(may_record(role, Direction::Out));
        }
    }

    #[test]
    fn test_allowed_is_membership() {
        assert!(allowed(&[Role::Admin], Role::Admin));
        assert!(!allowed(&[Role::Admin], Role::Manager));
        assert!(!allowed(&[], Role::Admin));
    }
}
