use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;

/// Hardcoded directory standing in for authentication. The dashboard only
/// ever needed to know who is acting, not to verify them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MockUser {
    pub id: &'static str,
    pub name: &'static str,
    pub role: &'static str,
}

static MOCK_USERS: &[MockUser] = &[
    MockUser {
        id: "u-medical-1",
        name: "Dr. Gabriel Caamano",
        role: "occupational-physician",
    },
    MockUser {
        id: "u-medical-2",
        name: "Dra. Lucia Ferreyra",
        role: "occupational-physician",
    },
    MockUser {
        id: "u-hr-1",
        name: "Marina Soler",
        role: "hr-analyst",
    },
    MockUser {
        id: "u-supervisor-1",
        name: "Pablo Quiroga",
        role: "sector-supervisor",
    },
];

static USER_INDEX: Lazy<HashMap<&'static str, &'static MockUser>> =
    Lazy::new(|| MOCK_USERS.iter().map(|user| (user.id, user)).collect());

pub fn mock_users() -> &'static [MockUser] {
    MOCK_USERS
}

pub fn find_user(id: &str) -> Option<&'static MockUser> {
    USER_INDEX.get(id).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_users_resolve() {
        let user = find_user("u-medical-1").expect("user exists");
        assert_eq!(user.role, "occupational-physician");
        assert!(find_user("nobody").is_none());
    }

    #[test]
    fn directory_is_not_empty() {
        assert!(!mock_users().is_empty());
    }
}
