//! Role-scoped dashboard navigation.

use crate::db::Role;

/// One dashboard menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub label: &'static str,
    pub path: &'static str,
    pub icon: &'static str,
}

const STUDENT_MENU: &[NavItem] = &[
    NavItem {
        label: "Dashboard",
        path: "/dashboard",
        icon: "home",
    },
    NavItem {
        label: "My Applications",
        path: "/dashboard/my-applications",
        icon: "file-text",
    },
    NavItem {
        label: "My Reviews",
        path: "/dashboard/my-reviews",
        icon: "star",
    },
    NavItem {
        label: "My Payments",
        path: "/dashboard/my-payments",
        icon: "credit-card",
    },
];

const MODERATOR_MENU: &[NavItem] = &[
    NavItem {
        label: "Dashboard",
        path: "/dashboard",
        icon: "home",
    },
    NavItem {
        label: "Manage Applications",
        path: "/dashboard/manage-applications",
        icon: "inbox",
    },
    NavItem {
        label: "All Reviews",
        path: "/dashboard/all-reviews",
        icon: "star",
    },
];

const ADMIN_MENU: &[NavItem] = &[
    NavItem {
        label: "Dashboard",
        path: "/dashboard",
        icon: "home",
    },
    NavItem {
        label: "Add Scholarship",
        path: "/dashboard/add-scholarship",
        icon: "plus",
    },
    NavItem {
        label: "Manage Scholarships",
        path: "/dashboard/manage-scholarships",
        icon: "award",
    },
    NavItem {
        label: "Manage Users",
        path: "/dashboard/manage-users",
        icon: "users",
    },
    NavItem {
        label: "Analytics",
        path: "/dashboard/analytics",
        icon: "bar-chart",
    },
];

/// The menu for a role. Exactly one menu per role; the student menu doubles
/// as the fallback because unknown role strings already parse to `Student`.
pub fn menu_for(role: Role) -> &'static [NavItem] {
    match role {
        Role::Student => STUDENT_MENU,
        Role::Moderator => MODERATOR_MENU,
        Role::Admin => ADMIN_MENU,
    }
}
