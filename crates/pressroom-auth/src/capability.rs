//! Role capabilities
//!
//! The single table mapping each role to what it may do. Route policy and
//! handlers both consult this instead of comparing role names.

use pressroom_db::UserRole;

/// A named permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    AccessAdmin,
    ManageUsers,
    CreatePosts,
    EditOwnPosts,
    EditOthersPosts,
    DeletePosts,
    ManageCategories,
    Comment,
}

const ADMIN: &[Capability] = &[
    Capability::AccessAdmin,
    Capability::ManageUsers,
    Capability::CreatePosts,
    Capability::EditOwnPosts,
    Capability::EditOthersPosts,
    Capability::DeletePosts,
    Capability::ManageCategories,
    Capability::Comment,
];

const AUTHOR: &[Capability] = &[
    Capability::CreatePosts,
    Capability::EditOwnPosts,
    Capability::Comment,
];

const EDITOR: &[Capability] = &[
    Capability::CreatePosts,
    Capability::EditOwnPosts,
    Capability::EditOthersPosts,
    Capability::ManageCategories,
    Capability::Comment,
];

const READER: &[Capability] = &[Capability::Comment];

/// Capability lookup for anything that carries a role
pub trait Capabilities {
    fn capabilities(&self) -> &'static [Capability];

    fn has(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

impl Capabilities for UserRole {
    fn capabilities(&self) -> &'static [Capability] {
        match self {
            UserRole::Admin => ADMIN,
            UserRole::Author => AUTHOR,
            UserRole::Editor => EDITOR,
            UserRole::Reader => READER,
        }
    }
}
