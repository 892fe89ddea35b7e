//! Access policy: who may do what on a document.
//!
//! Two roles only. Owners hold every permission; collaborators may view,
//! edit and download. Callers with no role at all must observe the same
//! outcome as the document not existing — that equivalence lives in a
//! single predicate at the view layer, not here.

/// Role a caller holds on a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Owner,
    Collaborator,
}

/// Operations subject to the access policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    View,
    Edit,
    Reupload,
    Download,
    Delete,
    Share,
}

impl Role {
    /// Label written into audit records.
    pub fn label(self) -> &'static str {
        match self {
            Role::Owner => "Owner",
            Role::Collaborator => "Collaborator",
        }
    }

    /// The permission table.
    pub fn allows(self, operation: Operation) -> bool {
        match (self, operation) {
            (Role::Owner, _) => true,
            (Role::Collaborator, Operation::View | Operation::Edit | Operation::Download) => true,
            (Role::Collaborator, _) => false,
        }
    }
}
