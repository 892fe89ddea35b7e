use std::collections::HashSet;

use dashmap::DashMap;

use crate::document::Document;
use crate::ids::DocumentId;
use crate::ids::UserId;
use crate::user::User;

/// In-process registry standing in for the external relational store.
///
/// One logical store, no replication. Rows live in concurrent maps; all
/// lifecycle mutations go through the model methods, which keep the grant
/// set consistent with the document rows.
#[derive(Debug, Default)]
pub struct Db {
    pub(crate) documents: DashMap<DocumentId, Document>,
    pub(crate) users: DashMap<UserId, User>,
    pub(crate) user_identities: DashMap<String, UserId>,
    pub(crate) shares: DashMap<DocumentId, HashSet<UserId>>,
}

impl Db {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn has_share(&self, document_id: &DocumentId, user_id: &UserId) -> bool {
        self.shares
            .get(document_id)
            .is_some_and(|granted| granted.contains(user_id))
    }
}
