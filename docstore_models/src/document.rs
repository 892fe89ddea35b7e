use std::collections::HashSet;

use chrono::DateTime;
use chrono::Utc;
use docstore_storage::ContentHandle;
use serde::Deserialize;
use serde::Serialize;

use crate::access::Role;
use crate::ids::DocumentId;
use crate::ids::UserId;
use crate::store::Db;
use crate::user::User;

/// A shared document: exactly one owner, explicitly granted collaborators,
/// and an audit trail embedded in its backing content blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    /// Set once at creation, immutable thereafter.
    pub owner: UserId,
    /// Backing blob, absent until first materialized. Once set it never
    /// goes back to `None`.
    pub content_ref: Option<ContentHandle>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Inserts a new document owned by `owner`, content not yet
    /// materialized.
    pub fn create_for(db: &Db, owner: UserId) -> Document {
        let now = Utc::now();
        let document = Document {
            id: DocumentId::generate(),
            owner,
            content_ref: None,
            created_at: now,
            updated_at: now,
        };
        db.documents
            .insert(document.id.clone(), document.clone());
        document
    }

    pub fn retrieve(db: &Db, document_id: &DocumentId) -> Option<Document> {
        db.documents
            .get(document_id)
            .map(|document| document.value().clone())
    }

    pub fn exists(db: &Db, document_id: &DocumentId) -> bool {
        db.documents.contains_key(document_id)
    }

    /// Documents the user owns or collaborates on, newest-created first.
    pub fn list_for_user(db: &Db, user_id: &UserId) -> Vec<Document> {
        let mut documents = db
            .documents
            .iter()
            .filter(|document| {
                document.owner == *user_id || db.has_share(&document.id, user_id)
            })
            .map(|document| document.value().clone())
            .collect::<Vec<_>>();
        documents.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        documents
    }

    /// Marks content as materialized and returns the updated row.
    pub fn set_content_ref(
        db: &Db,
        document_id: &DocumentId,
        handle: ContentHandle,
    ) -> Option<Document> {
        db.documents.get_mut(document_id).map(|mut document| {
            document.content_ref = Some(handle);
            document.updated_at = Utc::now();
            document.clone()
        })
    }

    /// Refreshes `updated_at` after a content-affecting mutation.
    pub fn touch(db: &Db, document_id: &DocumentId) -> Option<Document> {
        db.documents.get_mut(document_id).map(|mut document| {
            document.updated_at = Utc::now();
            document.clone()
        })
    }

    /// Removes the document and cascades its collaborator grants.
    pub fn delete(db: &Db, document_id: &DocumentId) -> bool {
        let removed = db.documents.remove(document_id).is_some();
        if removed {
            db.shares.remove(document_id);
        }
        removed
    }

    /// Role of `user_id` for this document, if any.
    pub fn role_of(&self, db: &Db, user_id: &UserId) -> Option<Role> {
        if self.owner == *user_id {
            Some(Role::Owner)
        } else if db.has_share(&self.id, user_id) {
            Some(Role::Collaborator)
        } else {
            None
        }
    }

    /// Bulk-grants access to the users behind `candidate_ids`.
    ///
    /// Unresolvable ids are dropped silently, ids already granted are
    /// skipped, the owner is never granted to their own document.
    /// Idempotent: overlapping calls converge on the union of their lists.
    pub fn add_shared_users(&self, db: &Db, candidate_ids: &[String]) {
        let mut granted = db.shares.entry(self.id.clone()).or_default();
        for candidate in candidate_ids {
            let user_id = UserId::from(candidate.as_str());
            let Some(user) = User::retrieve(db, &user_id) else {
                tracing::debug!(candidate = candidate.as_str(), "dropping unresolvable share candidate");
                continue;
            };
            if user.id == self.owner {
                continue;
            }
            granted.insert(user.id);
        }
    }

    /// Collaborators of this document.
    pub fn shared_users(&self, db: &Db) -> HashSet<UserId> {
        db.shares
            .get(&self.id)
            .map(|granted| granted.value().clone())
            .unwrap_or_default()
    }
}
