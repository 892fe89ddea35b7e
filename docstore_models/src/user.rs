use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::ids::UserId;
use crate::store::Db;

/// An authenticated identity, consumed as an opaque reference.
///
/// Profile management belongs to an external collaborator; identities
/// observed in request headers are registered here on first sight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub identity: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Returns the user behind `identity`, registering it on first sight.
    pub fn ensure(db: &Db, identity: &str, name: &str) -> User {
        let user_id = db
            .user_identities
            .entry(identity.to_owned())
            .or_insert_with(UserId::generate)
            .value()
            .clone();
        db.users
            .entry(user_id.clone())
            .or_insert_with(|| User {
                id: user_id.clone(),
                identity: identity.to_owned(),
                name: name.to_owned(),
                created_at: Utc::now(),
            })
            .value()
            .clone()
    }

    pub fn retrieve(db: &Db, user_id: &UserId) -> Option<User> {
        db.users.get(user_id).map(|user| user.value().clone())
    }
}
