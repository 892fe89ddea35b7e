//! Ready-made rows for tests.

use crate::document::Document;
use crate::store::Db;
use crate::user::User;

pub fn create_user(db: &Db, identity: &str) -> User {
    User::ensure(db, identity, identity)
}

pub fn create_document(db: &Db, owner: &User) -> Document {
    Document::create_for(db, owner.id.clone())
}
