//! Domain rows of the document store and the access policy over them.
//!
//! The relational store itself is an external collaborator; [store::Db] is
//! the in-process registry standing in for it. All document and grant
//! lifecycles go through the model methods here.

pub mod access;
pub mod document;
pub mod fixtures;
pub mod ids;
pub mod store;
pub mod user;

pub use access::Operation;
pub use access::Role;
pub use document::Document;
pub use ids::DocumentId;
pub use ids::UserId;
pub use store::Db;
pub use user::User;
