use serde::Deserialize;
use serde::Serialize;
use utoipa::ToSchema;

/// 10 uppercase hex chars drawn from a v4 UUID.
///
/// Short enough to be readable, random enough to be unguessable; ids are
/// the externally visible reference and must not be enumerable.
fn short_uuid() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..10].to_uppercase()
}

#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
    ToSchema,
)]
#[schema(value_type = String)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn generate() -> Self {
        Self(short_uuid())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
    ToSchema,
)]
#[schema(value_type = String)]
pub struct UserId(String);

impl UserId {
    pub fn generate() -> Self {
        Self(short_uuid())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_short_uppercase_hex() {
        let id = DocumentId::generate();
        assert_eq!(id.as_str().len(), 10);
        assert!(
            id.as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }

    #[test]
    fn generated_ids_do_not_repeat() {
        let a = UserId::generate();
        let b = UserId::generate();
        assert_ne!(a, b);
    }
}
