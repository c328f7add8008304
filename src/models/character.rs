use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use surrealdb::{Datetime, RecordId};

use crate::db::connection::CanonDb;
use crate::DramaturgError;

/// Narrative role of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CharacterRole {
    Protagonist,
    Antagonist,
    #[default]
    Supporting,
    Extra,
}

impl CharacterRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CharacterRole::Protagonist => "protagonist",
            CharacterRole::Antagonist => "antagonist",
            CharacterRole::Supporting => "supporting",
            CharacterRole::Extra => "extra",
        }
    }
}

/// Character entity as stored in database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub id: RecordId,
    pub drama: RecordId,
    pub name: String,
    /// Whitespace-free, lowercased name; the merge key within a drama.
    pub name_key: String,
    pub role: CharacterRole,
    pub age: Option<i64>,
    pub occupation: Option<String>,
    pub personality: Option<String>,
    pub backstory: Option<String>,
    pub arc: Option<String>,
    pub created_at: Datetime,
    pub updated_at: Datetime,
}

/// Data for creating a new character.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct CharacterCreate {
    pub drama: RecordId,
    pub name: String,
    pub name_key: String,
    pub role: CharacterRole,
    pub age: Option<i64>,
    pub occupation: Option<String>,
    pub personality: Option<String>,
    pub backstory: Option<String>,
    pub arc: Option<String>,
}

/// Data for updating a character. Only `Some` fields are written.
#[skip_serializing_none]
#[derive(Debug, Default, Clone, Serialize)]
pub struct CharacterUpdate {
    pub name: Option<String>,
    pub role: Option<CharacterRole>,
    pub age: Option<i64>,
    pub occupation: Option<String>,
    pub personality: Option<String>,
    pub backstory: Option<String>,
    pub arc: Option<String>,
}

impl CharacterUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.role.is_none()
            && self.age.is_none()
            && self.occupation.is_none()
            && self.personality.is_none()
            && self.backstory.is_none()
            && self.arc.is_none()
    }
}

/// Merge key for character names: case-insensitive, whitespace-insensitive.
///
/// ```
/// use dramaturg::models::character::name_key;
/// assert_eq!(name_key(" Kim  Seo-yeon "), name_key("kimseo-yeon"));
/// ```
pub fn name_key(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

pub async fn create_character(
    db: &CanonDb,
    data: CharacterCreate,
) -> Result<Character, DramaturgError> {
    let result: Option<Character> = db.create("character").content(data).await?;
    result.ok_or_else(|| DramaturgError::Database("Failed to create character".into()))
}

/// List all characters of a drama, ordered by name.
pub async fn list_characters(
    db: &CanonDb,
    drama: &RecordId,
) -> Result<Vec<Character>, DramaturgError> {
    let mut response = db
        .query("SELECT * FROM character WHERE drama = $drama ORDER BY name ASC")
        .bind(("drama", drama.clone()))
        .await?;
    let result: Vec<Character> = response.take(0)?;
    Ok(result)
}

/// Update a character by record id.
///
/// Returns `NotFound` when the record no longer exists.
pub async fn update_character(
    db: &CanonDb,
    id: &RecordId,
    data: CharacterUpdate,
) -> Result<Character, DramaturgError> {
    let result: Option<Character> = db.update(id.clone()).merge(data).await?;
    result.ok_or_else(|| DramaturgError::not_found("character", id.key().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_key_folds_case_and_space() {
        assert_eq!(name_key("김서연"), "김서연");
        assert_eq!(name_key(" 김 서연 "), "김서연");
        assert_eq!(name_key("Alice SMITH"), "alicesmith");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&CharacterRole::Antagonist).unwrap();
        assert_eq!(json, "\"antagonist\"");
        assert!(serde_json::from_str::<CharacterRole>("\"hero\"").is_err());
    }
}
