use serde::{Deserialize, Deserializer, Serialize};

/// A stored resume. One document per principal, keyed by `user_id`.
///
/// `user_id` and `updated_at` are owned by the server and only ever set by
/// `ResumeContent::stamp`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Resume {
    #[serde(deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(flatten)]
    pub content: ResumeContent,
    /// Epoch milliseconds of the last write.
    #[serde(deserialize_with = "null_as_default")]
    pub updated_at: i64,
}

/// The client-editable part of a resume, as accepted in request bodies.
///
/// Has no `userId` / `updatedAt` fields, so whatever a client sends under
/// those keys (of any type) is dropped with the other unknown keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeContent {
    pub personal_info: Option<PersonalInfo>,
    pub professional_summary: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub education: Vec<Education>,
    #[serde(deserialize_with = "null_as_default")]
    pub projects: Vec<Project>,
    #[serde(deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub degree: Option<String>,
    pub institution: Option<String>,
    pub year: Option<String>,
    pub cgpa: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub title: Option<String>,
    pub description: Option<String>,
    pub technologies: Option<String>,
}

/// Treats an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ResumeContent {
    /// Turns client content into a document owned by `user_id`.
    pub fn stamp(self, user_id: &str, updated_at: i64) -> Resume {
        Resume {
            user_id: user_id.to_string(),
            content: self,
            updated_at,
        }
    }
}
