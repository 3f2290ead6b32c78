use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use crate::identity::domain::description::ConsolidatedDescription;
use crate::identity::domain::record_store::Fields;

pub const BODY_DIR: &str = "body_dir";
pub const FACE_DIR: &str = "face_dir";
pub const DESCRIPTION: &str = "description";
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

/// Typed view over the stored fields of one identity.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct IdentityRecord {
    pub id: u32,
    pub body_dir: Option<PathBuf>,
    pub face_dir: Option<PathBuf>,
    pub description: Option<ConsolidatedDescription>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl IdentityRecord {
    pub fn from_fields(id: u32, fields: &Fields) -> Self {
        let text = |key: &str| fields.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            id,
            body_dir: text(BODY_DIR).map(PathBuf::from),
            face_dir: text(FACE_DIR).map(PathBuf::from),
            description: fields
                .get(DESCRIPTION)
                .and_then(ConsolidatedDescription::from_value),
            created_at: text(CREATED_AT),
            updated_at: text(UPDATED_AT),
        }
    }
}

/// A record plus the image files currently present in its directories.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IdentityListing {
    #[serde(flatten)]
    pub record: IdentityRecord,
    pub body_images: Vec<PathBuf>,
    pub face_images: Vec<PathBuf>,
}
