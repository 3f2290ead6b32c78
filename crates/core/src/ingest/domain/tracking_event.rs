use serde::{Deserialize, Deserializer};

use crate::shared::face_box::FaceBox;

/// One person sighting as published by the upstream tracker.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TrackingEvent {
    #[serde(deserialize_with = "string_or_number")]
    pub camera_id: String,
    pub frame_num: u64,
    #[serde(rename = "object_id")]
    pub track_id: u32,
    pub bbox_left: f64,
    pub bbox_top: f64,
    pub bbox_width: f64,
    pub bbox_height: f64,
}

impl TrackingEvent {
    /// Key of the frame in the frame cache: `<camera_id>_<frame_num>`.
    pub fn frame_key(&self) -> String {
        format!("{}_{}", self.camera_id, self.frame_num)
    }

    /// Body box in frame pixels, unclamped.
    pub fn bbox(&self) -> FaceBox {
        FaceBox::from_f64([
            self.bbox_left,
            self.bbox_top,
            self.bbox_left + self.bbox_width,
            self.bbox_top + self.bbox_height,
        ])
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}
