//! Topic and image type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A subject the library should cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    pub category: String,
    pub keywords: Vec<String>,
    /// Lower number means higher priority.
    pub priority: u8,
}

/// A user-added topic as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomTopic {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default = "default_custom_priority")]
    pub priority: u8,
    pub added_at: DateTime<Utc>,
}

pub(crate) fn default_custom_priority() -> u8 {
    5
}

impl From<CustomTopic> for Topic {
    fn from(custom: CustomTopic) -> Self {
        Self {
            name: custom.name,
            category: custom.category,
            keywords: custom.keywords,
            priority: custom.priority,
        }
    }
}

/// Request to add a custom topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomTopic {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// 1-10, defaults to 5.
    #[serde(default)]
    pub priority: Option<u8>,
}

/// Persisted custom topic document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomTopics {
    #[serde(default)]
    pub topics: Vec<CustomTopic>,
}

/// A per-round shot template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageType {
    pub name: &'static str,
    /// Filename fragment.
    pub suffix: &'static str,
    pub prompt: &'static str,
}

pub const IMAGE_TYPES: [ImageType; 7] = [
    ImageType {
        name: "hero",
        suffix: "hero-exterior",
        prompt: "Single photograph, iconic exterior establishing shot, wide angle, dramatic lighting, professional architectural photography, one image only",
    },
    ImageType {
        name: "interior",
        suffix: "interior-experience",
        prompt: "Single photograph of interior space, showing what visitors see, ambient lighting, inviting atmosphere, one image only",
    },
    ImageType {
        name: "activity",
        suffix: "activity-people",
        prompt: "Single photograph of people enjoying the experience, candid action shot, authentic moment, lifestyle photography, one image only",
    },
    ImageType {
        name: "detail",
        suffix: "detail-closeup",
        prompt: "Single close-up photograph of unique feature, sharp focus, artistic composition, texture and design, one image only",
    },
    ImageType {
        name: "practical",
        suffix: "practical-entrance",
        prompt: "Single photograph showing entrance or location context for visitors, helpful orientation, one image only",
    },
    ImageType {
        name: "sunset",
        suffix: "golden-hour",
        prompt: "Single photograph at golden hour, warm sunset lighting, dramatic sky, atmospheric, romantic mood, one image only",
    },
    ImageType {
        name: "night",
        suffix: "night-illuminated",
        prompt: "Single night photograph, illuminated, city lights, dramatic, modern urban atmosphere, one image only",
    },
];

/// Image type for a round index.
pub fn image_type_for_round(round: usize) -> ImageType {
    IMAGE_TYPES[round % IMAGE_TYPES.len()]
}
