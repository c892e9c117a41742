//! Types shared by the generation pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Generation provider family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    OpenAi,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
        }
    }

    /// Provider assigned to a batch slot: even slots go to Gemini, odd to OpenAI.
    pub fn for_slot(slot: usize) -> Self {
        if slot % 2 == 0 {
            ProviderKind::Gemini
        } else {
            ProviderKind::OpenAi
        }
    }

    pub fn other(&self) -> Self {
        match self {
            ProviderKind::Gemini => ProviderKind::OpenAi,
            ProviderKind::OpenAi => ProviderKind::Gemini,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named visual style appended to the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StyleVariation {
    pub name: &'static str,
    pub prompt: &'static str,
}

/// The fixed style rotation. Slot `i` of a batch uses `STYLE_VARIATIONS[i % 5]`.
pub const STYLE_VARIATIONS: [StyleVariation; 5] = [
    StyleVariation {
        name: "realistic",
        prompt: "Photorealistic, high resolution, professional DSLR photography, sharp details",
    },
    StyleVariation {
        name: "cinematic",
        prompt: "Cinematic look, dramatic lighting, movie still, widescreen composition",
    },
    StyleVariation {
        name: "editorial",
        prompt: "Editorial style, magazine quality, vibrant colors, lifestyle photography",
    },
    StyleVariation {
        name: "architectural",
        prompt: "Architectural photography, clean lines, symmetrical, professional real estate",
    },
    StyleVariation {
        name: "vibrant",
        prompt: "Vibrant colors, high saturation, travel brochure style, eye-catching",
    },
];

/// Style for a batch slot.
pub fn style_for_slot(slot: usize) -> StyleVariation {
    STYLE_VARIATIONS[slot % STYLE_VARIATIONS.len()]
}

/// One unit of work for the dispatcher.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub slot: usize,
    pub provider: ProviderKind,
    pub style: StyleVariation,
    pub prompt: String,
}

/// A successful generation.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub slot: usize,
    pub provider: ProviderKind,
    pub style: StyleVariation,
    pub prompt: String,
    pub bytes: Vec<u8>,
}

/// Build the provider-specific prompt for a subject.
pub fn build_prompt(
    provider: ProviderKind,
    subject: &str,
    destination: &str,
    base_prompt: &str,
    style: &StyleVariation,
) -> String {
    match provider {
        ProviderKind::Gemini => format!(
            "Single photograph of {} in {}. {}. {}. One image only, no collage.",
            subject, destination, base_prompt, style.prompt
        ),
        ProviderKind::OpenAi => format!(
            "One single photograph showing {} in {}. {}. {}. No collage, single image only.",
            subject, destination, base_prompt, style.prompt
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_rotation_wraps() {
        assert_eq!(style_for_slot(0).name, "realistic");
        assert_eq!(style_for_slot(4).name, "vibrant");
        assert_eq!(style_for_slot(5).name, "realistic");
        assert_eq!(style_for_slot(7).name, "editorial");
    }

    #[test]
    fn test_provider_alternates() {
        assert_eq!(ProviderKind::for_slot(0), ProviderKind::Gemini);
        assert_eq!(ProviderKind::for_slot(1), ProviderKind::OpenAi);
        assert_eq!(ProviderKind::for_slot(2), ProviderKind::Gemini);
    }

    #[test]
    fn test_build_prompt_mentions_everything() {
        let style = style_for_slot(1);
        let prompt = build_prompt(
            ProviderKind::OpenAi,
            "Dubai Frame",
            "Dubai",
            "Golden hour lighting",
            &style,
        );
        assert!(prompt.starts_with("One single photograph showing Dubai Frame in Dubai."));
        assert!(prompt.contains("Golden hour lighting"));
        assert!(prompt.contains("Cinematic look"));
    }

    #[test]
    fn test_provider_kind_serde() {
        assert_eq!(
            serde_json::to_string(&ProviderKind::OpenAi).unwrap(),
            "\"openai\""
        );
    }
}
