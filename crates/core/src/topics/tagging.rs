//! Categorisation, search tags, and file naming for assets.

use std::path::PathBuf;

use super::{ImageType, Topic};
use crate::library::{slugify, truncate_slug};

/// Fallback when nothing in the catalog matches.
pub const FALLBACK_TOPIC: &str = "Dubai General";
pub const FALLBACK_CATEGORY: &str = "attractions";

const MATCH_THRESHOLD: u32 = 4;
const MAX_STOCK_TAGS: usize = 15;
const MAX_RESOURCE_TAGS: usize = 10;

/// Pick the best topic for a stock title and tag list.
///
/// A topic scores 10 when its name appears in the text and 2 per keyword
/// hit. The first topic with the highest score wins if it reaches 4.
pub fn categorize(topics: &[Topic], title: &str, tags: &[String]) -> (String, String) {
    let text = format!("{} {}", title, tags.join(" ")).to_lowercase();

    let mut best: Option<&Topic> = None;
    let mut best_score = 0;
    for topic in topics {
        let mut score = 0;
        if text.contains(&topic.name.to_lowercase()) {
            score += 10;
        }
        score += 2 * topic
            .keywords
            .iter()
            .filter(|k| text.contains(&k.to_lowercase()))
            .count() as u32;

        if score > best_score {
            best_score = score;
            best = Some(topic);
        }
    }

    match best {
        Some(topic) if best_score >= MATCH_THRESHOLD => {
            (topic.name.clone(), topic.category.clone())
        }
        _ => (FALLBACK_TOPIC.to_string(), FALLBACK_CATEGORY.to_string()),
    }
}

fn push_unique(tags: &mut Vec<String>, tag: String) {
    if !tag.is_empty() && !tags.contains(&tag) {
        tags.push(tag);
    }
}

/// Search tags for a generated asset.
pub fn search_tags(topic: &Topic, image_type: &ImageType, destination: &str) -> Vec<String> {
    let mut tags = Vec::new();
    push_unique(&mut tags, topic.category.to_lowercase());
    push_unique(&mut tags, topic.name.to_lowercase());
    for keyword in &topic.keywords {
        push_unique(&mut tags, keyword.to_lowercase());
    }
    for tag in [destination.to_lowercase(), "tourism".into(), "travel".into()] {
        push_unique(&mut tags, tag);
    }
    push_unique(&mut tags, image_type.name.to_string());
    tags
}

/// Search tags for a stock asset: topic and source markers first, then up
/// to 10 catalog tags, capped at 15 overall.
pub fn stock_tags(topic: &str, resource_tags: &[String], destination: &str) -> Vec<String> {
    let mut tags = Vec::new();
    for tag in [
        topic.to_lowercase(),
        "freepik".to_string(),
        "stock".to_string(),
        destination.to_lowercase(),
    ] {
        push_unique(&mut tags, tag);
    }
    for tag in resource_tags.iter().take(MAX_RESOURCE_TAGS) {
        push_unique(&mut tags, tag.to_lowercase());
    }
    tags.truncate(MAX_STOCK_TAGS);
    tags
}

/// `{category}/{topic-slug}`
pub fn generated_dir(topic: &Topic) -> PathBuf {
    PathBuf::from(slugify(&topic.category)).join(slugify(&topic.name))
}

/// `{category}-{topic}-{suffix}-{style}-{kw1-kw2}-{destination}.jpg`
pub fn generated_filename(
    topic: &Topic,
    image_type: &ImageType,
    style: &str,
    destination: &str,
) -> String {
    let keywords = topic
        .keywords
        .iter()
        .take(2)
        .map(|k| slugify(k))
        .filter(|k| !k.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    let parts = [
        slugify(&topic.category),
        slugify(&topic.name),
        image_type.suffix.to_string(),
        slugify(style),
        keywords,
        slugify(destination),
    ];
    let stem = parts
        .iter()
        .filter(|p| !p.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join("-");
    format!("{}.jpg", stem)
}

/// `freepik/{topic-slug}`
pub fn stock_dir(topic: &str) -> PathBuf {
    PathBuf::from("freepik").join(slugify(topic))
}

/// `freepik-{id}-{title-slug up to 40}.jpg`
pub fn stock_filename(resource_id: &str, title: &str) -> String {
    let title = truncate_slug(&slugify(title), 40);
    let title = if title.is_empty() {
        "freepik-image".to_string()
    } else {
        title
    };
    format!("freepik-{}-{}.jpg", slugify(resource_id), title)
}
