//! Per-topic progress toward the target count.

use std::collections::{BTreeSet, HashMap};

use crate::topics::Topic;

/// In-memory view of topic counts and the completed-topic set for one run.
///
/// Counts are seeded from the library at the start of a run and advanced as
/// images are persisted.
#[derive(Debug, Clone)]
pub struct TopicProgressTracker {
    counts: HashMap<String, u64>,
    completed: BTreeSet<String>,
    target: u64,
}

impl TopicProgressTracker {
    pub fn new(counts: HashMap<String, u64>, completed: BTreeSet<String>, target: u64) -> Self {
        Self {
            counts,
            completed,
            target,
        }
    }

    pub fn target(&self) -> u64 {
        self.target
    }

    pub fn count(&self, topic: &str) -> u64 {
        self.counts.get(topic).copied().unwrap_or(0)
    }

    pub fn is_complete(&self, topic: &str) -> bool {
        self.count(topic) >= self.target
    }

    /// Images still needed for a topic.
    pub fn remaining(&self, topic: &str) -> u64 {
        self.target.saturating_sub(self.count(topic))
    }

    /// Record one more image. Returns the new count.
    pub fn advance(&mut self, topic: &str) -> u64 {
        let count = self.counts.entry(topic.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// Add a topic to the completed set. Returns true if it was not there yet.
    pub fn mark_complete(&mut self, topic: &str) -> bool {
        self.completed.insert(topic.to_string())
    }

    pub fn is_marked_complete(&self, topic: &str) -> bool {
        self.completed.contains(topic)
    }

    pub fn completed(&self) -> &BTreeSet<String> {
        &self.completed
    }

    /// Topics still needing work, in input order, capped at `max_topics`.
    pub fn backlog(&self, topics: &[Topic], max_topics: usize) -> Vec<Topic> {
        topics
            .iter()
            .filter(|t| !self.completed.contains(&t.name) && !self.is_complete(&t.name))
            .take(max_topics)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(name: &str, priority: u8) -> Topic {
        Topic {
            name: name.to_string(),
            category: "attractions".to_string(),
            keywords: vec![],
            priority,
        }
    }

    #[test]
    fn test_count_and_advance() {
        let mut tracker = TopicProgressTracker::new(HashMap::new(), BTreeSet::new(), 3);
        assert_eq!(tracker.count("a"), 0);
        assert_eq!(tracker.remaining("a"), 3);
        assert_eq!(tracker.advance("a"), 1);
        assert_eq!(tracker.advance("a"), 2);
        assert!(!tracker.is_complete("a"));
        tracker.advance("a");
        assert!(tracker.is_complete("a"));
        assert_eq!(tracker.remaining("a"), 0);
    }

    #[test]
    fn test_mark_complete_once() {
        let mut tracker = TopicProgressTracker::new(HashMap::new(), BTreeSet::new(), 1);
        assert!(tracker.mark_complete("a"));
        assert!(!tracker.mark_complete("a"));
        assert!(tracker.is_marked_complete("a"));
    }

    #[test]
    fn test_backlog_excludes_done_topics() {
        let counts = HashMap::from([("full".to_string(), 10), ("partial".to_string(), 4)]);
        let completed = BTreeSet::from(["marked".to_string()]);
        let tracker = TopicProgressTracker::new(counts, completed, 10);

        let topics = vec![
            topic("full", 1),
            topic("marked", 1),
            topic("partial", 2),
            topic("fresh", 3),
            topic("later", 4),
        ];
        let backlog = tracker.backlog(&topics, 2);
        let names: Vec<_> = backlog.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["partial", "fresh"]);
    }

    #[test]
    fn test_marked_topic_stays_excluded_after_deletions() {
        // Count dropped below target after deletions, but the topic was marked.
        let counts = HashMap::from([("done".to_string(), 2)]);
        let completed = BTreeSet::from(["done".to_string()]);
        let tracker = TopicProgressTracker::new(counts, completed, 10);

        assert!(tracker.backlog(&[topic("done", 1)], 10).is_empty());
    }
}
