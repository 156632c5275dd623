//! Presentation-facing selection rules.
//!
//! Rendering lives in the consumer, but the rules that decide WHICH cached
//! items reach it are part of the coordinator contract: ordering, then
//! truncation, then the optional summarization filter. All pure functions
//! over a cached sequence.

use std::collections::BTreeMap;

use regex::Regex;

use crate::config::{CoordinatorConfig, TaskOrder};
use crate::error::ConfigError;
use crate::model::{Snapshot, TaskRecord};

/// Compiled display options, built once from a validated configuration.
#[derive(Debug, Clone)]
pub struct DisplayOptions {
    pub order: TaskOrder,
    pub maximum_entries: usize,
    /// In summarized lists, titles matching this are shown even when not
    /// starred.
    pub always_show: Option<Regex>,
}

impl DisplayOptions {
    pub fn from_config(config: &CoordinatorConfig) -> Result<Self, ConfigError> {
        let always_show = config
            .always_show_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| ConfigError::InvalidValue {
                key: "always_show_pattern".to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            order: config.order,
            maximum_entries: config.maximum_entries,
            always_show,
        })
    }
}

/// The displayed subset of one list plus the full unfiltered count, for
/// "Name (total)" style headings.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView {
    pub entries: Vec<TaskRecord>,
    pub total: usize,
}

/// Apply the ordering preference. Stable: equal elements keep their
/// relative position in both directions.
pub fn ordered_todos(items: &[TaskRecord], order: TaskOrder) -> Vec<TaskRecord> {
    let mut out = items.to_vec();
    if order == TaskOrder::Reversed {
        out.reverse();
    }
    out
}

/// Select the displayed entries for one list: order, cap to
/// `maximum_entries`, then (for summarized lists) keep only starred items
/// and always-show matches. `total` always reports the unfiltered cache
/// count.
pub fn list_view(items: &[TaskRecord], options: &DisplayOptions, summarized: bool) -> ListView {
    let total = items.len();
    let mut entries = ordered_todos(items, options.order);
    entries.truncate(options.maximum_entries);

    if summarized {
        entries.retain(|task| {
            task.starred
                || options
                    .always_show
                    .as_ref()
                    .is_some_and(|re| re.is_match(&task.title))
        });
    }

    ListView { entries, total }
}

/// Build the displayed view of every list in a snapshot, applying the
/// configuration's ordering, cap, and per-list summarization flag.
pub fn snapshot_views(
    snapshot: &Snapshot,
    config: &CoordinatorConfig,
) -> Result<BTreeMap<String, ListView>, ConfigError> {
    let options = DisplayOptions::from_config(config)?;
    Ok(snapshot
        .iter()
        .map(|(name, items)| {
            let view = list_view(items, &options, config.is_summarized(name));
            (name.clone(), view)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(title: &str, starred: bool) -> TaskRecord {
        TaskRecord {
            id: 0,
            title: title.to_string(),
            starred,
            due_date: None,
            assignee_id: None,
            list_id: 1,
        }
    }

    fn options(order: TaskOrder, max: usize, pattern: Option<&str>) -> DisplayOptions {
        DisplayOptions {
            order,
            maximum_entries: max,
            always_show: pattern.map(|p| Regex::new(p).unwrap()),
        }
    }

    #[test]
    fn reversed_order_flips_the_sequence() {
        let items = vec![task("A", false), task("B", true)];
        let out = ordered_todos(&items, TaskOrder::Reversed);
        assert_eq!(out[0].title, "B");
        assert_eq!(out[1].title, "A");
    }

    #[test]
    fn natural_order_is_untouched() {
        let items = vec![task("A", false), task("B", true)];
        let out = ordered_todos(&items, TaskOrder::Normal);
        assert_eq!(out[0].title, "A");
    }

    #[test]
    fn truncation_applies_after_ordering() {
        let items = vec![task("A", false), task("B", false), task("C", false)];
        let view = list_view(&items, &options(TaskOrder::Reversed, 2, None), false);
        assert_eq!(view.entries.len(), 2);
        assert_eq!(view.entries[0].title, "C");
        assert_eq!(view.entries[1].title, "B");
        assert_eq!(view.total, 3);
    }

    #[test]
    fn summarized_view_keeps_starred_and_pattern_matches() {
        let items = vec![
            task("buy milk", false),
            task("urgent: call bank", false),
            task("gift", true),
        ];
        let view = list_view(&items, &options(TaskOrder::Normal, 10, Some("urgent")), true);
        let titles: Vec<&str> = view.entries.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["urgent: call bank", "gift"]);
        assert_eq!(view.total, 3);
    }

    #[test]
    fn summarized_view_without_pattern_keeps_only_starred() {
        let items = vec![task("a", false), task("b", true)];
        let view = list_view(&items, &options(TaskOrder::Normal, 10, None), true);
        assert_eq!(view.entries.len(), 1);
        assert!(view.entries[0].starred);
    }

    #[test]
    fn snapshot_views_summarizes_only_flagged_lists() {
        let config = CoordinatorConfig {
            summarize: vec!["Work".to_string()],
            always_show_pattern: Some("urgent".to_string()),
            ..Default::default()
        };
        let mut snapshot = Snapshot::new();
        snapshot.insert(
            "Work".to_string(),
            vec![task("buy milk", false), task("urgent: call bank", false)],
        );
        snapshot.insert("Home".to_string(), vec![task("water plants", false)]);

        let views = snapshot_views(&snapshot, &config).unwrap();
        assert_eq!(views["Work"].entries.len(), 1);
        assert_eq!(views["Work"].entries[0].title, "urgent: call bank");
        assert_eq!(views["Work"].total, 2);
        // Not flagged for summarization: shown unfiltered.
        assert_eq!(views["Home"].entries.len(), 1);
    }

    #[test]
    fn from_config_rejects_invalid_pattern() {
        let config = CoordinatorConfig {
            always_show_pattern: Some("[unclosed".to_string()),
            ..Default::default()
        };
        let err = DisplayOptions::from_config(&config).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { key, .. } if key == "always_show_pattern")
        );
    }

    #[test]
    fn empty_cache_yields_empty_view() {
        let view = list_view(&[], &options(TaskOrder::Normal, 10, None), true);
        assert!(view.entries.is_empty());
        assert_eq!(view.total, 0);
    }
}
