//! Renders a decision as a feed of display items
//!
//! The feed always has at least one item: when there is nothing to show a
//! single placeholder item says so.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use super::{AlertRecord, Decision, LocationQuery, ResolutionError, Snapshot, SnapshotState};

/// Feed handed to the renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feed {
    pub title: String,
    pub description: String,
    pub item: Vec<FeedItem>,
    /// Set when the items are last-known alerts served during an outage
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stale: bool,
    /// Why the location could not be resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One display item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedItem {
    pub title: String,
    pub description: String,
    #[serde(rename = "pubDate")]
    pub pub_date: Option<DateTime<FixedOffset>>,
    pub link: Option<String>,
}

/// Map a decision into the feed for `location`
pub fn present(decision: &Decision, location: &LocationQuery) -> Feed {
    let title = format!("{} weather alerts", location);
    let mut description = format!("Active weather hazard alerts for {}", location);

    let snapshot = decision.snapshot();
    let item = match (SnapshotState::of(snapshot), snapshot) {
        (SnapshotState::Active, Some(snapshot)) => snapshot
            .alerts
            .iter()
            .map(|record| alert_item(record, snapshot.link.clone()))
            .collect(),
        (SnapshotState::Empty, Some(snapshot)) => vec![calm_item(snapshot, location)],
        _ => vec![no_data_item(location)],
    };

    if let Decision::Fallback(snapshot) = decision {
        description.push_str(&format!(
            " (upstream unavailable, showing last known alerts fetched {})",
            snapshot.fetched_at.format("%Y-%m-%d %H:%M UTC")
        ));
    }

    Feed {
        title,
        description,
        item,
        stale: decision.is_fallback(),
        error: None,
    }
}

/// Feed standing in for a location that could not be resolved
pub fn present_unresolved(location: &LocationQuery, error: &ResolutionError) -> Feed {
    Feed {
        title: format!("{} weather alerts", location),
        description: format!("No weather alerts could be looked up for {}", location),
        item: vec![FeedItem {
            title: format!("Location not recognized: {}", location),
            description: error.to_string(),
            pub_date: None,
            link: None,
        }],
        stale: false,
        error: Some(error.to_string()),
    }
}

fn alert_item(record: &AlertRecord, link: Option<String>) -> FeedItem {
    FeedItem {
        title: record.title.clone(),
        description: record.description.clone(),
        pub_date: Some(record.pub_time),
        link,
    }
}

/// Placeholder for a live fetch that reported no alerts
fn calm_item(snapshot: &Snapshot, location: &LocationQuery) -> FeedItem {
    FeedItem {
        title: format!("No active weather alert for {}", location),
        description: "The weather service reports no active hazard alerts.".to_string(),
        pub_date: Some(snapshot.updated_at.unwrap_or_else(|| snapshot.fetched_at.into())),
        link: snapshot.link.clone(),
    }
}

/// Placeholder for an outage with nothing cached
fn no_data_item(location: &LocationQuery) -> FeedItem {
    FeedItem {
        title: format!("Weather alert data unavailable for {}", location),
        description: "The weather service could not be reached and no earlier alerts are known."
            .to_string(),
        pub_date: None,
        link: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::test_support::snapshot;

    fn city_x() -> LocationQuery {
        LocationQuery::new("City-X")
    }

    #[test]
    fn test_each_alert_becomes_an_item_with_shared_link() {
        let decision = Decision::Current(snapshot(&["Typhoon Warning", "Rainstorm Warning"]));

        let feed = present(&decision, &city_x());

        assert_eq!(feed.title, "City-X weather alerts");
        assert_eq!(feed.item.len(), 2);
        assert_eq!(feed.item[0].title, "Typhoon Warning");
        assert_eq!(feed.item[0].description, "Typhoon Warning in effect");
        assert_eq!(feed.item[1].title, "Rainstorm Warning");
        assert!(feed.item.iter().all(|i| i.link == feed.item[0].link && i.link.is_some()));
        assert!(!feed.stale);
    }

    #[test]
    fn test_empty_snapshot_yields_single_calm_placeholder() {
        let decision = Decision::Current(snapshot(&[]));

        let feed = present(&decision, &city_x());

        assert_eq!(feed.item.len(), 1);
        assert!(feed.item[0].title.starts_with("No active weather alert"));
        assert!(feed.item[0].pub_date.is_some());
    }

    #[test]
    fn test_no_data_yields_single_unavailable_placeholder() {
        let feed = present(&Decision::NoData, &city_x());

        assert_eq!(feed.item.len(), 1);
        assert!(feed.item[0].title.contains("unavailable"));
        assert!(feed.item[0].link.is_none());
        assert!(!feed.stale);
    }

    #[test]
    fn test_fallback_is_flagged_stale_with_original_records() {
        let last_active = snapshot(&["Typhoon Warning"]);
        let decision = Decision::Fallback(last_active.clone());

        let feed = present(&decision, &city_x());

        assert!(feed.stale);
        assert!(feed.description.contains("last known alerts"));
        assert_eq!(feed.item.len(), 1);
        assert_eq!(feed.item[0].title, last_active.alerts[0].title);
        assert_eq!(feed.item[0].pub_date, Some(last_active.alerts[0].pub_time));
    }

    #[test]
    fn test_serialized_shape() {
        let feed = present(&Decision::Current(snapshot(&["Gale"])), &city_x());

        let json = serde_json::to_value(&feed).unwrap();

        assert!(json.get("stale").is_none(), "stale is omitted when false");
        assert!(json.get("error").is_none());
        let item = &json["item"][0];
        assert_eq!(item["title"], "Gale");
        assert!(item.get("pubDate").is_some());
        assert!(item.get("link").is_some());
    }

    #[test]
    fn test_unresolved_location_gets_error_feed() {
        let error = ResolutionError::NoCandidates("Atlantis".to_string());

        let feed = present_unresolved(&LocationQuery::new("Atlantis"), &error);

        assert_eq!(feed.title, "Atlantis weather alerts");
        assert_eq!(feed.item.len(), 1);
        assert!(feed.item[0].pub_date.is_none());
        assert_eq!(feed.error.as_deref(), Some("Location not recognized: 'Atlantis'"));
        assert!(!feed.stale);
    }
}
