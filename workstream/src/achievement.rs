use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The clustering core's view of an achievement: an id and its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedItem {
    pub id: String,
    pub vector: Vec<f32>,
}

impl EmbeddedItem {
    pub fn new(id: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            vector,
        }
    }
}

impl AsRef<[f32]> for EmbeddedItem {
    fn as_ref(&self) -> &[f32] {
        &self.vector
    }
}

/// Who put an achievement into its workstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkstreamSource {
    /// Assigned by clustering or nearest-centroid matching.
    Ai,
    /// Chosen by a person.
    User,
}

/// An achievement record as handed over by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_start: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workstream_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workstream_source: Option<WorkstreamSource>,
}

impl Achievement {
    /// Projects to an [`EmbeddedItem`] when an embedding is present.
    pub fn embedded(&self) -> Option<EmbeddedItem> {
        self.embedding
            .as_ref()
            .map(|v| EmbeddedItem::new(self.id.clone(), v.clone()))
    }
}

/// Narrows the achievement population before clustering.
///
/// Time bounds apply to `event_start`: `since` inclusive, `until` exclusive.
/// Achievements without a start date are excluded once either bound is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AchievementFilter {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub project_ids: Option<Vec<String>>,
}

impl AchievementFilter {
    pub fn matches(&self, a: &Achievement) -> bool {
        if self.since.is_some() || self.until.is_some() {
            let Some(start) = a.event_start else {
                return false;
            };
            if self.since.is_some_and(|since| start < since) {
                return false;
            }
            if self.until.is_some_and(|until| start >= until) {
                return false;
            }
        }
        if let Some(ids) = &self.project_ids {
            match &a.project_id {
                Some(p) if ids.contains(p) => {}
                _ => return false,
            }
        }
        true
    }
}

/// Filtered achievements that carry an embedding.
pub fn embedded_items(achievements: &[Achievement], filter: &AchievementFilter) -> Vec<EmbeddedItem> {
    achievements
        .iter()
        .filter(|a| filter.matches(a))
        .filter_map(Achievement::embedded)
        .collect()
}

/// Like [`embedded_items`], restricted to achievements in no workstream.
pub fn unassigned_items(achievements: &[Achievement], filter: &AchievementFilter) -> Vec<EmbeddedItem> {
    achievements
        .iter()
        .filter(|a| a.workstream_id.is_none() && filter.matches(a))
        .filter_map(Achievement::embedded)
        .collect()
}

/// Count of achievements still lacking an embedding.
pub fn missing_embeddings(achievements: &[Achievement]) -> usize {
    achievements.iter().filter(|a| a.embedding.is_none()).count()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn achievement(id: &str, day: Option<u32>, project: Option<&str>, embedded: bool) -> Achievement {
        Achievement {
            id: id.into(),
            title: format!("title {id}"),
            summary: None,
            project_id: project.map(Into::into),
            project_name: None,
            event_start: day.map(|d| Utc.with_ymd_and_hms(2025, 3, d, 12, 0, 0).unwrap()),
            embedding: embedded.then(|| vec![1.0, 0.0]),
            workstream_id: None,
            workstream_source: None,
        }
    }

    #[test]
    fn no_filter_keeps_embedded_only() {
        let all = vec![
            achievement("a", None, None, true),
            achievement("b", Some(1), None, false),
            achievement("c", Some(2), Some("p"), true),
        ];
        let items = embedded_items(&all, &AchievementFilter::default());
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(missing_embeddings(&all), 1);
    }

    #[test]
    fn time_bounds() {
        let all = vec![
            achievement("early", Some(1), None, true),
            achievement("edge", Some(10), None, true),
            achievement("mid", Some(15), None, true),
            achievement("end", Some(20), None, true),
            achievement("undated", None, None, true),
        ];
        let filter = AchievementFilter {
            since: Some(Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()),
            until: Some(Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap()),
            project_ids: None,
        };
        let ids: Vec<String> = embedded_items(&all, &filter).into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["edge", "mid"]);
    }

    #[test]
    fn project_allow_list() {
        let all = vec![
            achievement("a", None, Some("p1"), true),
            achievement("b", None, Some("p2"), true),
            achievement("c", None, None, true),
        ];
        let filter = AchievementFilter {
            project_ids: Some(vec!["p2".into()]),
            ..Default::default()
        };
        let ids: Vec<String> = embedded_items(&all, &filter).into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn unassigned_skips_members() {
        let mut member = achievement("m", None, None, true);
        member.workstream_id = Some("ws".into());
        member.workstream_source = Some(WorkstreamSource::User);
        let all = vec![member, achievement("free", None, None, true)];

        let ids: Vec<String> = unassigned_items(&all, &AchievementFilter::default())
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec!["free"]);
    }

    #[test]
    fn deserialize_minimal_record() {
        let a: Achievement = serde_json::from_str(
            r#"{"id":"x","title":"Shipped it","event_start":"2025-01-02T03:04:05Z","workstream_source":"ai"}"#,
        )
        .unwrap();
        assert_eq!(a.id, "x");
        assert!(a.embedding.is_none());
        assert_eq!(a.workstream_source, Some(WorkstreamSource::Ai));
        assert!(a.event_start.is_some());
    }
}
