//! Human-readable reports joining clustering output with achievement
//! metadata (titles, projects, dates) that the core itself never looks at.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::achievement::Achievement;
use crate::assign::Assignment;
use crate::recluster::Regroup;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementLine {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_start: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkstreamBreakdown {
    pub workstream_id: String,
    pub name: String,
    pub achievements: Vec<AchievementLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegroupReport {
    pub workstreams_created: usize,
    pub achievements_assigned: usize,
    pub outlier_count: usize,
    pub epsilon: f32,
    pub workstreams: Vec<WorkstreamBreakdown>,
    pub outliers: Vec<AchievementLine>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentReport {
    pub assigned_count: usize,
    pub unassigned_count: usize,
    pub workstreams: Vec<WorkstreamBreakdown>,
    pub unassigned: Vec<AchievementLine>,
    pub summary: String,
}

/// Looks up achievement metadata by id; unknown ids fall back to the id.
struct Lines<'a> {
    by_id: HashMap<&'a str, &'a Achievement>,
}

impl<'a> Lines<'a> {
    fn new(achievements: &'a [Achievement]) -> Self {
        Self {
            by_id: achievements.iter().map(|a| (a.id.as_str(), a)).collect(),
        }
    }

    fn line(&self, id: &str) -> AchievementLine {
        match self.by_id.get(id) {
            Some(a) => AchievementLine {
                id: a.id.clone(),
                title: a.title.clone(),
                project_name: a.project_name.clone(),
                event_start: a.event_start,
            },
            None => AchievementLine {
                id: id.to_string(),
                title: id.to_string(),
                project_name: None,
                event_start: None,
            },
        }
    }
}

pub fn regroup_breakdown(regroup: &Regroup, achievements: &[Achievement]) -> RegroupReport {
    let lines = Lines::new(achievements);
    let workstreams: Vec<WorkstreamBreakdown> = regroup
        .workstreams
        .iter()
        .map(|w| WorkstreamBreakdown {
            workstream_id: w.id.clone(),
            name: w.name.clone(),
            achievements: w.achievement_ids.iter().map(|id| lines.line(id)).collect(),
        })
        .collect();
    let outliers: Vec<AchievementLine> = regroup.outliers.iter().map(|id| lines.line(id)).collect();

    let total = regroup.achievements_assigned() + regroup.outlier_count();
    let summary = format!(
        "Created {} from {}: {} assigned, {} left unassigned.",
        plural(regroup.workstreams_created(), "workstream"),
        plural(total, "achievement"),
        regroup.achievements_assigned(),
        regroup.outlier_count(),
    );

    RegroupReport {
        workstreams_created: regroup.workstreams_created(),
        achievements_assigned: regroup.achievements_assigned(),
        outlier_count: regroup.outlier_count(),
        epsilon: regroup.epsilon,
        workstreams,
        outliers,
        summary,
    }
}

/// `workstream_names` maps existing workstream ids to display names; ids
/// without a name are shown as-is.
pub fn assignment_breakdown(
    assignment: &Assignment,
    achievements: &[Achievement],
    workstream_names: &HashMap<String, String>,
) -> AssignmentReport {
    let lines = Lines::new(achievements);
    let workstreams: Vec<WorkstreamBreakdown> = assignment
        .assigned
        .iter()
        .map(|(ws, list)| WorkstreamBreakdown {
            workstream_id: ws.clone(),
            name: workstream_names.get(ws).cloned().unwrap_or_else(|| ws.clone()),
            achievements: list.iter().map(|a| lines.line(&a.achievement_id)).collect(),
        })
        .collect();
    let unassigned: Vec<AchievementLine> = assignment
        .unassigned
        .iter()
        .map(|u| lines.line(&u.achievement_id))
        .collect();

    let assigned = assignment.assigned_count();
    let summary = format!(
        "Assigned {} of {} to {}; {} remain unassigned.",
        assigned,
        plural(assigned + unassigned.len(), "new achievement"),
        plural(workstreams.len(), "workstream"),
        unassigned.len(),
    );

    AssignmentReport {
        assigned_count: assigned,
        unassigned_count: unassigned.len(),
        workstreams,
        unassigned,
        summary,
    }
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {noun}")
    } else {
        format!("{n} {noun}s")
    }
}
