//! Incremental assignment into existing workstreams.

use std::collections::HashMap;

use bragdoc_workstream::{
    Achievement, AssignmentReport, Phase, WorkstreamCentroid, assign_to_workstreams,
    assignment_breakdown, embedded_items, refresh_centroids, unassigned_items,
};
use clap::Args;
use serde::Serialize;

use super::{
    FilterArgs, emit, explain, get_config, load_input, output_result, print_success, print_warning,
};
use crate::Cli;
use crate::config::Input;

#[derive(Args, Debug)]
pub struct AssignCommand {
    /// Override the outlier threshold (max cosine distance to a centroid)
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Recompute centroids of the receiving workstreams afterwards
    #[arg(long)]
    pub refresh: bool,

    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Debug, Serialize)]
struct AssignOutput {
    report: AssignmentReport,
    achievements: Vec<Achievement>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    centroids: Vec<WorkstreamCentroid>,
}

impl AssignCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let input = load_input(cli)?;
        let existing = existing_centroids(&input)?;
        let names: HashMap<String, String> = input
            .workstreams
            .iter()
            .filter_map(|w| w.name.clone().map(|n| (w.id.clone(), n)))
            .collect();
        let mut achievements = input.achievements;
        emit(cli, Phase::Loading, "achievements loaded", Some(achievements.len()));

        let filter = self.filter.filter();
        let threshold = match self.threshold {
            Some(t) => t,
            None => {
                let total = embedded_items(&achievements, &filter).len();
                cfg.presets.require(total).map_err(explain)?.outlier_threshold
            }
        };

        let candidates = unassigned_items(&achievements, &filter);
        let assignment =
            assign_to_workstreams(&candidates, &existing, threshold).map_err(explain)?;
        assignment.apply(&mut achievements);
        emit(
            cli,
            Phase::AchievementsAssigned,
            "achievements assigned",
            Some(assignment.assigned_count()),
        );

        let mut centroids = Vec::new();
        if self.refresh && !assignment.assigned.is_empty() {
            emit(cli, Phase::Refreshing, "refreshing centroids", None);
            let ids: Vec<String> = assignment.assigned.keys().cloned().collect();
            centroids = refresh_centroids(&ids, &achievements).map_err(explain)?.centroids;
        }

        let report = assignment_breakdown(&assignment, &achievements, &names);
        print_success(&report.summary);
        emit(cli, Phase::Complete, report.summary.clone(), None);

        let out = AssignOutput {
            report,
            achievements,
            centroids,
        };
        output_result(&out, cli.output.as_deref(), cli.json)
    }
}

/// Centroids of the input workstreams, warning about those without one.
fn existing_centroids(input: &Input) -> anyhow::Result<Vec<WorkstreamCentroid>> {
    let missing = input.missing_centroids();
    for id in &missing {
        print_warning(&format!("workstream {id} has no centroid and is skipped"));
    }
    let existing = input.centroids();
    if existing.is_empty() && !missing.is_empty() {
        anyhow::bail!(
            "none of the {} workstreams has a centroid; run 'workstreams refresh' first",
            missing.len()
        );
    }
    Ok(existing)
}

#[cfg(test)]
mod tests {
    use crate::config::ExistingWorkstream;

    use super::*;

    fn workstream(id: &str, centroid: Option<Vec<f32>>) -> ExistingWorkstream {
        ExistingWorkstream {
            id: id.into(),
            name: None,
            centroid,
        }
    }

    #[test]
    fn skips_workstreams_without_centroid() {
        let input = Input {
            achievements: Vec::new(),
            workstreams: vec![workstream("w", Some(vec![1.0, 0.0])), workstream("v", None)],
        };
        let existing = existing_centroids(&input).unwrap();
        assert_eq!(existing.len(), 1);
        assert_eq!(existing[0].id, "w");
    }

    #[test]
    fn all_centroids_missing_points_to_refresh() {
        let input = Input {
            achievements: Vec::new(),
            workstreams: vec![workstream("w", None), workstream("v", None)],
        };
        let msg = existing_centroids(&input).unwrap_err().to_string();
        assert!(msg.contains("workstreams refresh"), "{msg}");
    }

    #[test]
    fn no_workstreams_is_left_to_the_core() {
        let existing = existing_centroids(&Input::default()).unwrap();
        assert!(existing.is_empty());
    }
}
