//! Full regroup of every embedded achievement.

use bragdoc_workstream::{
    Achievement, NewWorkstream, Phase, RegroupReport, build_workstreams, cluster_items,
    embedded_items, missing_embeddings, regroup_breakdown,
};
use clap::Args;
use serde::Serialize;
use tracing::info;

use super::{FilterArgs, emit, explain, get_config, load_input, output_result, print_success, print_warning};
use crate::Cli;

#[derive(Args, Debug)]
pub struct ReclusterCommand {
    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Debug, Serialize)]
struct ReclusterOutput {
    report: RegroupReport,
    workstreams: Vec<NewWorkstream>,
    achievements: Vec<Achievement>,
}

impl ReclusterCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let opts = cfg.cluster_options();
        let input = load_input(cli)?;
        let mut achievements = input.achievements;
        emit(cli, Phase::Loading, "achievements loaded", Some(achievements.len()));

        let missing = missing_embeddings(&achievements);
        if missing > 0 {
            print_warning(&format!("{missing} achievements have no embedding and are skipped"));
        }

        let items = embedded_items(&achievements, &self.filter.filter());
        let params = cfg.presets.require(items.len()).map_err(explain)?;
        info!(
            count = items.len(),
            min_pts = params.min_pts,
            min_cluster_size = params.min_cluster_size,
            outlier_threshold = params.outlier_threshold,
            "clustering parameters selected"
        );

        emit(cli, Phase::Clustering, "clustering achievements", Some(items.len()));
        let clustering = cluster_items(&items, &params, &opts).map_err(explain)?;

        let regroup = build_workstreams(&items, &clustering, &opts).map_err(explain)?;
        emit(
            cli,
            Phase::WorkstreamsCreated,
            "workstreams created",
            Some(regroup.workstreams_created()),
        );

        regroup.apply(&mut achievements);
        emit(
            cli,
            Phase::AchievementsAssigned,
            "achievements assigned",
            Some(regroup.achievements_assigned()),
        );

        let report = regroup_breakdown(&regroup, &achievements);
        print_success(&report.summary);
        emit(cli, Phase::Complete, report.summary.clone(), None);

        let out = ReclusterOutput {
            report,
            workstreams: regroup.workstreams,
            achievements,
        };
        output_result(&out, cli.output.as_deref(), cli.json)
    }
}
