//! Centroid refresh for existing workstreams.

use bragdoc_workstream::{CentroidRefresh, Phase, refresh_centroids};
use clap::Args;

use super::{emit, explain, load_input, output_result, print_warning};
use crate::Cli;

#[derive(Args, Debug)]
pub struct RefreshCommand {
    /// Only refresh these workstreams (repeatable; default: all in -f)
    #[arg(long = "workstream")]
    pub workstreams: Vec<String>,
}

impl RefreshCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let input = load_input(cli)?;
        let ids: Vec<String> = if self.workstreams.is_empty() {
            input.workstreams.iter().map(|w| w.id.clone()).collect()
        } else {
            self.workstreams.clone()
        };

        emit(cli, Phase::Refreshing, "refreshing centroids", Some(ids.len()));
        let refreshed: CentroidRefresh =
            refresh_centroids(&ids, &input.achievements).map_err(explain)?;
        for id in &refreshed.empty {
            print_warning(&format!("workstream {id} has no embedded members"));
        }
        emit(cli, Phase::Complete, "centroids refreshed", Some(refreshed.centroids.len()));

        output_result(&refreshed, cli.output.as_deref(), cli.json)
    }
}
