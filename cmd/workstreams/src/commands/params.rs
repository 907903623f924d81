//! Parameter preset lookup.

use bragdoc_workstream::{ClusteringParams, embedded_items};
use clap::Args;
use serde::Serialize;

use super::{FilterArgs, get_config, load_input, output_result};
use crate::Cli;

#[derive(Args, Debug)]
pub struct ParamsCommand {
    /// Population size to look up (default: count embedded achievements in -f)
    #[arg(long)]
    pub count: Option<usize>,

    #[command(flatten)]
    pub filter: FilterArgs,
}

#[derive(Debug, Serialize)]
struct ParamsOutput {
    count: usize,
    minimum: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<ClusteringParams>,
}

impl ParamsCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let count = match self.count {
            Some(n) => n,
            None => {
                let input = load_input(cli)?;
                embedded_items(&input.achievements, &self.filter.filter()).len()
            }
        };

        let out = ParamsOutput {
            count,
            minimum: cfg.presets.minimum,
            params: cfg.presets.select(count),
        };
        output_result(&out, cli.output.as_deref(), cli.json)
    }
}
