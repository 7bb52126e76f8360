//! Collection run across every configured switch.

use futures_util::stream::{self, StreamExt};
use log::info;

use crate::config::{AppConfig, SwitchTarget};
use crate::inventory::Inventory;
use crate::session::{Connector, ExitStatusPolicy, SwitchOutcome, collect_switch};

/// Outcome of one collection run.
#[derive(Debug, Default)]
pub struct CollectionReport {
    pub inventory: Inventory,
    /// Per-switch outcomes in configured order.
    pub outcomes: Vec<(SwitchTarget, SwitchOutcome)>,
}

impl CollectionReport {
    pub fn failed(&self) -> impl Iterator<Item = &(SwitchTarget, SwitchOutcome)> {
        self.outcomes.iter().filter(|(_, outcome)| outcome.is_failed())
    }
}

/// Collect every switch and merge the results.
///
/// Up to `concurrency` switches are collected at once, but outcomes are
/// merged strictly in configured order so a MAC reported by two switches
/// always ends up with the later switch's record.
pub async fn collect_inventory<C: Connector>(
    connector: &C,
    switches: &[SwitchTarget],
    concurrency: usize,
    policy: ExitStatusPolicy,
) -> CollectionReport {
    let total = switches.len();

    let outcomes: Vec<SwitchOutcome> = stream::iter(switches.iter().enumerate())
        .map(|(i, target)| async move {
            info!(
                "Processing Switch {}/{}: {} with ignore ports: {:?}",
                i + 1,
                total,
                target,
                target.ignore_ports
            );
            collect_switch(connector, target, policy).await
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut report = CollectionReport::default();
    for (target, outcome) in switches.iter().zip(outcomes) {
        report.inventory.merge(outcome.records().iter().cloned());
        report.outcomes.push((target.clone(), outcome));
    }

    info!("Total devices collected: {}", report.inventory.len());
    report
}

/// Collect using the switches and policies from the run configuration.
pub async fn collect_configured<C: Connector>(connector: &C, config: &AppConfig) -> CollectionReport {
    collect_inventory(
        connector,
        &config.switches,
        config.concurrency,
        ExitStatusPolicy::from_strict(config.strict_exit_status),
    )
    .await
}
