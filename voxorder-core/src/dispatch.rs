//! Command resolution and dispatch.
//!
//! Groups are expanded into one `ResolvedCommand` per identifier, in group
//! order then identifier order, and issued to the registry one at a time on
//! the calling thread. A failed command does not stop the rest of the batch.
//! A repeated id therefore ends in the status of its last mention.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::VoxorderError;
use crate::ipc::events::{FeedbackSignal, NotUnderstoodReason};
use crate::registry::{Order, OrderSummary, RegistryHandle};
use crate::resolve::{resolve, Strategy};
use crate::segment::CommandGroup;
use crate::vocab::{Status, StatusCatalog};

/// One status update ready to be issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedCommand {
    pub order_id: String,
    pub status: Status,
    pub strategy: Strategy,
}

/// Expand `groups` into commands, resolving every raw id against `snapshot`.
pub fn resolve_groups(groups: &[CommandGroup], snapshot: &[OrderSummary]) -> Vec<ResolvedCommand> {
    groups
        .iter()
        .flat_map(|group| {
            group.raw_ids.iter().map(move |raw| {
                let resolution = resolve(raw, snapshot);
                if !resolution.is_known() {
                    debug!(raw_id = %raw, fallback = %resolution.id, "identifier not in snapshot");
                }
                ResolvedCommand {
                    order_id: resolution.id,
                    status: group.status,
                    strategy: resolution.strategy,
                }
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum CommandResult {
    Updated { order: Order },
    Unresolved,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutcome {
    pub command: ResolvedCommand,
    pub result: CommandResult,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
    pub outcomes: Vec<CommandOutcome>,
    /// Feedback signals in emission order.
    pub signals: Vec<FeedbackSignal>,
}

impl DispatchReport {
    pub fn updated_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, CommandResult::Updated { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.updated_count()
    }
}

pub struct Dispatcher<'a> {
    registry: &'a RegistryHandle,
    catalog: &'a StatusCatalog,
}

impl<'a> Dispatcher<'a> {
    pub fn new(registry: &'a RegistryHandle, catalog: &'a StatusCatalog) -> Self {
        Self { registry, catalog }
    }

    /// Issue `commands` in order. An empty command list from zero groups
    /// yields a single `NoGroupsRecognized` signal.
    pub fn dispatch(&self, groups: &[CommandGroup], commands: Vec<ResolvedCommand>) -> DispatchReport {
        let mut report = DispatchReport::default();

        if groups.is_empty() {
            info!("no command groups recognized");
            report.signals.push(FeedbackSignal::NotUnderstood {
                reason: NotUnderstoodReason::NoGroupsRecognized,
                order_id: None,
            });
            return report;
        }

        for command in commands {
            let (result, signal) = self.issue(&command);
            report.signals.push(signal);
            report.outcomes.push(CommandOutcome { command, result });
        }

        report
    }

    fn issue(&self, command: &ResolvedCommand) -> (CommandResult, FeedbackSignal) {
        match self.registry.0.update_status(&command.order_id, command.status) {
            Ok(order) => {
                let signal = FeedbackSignal::Confirmed {
                    order_id: order.id.clone(),
                    status: order.status,
                    label: self.catalog.label_of(order.status).to_string(),
                };
                (CommandResult::Updated { order }, signal)
            }
            Err(VoxorderError::IdentifierUnresolved { id }) => {
                warn!(order_id = %id, "order not found");
                (
                    CommandResult::Unresolved,
                    FeedbackSignal::NotUnderstood {
                        reason: NotUnderstoodReason::IdentifierUnresolved,
                        order_id: Some(id),
                    },
                )
            }
            Err(e) => {
                warn!(order_id = %command.order_id, error = %e, "status update failed");
                (
                    CommandResult::Failed {
                        error: e.to_string(),
                    },
                    FeedbackSignal::NotUnderstood {
                        reason: NotUnderstoodReason::CollaboratorUnavailable,
                        order_id: Some(command.order_id.clone()),
                    },
                )
            }
        }
    }
}
