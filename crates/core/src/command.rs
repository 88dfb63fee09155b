//! Commands accepted by [`Ledger::dispatch`](crate::ledger::Ledger::dispatch)
//! and the outcomes it reports.

use crate::{
    models::{Job, Resource},
    shopping::{ShoppingList, TotalsView},
};

/// What a shopping list is computed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShoppingTarget {
    /// One unit of the named product.
    Product(String),
    /// Everything the named job orders.
    Job(String),
}

/// A single user action against the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a fresh tab with a generated name and activate it.
    CreateTab,
    /// Rename a tab.
    RenameTab {
        /// Current name.
        from: String,
        /// Requested name.
        to: String,
    },
    /// Activate a tab and reload its record from the store.
    SwitchTab(String),
    /// Add a resource or product to a tab.
    AddResource {
        /// Target tab.
        tab: String,
        /// New definition.
        resource: Resource,
    },
    /// Remove a resource or product from a tab.
    RemoveResource {
        /// Target tab.
        tab: String,
        /// Definition to drop.
        name: String,
    },
    /// Replace a resource or product in place.
    EditResource {
        /// Target tab.
        tab: String,
        /// Name of the definition being replaced.
        original: String,
        /// New definition.
        replacement: Resource,
    },
    /// Add a job to a tab.
    AddJob {
        /// Target tab.
        tab: String,
        /// New job.
        job: Job,
    },
    /// Remove a job from a tab.
    RemoveJob {
        /// Target tab.
        tab: String,
        /// Job to drop.
        name: String,
    },
    /// Replace a job in place.
    EditJob {
        /// Target tab.
        tab: String,
        /// Name of the job being replaced.
        original: String,
        /// New job.
        replacement: Job,
    },
    /// Compute a shopping list.
    ShoppingList {
        /// Tab holding the definitions.
        tab: String,
        /// Product or job to aggregate.
        target: ShoppingTarget,
        /// Direct or exploded totals.
        view: TotalsView,
    },
    /// Write every loaded record back to the store and leave degraded mode.
    Flush,
}

/// Result of a successfully dispatched [`Command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A tab was created.
    TabCreated(String),
    /// A tab was renamed.
    TabRenamed {
        /// Old name.
        from: String,
        /// New name.
        to: String,
    },
    /// The active tab changed.
    TabSwitched(String),
    /// A definition was added.
    ResourceAdded(String),
    /// A definition was removed.
    ResourceRemoved(String),
    /// A definition was replaced.
    ResourceEdited {
        /// Old name.
        from: String,
        /// New name.
        to: String,
    },
    /// A job was added.
    JobAdded(String),
    /// A job was removed.
    JobRemoved(String),
    /// A job was replaced.
    JobEdited {
        /// Old name.
        from: String,
        /// New name.
        to: String,
    },
    /// The requested shopping list.
    ShoppingList(ShoppingList),
    /// Everything loaded was written back.
    Flushed,
}

impl Outcome {
    /// One-line summary for status displays.
    pub fn describe(&self) -> String {
        match self {
            Outcome::TabCreated(name) => format!("Created tab {name}"),
            Outcome::TabRenamed { from, to } => format!("Renamed tab {from} to {to}"),
            Outcome::TabSwitched(name) => format!("Switched to {name}"),
            Outcome::ResourceAdded(name) => format!("Added {name}"),
            Outcome::ResourceRemoved(name) => format!("Removed {name}"),
            Outcome::ResourceEdited { from, to } if from == to => format!("Updated {to}"),
            Outcome::ResourceEdited { from, to } => format!("Updated {from} as {to}"),
            Outcome::JobAdded(name) => format!("Added job {name}"),
            Outcome::JobRemoved(name) => format!("Removed job {name}"),
            Outcome::JobEdited { from, to } if from == to => format!("Updated job {to}"),
            Outcome::JobEdited { from, to } => format!("Updated job {from} as {to}"),
            Outcome::ShoppingList(list) => format!("{} line(s) in shopping list", list.len()),
            Outcome::Flushed => "All tabs saved".to_string(),
        }
    }
}
