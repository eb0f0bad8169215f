//! Kind router.

use super::rules::Rule;
use crate::materialize::{Materialized, MaterializedView};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// WorkloadKind is the closed set of kinds that get mutated.
///
/// Every one of them carries a pod template at `spec.template`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkloadKind {
    Deployment,
    StatefulSet,
    DaemonSet,
}

impl WorkloadKind {
    pub const ALL: [WorkloadKind; 3] = [
        WorkloadKind::Deployment,
        WorkloadKind::StatefulSet,
        WorkloadKind::DaemonSet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadKind::Deployment => "Deployment",
            WorkloadKind::StatefulSet => "StatefulSet",
            WorkloadKind::DaemonSet => "DaemonSet",
        }
    }

    /// Rules run for this kind, in order.
    pub fn rules(&self) -> &'static [Rule] {
        match self {
            WorkloadKind::Deployment | WorkloadKind::StatefulSet | WorkloadKind::DaemonSet => {
                &[Rule::AnnotationMerge, Rule::ContainerEnvAppend]
            }
        }
    }
}

impl FromStr for WorkloadKind {
    type Err = UnrecognizedKind;

    fn from_str(kind: &str) -> Result<Self, Self::Err> {
        WorkloadKind::ALL
            .into_iter()
            .find(|k| k.as_str() == kind)
            .ok_or_else(|| UnrecognizedKind(kind.to_string()))
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// UnrecognizedKind names a kind with no mutation rules. It is a routing
/// outcome, not a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnrecognizedKind(pub String);

impl fmt::Display for UnrecognizedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized kind {:?}", self.0)
    }
}

/// Route is where an object goes after materialization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Route<'a> {
    Mutate {
        kind: WorkloadKind,
        view: &'a MaterializedView,
    },
    Skip {
        kind: &'a str,
    },
}

/// Routes a materialized object to its rules.
///
/// Objects whose kind has no rules, or that the materializer could not
/// project, are skipped with an informational log entry.
pub fn route(materialized: &Materialized) -> Route<'_> {
    match (materialized.kind.parse::<WorkloadKind>(), &materialized.view) {
        (Ok(kind), Some(view)) => Route::Mutate { kind, view },
        _ => {
            info!(kind = %materialized.kind, "Skipping object");
            Route::Skip {
                kind: &materialized.kind,
            }
        }
    }
}
