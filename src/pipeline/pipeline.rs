//! The classify, mutate, patch pipeline.

use super::error::MutateError;
use crate::materialize::Materializer;
use crate::mutation::{route, MutationConfig, Route};
use crate::object::{ObjectIdentity, RenderedObject};
use crate::patch::Registrations;
use tracing::debug;

/// Skipped records an object that passed through unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub identity: ObjectIdentity,
    pub kind: String,
}

/// Report is the outcome of one run.
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// Patches per object. Every input object has an entry, empty when
    /// nothing was changed.
    pub registrations: Registrations,
    /// Objects whose kind has no rules, in input order.
    pub skipped: Vec<Skipped>,
}

/// Pipeline runs the rules over a batch of rendered objects.
///
/// Objects are processed in order on the calling thread. The first fatal error
/// aborts the run; nothing is carried from one run to the next. Two objects
/// with the same identity are a fatal error.
#[derive(Debug)]
pub struct Pipeline<'c, M> {
    materializer: M,
    config: &'c MutationConfig,
}

impl<'c, M: Materializer> Pipeline<'c, M> {
    pub fn new(materializer: M, config: &'c MutationConfig) -> Self {
        Pipeline {
            materializer,
            config,
        }
    }

    /// Computes and registers the patches of every object.
    pub fn run(&self, objects: &[RenderedObject]) -> Result<Report, MutateError> {
        let mut report = Report::default();
        for object in objects {
            self.mutate_object(object, &mut report)?;
        }
        debug!(
            objects = objects.len(),
            patches = report.registrations.patch_count(),
            skipped = report.skipped.len(),
            "Mutation run finished"
        );
        Ok(report)
    }

    fn mutate_object(&self, object: &RenderedObject, report: &mut Report) -> Result<(), MutateError> {
        let identity = object.identity();
        if report.registrations.contains(&identity) {
            return Err(MutateError::DuplicateIdentity { identity });
        }
        report.registrations.track(&identity);

        let materialized = self
            .materializer
            .materialize(object)
            .map_err(|e| MutateError::materialize(identity.clone(), e))?;

        let (kind, view) = match route(&materialized) {
            Route::Mutate { kind, view } => (kind, view),
            Route::Skip { kind } => {
                report.skipped.push(Skipped {
                    identity,
                    kind: kind.to_string(),
                });
                return Ok(());
            }
        };

        for rule in kind.rules() {
            let mutations = rule.evaluate(view, self.config);
            debug!(object = %identity, %rule, mutations = mutations.len(), "Evaluated rule");
            for mutation in mutations {
                report
                    .registrations
                    .register_patch(object, mutation.path, mutation.value);
            }
        }
        Ok(())
    }
}
