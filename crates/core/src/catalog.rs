// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step catalog and upgrade path resolution.
//!
//! The catalog is a directed graph whose nodes are versions and whose edges
//! are migration steps. It is built once from registered steps and is
//! read-only afterwards.
//!
//! Path building is greedy forward chaining. At each frontier version the
//! applicable steps (those whose range contains the frontier) are ranked:
//!
//! 1. an explicit preference pinned for this frontier
//! 2. steps that do not overshoot the requested target
//! 3. most forward progress (least overshoot when all overshoot)
//! 4. exact range over a wider one
//! 5. extended variant over base
//! 6. registration order
//!
//! A frontier with no applicable step fails the whole path; partial paths
//! are never returned.

use crate::step::{MigrationStep, StepId, Variant};
use crate::version::Version;
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::collections::HashMap;
use thiserror::Error;

/// Catalog integrity errors: bugs in step metadata, not database conditions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("step {0} has an inverted range (upper bound below lower bound)")]
    InvertedRange(StepId),
    #[error("step {0} does not move forward: target is within or below its range, forming a cycle")]
    Cycle(StepId),
    #[error("step {0} registered twice")]
    Duplicate(StepId),
}

/// Errors from resolving an upgrade path
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("no upgrade path from {from} to {to}: no step applies to {stuck_at}")]
    NoPath {
        from: Version,
        to: Version,
        stuck_at: Version,
    },
    #[error("database version {from} is newer than target {to}")]
    Downgrade { from: Version, to: Version },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Default)]
pub struct Catalog {
    steps: IndexMap<StepId, MigrationStep>,
    preferred: HashMap<Version, Version>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from steps in registration order.
    pub fn from_steps(
        steps: impl IntoIterator<Item = MigrationStep>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for step in steps {
            catalog.register(step)?;
        }
        Ok(catalog)
    }

    pub fn register(&mut self, step: MigrationStep) -> Result<(), CatalogError> {
        let id = step.id();
        if id.range.is_inverted() {
            return Err(CatalogError::InvertedRange(id));
        }
        if id.target <= id.range.upper {
            return Err(CatalogError::Cycle(id));
        }
        if self.steps.contains_key(&id) {
            return Err(CatalogError::Duplicate(id));
        }
        self.steps.insert(id, step);
        Ok(())
    }

    /// Pin the step target to take when the path reaches `frontier` and
    /// several overlapping steps apply.
    pub fn prefer(&mut self, frontier: Version, target: Version) {
        self.preferred.insert(frontier, target);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> impl Iterator<Item = &MigrationStep> {
        self.steps.values()
    }

    pub fn get(&self, id: &StepId) -> Option<&MigrationStep> {
        self.steps.get(id)
    }

    /// Highest version any step upgrades to.
    pub fn latest(&self) -> Option<&Version> {
        self.steps.values().map(|s| s.upgraded_version()).max()
    }

    /// Ordered chain of steps leading from `from` to `to`.
    ///
    /// The first step's range contains `from`; the last step's target is
    /// `to` whenever a chain ending exactly there exists, otherwise the
    /// first version past it.
    pub fn build_path(
        &self,
        from: &Version,
        to: &Version,
    ) -> Result<Vec<&MigrationStep>, PathError> {
        match from.cmp(to) {
            Ordering::Equal => return Ok(Vec::new()),
            Ordering::Greater => {
                return Err(PathError::Downgrade {
                    from: from.clone(),
                    to: to.clone(),
                })
            }
            Ordering::Less => {}
        }

        let mut path = Vec::new();
        let mut frontier = from.clone();
        while &frontier < to {
            let step = self.select(&frontier, to).ok_or_else(|| PathError::NoPath {
                from: from.clone(),
                to: to.clone(),
                stuck_at: frontier.clone(),
            })?;

            let next = step.upgraded_version();
            if next <= &frontier {
                return Err(CatalogError::Cycle(step.id()).into());
            }
            if next > to {
                tracing::warn!(
                    step = %step.id(),
                    target = %to,
                    "no step lands exactly on target; overshooting"
                );
            }
            path.push(step);
            frontier = next.clone();
        }
        Ok(path)
    }

    fn select(&self, frontier: &Version, to: &Version) -> Option<&MigrationStep> {
        let pinned = self.preferred.get(frontier);
        self.steps
            .values()
            .filter(|s| s.upgradable_range().contains(frontier))
            .fold(None, |best: Option<&MigrationStep>, candidate| match best {
                Some(b) if rank(candidate, b, frontier, to, pinned) != Ordering::Greater => Some(b),
                _ => Some(candidate),
            })
    }
}

/// Compare two applicable steps; `Greater` means `a` is preferred.
fn rank(
    a: &MigrationStep,
    b: &MigrationStep,
    frontier: &Version,
    to: &Version,
    pinned: Option<&Version>,
) -> Ordering {
    let (ta, tb) = (a.upgraded_version(), b.upgraded_version());

    let pin = |t: &Version| pinned.is_some_and(|p| p == t);
    let within = |t: &Version| t <= to;
    let exact = |s: &MigrationStep| {
        s.upgradable_range().is_exact() && &s.upgradable_range().lower == frontier
    };
    let extended = |s: &MigrationStep| s.variant_kind() == Variant::Extended;

    pin(ta)
        .cmp(&pin(tb))
        .then_with(|| within(ta).cmp(&within(tb)))
        .then_with(|| {
            if within(ta) {
                ta.cmp(tb)
            } else {
                tb.cmp(ta)
            }
        })
        .then_with(|| exact(a).cmp(&exact(b)))
        .then_with(|| extended(a).cmp(&extended(b)))
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
