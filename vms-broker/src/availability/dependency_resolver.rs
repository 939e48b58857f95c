/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Depth-first satisfiability of offered layers over OR-of-AND dependency sets.

use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{trace, warn};

use crate::layer::Layer;
use crate::observability::{events, fields};

const COMPONENT: &str = "dependency_resolver";

/// Alternative dependency sets per offered layer. Any one alternative is enough;
/// every layer within an alternative is required.
pub(crate) type DependencySets = HashMap<Layer, BTreeSet<BTreeSet<Layer>>>;

/// Returns every layer in `dependency_sets` that is transitively satisfiable.
///
/// Layers referenced only as dependencies are never available. A dependency that
/// loops back onto the current traversal path fails that path only; other
/// alternatives of the same layer are still tried.
pub(crate) fn resolve_available_layers(dependency_sets: &DependencySets) -> HashSet<Layer> {
    let mut traversal = Traversal::new(dependency_sets);

    let mut offered: Vec<&Layer> = dependency_sets.keys().collect();
    offered.sort();
    for layer in offered {
        traversal.resolve(*layer);
    }

    traversal.resolved
}

/// Result of resolving one layer inside a [`Traversal`].
struct Resolution {
    satisfied: bool,
    /// Shallowest in-progress path depth an unsatisfied result leaned on.
    low_link: Option<usize>,
}

impl Resolution {
    const SATISFIED: Self = Self {
        satisfied: true,
        low_link: None,
    };
    const UNSATISFIED: Self = Self {
        satisfied: false,
        low_link: None,
    };
}

/// State for one resolution pass. Lives only for the duration of
/// [`resolve_available_layers`].
///
/// Failures are only remembered when they did not depend on a layer still on
/// the path above them; such failures are re-evaluated from other entry points.
struct Traversal<'a> {
    dependency_sets: &'a DependencySets,
    resolved: HashSet<Layer>,
    failed: HashSet<Layer>,
    /// Layers on the current path, keyed to their depth.
    in_progress: HashMap<Layer, usize>,
    path: Vec<Layer>,
}

impl<'a> Traversal<'a> {
    fn new(dependency_sets: &'a DependencySets) -> Self {
        Self {
            dependency_sets,
            resolved: HashSet::new(),
            failed: HashSet::new(),
            in_progress: HashMap::new(),
            path: Vec::new(),
        }
    }

    fn resolve(&mut self, layer: Layer) -> Resolution {
        if self.resolved.contains(&layer) {
            return Resolution::SATISFIED;
        }
        if self.failed.contains(&layer) {
            return Resolution::UNSATISFIED;
        }

        let dependency_sets = self.dependency_sets;
        let Some(alternatives) = dependency_sets.get(&layer) else {
            trace!(
                event = events::DEPENDENCY_NOT_OFFERED,
                component = COMPONENT,
                layer = %layer,
                "dependency is not offered by any publisher"
            );
            return Resolution::UNSATISFIED;
        };

        if let Some(&depth) = self.in_progress.get(&layer) {
            self.report_cycle(layer, depth);
            return Resolution {
                satisfied: false,
                low_link: Some(depth),
            };
        }

        let depth = self.path.len();
        self.in_progress.insert(layer, depth);
        self.path.push(layer);

        let mut satisfied = false;
        let mut low_link: Option<usize> = None;
        for dependencies in alternatives {
            let mut all_satisfied = true;
            for dependency in dependencies {
                let resolution = self.resolve(*dependency);
                if !resolution.satisfied {
                    low_link = low_link.into_iter().chain(resolution.low_link).min();
                    all_satisfied = false;
                    break;
                }
            }
            if all_satisfied {
                satisfied = true;
                break;
            }
        }

        self.path.pop();
        self.in_progress.remove(&layer);

        if satisfied {
            self.resolved.insert(layer);
            return Resolution::SATISFIED;
        }
        match low_link {
            Some(above) if above < depth => Resolution {
                satisfied: false,
                low_link: Some(above),
            },
            _ => {
                self.failed.insert(layer);
                Resolution::UNSATISFIED
            }
        }
    }

    fn report_cycle(&self, layer: Layer, depth: usize) {
        let cycle = fields::format_layer_path(self.path[depth..].iter().chain([&layer]));
        warn!(
            event = events::DEPENDENCY_CYCLE_DETECTED,
            component = COMPONENT,
            layer = %layer,
            cycle = %cycle,
            "dependency cycle detected; alternative is not satisfiable"
        );
    }
}
