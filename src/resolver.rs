//! Stat resolver module.
//!
//! Provides the `StatResolver` type, which runs one derivation pass: it
//! collects sources, builds the dependency graph from transforms, detects
//! cycles, and resolves every stat in topological order.

use crate::error::SheetError;
use crate::graph::StatGraph;
use crate::resolved::{ResolvedStat, StatTable};
use crate::source::StatSource;
use crate::stat_id::{StatId, StatValue};
use crate::transform::StatTransform;
use std::collections::HashMap;
use tracing::trace;

/// Collects sources and transforms, then resolves them.
///
/// A resolver is built fresh for each pass and keeps no cache between
/// calls, so resolving twice always gives the same table.
///
/// # Examples
///
/// ```rust
/// use charstat::*;
/// use charstat::source::ConstantSource;
/// use charstat::transform::{AbilityModifierTransform, ScalingTransform};
///
/// let mut resolver = StatResolver::new();
/// let dex = StatId::score(Ability::Dexterity);
/// let dex_mod = StatId::modifier(Ability::Dexterity);
/// let ac = StatId::armor_class();
///
/// resolver.register_source(dex.clone(), Box::new(ConstantSource::new("base", 14)));
/// resolver.register_transform(dex_mod.clone(), Box::new(AbilityModifierTransform::new(dex)));
/// resolver.register_source(ac.clone(), Box::new(ConstantSource::new("unarmored", 10)));
/// resolver.register_transform(ac.clone(), Box::new(ScalingTransform::new(dex_mod, 1)));
///
/// let resolved = resolver.resolve(&ac).unwrap();
/// assert_eq!(resolved.value, 12);
/// ```
pub struct StatResolver {
    /// Stats in first-registration order.
    order: Vec<StatId>,

    /// Multiple sources per stat (additive).
    sources: HashMap<StatId, Vec<Box<dyn StatSource>>>,

    /// Transform chain per stat.
    transforms: HashMap<StatId, Vec<Box<dyn StatTransform>>>,
}

impl StatResolver {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            sources: HashMap::new(),
            transforms: HashMap::new(),
        }
    }

    fn track(&mut self, stat_id: &StatId) {
        if !self.sources.contains_key(stat_id) && !self.transforms.contains_key(stat_id) {
            self.order.push(stat_id.clone());
        }
    }

    /// Register a source for a stat. Multiple sources are summed.
    pub fn register_source(&mut self, stat_id: StatId, source: Box<dyn StatSource>) {
        self.track(&stat_id);
        self.sources.entry(stat_id).or_default().push(source);
    }

    /// Register a transform for a stat.
    ///
    /// Transforms run grouped by [`TransformPhase`](crate::transform::TransformPhase),
    /// in registration order within a phase.
    pub fn register_transform(&mut self, stat_id: StatId, transform: Box<dyn StatTransform>) {
        self.track(&stat_id);
        self.transforms.entry(stat_id).or_default().push(transform);
    }

    pub fn is_registered(&self, stat_id: &StatId) -> bool {
        self.sources.contains_key(stat_id) || self.transforms.contains_key(stat_id)
    }

    /// Resolve a single stat and only the stats it depends on.
    ///
    /// # Errors
    ///
    /// * `SheetError::MissingStat` if nothing was registered for `stat_id`
    /// * `SheetError::MissingDependency` if a transform reads an unregistered stat
    /// * `SheetError::Cycle` if the dependencies loop
    pub fn resolve(&self, stat_id: &StatId) -> Result<ResolvedStat, SheetError> {
        if !self.is_registered(stat_id) {
            return Err(SheetError::MissingStat(stat_id.clone()));
        }

        let graph = self.build_graph()?.subgraph_for_targets(std::slice::from_ref(stat_id));
        let table = self.resolve_in_order(&graph.topological_sort()?)?;
        table
            .get(stat_id)
            .cloned()
            .ok_or_else(|| SheetError::MissingStat(stat_id.clone()))
    }

    /// Resolve every registered stat.
    pub fn resolve_all(&self) -> Result<StatTable, SheetError> {
        let graph = self.build_graph()?;
        self.resolve_in_order(&graph.topological_sort()?)
    }

    fn resolve_in_order(&self, order: &[StatId]) -> Result<StatTable, SheetError> {
        let mut table = StatTable::default();
        for stat_id in order {
            let resolved = self.resolve_stat_internal(stat_id, &table)?;
            trace!(stat = %stat_id, value = resolved.value, "resolved stat");
            table.insert(resolved);
        }
        Ok(table)
    }

    /// Build the dependency graph from all registered transforms.
    fn build_graph(&self) -> Result<StatGraph, SheetError> {
        let mut graph = StatGraph::new();

        for stat_id in &self.order {
            graph.add_node(stat_id.clone());
        }

        for stat_id in &self.order {
            for transform in self.transforms.get(stat_id).into_iter().flatten() {
                for dep in transform.depends_on() {
                    if !self.is_registered(&dep) {
                        return Err(SheetError::MissingDependency(dep));
                    }
                    graph.add_edge(stat_id.clone(), dep);
                }
            }
        }

        Ok(graph)
    }

    fn resolve_stat_internal(
        &self,
        stat_id: &StatId,
        resolved_so_far: &StatTable,
    ) -> Result<ResolvedStat, SheetError> {
        let mut resolved = ResolvedStat::new(stat_id.clone(), 0);

        // Step 1: sum all sources
        let mut current_value: StatValue = 0;
        for source in self.sources.get(stat_id).into_iter().flatten() {
            let value = source.get_value(stat_id);
            current_value = current_value.saturating_add(value);
            resolved.add_source(source.label(), value);
        }

        // Step 2: apply transforms, phase by phase
        let mut transforms: Vec<&dyn StatTransform> = self
            .transforms
            .get(stat_id)
            .into_iter()
            .flatten()
            .map(|t| &**t)
            .collect();
        transforms.sort_by_key(|t| t.phase());

        for transform in transforms {
            let mut dependencies = HashMap::new();
            for dep_id in transform.depends_on() {
                let dep_value = resolved_so_far
                    .get(&dep_id)
                    .map(|r| r.value)
                    .ok_or_else(|| SheetError::MissingDependency(dep_id.clone()))?;
                dependencies.insert(dep_id, dep_value);
            }

            current_value = transform.apply(current_value, &dependencies)?;
            resolved.add_transform(transform.description(), current_value);
        }

        resolved.value = current_value;
        Ok(resolved)
    }
}

impl Default for StatResolver {
    fn default() -> Self {
        Self::new()
    }
}
