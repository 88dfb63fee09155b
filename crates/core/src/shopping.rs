//! Shopping-list aggregation over a tab's bill of materials.
//!
//! Direct totals look one level deep, matching what the product's own input
//! lines say. Exploded totals walk nested products down to raw resources and
//! multiply quantities along the way. Both skip inputs that no longer resolve
//! to a definition in the tab.

use std::collections::{HashMap, HashSet};

use crate::{
    error::LedgerError,
    models::{Job, Resource, ResourceKind},
};

/// Aggregated quantities keyed by name, ordered by first encounter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShoppingList {
    entries: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl ShoppingList {
    /// Add `quantity` to the running total for `name`.
    pub fn add(&mut self, name: &str, quantity: u64) {
        match self.index.get(name) {
            Some(&slot) => {
                let total = &mut self.entries[slot].1;
                *total = total.saturating_add(quantity);
            }
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push((name.to_string(), quantity));
            }
        }
    }

    /// Total recorded for `name`, if any.
    pub fn get(&self, name: &str) -> Option<u64> {
        self.index.get(name).map(|&slot| self.entries[slot].1)
    }

    /// Entries in first-encounter order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries
            .iter()
            .map(|(name, quantity)| (name.as_str(), *quantity))
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was aggregated.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn merge_scaled(&mut self, other: &ShoppingList, factor: u64) {
        for (name, quantity) in other.iter() {
            self.add(name, quantity.saturating_mul(factor));
        }
    }
}

/// Which flavour of totals to compute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TotalsView {
    /// The product's own input lines.
    #[default]
    Direct,
    /// Fully expanded down to raw resources.
    Exploded,
}

impl TotalsView {
    /// Switch between the two views.
    pub fn toggled(self) -> Self {
        match self {
            TotalsView::Direct => TotalsView::Exploded,
            TotalsView::Exploded => TotalsView::Direct,
        }
    }

    /// Short label for display.
    pub fn label(self) -> &'static str {
        match self {
            TotalsView::Direct => "direct",
            TotalsView::Exploded => "exploded",
        }
    }
}

/// Direct bill of materials for `product`. Dangling inputs are skipped.
pub fn totals(product: &Resource, resources: &[Resource]) -> ShoppingList {
    let catalog = catalog(resources);
    let mut list = ShoppingList::default();
    for line in &product.inputs {
        if catalog.contains_key(line.input.as_str()) {
            list.add(&line.input, u64::from(line.quantity));
        }
    }
    list
}

/// Direct totals of every product in `job`, scaled by the ordered quantity.
///
/// Lines naming something missing or not a product are ignored.
pub fn job_totals(job: &Job, resources: &[Resource]) -> ShoppingList {
    let catalog = catalog(resources);
    let mut list = ShoppingList::default();
    for line in &job.products {
        let Some(product) = catalog
            .get(line.input.as_str())
            .filter(|resource| resource.is_product())
        else {
            continue;
        };
        list.merge_scaled(&totals(product, resources), u64::from(line.quantity));
    }
    list
}

/// Raw-resource requirements for one unit of `product`.
pub fn exploded_totals(
    product: &Resource,
    resources: &[Resource],
) -> Result<ShoppingList, LedgerError> {
    let catalog = catalog(resources);
    let mut list = ShoppingList::default();
    let mut path = vec![product.name.clone()];
    explode_into(&mut list, product, 1, &catalog, &mut path)?;
    Ok(list)
}

/// Raw-resource requirements for everything `job` orders.
pub fn exploded_job_totals(job: &Job, resources: &[Resource]) -> Result<ShoppingList, LedgerError> {
    let catalog = catalog(resources);
    let mut list = ShoppingList::default();
    for line in &job.products {
        let Some(product) = catalog
            .get(line.input.as_str())
            .filter(|resource| resource.is_product())
        else {
            continue;
        };
        let mut path = vec![product.name.clone()];
        explode_into(
            &mut list,
            product,
            u64::from(line.quantity),
            &catalog,
            &mut path,
        )?;
    }
    Ok(list)
}

fn explode_into(
    list: &mut ShoppingList,
    product: &Resource,
    factor: u64,
    catalog: &HashMap<&str, &Resource>,
    path: &mut Vec<String>,
) -> Result<(), LedgerError> {
    for line in &product.inputs {
        let Some(input) = catalog.get(line.input.as_str()) else {
            continue;
        };
        let quantity = factor.saturating_mul(u64::from(line.quantity));
        if input.kind == ResourceKind::Resource || input.inputs.is_empty() {
            list.add(&input.name, quantity);
            continue;
        }
        if path.iter().any(|seen| *seen == input.name) {
            let mut cycle = path.clone();
            cycle.push(input.name.clone());
            return Err(LedgerError::Cycle(cycle));
        }
        path.push(input.name.clone());
        explode_into(list, input, quantity, catalog, path)?;
        path.pop();
    }
    Ok(())
}

/// Path from `candidate` back to itself through `resources`, if one exists.
///
/// Entries sharing the candidate's name are ignored so edits can be checked
/// against the definition they replace.
pub(crate) fn find_cycle(candidate: &Resource, resources: &[Resource]) -> Option<Vec<String>> {
    let catalog: HashMap<&str, &Resource> = resources
        .iter()
        .filter(|resource| resource.name != candidate.name)
        .map(|resource| (resource.name.as_str(), resource))
        .collect();
    let mut path = vec![candidate.name.clone()];
    let mut visited = HashSet::new();
    walk_for_cycle(candidate, &candidate.name, &catalog, &mut path, &mut visited)
}

fn walk_for_cycle(
    node: &Resource,
    target: &str,
    catalog: &HashMap<&str, &Resource>,
    path: &mut Vec<String>,
    visited: &mut HashSet<String>,
) -> Option<Vec<String>> {
    for line in &node.inputs {
        if line.input == target {
            let mut cycle = path.clone();
            cycle.push(target.to_string());
            return Some(cycle);
        }
        if !visited.insert(line.input.clone()) {
            continue;
        }
        if let Some(next) = catalog.get(line.input.as_str()) {
            path.push(next.name.clone());
            if let Some(cycle) = walk_for_cycle(next, target, catalog, path, visited) {
                return Some(cycle);
            }
            path.pop();
        }
    }
    None
}

fn catalog(resources: &[Resource]) -> HashMap<&str, &Resource> {
    resources
        .iter()
        .map(|resource| (resource.name.as_str(), resource))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InputLine;

    fn catalog_fixture() -> Vec<Resource> {
        vec![
            Resource::raw("A"),
            Resource::raw("B"),
            Resource::raw("Steel"),
            Resource::raw("Copper"),
            Resource::product("ProductX", vec![InputLine::new("Steel", 5)]),
            Resource::product(
                "Wire",
                vec![InputLine::new("Copper", 2)],
            ),
            Resource::product(
                "Circuit",
                vec![InputLine::new("Wire", 3), InputLine::new("Steel", 1)],
            ),
        ]
    }

    #[test]
    fn duplicate_inputs_accumulate() {
        let resources = catalog_fixture();
        let product = Resource::product(
            "Mix",
            vec![
                InputLine::new("A", 2),
                InputLine::new("B", 3),
                InputLine::new("A", 1),
            ],
        );
        let list = totals(&product, &resources);
        assert_eq!(list.len(), 2);
        assert_eq!(list.get("A"), Some(3));
        assert_eq!(list.get("B"), Some(3));
        let order: Vec<_> = list.iter().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["A", "B"]);
    }

    #[test]
    fn job_scales_by_ordered_quantity() {
        let resources = catalog_fixture();
        let job = Job::new("Order", vec![InputLine::new("ProductX", 2)]);
        let list = job_totals(&job, &resources);
        assert_eq!(list.len(), 1);
        assert_eq!(list.get("Steel"), Some(10));
    }

    #[test]
    fn job_skips_missing_and_raw_lines() {
        let resources = catalog_fixture();
        let job = Job::new(
            "Order",
            vec![
                InputLine::new("Ghost", 4),
                InputLine::new("Steel", 9),
                InputLine::new("ProductX", 1),
            ],
        );
        let list = job_totals(&job, &resources);
        assert_eq!(list.len(), 1);
        assert_eq!(list.get("Steel"), Some(5));
    }

    #[test]
    fn dangling_inputs_are_omitted() {
        let mut resources = catalog_fixture();
        let product = Resource::product(
            "Frame",
            vec![InputLine::new("A", 1), InputLine::new("B", 2)],
        );
        resources.retain(|resource| resource.name != "B");
        let list = totals(&product, &resources);
        assert_eq!(list.get("A"), Some(1));
        assert_eq!(list.get("B"), None);
    }

    #[test]
    fn direct_totals_stay_single_level() {
        let resources = catalog_fixture();
        let circuit = resources.iter().find(|r| r.name == "Circuit").unwrap();
        let list = totals(circuit, &resources);
        assert_eq!(list.get("Wire"), Some(3));
        assert_eq!(list.get("Copper"), None);
    }

    #[test]
    fn exploded_totals_multiply_through_tiers() {
        let resources = catalog_fixture();
        let circuit = resources.iter().find(|r| r.name == "Circuit").unwrap();
        let list = exploded_totals(circuit, &resources).unwrap();
        assert_eq!(list.get("Copper"), Some(6));
        assert_eq!(list.get("Steel"), Some(1));
        assert_eq!(list.get("Wire"), None);

        let job = Job::new("Batch", vec![InputLine::new("Circuit", 4)]);
        let list = exploded_job_totals(&job, &resources).unwrap();
        assert_eq!(list.get("Copper"), Some(24));
        assert_eq!(list.get("Steel"), Some(4));
    }

    #[test]
    fn exploded_totals_report_stored_cycles() {
        let resources = vec![
            Resource::product("A", vec![InputLine::new("B", 1)]),
            Resource::product("B", vec![InputLine::new("A", 1)]),
        ];
        let err = exploded_totals(&resources[0], &resources).unwrap_err();
        match err {
            LedgerError::Cycle(path) => assert_eq!(path, vec!["A", "B", "A"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn find_cycle_ignores_unrelated_loops() {
        let resources = vec![
            Resource::product("A", vec![InputLine::new("B", 1)]),
            Resource::product("B", vec![InputLine::new("A", 1)]),
        ];
        let candidate = Resource::product("C", vec![InputLine::new("A", 1)]);
        assert_eq!(find_cycle(&candidate, &resources), None);
    }
}
