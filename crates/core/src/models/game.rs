use crate::{error::LedgerError, shopping::find_cycle};

use super::{GameRecord, InputLine, Job, Resource, ResourceKind};

impl GameRecord {
    /// Look up a resource or product by name.
    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|resource| resource.name == name)
    }

    /// Look up a job by name.
    pub fn job(&self, name: &str) -> Option<&Job> {
        self.jobs.iter().find(|job| job.name == name)
    }

    /// Products only, in insertion order.
    pub fn products(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter().filter(|resource| resource.is_product())
    }

    /// Append a new definition. Inputs may reference names that do not exist yet.
    pub fn add_resource(&mut self, resource: Resource) -> Result<&Resource, LedgerError> {
        let resource = normalize_resource(resource)?;
        if self.resource(&resource.name).is_some() {
            return Err(LedgerError::NameConflict {
                kind: "resource",
                name: resource.name,
            });
        }
        if let Some(cycle) = find_cycle(&resource, &self.resources) {
            return Err(LedgerError::Cycle(cycle));
        }
        self.resources.push(resource);
        Ok(&self.resources[self.resources.len() - 1])
    }

    /// Remove a definition. Products that used it keep a dangling input line.
    pub fn remove_resource(&mut self, name: &str) -> Result<Resource, LedgerError> {
        let index = self
            .resources
            .iter()
            .position(|resource| resource.name == name)
            .ok_or_else(|| LedgerError::UnknownResource(name.to_string()))?;
        Ok(self.resources.remove(index))
    }

    /// Replace `original` in place. The old definition stays if the replacement is rejected.
    pub fn edit_resource(
        &mut self,
        original: &str,
        replacement: Resource,
    ) -> Result<&Resource, LedgerError> {
        let index = self
            .resources
            .iter()
            .position(|resource| resource.name == original)
            .ok_or_else(|| LedgerError::UnknownResource(original.to_string()))?;
        let replacement = normalize_resource(replacement)?;

        let clash = self
            .resources
            .iter()
            .enumerate()
            .any(|(idx, resource)| idx != index && resource.name == replacement.name);
        if clash {
            return Err(LedgerError::NameConflict {
                kind: "resource",
                name: replacement.name,
            });
        }

        let others: Vec<Resource> = self
            .resources
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != index)
            .map(|(_, resource)| resource.clone())
            .collect();
        if let Some(cycle) = find_cycle(&replacement, &others) {
            return Err(LedgerError::Cycle(cycle));
        }

        self.resources[index] = replacement;
        Ok(&self.resources[index])
    }

    /// Append a new job. Product names are resolved lazily when totals are computed.
    pub fn add_job(&mut self, job: Job) -> Result<&Job, LedgerError> {
        let job = normalize_job(job)?;
        if self.job(&job.name).is_some() {
            return Err(LedgerError::NameConflict {
                kind: "job",
                name: job.name,
            });
        }
        self.jobs.push(job);
        Ok(&self.jobs[self.jobs.len() - 1])
    }

    /// Remove a job by name.
    pub fn remove_job(&mut self, name: &str) -> Result<Job, LedgerError> {
        let index = self
            .jobs
            .iter()
            .position(|job| job.name == name)
            .ok_or_else(|| LedgerError::UnknownJob(name.to_string()))?;
        Ok(self.jobs.remove(index))
    }

    /// Replace the job named `original` in place.
    pub fn edit_job(&mut self, original: &str, replacement: Job) -> Result<&Job, LedgerError> {
        let index = self
            .jobs
            .iter()
            .position(|job| job.name == original)
            .ok_or_else(|| LedgerError::UnknownJob(original.to_string()))?;
        let replacement = normalize_job(replacement)?;
        let clash = self
            .jobs
            .iter()
            .enumerate()
            .any(|(idx, job)| idx != index && job.name == replacement.name);
        if clash {
            return Err(LedgerError::NameConflict {
                kind: "job",
                name: replacement.name,
            });
        }
        self.jobs[index] = replacement;
        Ok(&self.jobs[index])
    }

    /// Append entries from `other` whose names are not present yet. Existing entries win.
    pub fn absorb(&mut self, other: GameRecord) {
        for resource in other.resources {
            if self.resource(&resource.name).is_none() {
                self.resources.push(resource);
            }
        }
        for job in other.jobs {
            if self.job(&job.name).is_none() {
                self.jobs.push(job);
            }
        }
    }
}

fn normalize_resource(resource: Resource) -> Result<Resource, LedgerError> {
    let name = resource.name.trim().to_string();
    if name.is_empty() {
        return Err(LedgerError::EmptyInput("resource"));
    }
    let inputs = normalize_lines(&name, resource.inputs)?;
    match resource.kind {
        ResourceKind::Resource if !inputs.is_empty() => {
            Err(LedgerError::invalid(&name, "raw resources take no inputs"))
        }
        ResourceKind::Product if inputs.is_empty() => Err(LedgerError::invalid(
            &name,
            "products need at least one input",
        )),
        kind => Ok(Resource { name, kind, inputs }),
    }
}

fn normalize_job(job: Job) -> Result<Job, LedgerError> {
    let name = job.name.trim().to_string();
    if name.is_empty() {
        return Err(LedgerError::EmptyInput("job"));
    }
    let products = normalize_lines(&name, job.products)?;
    Ok(Job { name, products })
}

fn normalize_lines(owner: &str, lines: Vec<InputLine>) -> Result<Vec<InputLine>, LedgerError> {
    lines
        .into_iter()
        .map(|line| {
            let input = line.input.trim().to_string();
            if input.is_empty() {
                return Err(LedgerError::invalid(owner, "input names must not be empty"));
            }
            if line.quantity == 0 {
                return Err(LedgerError::invalid(
                    owner,
                    format!("quantity for '{input}' must be at least 1"),
                ));
            }
            Ok(InputLine {
                input,
                quantity: line.quantity,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GameRecord {
        let mut record = GameRecord::default();
        record.add_resource(Resource::raw("Iron")).unwrap();
        record.add_resource(Resource::raw("Copper")).unwrap();
        record
            .add_resource(Resource::product(
                "Gear",
                vec![InputLine::new("Iron", 2)],
            ))
            .unwrap();
        record
    }

    #[test]
    fn add_then_list_contains_exactly_one_entry() {
        let record = sample();
        let gears: Vec<_> = record
            .resources
            .iter()
            .filter(|resource| resource.name == "Gear")
            .collect();
        assert_eq!(gears.len(), 1);
        assert_eq!(gears[0].kind, ResourceKind::Product);
    }

    #[test]
    fn rejects_blank_and_duplicate_names() {
        let mut record = sample();
        assert!(matches!(
            record.add_resource(Resource::raw("   ")),
            Err(LedgerError::EmptyInput("resource"))
        ));
        assert!(matches!(
            record.add_resource(Resource::raw(" Iron ")),
            Err(LedgerError::NameConflict { kind: "resource", .. })
        ));
        assert_eq!(record.resources.len(), 3);
    }

    #[test]
    fn enforces_kind_and_quantity_rules() {
        let mut record = sample();
        let raw_with_inputs = Resource {
            name: "Ore".into(),
            kind: ResourceKind::Resource,
            inputs: vec![InputLine::new("Iron", 1)],
        };
        assert!(matches!(
            record.add_resource(raw_with_inputs),
            Err(LedgerError::InvalidDefinition { .. })
        ));
        assert!(matches!(
            record.add_resource(Resource::product("Plate", Vec::new())),
            Err(LedgerError::InvalidDefinition { .. })
        ));
        assert!(matches!(
            record.add_resource(Resource::product("Plate", vec![InputLine::new("Iron", 0)])),
            Err(LedgerError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn dangling_inputs_are_accepted() {
        let mut record = sample();
        let added = record
            .add_resource(Resource::product(
                "Engine",
                vec![InputLine::new("Piston", 4)],
            ))
            .unwrap();
        assert_eq!(added.inputs[0].input, "Piston");
    }

    #[test]
    fn rejects_self_and_transitive_cycles() {
        let mut record = sample();
        assert!(matches!(
            record.add_resource(Resource::product("Loop", vec![InputLine::new("Loop", 1)])),
            Err(LedgerError::Cycle(_))
        ));

        record
            .add_resource(Resource::product("A", vec![InputLine::new("B", 1)]))
            .unwrap();
        let err = record
            .add_resource(Resource::product("B", vec![InputLine::new("A", 1)]))
            .unwrap_err();
        match err {
            LedgerError::Cycle(path) => assert_eq!(path, vec!["B", "A", "B"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn remove_leaves_dependants_untouched() {
        let mut record = sample();
        let removed = record.remove_resource("Iron").unwrap();
        assert_eq!(removed.name, "Iron");
        let gear = record.resource("Gear").unwrap();
        assert_eq!(gear.inputs, vec![InputLine::new("Iron", 2)]);
        assert!(matches!(
            record.remove_resource("Iron"),
            Err(LedgerError::UnknownResource(_))
        ));
    }

    #[test]
    fn failed_edit_keeps_original() {
        let mut record = sample();
        let err = record
            .edit_resource("Gear", Resource::raw("Copper"))
            .unwrap_err();
        assert!(matches!(err, LedgerError::NameConflict { .. }));
        assert!(record.resource("Gear").is_some());

        record
            .edit_resource(
                "Gear",
                Resource::product("Gear", vec![InputLine::new("Copper", 3)]),
            )
            .unwrap();
        let names: Vec<_> = record.resources.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Iron", "Copper", "Gear"]);
        assert_eq!(
            record.resource("Gear").unwrap().inputs,
            vec![InputLine::new("Copper", 3)]
        );
    }

    #[test]
    fn edit_can_keep_its_own_name_without_conflict() {
        let mut record = sample();
        record.edit_resource("Iron", Resource::raw("Iron")).unwrap();
        assert_eq!(record.resources.len(), 3);
    }

    #[test]
    fn job_crud_follows_resource_rules() {
        let mut record = sample();
        record
            .add_job(Job::new("Order", vec![InputLine::new("Gear", 2)]))
            .unwrap();
        record.add_job(Job::new("Backlog", Vec::new())).unwrap();
        assert!(matches!(
            record.add_job(Job::new("Order", Vec::new())),
            Err(LedgerError::NameConflict { kind: "job", .. })
        ));
        assert!(matches!(
            record.add_job(Job::new("Bad", vec![InputLine::new("Gear", 0)])),
            Err(LedgerError::InvalidDefinition { .. })
        ));
        assert!(matches!(
            record.edit_job("Order", Job::new("Backlog", Vec::new())),
            Err(LedgerError::NameConflict { .. })
        ));
        record
            .edit_job("Order", Job::new("Order 2", vec![InputLine::new("Gear", 5)]))
            .unwrap();
        assert_eq!(record.jobs[0].name, "Order 2");
        record.remove_job("Backlog").unwrap();
        assert_eq!(record.jobs.len(), 1);
        assert!(matches!(
            record.remove_job("Backlog"),
            Err(LedgerError::UnknownJob(_))
        ));
    }

    #[test]
    fn absorb_keeps_existing_entries_and_appends_new_ones() {
        let mut stored = sample();
        let mut local = GameRecord::default();
        local.resources.push(Resource::raw("Iron"));
        local.resources.push(Resource::raw("Glass"));
        local.resources.push(Resource::product("Gear", vec![InputLine::new("Glass", 9)]));
        local.jobs.push(Job::new("Order", vec![InputLine::new("Gear", 1)]));

        stored.absorb(local);
        let names: Vec<_> = stored.resources.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Iron", "Copper", "Gear", "Glass"]);
        assert_eq!(
            stored.resource("Gear").unwrap().inputs,
            vec![InputLine::new("Iron", 2)]
        );
        assert_eq!(stored.jobs.len(), 1);
    }
}
