//! One-line text format for definitions.
//!
//! `Iron` is a raw resource, `Gear = Iron x2, Copper` a product, and jobs use
//! the same shape with an optional right-hand side. Quantities default to 1
//! and are written `Name x3` or `Name*3`. An `x` quantity needs whitespace in
//! front of it, so names like `Box2` or `T2x4` stay intact.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::LedgerError,
    models::{InputLine, Job, Resource, ResourceKind},
};

static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?P<name>.+?)(?:\s+[xX]\s*(?P<qty>\d+)|\s*\*\s*(?P<star>\d+))?\s*$")
        .expect("invalid input line regex")
});

/// Parse a resource (`Name`) or product (`Name = A x2, B`) definition.
pub fn parse_resource(text: &str) -> Result<Resource, LedgerError> {
    match text.split_once('=') {
        None => {
            let name = text.trim();
            if name.is_empty() {
                return Err(LedgerError::EmptyInput("resource"));
            }
            Ok(Resource::raw(name))
        }
        Some((name, inputs)) => {
            let name = name.trim();
            if name.is_empty() {
                return Err(LedgerError::EmptyInput("resource"));
            }
            let inputs = parse_lines(inputs)?;
            if inputs.is_empty() {
                return Err(LedgerError::parse(text, "a product needs at least one input"));
            }
            Ok(Resource::product(name, inputs))
        }
    }
}

/// Parse a job (`Name` or `Name = Product x3, Other`).
pub fn parse_job(text: &str) -> Result<Job, LedgerError> {
    let (name, products) = match text.split_once('=') {
        Some((name, products)) => (name, parse_lines(products)?),
        None => (text, Vec::new()),
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(LedgerError::EmptyInput("job"));
    }
    Ok(Job::new(name, products))
}

/// Parse a comma separated list of input lines. Blank segments are skipped.
pub fn parse_lines(text: &str) -> Result<Vec<InputLine>, LedgerError> {
    text.split(',')
        .filter(|segment| !segment.trim().is_empty())
        .map(parse_line)
        .collect()
}

fn parse_line(segment: &str) -> Result<InputLine, LedgerError> {
    let caps = LINE_RE
        .captures(segment)
        .ok_or_else(|| LedgerError::parse(segment.trim(), "expected 'Name x3'"))?;
    let name = caps.name("name").map(|m| m.as_str()).unwrap_or_default();
    let quantity = match caps.name("qty").or_else(|| caps.name("star")) {
        Some(qty) => qty
            .as_str()
            .parse::<u32>()
            .map_err(|_| LedgerError::parse(segment.trim(), "quantity is too large"))?,
        None => 1,
    };
    if quantity == 0 {
        return Err(LedgerError::parse(
            segment.trim(),
            "quantity must be at least 1",
        ));
    }
    Ok(InputLine::new(name, quantity))
}

/// Text form accepted by [`parse_resource`].
pub fn format_resource(resource: &Resource) -> String {
    match resource.kind {
        ResourceKind::Resource => resource.name.clone(),
        ResourceKind::Product => format!("{} = {}", resource.name, format_lines(&resource.inputs)),
    }
}

/// Text form accepted by [`parse_job`].
pub fn format_job(job: &Job) -> String {
    if job.products.is_empty() {
        job.name.clone()
    } else {
        format!("{} = {}", job.name, format_lines(&job.products))
    }
}

/// `A x2, B x1`
pub fn format_lines(lines: &[InputLine]) -> String {
    lines
        .iter()
        .map(|line| format!("{} x{}", line.input, line.quantity))
        .collect::<Vec<_>>()
        .join(", ")
}
