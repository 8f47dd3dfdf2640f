//! Filter Engine - narrows a fact table to a UI filter selection
//!
//! Criteria map field names to one value or a list of values. A field with
//! no (or an empty) criterion is unconstrained; names that are not fields are
//! ignored. Hierarchical labels such as `"Kitchen Knives - Chef Knives"` are
//! decoded once into [`FilterSelection::Pair`] and then matched against the
//! field itself and against its parent/child fields.

use crate::fields::Field;
use crate::generator::{product_type_label, FactRecord};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Separator between parent and child in hierarchical labels.
pub const HIERARCHY_SEPARATOR: &str = " - ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSelection {
    Leaf(String),
    Pair { parent: String, child: String },
}

impl FilterSelection {
    pub fn decode(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.split_once(HIERARCHY_SEPARATOR) {
            Some((parent, child)) if !parent.trim().is_empty() && !child.trim().is_empty() => {
                FilterSelection::Pair {
                    parent: parent.trim().to_string(),
                    child: child.trim().to_string(),
                }
            }
            _ => FilterSelection::Leaf(raw.to_string()),
        }
    }

    pub fn label(&self) -> String {
        match self {
            FilterSelection::Leaf(value) => value.clone(),
            FilterSelection::Pair { parent, child } => product_type_label(parent, child),
        }
    }

    /// True when any interpretation of the selection matches: exact value,
    /// parent-only, or parent and child together.
    pub fn matches(&self, field: Field, record: &FactRecord) -> bool {
        let value = field.value(record);
        match self {
            FilterSelection::Leaf(leaf) => {
                if value == leaf.as_str() {
                    return true;
                }
                field
                    .hierarchy()
                    .map(|(parent, _)| parent.value(record) == leaf.as_str())
                    .unwrap_or(false)
            }
            FilterSelection::Pair { parent, child } => {
                if value == self.label().as_str() {
                    return true;
                }
                field
                    .hierarchy()
                    .map(|(parent_field, child_field)| {
                        parent_field.value(record) == parent.as_str()
                            && child_field.value(record) == child.as_str()
                    })
                    .unwrap_or(false)
            }
        }
    }
}

/// A JSON scalar as sent by a UI; compared to fields by its text form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl FilterValue {
    pub fn as_text(&self) -> String {
        match self {
            FilterValue::Text(s) => s.clone(),
            FilterValue::Integer(i) => i.to_string(),
            FilterValue::Float(f) => f.to_string(),
            FilterValue::Bool(b) => b.to_string(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        FilterValue::Integer(value as i64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Criterion {
    Many(Vec<FilterValue>),
    One(FilterValue),
    /// `null`: no constraint.
    Unset,
}

impl Criterion {
    pub fn values(&self) -> Vec<String> {
        match self {
            Criterion::Many(values) => values.iter().map(FilterValue::as_text).collect(),
            Criterion::One(value) => vec![value.as_text()],
            Criterion::Unset => Vec::new(),
        }
    }
}

/// Field name → criterion, as received from the UI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterCriteria {
    criteria: BTreeMap<String, Criterion>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn select<V: Into<FilterValue>>(mut self, field: Field, values: impl IntoIterator<Item = V>) -> Self {
        self.criteria.insert(
            field.name().to_string(),
            Criterion::Many(values.into_iter().map(Into::into).collect()),
        );
        self
    }

    pub fn select_one(mut self, field: Field, value: impl Into<FilterValue>) -> Self {
        self.criteria.insert(field.name().to_string(), Criterion::One(value.into()));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, criterion: Criterion) {
        self.criteria.insert(name.into(), criterion);
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Resolve names to fields and decode selections. Unknown names and
    /// empty criteria are dropped.
    pub fn compile(&self) -> CompiledFilter {
        let mut clauses = Vec::new();
        for (name, criterion) in &self.criteria {
            let Some(field) = Field::from_name(name) else {
                debug!("Ignoring filter on unknown field '{}'", name);
                continue;
            };
            let selections: Vec<FilterSelection> = criterion
                .values()
                .iter()
                .filter(|v| !v.trim().is_empty())
                .map(|v| FilterSelection::decode(v))
                .collect();
            if selections.is_empty() {
                continue;
            }
            clauses.push((field, selections));
        }
        CompiledFilter { clauses }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledFilter {
    clauses: Vec<(Field, Vec<FilterSelection>)>,
}

impl CompiledFilter {
    pub fn matches(&self, record: &FactRecord) -> bool {
        self.clauses
            .iter()
            .all(|(field, selections)| selections.iter().any(|s| s.matches(*field, record)))
    }

    pub fn is_unconstrained(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn fields(&self) -> Vec<Field> {
        self.clauses.iter().map(|(field, _)| *field).collect()
    }
}

/// Records matching `criteria`, in input order.
pub fn filter_records(records: &[FactRecord], criteria: &FilterCriteria) -> Vec<FactRecord> {
    filter_refs(records, criteria).into_iter().cloned().collect()
}

pub fn filter_refs<'a>(records: &'a [FactRecord], criteria: &FilterCriteria) -> Vec<&'a FactRecord> {
    let compiled = criteria.compile();
    if compiled.is_unconstrained() {
        return records.iter().collect();
    }
    let matched: Vec<&FactRecord> = records.iter().filter(|r| compiled.matches(r)).collect();
    debug!(
        "Filter on {:?} kept {} of {} records",
        compiled.fields(),
        matched.len(),
        records.len()
    );
    matched
}

/// Sorted distinct values of `field`; years sort numerically.
pub fn distinct_values<'a>(records: impl IntoIterator<Item = &'a FactRecord>, field: Field) -> Vec<String> {
    if field == Field::Year {
        return records
            .into_iter()
            .map(|r| r.year)
            .sorted()
            .dedup()
            .map(|y| y.to_string())
            .collect();
    }
    records
        .into_iter()
        .map(|r| field.value(r).into_owned())
        .sorted()
        .dedup()
        .collect()
}

/// Dropdown options for every field.
pub fn filter_options(records: &[FactRecord]) -> BTreeMap<Field, Vec<String>> {
    Field::ALL
        .iter()
        .map(|field| (*field, distinct_values(records, *field)))
        .collect()
}
