//! Filter state and the evaluation request payload.
//!
//! Filter state is written by the external filter stage; the engine only
//! turns it into the request's `filters` list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::NotReady;
use crate::core::pipeline::Pipeline;
use crate::core::types::CardValue;

/// Closed numeric range selected for one numerical column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

/// Per-column filter selections; `null` means the column is unfiltered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    pub numerical: BTreeMap<String, Option<Interval>>,
    pub categorical: BTreeMap<String, Option<Vec<Value>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Filter {
    Interval { colname: String, interval: Interval },
    List { colname: String, list: Vec<Value> },
}

impl FilterState {
    /// Active filters: intervals first, then lists, each in column order.
    pub fn to_filters(&self) -> Vec<Filter> {
        let intervals = self.numerical.iter().filter_map(|(colname, interval)| {
            interval.map(|interval| Filter::Interval {
                colname: colname.clone(),
                interval,
            })
        });
        let lists = self.categorical.iter().filter_map(|(colname, list)| {
            list.as_ref().map(|list| Filter::List {
                colname: colname.clone(),
                list: list.clone(),
            })
        });
        intervals.chain(lists).collect()
    }
}

/// Payload handed to the external evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub filters: Vec<Filter>,
    pub cards: Vec<CardValue>,
}

impl EvaluationRequest {
    /// Build the request, refusing while any card is incomplete.
    pub fn build(filters: &FilterState, pipeline: &Pipeline) -> Result<Self, NotReady> {
        Ok(Self {
            filters: filters.to_filters(),
            cards: pipeline.serialize()?,
        })
    }
}
