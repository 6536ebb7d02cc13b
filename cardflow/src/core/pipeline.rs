//! The ordered card pipeline and its cross-card computations.
//!
//! A `Pipeline` is a persistent value: every edit returns a new pipeline that
//! shares unchanged cards, the catalog and the base columns with its
//! predecessor. Column availability is a flat namespace: a card sees the base
//! columns plus the outputs of *every other* card, regardless of position, so
//! forward references are allowed and no ordering is inferred.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use crate::core::card::CardInstance;
use crate::core::catalog::{CardTypeConfig, Catalog};
use crate::core::error::{EngineError, IncompleteCard, NotReady};
use crate::core::types::{CardId, CardValue, ColumnDescriptor, FieldValues};

#[derive(Debug, Clone)]
pub struct Pipeline {
    catalog: Arc<Catalog>,
    base_columns: Arc<[ColumnDescriptor]>,
    cards: Vec<Arc<CardInstance>>,
    next_id: u64,
}

impl Pipeline {
    /// Empty pipeline over an explicitly supplied catalog and base column set.
    pub fn new(catalog: Arc<Catalog>, base_columns: Arc<[ColumnDescriptor]>) -> Self {
        Self {
            catalog,
            base_columns,
            cards: Vec::new(),
            next_id: 1,
        }
    }

    /// Rebuild a pipeline from stored `(id, type id, values)` triples, in order.
    ///
    /// Stored ids are kept; cards without one get a fresh id above every
    /// stored id and above `next_id`, so ids handed out before the save stay
    /// retired.
    pub fn restore<I>(
        catalog: Arc<Catalog>,
        base_columns: Arc<[ColumnDescriptor]>,
        next_id: Option<u64>,
        cards: I,
    ) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = (Option<CardId>, String, FieldValues)>,
    {
        let cards: Vec<_> = cards.into_iter().collect();
        let stored_max = cards
            .iter()
            .filter_map(|(id, _, _)| id.map(|id| id.0))
            .max()
            .unwrap_or(0);

        let mut pipeline = Self::new(catalog, base_columns);
        pipeline.next_id = next_id.unwrap_or(1).max(stored_max.saturating_add(1));
        let mut seen = HashSet::new();
        for (stored, type_id, values) in cards {
            let config = pipeline.config_for(&type_id)?;
            let id = match stored {
                Some(id) => id,
                None => pipeline.allocate_id(),
            };
            if !seen.insert(id) {
                return Err(EngineError::DuplicateCard(id));
            }
            pipeline
                .cards
                .push(Arc::new(CardInstance::with_values(id, config, values)));
        }
        Ok(pipeline)
    }

    /// Id the next inserted card will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn base_columns(&self) -> &[ColumnDescriptor] {
        &self.base_columns
    }

    /// Same cards over a new base column set (e.g. after the loader reran).
    pub fn with_base_columns(&self, base_columns: Arc<[ColumnDescriptor]>) -> Self {
        Self {
            base_columns,
            ..self.clone()
        }
    }

    pub fn cards(&self) -> impl Iterator<Item = &CardInstance> {
        self.cards.iter().map(Arc::as_ref)
    }

    pub fn card(&self, id: CardId) -> Option<&CardInstance> {
        self.cards().find(|card| card.id() == id)
    }

    pub fn position(&self, id: CardId) -> Option<usize> {
        self.cards.iter().position(|card| card.id() == id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Base columns followed by the outputs of every card except `for_card`.
    ///
    /// Names are de-duplicated, keeping the first occurrence. A card never
    /// sees its own outputs.
    pub fn available_columns(&self, for_card: CardId) -> Vec<ColumnDescriptor> {
        let mut seen = HashSet::new();
        let others = self
            .cards()
            .filter(|card| card.id() != for_card)
            .flat_map(|card| card.outputs().iter());
        self.base_columns
            .iter()
            .chain(others)
            .filter(|column| seen.insert(column.name.as_str()))
            .cloned()
            .collect()
    }

    /// Insert a new card of `type_id` after `after`, or at the head for `None`.
    ///
    /// Returns the new pipeline and the identity of the inserted card.
    pub fn insert_card_after(
        &self,
        after: Option<CardId>,
        type_id: &str,
    ) -> Result<(Pipeline, CardId), EngineError> {
        let config = self.config_for(type_id)?;
        self.insert_config_after(after, config)
    }

    /// Like [`Pipeline::insert_card_after`], looking the card type up by label.
    pub fn insert_card_after_label(
        &self,
        after: Option<CardId>,
        label: &str,
    ) -> Result<(Pipeline, CardId), EngineError> {
        let config = self
            .catalog
            .by_label(label)
            .cloned()
            .ok_or_else(|| EngineError::UnknownCardLabel(label.to_string()))?;
        self.insert_config_after(after, config)
    }

    fn insert_config_after(
        &self,
        after: Option<CardId>,
        config: Arc<CardTypeConfig>,
    ) -> Result<(Pipeline, CardId), EngineError> {
        let index = match after {
            None => 0,
            Some(id) => self.position(id).ok_or(EngineError::UnknownCard(id))? + 1,
        };
        let mut next = self.clone();
        let id = next.allocate_id();
        next.cards
            .insert(index, Arc::new(CardInstance::new(id, config)));
        Ok((next, id))
    }

    /// Pipeline without card `id`.
    ///
    /// Cards that referenced the removed card's outputs keep their values;
    /// those names simply stop being available.
    pub fn remove_card(&self, id: CardId) -> Result<Pipeline, EngineError> {
        let index = self.position(id).ok_or(EngineError::UnknownCard(id))?;
        let mut next = self.clone();
        next.cards.remove(index);
        Ok(next)
    }

    /// Apply one field edit to card `id`.
    pub fn update_field(&self, id: CardId, key: &str, raw: Value) -> Result<Pipeline, EngineError> {
        let index = self.position(id).ok_or(EngineError::UnknownCard(id))?;
        let updated = self.cards[index].update_field(key, raw)?;
        let mut next = self.clone();
        next.cards[index] = Arc::new(updated);
        Ok(next)
    }

    pub fn is_valid(&self) -> bool {
        self.cards().all(CardInstance::is_valid)
    }

    /// Card values in order, or `NotReady` listing what blocks submission.
    pub fn serialize(&self) -> Result<Vec<CardValue>, NotReady> {
        let incomplete: Vec<IncompleteCard> = self
            .cards()
            .filter(|card| !card.is_valid())
            .map(|card| IncompleteCard {
                id: card.id(),
                type_id: card.type_id().to_string(),
                fields: card.incomplete_fields(),
            })
            .collect();
        if !incomplete.is_empty() {
            return Err(NotReady { incomplete });
        }
        Ok(self.cards().map(CardInstance::card_value).collect())
    }

    fn config_for(&self, type_id: &str) -> Result<Arc<CardTypeConfig>, EngineError> {
        self.catalog
            .get(type_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownCardType(type_id.to_string()))
    }

    fn allocate_id(&mut self) -> CardId {
        let id = CardId(self.next_id);
        self.next_id += 1;
        id
    }
}
