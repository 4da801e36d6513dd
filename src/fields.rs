//! Descriptor field groups
//!
//! A pass kind carries five ordered field lists. All five share one pool of
//! reserved keys, so a key used in the header fields cannot be reused in the
//! primary fields. Mutation goes through [`FieldListMut`], a borrow of one
//! list together with the shared pool.

use crate::schema::{Field, PassKind};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};
use validator::Validate;

/// One of the five field groups of a kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldGroup {
    Header,
    Primary,
    Secondary,
    Auxiliary,
    Back,
}

impl FieldGroup {
    pub const ALL: [FieldGroup; 5] = [
        FieldGroup::Header,
        FieldGroup::Primary,
        FieldGroup::Secondary,
        FieldGroup::Auxiliary,
        FieldGroup::Back,
    ];

    /// Key of the group array inside the kind sub-object
    pub fn as_str(self) -> &'static str {
        match self {
            FieldGroup::Header => "headerFields",
            FieldGroup::Primary => "primaryFields",
            FieldGroup::Secondary => "secondaryFields",
            FieldGroup::Auxiliary => "auxiliaryFields",
            FieldGroup::Back => "backFields",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FieldGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The five field lists of one kind and their shared key pool
#[derive(Debug, Clone)]
pub(crate) struct FieldLists {
    kind: PassKind,
    lists: [Vec<Field>; 5],
    keys: HashSet<String>,
}

impl FieldLists {
    /// Fresh, empty lists bound to a fresh pool
    pub(crate) fn new(kind: PassKind) -> Self {
        Self {
            kind,
            lists: Default::default(),
            keys: HashSet::new(),
        }
    }

    pub(crate) fn kind(&self) -> PassKind {
        self.kind
    }

    pub(crate) fn get(&self, group: FieldGroup) -> &[Field] {
        &self.lists[group.index()]
    }

    pub(crate) fn get_mut(&mut self, group: FieldGroup) -> FieldListMut<'_> {
        FieldListMut {
            group,
            accepts_row: accepts_row(self.kind, group),
            fields: &mut self.lists[group.index()],
            keys: &mut self.keys,
        }
    }

    /// Append untyped entries, dropping those that do not match the field shape
    pub(crate) fn import(&mut self, group: FieldGroup, values: &[Value]) -> usize {
        let fields = values.iter().filter_map(|value| {
            match serde_json::from_value::<Field>(value.clone()) {
                Ok(field) => Some(field),
                Err(e) => {
                    warn!("Dropping invalid field in {}: {}", group, e);
                    None
                }
            }
        });
        self.get_mut(group).push(fields)
    }

    /// Kind sub-object as it appears in `pass.json`
    pub(crate) fn to_json(&self) -> Map<String, Value> {
        let mut object = Map::new();
        for group in FieldGroup::ALL {
            let fields = self
                .get(group)
                .iter()
                .filter_map(|field| serde_json::to_value(field).ok())
                .collect();
            object.insert(group.as_str().to_string(), Value::Array(fields));
        }
        object
    }
}

/// Only the auxiliary fields of an event ticket carry a row hint
fn accepts_row(kind: PassKind, group: FieldGroup) -> bool {
    kind == PassKind::EventTicket && group == FieldGroup::Auxiliary
}

/// Mutable view over one field list and the pool it shares with its siblings
///
/// Insertions validate every candidate and skip (with a warning) invalid ones
/// and ones whose key is already reserved; they return how many candidates
/// were actually inserted. Removals release the removed keys.
pub struct FieldListMut<'a> {
    group: FieldGroup,
    accepts_row: bool,
    fields: &'a mut Vec<Field>,
    keys: &'a mut HashSet<String>,
}

impl<'a> FieldListMut<'a> {
    /// Group this view belongs to
    pub fn group(&self) -> FieldGroup {
        self.group
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn as_slice(&self) -> &[Field] {
        self.fields.as_slice()
    }

    /// Append fields at the end
    pub fn push<I>(&mut self, items: I) -> usize
    where
        I: IntoIterator<Item = Field>,
    {
        let admitted = self.admit(items);
        let count = admitted.len();
        self.fields.extend(admitted);
        count
    }

    /// Insert fields at the start, keeping their relative order
    pub fn unshift<I>(&mut self, items: I) -> usize
    where
        I: IntoIterator<Item = Field>,
    {
        let admitted = self.admit(items);
        let count = admitted.len();
        self.fields.splice(0..0, admitted);
        count
    }

    /// Remove the last field
    pub fn pop(&mut self) -> Option<Field> {
        let field = self.fields.pop()?;
        self.keys.remove(&field.key);
        Some(field)
    }

    /// Remove the first field
    pub fn shift(&mut self) -> Option<Field> {
        if self.fields.is_empty() {
            return None;
        }
        let field = self.fields.remove(0);
        self.keys.remove(&field.key);
        Some(field)
    }

    /// Replace `delete_count` fields starting at `start` with `items`
    ///
    /// Out-of-range bounds are clamped. The removed keys are released before
    /// the new candidates are checked, so a replacement may reuse them.
    pub fn splice<I>(&mut self, start: usize, delete_count: usize, items: I) -> Vec<Field>
    where
        I: IntoIterator<Item = Field>,
    {
        let start = start.min(self.fields.len());
        let end = start.saturating_add(delete_count).min(self.fields.len());

        let removed: Vec<Field> = self.fields.drain(start..end).collect();
        for field in &removed {
            self.keys.remove(&field.key);
        }

        let admitted = self.admit(items);
        self.fields.splice(start..start, admitted);

        removed
    }

    /// Validate candidates and reserve their keys
    fn admit<I>(&mut self, items: I) -> Vec<Field>
    where
        I: IntoIterator<Item = Field>,
    {
        let mut admitted = Vec::new();

        for mut field in items {
            if !self.accepts_row && field.row.take().is_some() {
                debug!("Stripping row hint from {} field {}", self.group, field.key);
            }

            if let Err(e) = field.validate() {
                warn!("Dropping invalid field in {}: {}", self.group, e);
                continue;
            }

            if self.keys.contains(&field.key) {
                warn!(
                    "Dropping field with repeated key {:?} in {}",
                    field.key, self.group
                );
                continue;
            }

            self.keys.insert(field.key.clone());
            admitted.push(field);
        }

        admitted
    }
}
