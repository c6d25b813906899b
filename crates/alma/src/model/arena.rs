//! Operator storage.
//!
//! Operators live in slots of a `Vec`; an [`OpKey`] is the slot index plus a
//! generation counter, so a key to a removed operator never aliases whatever
//! reuses the slot later.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::operator::{Intentions, Operator, Selectors};
use crate::Path;

/// Handle identifying one operator instance within a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OpKey {
    index: u32,
    generation: u32,
}

impl fmt::Display for OpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op{}v{}", self.index, self.generation)
    }
}

/// Everything the model tracks about one operator.
pub(crate) struct Entry {
    pub(crate) op_name: String,
    /// `None` while the behavior is lent out to a dispatch.
    pub(crate) behavior: Option<Box<dyn Operator>>,
    /// Absolute path; `None` means unmounted.
    pub(crate) path: Option<Path>,
    pub(crate) parent: Option<OpKey>,
    /// Nested children and their paths relative to this operator.
    pub(crate) nested: IndexMap<OpKey, Path>,
    pub(crate) selectors: Option<Rc<Selectors>>,
    pub(crate) intentions: Option<Rc<Intentions>>,
}

impl Entry {
    fn new(behavior: Box<dyn Operator>) -> Self {
        Self {
            op_name: behavior.op_name().to_string(),
            behavior: Some(behavior),
            path: None,
            parent: None,
            nested: IndexMap::new(),
            selectors: None,
            intentions: None,
        }
    }
}

struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

#[derive(Default)]
pub(crate) struct OpArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl OpArena {
    pub(crate) fn insert(&mut self, behavior: Box<dyn Operator>) -> OpKey {
        let entry = Entry::new(behavior);
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.entry = Some(entry);
            return OpKey {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            entry: Some(entry),
        });
        OpKey {
            index,
            generation: 0,
        }
    }

    pub(crate) fn get(&self, key: OpKey) -> Option<&Entry> {
        self.slots
            .get(key.index as usize)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    pub(crate) fn get_mut(&mut self, key: OpKey) -> Option<&mut Entry> {
        self.slots
            .get_mut(key.index as usize)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    pub(crate) fn remove(&mut self, key: OpKey) -> Option<Entry> {
        let slot = self
            .slots
            .get_mut(key.index as usize)
            .filter(|slot| slot.generation == key.generation)?;
        let entry = slot.entry.take()?;
        self.free.push(key.index);
        Some(entry)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}
