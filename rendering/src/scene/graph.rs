use super::entity::EntityId;
use rustc_hash::FxHashMap;
use tracing::trace;

/// Receives scene membership changes of entities.
pub trait SceneGraph {
    fn add_element(&mut self, id: EntityId, layer: i32);
    fn remove_element(&mut self, id: EntityId);
    fn update_element_location(&mut self, id: EntityId, layer: i32);
}

#[derive(Debug, Clone, Copy)]
struct Element {
    layer: i32,
    sequence: u64,
    id: EntityId,
}

impl Element {
    /// Higher layers first, insertion order among equal layers.
    fn key(&self) -> (std::cmp::Reverse<i32>, u64) {
        (std::cmp::Reverse(self.layer), self.sequence)
    }
}

/// Entities of the scene in drawing order.
#[derive(Debug, Default)]
pub struct DisplayList {
    elements: Vec<Element>,
    layers: FxHashMap<EntityId, i32>,
    sequence: u64,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.layers.contains_key(&id)
    }

    pub fn layer_of(&self, id: EntityId) -> Option<i32> {
        self.layers.get(&id).copied()
    }

    /// Back to front.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = EntityId> + '_ {
        self.elements.iter().map(|e| e.id)
    }

    pub fn clear(&mut self) {
        self.elements.clear();
        self.layers.clear();
    }

    fn insert(&mut self, id: EntityId, layer: i32) {
        self.sequence += 1;
        let element = Element {
            layer,
            sequence: self.sequence,
            id,
        };
        let index = self
            .elements
            .partition_point(|existing| existing.key() < element.key());
        self.elements.insert(index, element);
        self.layers.insert(id, layer);
    }

    fn position(&self, id: EntityId) -> Option<usize> {
        let layer = *self.layers.get(&id)?;
        let start = self
            .elements
            .partition_point(|e| std::cmp::Reverse(e.layer) < std::cmp::Reverse(layer));
        self.elements[start..]
            .iter()
            .take_while(|e| e.layer == layer)
            .position(|e| e.id == id)
            .map(|offset| start + offset)
    }
}

impl SceneGraph for DisplayList {
    fn add_element(&mut self, id: EntityId, layer: i32) {
        if self.contains(id) {
            trace!(?id, "element already listed");
            return;
        }
        self.insert(id, layer);
    }

    fn remove_element(&mut self, id: EntityId) {
        if let Some(index) = self.position(id) {
            self.elements.remove(index);
        }
        self.layers.remove(&id);
    }

    fn update_element_location(&mut self, id: EntityId, layer: i32) {
        match self.layers.get(&id) {
            Some(current) if *current == layer => {}
            Some(_) => {
                self.remove_element(id);
                self.insert(id, layer);
            }
            None => {}
        }
    }
}
