//! Interactive region registry used for mouse hit-testing.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::core::geometry::Rect;
use crate::core::input::MouseEvent;

/// Something that can receive mouse events routed to its region.
pub trait Interactive {
    /// Handle a mouse event in region-local coordinates.
    fn handle_mouse(&mut self, _event: &MouseEvent) {}
}

pub type ComponentHandle = Rc<RefCell<dyn Interactive>>;

/// Generational identifier for a registered component.
///
/// Semantics:
/// - A slot index is reused after `unregister`, but with a new generation.
/// - A stale id never addresses the component that reused its slot.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ComponentId {
    index: u32,
    generation: u32,
}

impl ComponentId {
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

struct Entry {
    region: Rect,
    handle: ComponentHandle,
}

struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// Insertion-ordered registry of `(region, handle)` pairs.
#[derive(Default)]
pub struct ComponentRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    order: Vec<u32>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn register(&mut self, handle: ComponentHandle, region: Rect) -> ComponentId {
        let entry = Some(Entry { region, handle });
        let id = if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = entry;
            ComponentId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Slot {
                generation: 0,
                entry,
            });
            ComponentId {
                index,
                generation: 0,
            }
        };
        self.order.push(id.index);
        trace!(index = id.index, generation = id.generation, ?region, "component registered");
        id
    }

    /// Replace the handle and region of a live entry, keeping its hit-test order.
    pub fn replace(&mut self, id: ComponentId, handle: ComponentHandle, region: Rect) -> bool {
        let Some(entry) = self.entry_mut(id) else {
            return false;
        };
        *entry = Entry { region, handle };
        trace!(index = id.index, ?region, "component replaced");
        true
    }

    pub fn update_region(&mut self, id: ComponentId, region: Rect) -> bool {
        let Some(entry) = self.entry_mut(id) else {
            return false;
        };
        entry.region = region;
        true
    }

    pub fn unregister(&mut self, id: ComponentId) -> bool {
        if self.entry_mut(id).is_none() {
            return false;
        }
        let slot = &mut self.slots[id.index as usize];
        slot.entry = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.order.retain(|index| *index != id.index);
        trace!(index = id.index, "component unregistered");
        true
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.entry(id).is_some()
    }

    pub fn region(&self, id: ComponentId) -> Option<Rect> {
        self.entry(id).map(|entry| entry.region)
    }

    /// First entry (registration order) whose region contains the point.
    pub fn hit_test(&self, x: i32, y: i32) -> Option<(ComponentId, Rect, ComponentHandle)> {
        self.order.iter().find_map(|index| {
            let slot = &self.slots[*index as usize];
            let entry = slot.entry.as_ref()?;
            entry.region.contains(x, y).then(|| {
                (
                    ComponentId {
                        index: *index,
                        generation: slot.generation,
                    },
                    entry.region,
                    Rc::clone(&entry.handle),
                )
            })
        })
    }

    fn entry(&self, id: ComponentId) -> Option<&Entry> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    fn entry_mut(&mut self, id: ComponentId) -> Option<&mut Entry> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_mut()
    }
}
