//! Identity tracking for shared and cyclic object graphs.
//!
//! Write side maps object identities to ref ids assigned in document order.
//! Read side keeps a slot table; a slot is reserved (and the shared handle
//! registered) *before* the object body is read, which is what makes cycles
//! reconstructible.

use std::any::Any;
use std::collections::HashMap;

/// Write-side identity table.
#[derive(Default)]
pub struct RefWriter {
    ids: HashMap<usize, u32>,
}

impl RefWriter {
    /// Returns the existing id for an already-written identity, or assigns
    /// the next id and returns `None` (the value must then be written).
    pub fn try_register(&mut self, identity: usize) -> Option<u32> {
        if let Some(&id) = self.ids.get(&identity) {
            return Some(id);
        }
        let id = self.ids.len() as u32;
        self.ids.insert(identity, id);
        None
    }

    pub fn reset(&mut self) {
        self.ids.clear();
    }
}

/// Read-side slot table; ids index into it in reservation order.
#[derive(Default)]
pub struct RefReader {
    objects: Vec<Option<Box<dyn Any>>>,
}

impl RefReader {
    /// Reserves the next slot. The caller registers the (default-filled)
    /// shared handle with [`set`](RefReader::set) before reading the body.
    pub fn reserve(&mut self) -> u32 {
        self.objects.push(None);
        (self.objects.len() - 1) as u32
    }

    pub fn set(&mut self, id: u32, obj: Box<dyn Any>) {
        self.objects[id as usize] = Some(obj);
    }

    /// Clone of the handle registered under `id`, if the slot is filled and
    /// the type matches.
    pub fn get<T: Clone + 'static>(&self, id: u32) -> Option<T> {
        self.objects
            .get(id as usize)?
            .as_ref()?
            .downcast_ref::<T>()
            .cloned()
    }

    pub fn reset(&mut self) {
        self.objects.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn write_side_assigns_ids_in_document_order() {
        let mut refs = RefWriter::default();
        assert_eq!(refs.try_register(0x10), None);
        assert_eq!(refs.try_register(0x20), None);
        assert_eq!(refs.try_register(0x10), Some(0));
        assert_eq!(refs.try_register(0x20), Some(1));
        assert_eq!(refs.try_register(0x30), None);
        assert_eq!(refs.try_register(0x30), Some(2));
    }

    #[test]
    fn read_side_two_phase_registration() {
        let mut refs = RefReader::default();
        let id = refs.reserve();
        // Slot exists but is unfilled until the handle is registered.
        assert!(refs.get::<Rc<RefCell<i32>>>(id).is_none());
        let handle = Rc::new(RefCell::new(0));
        refs.set(id, Box::new(handle.clone()));
        let fetched = refs.get::<Rc<RefCell<i32>>>(id).unwrap();
        *fetched.borrow_mut() = 9;
        assert_eq!(*handle.borrow(), 9);
    }

    #[test]
    fn mismatched_type_yields_none() {
        let mut refs = RefReader::default();
        let id = refs.reserve();
        refs.set(id, Box::new(Rc::new(RefCell::new(0i32))));
        assert!(refs.get::<Rc<RefCell<String>>>(id).is_none());
    }
}
