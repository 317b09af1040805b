//! Global-variable interning (§4.3) — the same insert/count/sort/reassign-slots shape as
//! [`crate::assembler::constant_pool`], minus the recursive structural pooling: globals are keyed
//! by name alone and never contain sub-components.

use std::collections::HashMap;

use crate::errors::AssemblyError;

#[derive(Debug, Clone, Copy)]
pub struct GlobalDescriptor {
    slot: u16,
    ref_count: u32,
}

impl GlobalDescriptor {
    pub fn slot(&self) -> u16 {
        self.slot
    }

    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }
}

#[derive(Debug, Default)]
pub struct GlobalTable {
    entries: HashMap<String, GlobalDescriptor>,
    next_order: u16,
}

impl GlobalTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&GlobalDescriptor> {
        self.entries.get(name)
    }

    /// §4.3: `add_global`. Bumps the reference count if `var` is already interned, otherwise
    /// inserts it with count 1 and the next insertion-order slot (reassigned by [`Self::finalize`]).
    pub fn add_global(&mut self, var: &str) {
        if let Some(descriptor) = self.entries.get_mut(var) {
            descriptor.ref_count += 1;
            return;
        }
        self.entries.insert(
            var.to_string(),
            GlobalDescriptor {
                slot: self.next_order,
                ref_count: 1,
            },
        );
        self.next_order += 1;
    }

    /// Sorts by descending reference count (ties by the original insertion-order slot, for
    /// determinism — same rationale as [`crate::assembler::constant_pool::ConstantPool`]) and
    /// reassigns slots `0, 1, 2, ...`.
    pub fn finalize(&mut self) -> Result<(), AssemblyError> {
        if self.entries.len() > 256 {
            return Err(AssemblyError::TooManyGlobals {
                count: self.entries.len(),
            });
        }

        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort_by(|a, b| {
            let da = &self.entries[a];
            let db = &self.entries[b];
            db.ref_count
                .cmp(&da.ref_count)
                .then(da.slot.cmp(&db.slot))
        });

        for (new_slot, name) in names.into_iter().enumerate() {
            self.entries.get_mut(&name).unwrap().slot = new_slot as u16;
        }
        Ok(())
    }

    /// Every global in final slot order, ready for statistics or debugging output.
    pub fn in_slot_order(&self) -> Vec<(&str, &GlobalDescriptor)> {
        let mut entries: Vec<(&str, &GlobalDescriptor)> =
            self.entries.iter().map(|(k, v)| (k.as_str(), v)).collect();
        entries.sort_by_key(|(_, d)| d.slot);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_globals_bump_ref_count() {
        let mut globals = GlobalTable::new();
        globals.add_global("x");
        globals.add_global("x");
        assert_eq!(globals.get("x").unwrap().ref_count(), 2);
    }

    #[test]
    fn finalize_reassigns_slots_by_popularity() {
        let mut globals = GlobalTable::new();
        globals.add_global("rare");
        globals.add_global("popular");
        globals.add_global("popular");
        globals.finalize().unwrap();
        assert_eq!(globals.get("popular").unwrap().slot(), 0);
        assert_eq!(globals.get("rare").unwrap().slot(), 1);
    }

    #[test]
    fn too_many_globals_is_rejected() {
        let mut globals = GlobalTable::new();
        for i in 0..257 {
            globals.add_global(&format!("g{i}"));
        }
        assert!(matches!(
            globals.finalize(),
            Err(AssemblyError::TooManyGlobals { count: 257 })
        ));
    }
}
