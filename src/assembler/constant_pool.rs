//! Constant pooling, reference counting, address assignment, and serialisation (§3, §4.2).
//!
//! Generalised from the teacher's `build_constant_table` pass-0 `HashMap` scan
//! (`examples/cnolan3-Cicada-16/Assembler/src/assembler/mod.rs`) into a structural, recursive,
//! reference-counted, address-sorted pool — the teacher's constant table is a flat `.define` name
//! lookup with no recursion or sorting, so this module's recursion and sort step are new relative
//! to that file, grounded directly on §4.2's algorithm.

use std::cell::Cell;
use std::collections::HashMap;

use crate::constants::{MIN_RAM_ENCODING, MIN_ROM_ENCODING};
use crate::errors::AssemblyError;
use crate::literal::{encode_direct, Literal};

/// Bookkeeping record for one pooled literal (§3's "constant descriptor"). The ROM address is
/// filled in once, after the whole pool has been sorted; `Cell` gives us that one in-place update
/// without needing `&mut` access to the whole pool at encode time, mirroring the teacher's
/// in-place `Symbol`/`AddrCounter` field updates via Rust's interior mutability instead (§9).
#[derive(Debug)]
pub struct ConstDescriptor {
    ref_count: Cell<u32>,
    address: Cell<Option<u16>>,
    /// Derived form of the literal used at serialisation time (§3): the element/byte list for
    /// strings, vectors and byte-vectors, or the high 16 bits for large integers. `None` for
    /// symbols and pairs, which serialise straight from the key itself.
    content: Option<Literal>,
    /// Tie-breaker for the popularity sort so output is deterministic regardless of the
    /// `HashMap`'s randomised iteration order (§8's determinism invariant) — ties in the spec are
    /// "arbitrary order", and insertion order is the simplest arbitrary order that is also
    /// reproducible.
    insertion_order: usize,
}

impl ConstDescriptor {
    pub fn ref_count(&self) -> u32 {
        self.ref_count.get()
    }

    pub fn address(&self) -> Option<u16> {
        self.address.get()
    }
}

/// A mapping from literal (by structural equality, after character pre-translation) to its
/// descriptor (§3).
#[derive(Debug, Default)]
pub struct ConstantPool {
    entries: HashMap<Literal, ConstDescriptor>,
    next_order: usize,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, literal: &Literal) -> Option<&ConstDescriptor> {
        self.entries.get(literal)
    }

    fn insert_new(&mut self, key: Literal, count: u32, content: Option<Literal>) {
        let descriptor = ConstDescriptor {
            ref_count: Cell::new(count),
            address: Cell::new(None),
            content,
            insertion_order: self.next_order,
        };
        self.next_order += 1;
        self.entries.insert(key, descriptor);
    }

    /// Stable-sorts by reference count descending (ties by insertion order) and assigns ROM
    /// addresses starting at [`MIN_ROM_ENCODING`]. Must be called exactly once, after pass 1 has
    /// finished populating the pool and before any constant record is serialised.
    pub fn finalize(&mut self) -> Result<(), AssemblyError> {
        if self.entries.len() > 256 {
            return Err(AssemblyError::TooManyConstants {
                count: self.entries.len(),
            });
        }

        let mut ordered: Vec<&ConstDescriptor> = self.entries.values().collect();
        ordered.sort_by(|a, b| {
            b.ref_count
                .get()
                .cmp(&a.ref_count.get())
                .then(a.insertion_order.cmp(&b.insertion_order))
        });

        let mut addr = MIN_ROM_ENCODING as u32;
        for (index, descriptor) in ordered.into_iter().enumerate() {
            if addr >= MIN_RAM_ENCODING as u32 {
                return Err(AssemblyError::RomOverflow {
                    index,
                    address: addr,
                    min_ram: MIN_RAM_ENCODING as u32,
                });
            }
            descriptor.address.set(Some(addr as u16));
            addr += 1;
        }
        Ok(())
    }

    /// Every pooled literal in ROM-address order, ready to be serialised and emitted in turn
    /// (§4.6's "walk sorted constants in address order").
    pub fn in_address_order(&self) -> Vec<(&Literal, &ConstDescriptor)> {
        let mut entries: Vec<(&Literal, &ConstDescriptor)> = self.entries.iter().collect();
        entries.sort_by_key(|(_, d)| d.address().expect("finalize() must run before iteration"));
        entries
    }
}

/// Build the canonical Scheme proper list (nested `Pair`s terminated by `Nil`) out of a slice of
/// elements — the "materialise list of ..." step shared by strings, vectors and byte-vectors.
fn build_proper_list(items: &[Literal]) -> Literal {
    match items.split_first() {
        None => Literal::Nil,
        Some((head, rest)) => Literal::Pair(Box::new(head.clone()), Box::new(build_proper_list(rest))),
    }
}

/// §4.2: `add_constant`. Recursively pools `obj` and its sub-components, bumping `obj`'s own
/// reference count only when `from_code` is set.
pub fn add_constant(obj: &Literal, pool: &mut ConstantPool, from_code: bool) -> Result<(), AssemblyError> {
    let translated = obj.to_direct_form();

    if encode_direct(&translated).is_some() {
        return Ok(());
    }

    if let Some(descriptor) = pool.get(&translated) {
        if from_code {
            descriptor.ref_count.set(descriptor.ref_count.get() + 1);
        }
        return Ok(());
    }

    let count = if from_code { 1 } else { 0 };

    match &translated {
        Literal::Pair(car, cdr) => {
            pool.insert_new(translated.clone(), count, None);
            add_constant(car, pool, false)?;
            add_constant(cdr, pool, false)?;
        }
        Literal::Str(s) => {
            let chars: Vec<Literal> = s.chars().map(|c| Literal::from_i64(c as i64)).collect();
            let list = build_proper_list(&chars);
            pool.insert_new(translated.clone(), count, Some(list.clone()));
            add_constant(&list, pool, false)?;
        }
        Literal::Vector(items) => {
            if items.is_empty() {
                return Err(AssemblyError::EmptyVector {
                    context: "push-constant of an empty vector".to_string(),
                });
            }
            let list = build_proper_list(items);
            pool.insert_new(translated.clone(), count, Some(list.clone()));
            add_constant(&list, pool, false)?;
        }
        Literal::ByteVector(bytes) => {
            let items: Vec<Literal> = bytes.iter().map(|b| Literal::SmallInt(*b as i32)).collect();
            let list = build_proper_list(&items);
            pool.insert_new(translated.clone(), count, Some(list.clone()));
            add_constant(&list, pool, false)?;
        }
        Literal::BigInt(n) => {
            let hi = Literal::from_i64(n >> 16);
            pool.insert_new(translated.clone(), count, Some(hi.clone()));
            add_constant(&hi, pool, false)?;
        }
        Literal::Symbol(_) => {
            pool.insert_new(translated.clone(), count, None);
        }
        // `False`/`True`/`Nil`/`SmallInt`/`Char` all return `Some` from `encode_direct` above.
        _ => unreachable!("direct-encodable literal reached the pooling branch"),
    }

    Ok(())
}

/// §4.2: `add_constants`, folding [`add_constant`] with `from_code = false` across a list.
pub fn add_constants(items: &[Literal], pool: &mut ConstantPool) -> Result<(), AssemblyError> {
    for item in items {
        add_constant(item, pool, false)?;
    }
    Ok(())
}

/// `enc(x)`: either `x`'s direct encoding or its descriptor's assigned ROM address. Only valid
/// after [`ConstantPool::finalize`] has run; every literal reaching this point was pooled during
/// pass 1, so the lookup cannot fail in a correctly driven assembly (§4.6).
pub fn encode_constant(obj: &Literal, pool: &ConstantPool) -> u16 {
    let translated = obj.to_direct_form();
    if let Some(direct) = encode_direct(&translated) {
        return direct;
    }
    pool.get(&translated)
        .and_then(|d| d.address())
        .expect("literal must be pooled and addressed before encoding")
}

/// §4.2's binary serialisation table: one 32-bit record (two big-endian `u16` words) per
/// constant.
pub fn serialize_record(obj: &Literal, pool: &ConstantPool) -> (u16, u16) {
    let translated = obj.to_direct_form();
    match &translated {
        Literal::BigInt(n) => {
            let hi = Literal::from_i64(n >> 16);
            let word0 = encode_constant(&hi, pool);
            let word1 = *n as u16;
            (word0, word1)
        }
        Literal::Pair(car, cdr) => {
            let word0 = 0x8000 | encode_constant(car, pool);
            let word1 = encode_constant(cdr, pool);
            (word0, word1)
        }
        Literal::Symbol(_) => (0x8000, 0x2000),
        Literal::Str(s) => {
            let chars: Vec<Literal> = s.chars().map(|c| Literal::from_i64(c as i64)).collect();
            let list = build_proper_list(&chars);
            let word0 = 0x8000 | encode_constant(&list, pool);
            (word0, 0x4000)
        }
        Literal::Vector(items) => {
            // Non-emptiness was enforced when this literal was pooled.
            let car = &items[0];
            let rest = build_proper_list(&items[1..]);
            let word0 = 0x8000 | encode_constant(car, pool);
            let word1 = encode_constant(&rest, pool);
            (word0, word1)
        }
        Literal::ByteVector(bytes) => {
            let items: Vec<Literal> = bytes.iter().map(|b| Literal::SmallInt(*b as i32)).collect();
            let list = build_proper_list(&items);
            let word0 = 0x8000 | bytes.len() as u16;
            let word1 = 0x6000 | encode_constant(&list, pool);
            (word0, word1)
        }
        _ => unreachable!("direct-encodable literal has no serialised record"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_encodable_literals_never_enter_the_pool() {
        let mut pool = ConstantPool::new();
        add_constant(&Literal::SmallInt(5), &mut pool, true).unwrap();
        assert!(pool.is_empty());
    }

    #[test]
    fn repeated_code_references_bump_ref_count() {
        let mut pool = ConstantPool::new();
        let sym = Literal::Symbol("x".into());
        add_constant(&sym, &mut pool, true).unwrap();
        add_constant(&sym, &mut pool, true).unwrap();
        assert_eq!(pool.get(&sym).unwrap().ref_count(), 2);
    }

    #[test]
    fn nested_references_do_not_bump_count() {
        let mut pool = ConstantPool::new();
        let inner = Literal::Symbol("inner".into());
        let pair = Literal::Pair(Box::new(inner.clone()), Box::new(Literal::Nil));
        add_constant(&pair, &mut pool, true).unwrap();
        // `inner` was only reached via recursion (from_code = false), never from code directly.
        assert_eq!(pool.get(&inner).unwrap().ref_count(), 0);
    }

    #[test]
    fn string_pools_its_character_list_and_tail() {
        let mut pool = ConstantPool::new();
        add_constant(&Literal::Str("hi".into()), &mut pool, true).unwrap();
        pool.finalize().unwrap();

        let ordered = pool.in_address_order();
        assert_eq!(ordered.len(), 3); // the string, `(104 97)`, and `(97)`
        let addrs: Vec<u16> = ordered.iter().map(|(_, d)| d.address().unwrap()).collect();
        assert_eq!(addrs, vec![261, 262, 263]);
    }

    #[test]
    fn empty_vector_is_rejected() {
        let mut pool = ConstantPool::new();
        let err = add_constant(&Literal::Vector(vec![]), &mut pool, true).unwrap_err();
        assert!(matches!(err, AssemblyError::EmptyVector { .. }));
    }

    #[test]
    fn sort_is_by_descending_reference_count() {
        let mut pool = ConstantPool::new();
        let popular = Literal::Symbol("popular".into());
        let rare = Literal::Symbol("rare".into());
        add_constant(&rare, &mut pool, true).unwrap();
        add_constant(&popular, &mut pool, true).unwrap();
        add_constant(&popular, &mut pool, true).unwrap();
        pool.finalize().unwrap();
        let ordered = pool.in_address_order();
        let (first_literal, _) = ordered.iter().min_by_key(|(_, d)| d.address().unwrap()).unwrap();
        assert_eq!(*first_literal, &popular);
    }

    #[test]
    fn too_many_constants_is_rejected() {
        let mut pool = ConstantPool::new();
        for i in 0..257 {
            add_constant(&Literal::Symbol(format!("s{i}")), &mut pool, true).unwrap();
        }
        assert!(matches!(
            pool.finalize(),
            Err(AssemblyError::TooManyConstants { count: 257 })
        ));
    }

    #[test]
    fn big_integer_pools_its_high_part() {
        let mut pool = ConstantPool::new();
        add_constant(&Literal::BigInt(70_000), &mut pool, true).unwrap();
        pool.finalize().unwrap();
        let (word0, word1) = serialize_record(&Literal::BigInt(70_000), &pool);
        assert_eq!(word0, 5); // enc(1) = 1 + 4
        assert_eq!(word1, 4464); // 70000 mod 65536
    }
}
