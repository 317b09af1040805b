/*
Copyright 2025 Connor Nolan

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! The two-pass driver (§4.6): pass 1 populates the constant pool and global table, pass 2 emits
//! bytes. Plays the same role as the teacher's `build_constant_table` / `build_symbol_table` /
//! `generate_bytecode` trio, minus bank switching — this VM family has a single linear ROM region.

pub mod constant_pool;
pub mod encoder;
pub mod global_table;
pub mod label_table;

use std::collections::HashMap;

use constant_pool::{add_constant, serialize_record, ConstantPool};
use global_table::GlobalTable;

use crate::assembler::encoder::constants::{MAGIC_HI, MAGIC_LO};
use crate::buffer::AssemblerBuffer;
use crate::errors::AssemblyError;
use crate::instr::{Instr, Item};
use crate::primitives::PrimitiveTable;

/// Per-call bookkeeping collected alongside assembly (§10.2), analogous to the teacher's
/// `AddrCounter`/`ContextStack` structs threaded through its two passes rather than a process-wide
/// map.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AssembleStats {
    pub total_instructions: usize,
    pub tag_counts: HashMap<&'static str, usize>,
    pub constant_count: usize,
    pub global_count: usize,
    pub rel4_branches: usize,
    pub rel8_branches: usize,
    pub rel12_branches: usize,
    pub abs16_branches: usize,
}

/// Pass 1 (§4.6): walk `items` once, pooling every `PushConstant` literal (with `from_code = true`)
/// and interning every `PushGlobal`/`SetGlobal` name, counting instruction tags along the way.
/// Label markers and every other instruction are left untouched until pass 2.
fn build_pools(
    items: &[Item],
    stats: &mut AssembleStats,
) -> Result<(ConstantPool, GlobalTable), AssemblyError> {
    let mut pool = ConstantPool::new();
    let mut globals = GlobalTable::new();

    for item in items {
        let Item::Instr(instr) = item else { continue };
        stats.total_instructions += 1;
        *stats.tag_counts.entry(instr.name()).or_insert(0) += 1;

        match instr {
            Instr::PushConstant(literal) => add_constant(literal, &mut pool, true)?,
            Instr::PushGlobal(name) | Instr::SetGlobal(name) => globals.add_global(name),
            _ => {}
        }
    }

    pool.finalize()?;
    globals.finalize()?;
    stats.constant_count = pool.len();
    stats.global_count = globals.len();

    Ok((pool, globals))
}

/// Between passes (§4.6): the header `[0xFB, 0xD7, #consts, #globals]` followed by every pooled
/// constant's serialised record, in ROM-address order. `#consts`/`#globals` are single header
/// bytes, so a pool of exactly 256 wraps to 0 — allowed, since [`ConstantPool::finalize`] only
/// rejects counts strictly greater than 256.
fn emit_constant_table(buf: &mut AssemblerBuffer, pool: &ConstantPool, globals: &GlobalTable) {
    buf.emit_u8(MAGIC_HI);
    buf.emit_u8(MAGIC_LO);
    buf.emit_u8(pool.len() as u8);
    buf.emit_u8(globals.len() as u8);

    for (literal, _descriptor) in pool.in_address_order() {
        let (word0, word1) = serialize_record(literal, pool);
        buf.emit_u16(word0);
        buf.emit_u16(word1);
    }
}

/// Pass 2 (§4.6): walk `items` again, binding each label marker to its buffer position and
/// delegating every instruction to [`encoder::encode_instruction`].
fn emit_instructions(
    items: &[Item],
    pool: &ConstantPool,
    globals: &GlobalTable,
    prims: &PrimitiveTable,
    buf: &mut AssemblerBuffer,
) -> Result<(), AssemblyError> {
    for (site_index, item) in items.iter().enumerate() {
        match item {
            Item::Label(id) => buf.place_label(*id),
            Item::Instr(instr) => {
                encoder::encode_instruction(instr, site_index, pool, globals, prims, buf)?
            }
        }
    }
    Ok(())
}

/// Assembles `items` into the final flat byte stream (header, constant table, program bytes),
/// discarding statistics. The public entry points in [`crate::assemble`]/[`crate::assemble_with_stats`]
/// wrap this with `anyhow::Context` and HEX rendering.
pub fn assemble_bytes(items: &[Item], prims: &PrimitiveTable) -> Result<Vec<u8>, AssemblyError> {
    let (bytes, _stats) = assemble_bytes_with_stats(items, prims)?;
    Ok(bytes)
}

/// Same as [`assemble_bytes`], but also returns the [`AssembleStats`] collected along the way.
pub fn assemble_bytes_with_stats(
    items: &[Item],
    prims: &PrimitiveTable,
) -> Result<(Vec<u8>, AssembleStats), AssemblyError> {
    let mut stats = AssembleStats::default();
    let (pool, globals) = build_pools(items, &mut stats)?;

    let mut buf = AssemblerBuffer::begin();
    emit_constant_table(&mut buf, &pool, &globals);
    emit_instructions(items, &pool, &globals, prims, &mut buf)?;
    buf.assemble()?;

    for (form, count) in buf.branch_form_counts() {
        use label_table::ChosenForm;
        match form {
            ChosenForm::Rel4 => stats.rel4_branches = count,
            ChosenForm::Rel8 => stats.rel8_branches = count,
            ChosenForm::Rel12 => stats.rel12_branches = count,
            ChosenForm::Abs16 => stats.abs16_branches = count,
        }
    }

    let bytes = buf.end()?;
    Ok((bytes, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Literal;

    #[test]
    fn header_reflects_pool_and_global_counts() {
        let items = vec![
            Item::Instr(Instr::PushConstant(Literal::Symbol("x".into()))),
            Item::Instr(Instr::PushGlobal("g".into())),
            Item::Instr(Instr::Return),
        ];
        let prims = PrimitiveTable::standard();
        let bytes = assemble_bytes(&items, &prims).unwrap();
        assert_eq!(&bytes[0..4], &[MAGIC_HI, MAGIC_LO, 0x01, 0x01]);
    }

    #[test]
    fn empty_program_is_just_the_header() {
        let prims = PrimitiveTable::standard();
        let bytes = assemble_bytes(&[], &prims).unwrap();
        assert_eq!(bytes, vec![MAGIC_HI, MAGIC_LO, 0x00, 0x00]);
    }

    #[test]
    fn stats_count_instruction_tags() {
        let items = vec![
            Item::Label(0),
            Item::Instr(Instr::PushConstant(Literal::SmallInt(5))),
            Item::Instr(Instr::Goto(0)),
        ];
        let prims = PrimitiveTable::standard();
        let (_, stats) = assemble_bytes_with_stats(&items, &prims).unwrap();
        assert_eq!(stats.total_instructions, 2);
        assert_eq!(stats.tag_counts.get("push-constant"), Some(&1));
        assert_eq!(stats.tag_counts.get("goto"), Some(&1));
    }

    #[test]
    fn undefined_label_reference_propagates_from_pass_two() {
        let items = vec![Item::Instr(Instr::Goto(99))];
        let prims = PrimitiveTable::standard();
        assert!(matches!(
            assemble_bytes(&items, &prims),
            Err(AssemblyError::UndefinedLabel { label: 99, .. })
        ));
    }
}
