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

//! The pass-2 code buffer (§4.4/§4.5): a flat byte stream under construction, interleaved with
//! label markers and deferred branch instructions whose final size isn't known until layout
//! converges. This plays the role the teacher's `AddrCounter`/`ContextStack` play for bank
//! switching, except the thing being fixed up here is branch instruction *width*, not bank
//! boundaries.

use std::cell::Cell;

use crate::assembler::label_table::{BranchSpec, ChosenForm, LabelTable, select_form};
use crate::constants::CODE_START;
use crate::errors::AssemblyError;
use crate::hex;
use crate::instr::LabelId;

const MAX_LAYOUT_PASSES: usize = 64;

/// A branch instruction whose encoded width depends on the (not yet known) distance to its
/// target label. Holds everything [`select_form`] and the final byte encoder need.
#[derive(Debug)]
struct DeferredBranch {
    instruction: &'static str,
    spec: BranchSpec,
    target: LabelId,
    site_index: usize,
    chosen: Cell<ChosenForm>,
}

#[derive(Debug)]
enum Chunk {
    Bytes(Vec<u8>),
    Label(LabelId),
    Deferred(DeferredBranch),
}

/// Accumulates the pass-2 output. Fixed-size instructions are appended as bytes immediately;
/// label-bearing ones go through [`AssemblerBuffer::defer`] and are only turned into bytes once
/// [`AssemblerBuffer::assemble`] has converged.
#[derive(Debug, Default)]
pub struct AssemblerBuffer {
    chunks: Vec<Chunk>,
}

impl AssemblerBuffer {
    pub fn begin() -> Self {
        Self::default()
    }

    pub fn emit_u8(&mut self, byte: u8) {
        self.push_byte(byte);
    }

    /// Emitted big-endian, per §6's "all multi-byte numeric fields in emitted bytecode are
    /// big-endian".
    pub fn emit_u16(&mut self, value: u16) {
        for b in value.to_be_bytes() {
            self.push_byte(b);
        }
    }

    pub fn emit_u32(&mut self, value: u32) {
        for b in value.to_be_bytes() {
            self.push_byte(b);
        }
    }

    pub fn emit_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.push_byte(b);
        }
    }

    fn push_byte(&mut self, byte: u8) {
        match self.chunks.last_mut() {
            Some(Chunk::Bytes(buf)) => buf.push(byte),
            _ => self.chunks.push(Chunk::Bytes(vec![byte])),
        }
    }

    /// Marks that `label` is defined at the current position in the stream.
    pub fn place_label(&mut self, label: LabelId) {
        self.chunks.push(Chunk::Label(label));
    }

    /// Reserves space for a branch to `target`, worst case (abs16) until layout proves it can
    /// shrink. `site_index` is the front-end instruction index, carried through for error
    /// messages only.
    pub fn defer(&mut self, instruction: &'static str, spec: BranchSpec, target: LabelId, site_index: usize) {
        self.chunks.push(Chunk::Deferred(DeferredBranch {
            instruction,
            spec,
            target,
            site_index,
            chosen: Cell::new(ChosenForm::Abs16),
        }));
    }

    fn chunk_size(chunk: &Chunk) -> u32 {
        match chunk {
            Chunk::Bytes(bytes) => bytes.len() as u32,
            Chunk::Label(_) => 0,
            Chunk::Deferred(d) => d.chosen.get().size(),
        }
    }

    /// §4.5/§8's fixed-point layout. Each pass walks the chunk list once under the *current*
    /// (stable) sizes to compute every label's position and every deferred branch's site
    /// simultaneously; only once that whole walk is done do we decide each deferred branch's new
    /// form and write it back. Deciding and walking in the same pass would let an earlier
    /// instruction's update change the positions a later instruction in the same pass sees,
    /// breaking the monotone-shrink argument that guarantees convergence.
    pub fn assemble(&self) -> Result<(), AssemblyError> {
        for _pass in 0..MAX_LAYOUT_PASSES {
            let mut labels = LabelTable::new();
            let mut sites = Vec::new();
            let mut offset = 0u32;
            for chunk in &self.chunks {
                match chunk {
                    Chunk::Label(id) => labels.define(*id, offset)?,
                    Chunk::Deferred(d) => sites.push((d, offset)),
                    Chunk::Bytes(_) => {}
                }
                offset += Self::chunk_size(chunk);
            }

            let mut changed = false;
            for (deferred, self_pos) in &sites {
                let target_pos = labels.resolve(deferred.target, deferred.site_index)?;
                let new_form = select_form(&deferred.spec, *self_pos, target_pos);
                if new_form != deferred.chosen.get() {
                    deferred.chosen.set(new_form);
                    changed = true;
                }
            }

            if !changed {
                return Ok(());
            }
        }
        Err(AssemblyError::LayoutDidNotConverge {
            passes: MAX_LAYOUT_PASSES,
        })
    }

    /// Renders the final byte stream. Must be called after [`Self::assemble`] has returned `Ok`.
    pub fn end(&self) -> Result<Vec<u8>, AssemblyError> {
        let mut labels = LabelTable::new();
        let mut offset = 0u32;
        for chunk in &self.chunks {
            if let Chunk::Label(id) = chunk {
                labels.define(*id, offset)?;
            }
            offset += Self::chunk_size(chunk);
        }

        let mut out = Vec::new();
        let mut offset = 0u32;
        for chunk in &self.chunks {
            match chunk {
                Chunk::Bytes(bytes) => out.extend_from_slice(bytes),
                Chunk::Label(_) => {}
                Chunk::Deferred(d) => {
                    let target_pos = labels.resolve(d.target, d.site_index)?;
                    encode_branch(&mut out, d, offset, target_pos)?;
                }
            }
            offset += Self::chunk_size(chunk);
        }
        Ok(out)
    }

    /// Convenience: run [`Self::assemble`], then [`Self::end`], then wrap the result as Intel HEX
    /// text loaded at [`CODE_START`].
    pub fn write_hex(&self) -> Result<String, AssemblyError> {
        self.assemble()?;
        let bytes = self.end()?;
        Ok(hex::encode(&bytes, CODE_START))
    }

    /// How many deferred branches ultimately resolved to each [`ChosenForm`], for
    /// [`crate::assembler::AssembleStats`] (§10.2). Only meaningful after [`Self::assemble`] has
    /// converged.
    pub fn branch_form_counts(&self) -> [(ChosenForm, usize); 4] {
        let mut counts = [
            (ChosenForm::Rel4, 0),
            (ChosenForm::Rel8, 0),
            (ChosenForm::Rel12, 0),
            (ChosenForm::Abs16, 0),
        ];
        for chunk in &self.chunks {
            if let Chunk::Deferred(d) = chunk {
                let chosen = d.chosen.get();
                for (form, count) in &mut counts {
                    if *form == chosen {
                        *count += 1;
                    }
                }
            }
        }
        counts
    }
}

fn encode_branch(out: &mut Vec<u8>, d: &DeferredBranch, self_pos: u32, target_pos: u32) -> Result<(), AssemblyError> {
    let form = d.chosen.get();
    let end = self_pos + form.size();
    let disp = target_pos as i64 - end as i64;
    match form {
        ChosenForm::Rel4 => {
            let base = d.spec.rel4.ok_or(AssemblyError::BranchOutOfRange {
                instruction: d.instruction,
                site: d.site_index,
                label: d.target,
            })?;
            out.push(base | (disp as i8 as u8 & 0x0F));
        }
        ChosenForm::Rel8 => {
            let base = d.spec.rel8.ok_or(AssemblyError::BranchOutOfRange {
                instruction: d.instruction,
                site: d.site_index,
                label: d.target,
            })?;
            out.push(base);
            out.push((disp + 128) as u8);
        }
        ChosenForm::Rel12 => {
            let base = d.spec.rel12.ok_or(AssemblyError::BranchOutOfRange {
                instruction: d.instruction,
                site: d.site_index,
                label: d.target,
            })?;
            let biased = (disp + 2048) as u16;
            let word = (base as u16) * 256 + biased;
            for b in word.to_be_bytes() {
                out.push(b);
            }
        }
        ChosenForm::Abs16 => {
            out.push(d.spec.abs16);
            for b in (target_pos as u16).to_be_bytes() {
                out.push(b);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::encoder::constants::{GOTO_SPEC, JUMP_TOPLEVEL_SPEC};

    #[test]
    fn short_forward_branch_shrinks_to_rel4() {
        let mut buf = AssemblerBuffer::begin();
        buf.defer("jump-toplevel", JUMP_TOPLEVEL_SPEC, 0, 0);
        buf.place_label(0);
        buf.assemble().unwrap();
        let bytes = buf.end().unwrap();
        assert_eq!(bytes.len(), 1);
    }

    #[test]
    fn far_branch_stays_abs16() {
        let mut buf = AssemblerBuffer::begin();
        buf.defer("goto", GOTO_SPEC, 0, 0);
        buf.emit_bytes(&vec![0u8; 5000]);
        buf.place_label(0);
        buf.assemble().unwrap();
        let bytes = buf.end().unwrap();
        assert_eq!(bytes.len(), 3 + 5000);
    }

    #[test]
    fn reference_to_missing_label_is_rejected() {
        let mut buf = AssemblerBuffer::begin();
        buf.defer("goto", GOTO_SPEC, 99, 0);
        assert!(matches!(
            buf.assemble(),
            Err(AssemblyError::UndefinedLabel { .. })
        ));
    }

    #[test]
    fn backward_branch_resolves_against_already_placed_label() {
        let mut buf = AssemblerBuffer::begin();
        buf.place_label(0);
        buf.emit_bytes(&[0u8; 3]);
        buf.defer("goto", GOTO_SPEC, 0, 1);
        buf.assemble().unwrap();
        let bytes = buf.end().unwrap();
        assert_eq!(bytes.len(), 3 + 2); // rel8 reaches backward 5 bytes easily
    }
}
