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

//! Label resolution and branch-form selection (§4.5), the bytecode counterpart of the teacher's
//! [`crate::assembler::symbol_table`].

use std::collections::HashMap;

use crate::errors::AssemblyError;
use crate::instr::LabelId;

/// Per-opcode table of which branch forms an instruction supports. `abs16` is the only form every
/// label-bearing instruction has, so it is not optional.
#[derive(Debug, Clone, Copy)]
pub struct BranchSpec {
    pub rel4: Option<u8>,
    pub rel8: Option<u8>,
    pub rel12: Option<u8>,
    pub abs16: u8,
}

/// A resolved branch form and its encoded size in bytes, chosen by [`select_form`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChosenForm {
    Rel4,
    Rel8,
    Rel12,
    Abs16,
}

impl ChosenForm {
    /// Total instruction size in bytes, opcode byte(s) plus operand.
    pub fn size(&self) -> u32 {
        match self {
            ChosenForm::Rel4 => 1,
            ChosenForm::Rel8 => 2,
            ChosenForm::Rel12 => 2,
            ChosenForm::Abs16 => 3,
        }
    }
}

/// §4.5: pick the smallest form `spec` supports whose signed displacement still fits, preferring
/// rel4 over rel8 over rel12 over abs16 whenever more than one applies. `self_pos` and
/// `target_pos` are both buffer-relative byte offsets (see [`crate::buffer`]); the rel-N forms
/// encode `target_pos - (self_pos + size)`, i.e. the displacement from the end of the encoded
/// instruction, which is why the candidate size is folded into the range check before the
/// displacement is taken.
pub fn select_form(spec: &BranchSpec, self_pos: u32, target_pos: u32) -> ChosenForm {
    if spec.rel4.is_some() && fits_signed(target_pos, self_pos, 1, 4) {
        return ChosenForm::Rel4;
    }
    if spec.rel8.is_some() && fits_signed(target_pos, self_pos, 2, 8) {
        return ChosenForm::Rel8;
    }
    if spec.rel12.is_some() && fits_signed(target_pos, self_pos, 2, 12) {
        return ChosenForm::Rel12;
    }
    ChosenForm::Abs16
}

fn fits_signed(target_pos: u32, self_pos: u32, candidate_size: u32, bits: u32) -> bool {
    let end = self_pos as i64 + candidate_size as i64;
    let disp = target_pos as i64 - end;
    let half = 1i64 << (bits - 1);
    disp >= -half && disp < half
}

/// Maps the front-end's [`LabelId`]s to their buffer position, catching duplicate definitions and
/// references to labels that are never placed.
#[derive(Debug, Default)]
pub struct LabelTable {
    positions: HashMap<LabelId, u32>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records where `label` was placed. Errors if it was already placed once before.
    pub fn define(&mut self, label: LabelId, position: u32) -> Result<(), AssemblyError> {
        if let Some(&first) = self.positions.get(&label) {
            return Err(AssemblyError::DuplicateLabel {
                label,
                first: first as usize,
                again: position as usize,
            });
        }
        self.positions.insert(label, position);
        Ok(())
    }

    /// Looks up where `label` was placed. `site` is the referencing instruction's index, used
    /// only to build a useful [`AssemblyError::UndefinedLabel`].
    pub fn resolve(&self, label: LabelId, site: usize) -> Result<u32, AssemblyError> {
        self.positions
            .get(&label)
            .copied()
            .ok_or(AssemblyError::UndefinedLabel { label, site })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rel4_preferred_when_it_fits() {
        let spec = BranchSpec {
            rel4: Some(0x80),
            rel8: Some(0xb6),
            rel12: None,
            abs16: 0xb1,
        };
        // self at 10, target at 12: end = 11, disp = 1, fits in 4 bits (-8..8).
        assert_eq!(select_form(&spec, 10, 12), ChosenForm::Rel4);
    }

    #[test]
    fn falls_back_to_rel8_then_abs16() {
        let spec = BranchSpec {
            rel4: Some(0x80),
            rel8: Some(0xb6),
            rel12: None,
            abs16: 0xb1,
        };
        assert_eq!(select_form(&spec, 0, 100), ChosenForm::Rel8);
        assert_eq!(select_form(&spec, 0, 100_000), ChosenForm::Abs16);
    }

    #[test]
    fn spec_with_no_short_forms_always_picks_abs16() {
        let spec = BranchSpec {
            rel4: None,
            rel8: Some(0xb5),
            rel12: None,
            abs16: 0xb0,
        };
        assert_eq!(select_form(&spec, 0, 1), ChosenForm::Rel8);
    }

    #[test]
    fn duplicate_label_definition_is_rejected() {
        let mut table = LabelTable::new();
        table.define(1, 0).unwrap();
        assert!(matches!(
            table.define(1, 5),
            Err(AssemblyError::DuplicateLabel { .. })
        ));
    }

    #[test]
    fn undefined_label_reference_is_rejected() {
        let table = LabelTable::new();
        assert!(matches!(
            table.resolve(9, 0usize),
            Err(AssemblyError::UndefinedLabel { .. })
        ));
    }
}
