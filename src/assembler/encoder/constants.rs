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

//! Opcode bytes for §4.4 and §4.5, kept as a flat `pub const` list the way the teacher keeps its
//! own opcode table in this same file.

use crate::assembler::label_table::BranchSpec;

pub const MAGIC_HI: u8 = 0xFB;
pub const MAGIC_LO: u8 = 0xD7;

// Opcode space, one fixed-size short form per 16- or 32-wide byte range, branch forms at
// 0x80-0x9f/0xb0-0xb9. `entry` has no opcode byte at all: it is packed/negated into its single
// operand byte, so it never appears in this table.
pub const PUSH_CONSTANT_SHORT_BASE: u8 = 0x00;
pub const PUSH_CONSTANT_SHORT_MAX: u32 = 31;
/// Long form is a single big-endian 16-bit word, `PUSH_CONSTANT_LONG_TAG | addr`, not a prefix
/// byte.
pub const PUSH_CONSTANT_LONG_TAG: u16 = 0xa000;

pub const PUSH_STACK_BASE: u8 = 0x20;
pub const PUSH_STACK_MAX: u32 = 31;

pub const PUSH_GLOBAL_SHORT_BASE: u8 = 0x40;
pub const PUSH_GLOBAL_SHORT_MAX: u32 = 15;
pub const PUSH_GLOBAL_LONG: u8 = 0x8e;

pub const SET_GLOBAL_SHORT_BASE: u8 = 0x50;
pub const SET_GLOBAL_SHORT_MAX: u32 = 15;
pub const SET_GLOBAL_LONG: u8 = 0x8f;

pub const CALL_BASE: u8 = 0x60;
pub const CALL_MAX: u32 = 15;

pub const JUMP_BASE: u8 = 0x70;
pub const JUMP_MAX: u32 = 15;

pub const PRIM_BASE: u8 = 0xc0;
pub const PRIM_RETURN: u8 = 47;
pub const PRIM_POP: u8 = 46;

/// §4.5's form table, one [`BranchSpec`] per label-bearing instruction.
pub const CALL_TOPLEVEL_SPEC: BranchSpec = BranchSpec {
    rel4: None,
    rel8: Some(0xb5),
    rel12: None,
    abs16: 0xb0,
};

pub const JUMP_TOPLEVEL_SPEC: BranchSpec = BranchSpec {
    rel4: Some(0x80),
    rel8: Some(0xb6),
    rel12: None,
    abs16: 0xb1,
};

pub const GOTO_SPEC: BranchSpec = BranchSpec {
    rel4: None,
    rel8: Some(0xb7),
    rel12: None,
    abs16: 0xb2,
};

pub const GOTO_IF_FALSE_SPEC: BranchSpec = BranchSpec {
    rel4: Some(0x90),
    rel8: Some(0xb8),
    rel12: None,
    abs16: 0xb3,
};

pub const CLOSURE_SPEC: BranchSpec = BranchSpec {
    rel4: None,
    rel8: Some(0xb9),
    rel12: None,
    abs16: 0xb4,
};
