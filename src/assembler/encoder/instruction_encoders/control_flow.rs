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

//! Label-bearing instructions (§4.5). None of these are encoded on the spot: each one just
//! registers an [`crate::buffer::AssemblerBuffer::defer`] entry, the way the teacher's
//! `encode_jmp_imm`/`encode_jr` family resolve against the symbol table directly — except here
//! resolution is deferred until [`crate::buffer::AssemblerBuffer::assemble`] has converged.

use crate::assembler::encoder::constants::{
    CALL_TOPLEVEL_SPEC, CLOSURE_SPEC, GOTO_IF_FALSE_SPEC, GOTO_SPEC, JUMP_TOPLEVEL_SPEC,
};
use crate::buffer::AssemblerBuffer;
use crate::instr::LabelId;

pub fn encode_call_toplevel(buf: &mut AssemblerBuffer, target: LabelId, site_index: usize) {
    buf.defer("call-toplevel", CALL_TOPLEVEL_SPEC, target, site_index);
}

pub fn encode_jump_toplevel(buf: &mut AssemblerBuffer, target: LabelId, site_index: usize) {
    buf.defer("jump-toplevel", JUMP_TOPLEVEL_SPEC, target, site_index);
}

pub fn encode_goto(buf: &mut AssemblerBuffer, target: LabelId, site_index: usize) {
    buf.defer("goto", GOTO_SPEC, target, site_index);
}

pub fn encode_goto_if_false(buf: &mut AssemblerBuffer, target: LabelId, site_index: usize) {
    buf.defer("goto-if-false", GOTO_IF_FALSE_SPEC, target, site_index);
}

pub fn encode_closure(buf: &mut AssemblerBuffer, target: LabelId, site_index: usize) {
    buf.defer("closure", CLOSURE_SPEC, target, site_index);
}
