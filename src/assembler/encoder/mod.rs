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

pub mod constants;
pub mod instruction_encoders;

use crate::assembler::constant_pool::ConstantPool;
use crate::assembler::global_table::GlobalTable;
use crate::buffer::AssemblerBuffer;
use crate::errors::AssemblyError;
use crate::instr::Instr;
use crate::primitives::PrimitiveTable;
use instruction_encoders::control_flow;
use instruction_encoders::load_store;
use instruction_encoders::misc;

/// Pass 2's instruction dispatcher (§4.4/§4.5/§4.6): appends `instr`'s encoding to `buf`, either
/// as fixed bytes emitted immediately or, for the five label-bearing forms, as a deferred branch
/// resolved later by [`AssemblerBuffer::assemble`]. `site_index` is the instruction's position in
/// the front-end's item list, threaded through purely for error messages.
pub fn encode_instruction(
    instr: &Instr,
    site_index: usize,
    pool: &ConstantPool,
    globals: &GlobalTable,
    prims: &PrimitiveTable,
    buf: &mut AssemblerBuffer,
) -> Result<(), AssemblyError> {
    match instr {
        Instr::Entry { num_params, rest } => misc::encode_entry(buf, *num_params, *rest),
        Instr::PushConstant(literal) => {
            load_store::encode_push_constant(buf, literal, pool);
            Ok(())
        }
        Instr::PushStack(depth) => load_store::encode_push_stack(buf, *depth),
        Instr::PushGlobal(name) => {
            load_store::encode_push_global(buf, name, globals);
            Ok(())
        }
        Instr::SetGlobal(name) => {
            load_store::encode_set_global(buf, name, globals);
            Ok(())
        }
        Instr::Call(argc) => load_store::encode_call(buf, *argc),
        Instr::Jump(argc) => load_store::encode_jump(buf, *argc),
        Instr::CallToplevel(label) => {
            control_flow::encode_call_toplevel(buf, *label, site_index);
            Ok(())
        }
        Instr::JumpToplevel(label) => {
            control_flow::encode_jump_toplevel(buf, *label, site_index);
            Ok(())
        }
        Instr::Goto(label) => {
            control_flow::encode_goto(buf, *label, site_index);
            Ok(())
        }
        Instr::GotoIfFalse(label) => {
            control_flow::encode_goto_if_false(buf, *label, site_index);
            Ok(())
        }
        Instr::Closure(label) => {
            control_flow::encode_closure(buf, *label, site_index);
            Ok(())
        }
        Instr::Prim(name) => misc::encode_prim(buf, name, prims),
        Instr::Return => {
            misc::encode_return(buf);
            Ok(())
        }
        Instr::Pop => {
            misc::encode_pop(buf);
            Ok(())
        }
    }
}
