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

//! Everything that doesn't fit `load_store`/`control_flow`: procedure entry points and primitive
//! invocations, including the `return`/`pop` lowering called out in §4.6.

use crate::assembler::encoder::constants::{PRIM_BASE, PRIM_POP, PRIM_RETURN};
use crate::buffer::AssemblerBuffer;
use crate::errors::AssemblyError;
use crate::primitives::PrimitiveTable;

/// `entry np rest?`. No opcode byte: a single byte holds `np` directly, or `-np` in two's
/// complement when the entry point is variadic.
pub fn encode_entry(buf: &mut AssemblerBuffer, num_params: u8, rest: bool) -> Result<(), AssemblyError> {
    if num_params > 0x7f {
        return Err(AssemblyError::ArgCountTooLarge {
            instruction: "entry",
            argc: num_params as u32,
        });
    }
    let byte = if rest { (-(num_params as i8)) as u8 } else { num_params };
    buf.emit_u8(byte);
    Ok(())
}

pub fn encode_prim(buf: &mut AssemblerBuffer, name: &str, prims: &PrimitiveTable) -> Result<(), AssemblyError> {
    let code = prims.lookup(name)?;
    buf.emit_u8(PRIM_BASE + code);
    Ok(())
}

/// `return` lowers to `prim 47` (§4.6).
pub fn encode_return(buf: &mut AssemblerBuffer) {
    buf.emit_u8(PRIM_BASE + PRIM_RETURN);
}

/// `pop` lowers to `prim 46` (§4.6).
pub fn encode_pop(buf: &mut AssemblerBuffer) {
    buf.emit_u8(PRIM_BASE + PRIM_POP);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_emits_param_count_directly_when_not_variadic() {
        let mut buf = AssemblerBuffer::begin();
        encode_entry(&mut buf, 3, false).unwrap();
        buf.assemble().unwrap();
        assert_eq!(buf.end().unwrap(), vec![0x03]);
    }

    #[test]
    fn entry_negates_param_count_when_variadic() {
        let mut buf = AssemblerBuffer::begin();
        encode_entry(&mut buf, 3, true).unwrap();
        buf.assemble().unwrap();
        assert_eq!(buf.end().unwrap(), vec![0xfd]); // -3 in two's complement
    }

    #[test]
    fn return_and_pop_lower_to_fixed_prim_codes() {
        let mut buf = AssemblerBuffer::begin();
        encode_return(&mut buf);
        encode_pop(&mut buf);
        buf.assemble().unwrap();
        let bytes = buf.end().unwrap();
        assert_eq!(bytes, vec![PRIM_BASE + PRIM_RETURN, PRIM_BASE + PRIM_POP]);
    }

    #[test]
    fn unknown_primitive_name_is_rejected() {
        let mut buf = AssemblerBuffer::begin();
        let prims = PrimitiveTable::standard();
        assert!(matches!(
            encode_prim(&mut buf, "nonexistent", &prims),
            Err(AssemblyError::UnknownPrimitive { .. })
        ));
    }
}
