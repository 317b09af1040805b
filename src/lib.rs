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

pub mod assembler;
pub mod buffer;
pub mod constants;
pub mod errors;
pub mod hex;
pub mod instr;
pub mod literal;
pub mod primitives;
pub mod program;

use anyhow::{Context, Result};

use assembler::AssembleStats;
use instr::Item;
use primitives::PrimitiveTable;

/// Top-level entry point (§6): assembles `items` against `prims` and returns the Intel HEX text
/// loaded at [`constants::CODE_START`]. Each phase is wrapped in `anyhow::Context`, the way the
/// teacher's own `assemble()` wraps `build_constant_table`/`build_symbol_table`/`generate_bytecode`
/// with a `.context("Failed during ...")` per phase — the underlying `AssemblyError` is still
/// recoverable from the returned `anyhow::Error` via `downcast_ref`.
pub fn assemble(items: &[Item], prims: &PrimitiveTable) -> Result<String> {
    let bytes = assembler::assemble_bytes(items, prims).context("Failed during assembly")?;
    Ok(hex::encode(&bytes, constants::CODE_START))
}

/// Same as [`assemble`], but also returns the [`AssembleStats`] collected during the run (§10.2).
pub fn assemble_with_stats(items: &[Item], prims: &PrimitiveTable) -> Result<(String, AssembleStats)> {
    let (bytes, stats) =
        assembler::assemble_bytes_with_stats(items, prims).context("Failed during assembly")?;
    Ok((hex::encode(&bytes, constants::CODE_START), stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use instr::Instr;
    use literal::Literal;

    #[test]
    fn assembles_a_trivial_program_to_hex_text() {
        let items = vec![
            Item::Instr(Instr::PushConstant(Literal::SmallInt(5))),
            Item::Instr(Instr::Return),
        ];
        let prims = PrimitiveTable::standard();
        let text = assemble(&items, &prims).unwrap();
        assert!(text.starts_with(":"));
        assert!(text.ends_with(":00000001FF\n"));
    }

    #[test]
    fn stats_report_one_pooled_constant_for_a_string() {
        let items = vec![Item::Instr(Instr::PushConstant(Literal::Str("hi".into())))];
        let prims = PrimitiveTable::standard();
        let (_, stats) = assemble_with_stats(&items, &prims).unwrap();
        assert_eq!(stats.constant_count, 3); // the string, its char list, and the list's tail
    }
}
