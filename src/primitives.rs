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

//! Primitive-name-to-code lookup (§3's "prim k invokes primitive k"). Plays the role of the
//! teacher's `constant_table` (a flat name-keyed map built once, consulted during pass 2) but
//! keyed by a fixed VM primitive table instead of user `.define`s.

use std::collections::HashMap;

use serde::Deserialize;

use crate::assembler::encoder::constants::{PRIM_POP, PRIM_RETURN};
use crate::errors::AssemblyError;

/// Name -> primitive code. `return` and `pop` are not user-visible primitive names (they have
/// their own [`crate::instr::Instr`] variants, lowered in pass 2 per §4.6), but the codes they
/// lower to live in the same numbering space, so the table includes them to keep `standard()` a
/// complete picture of the primitive-code space.
#[derive(Debug, Default)]
pub struct PrimitiveTable {
    codes: HashMap<String, u8>,
}

#[derive(Deserialize)]
struct PrimitiveEntry {
    name: String,
    code: u8,
}

impl PrimitiveTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in PicoBit VM family primitive table (§10.3). Kept deliberately short; the real
    /// VM's table runs past a hundred entries, but only the ones an assembler needs to resolve
    /// `prim` operands by name matter here.
    pub fn standard() -> Self {
        let mut table = Self::new();
        let entries: &[(&str, u8)] = &[
            ("return", PRIM_RETURN),
            ("pop", PRIM_POP),
            ("cons", 0),
            ("car", 1),
            ("cdr", 2),
            ("set-car!", 3),
            ("set-cdr!", 4),
            ("pair?", 5),
            ("null?", 6),
            ("eq?", 7),
            ("not", 8),
            ("+", 9),
            ("-", 10),
            ("*", 11),
            ("quotient", 12),
            ("remainder", 13),
            ("<", 14),
            (">", 15),
            ("=", 16),
            ("vector-ref", 17),
            ("vector-set!", 18),
            ("vector-length", 19),
            ("string-ref", 20),
            ("string-length", 21),
            ("symbol->string", 22),
            ("string->symbol", 23),
            ("apply", 24),
            ("write", 25),
            ("read", 26),
        ];
        for &(name, code) in entries {
            table.codes.insert(name.to_string(), code);
        }
        table
    }

    /// Loads a table from a JSON array of `{"name": ..., "code": ...}` objects, for front ends
    /// targeting a VM build whose primitive numbering differs from [`Self::standard`].
    pub fn from_json(text: &str) -> Result<Self, AssemblyError> {
        let entries: Vec<PrimitiveEntry> = serde_json::from_str(text)?;
        let mut table = Self::new();
        for entry in entries {
            table.codes.insert(entry.name, entry.code);
        }
        Ok(table)
    }

    pub fn lookup(&self, name: &str) -> Result<u8, AssemblyError> {
        self.codes
            .get(name)
            .copied()
            .ok_or_else(|| AssemblyError::UnknownPrimitive {
                name: name.to_string(),
            })
    }
}
