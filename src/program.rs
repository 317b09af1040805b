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

//! The on-disk instruction-stream interchange format (§10.4): a JSON array of [`Item`]s, the
//! front-end's equivalent of the teacher's own `.easm` text file, just already tokenised.

use serde::{Deserialize, Serialize};

use crate::errors::AssemblyError;
use crate::instr::Item;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program(pub Vec<Item>);

impl Program {
    /// Builds a program directly from a list of items, mirroring the teacher's
    /// `MockFileReader::add_file` in letting tests construct input without going through JSON.
    pub fn from_items(items: Vec<Item>) -> Self {
        Program(items)
    }

    pub fn items(&self) -> &[Item] {
        &self.0
    }

    pub fn from_json(text: &str) -> Result<Self, AssemblyError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, AssemblyError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instr::Instr;
    use crate::literal::Literal;

    #[test]
    fn round_trips_through_json() {
        let program = Program::from_items(vec![
            Item::Label(0),
            Item::Instr(Instr::PushConstant(Literal::SmallInt(1))),
            Item::Instr(Instr::Return),
        ]);
        let text = program.to_json().unwrap();
        let back = Program::from_json(&text).unwrap();
        assert_eq!(program, back);
    }
}
