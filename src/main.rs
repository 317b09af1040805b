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

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as clap_parser;
use pbasm::primitives::PrimitiveTable;
use pbasm::program::Program;

#[derive(clap_parser)]
#[clap(version = "0.1.0", author = "Connor Nolan")]
struct Opts {
    /// JSON instruction stream (§10.4), the stand-in for an external front-end's output.
    #[clap(short, long)]
    input: PathBuf,
    /// Destination for the assembled Intel HEX file.
    #[clap(short, long)]
    output: PathBuf,
    /// JSON primitive-name table overriding the built-in standard table.
    #[clap(long)]
    primitives: Option<PathBuf>,
    /// Print a short instruction/constant/branch-form summary after assembling.
    #[clap(long)]
    stats: bool,
}

fn main() -> Result<()> {
    let opts: Opts = Opts::parse();

    let program_text = fs::read_to_string(&opts.input)
        .with_context(|| format!("Failed to read input file: {}", opts.input.display()))?;
    let program = Program::from_json(&program_text)
        .with_context(|| format!("Failed to parse instruction stream: {}", opts.input.display()))?;

    let prims = match &opts.primitives {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read primitive table: {}", path.display()))?;
            PrimitiveTable::from_json(&text)
                .with_context(|| format!("Failed to parse primitive table: {}", path.display()))?
        }
        None => PrimitiveTable::standard(),
    };

    if opts.stats {
        let (hex_text, stats) = pbasm::assemble_with_stats(program.items(), &prims)?;
        fs::write(&opts.output, &hex_text)?;
        println!(
            "Successfully assembled {} to {}",
            opts.input.display(),
            opts.output.display()
        );
        println!(
            "{} instructions, {} constants, {} globals ({} rel4, {} rel8, {} rel12, {} abs16)",
            stats.total_instructions,
            stats.constant_count,
            stats.global_count,
            stats.rel4_branches,
            stats.rel8_branches,
            stats.rel12_branches,
            stats.abs16_branches,
        );
    } else {
        let hex_text = pbasm::assemble(program.items(), &prims)?;
        fs::write(&opts.output, &hex_text)?;
        println!(
            "Successfully assembled {} to {}",
            opts.input.display(),
            opts.output.display()
        );
    }

    Ok(())
}
