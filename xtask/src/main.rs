// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Maintenance tasks for the workspace, run via `cargo run -p x -- <task>`.
//!
//! Kept intentionally small: this crate is scaffolding around the library,
//! not part of the sketch core.

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "x", about = "workspace maintenance tasks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Verify that the tools this xtask shells out to are on PATH.
    CheckTools,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::CheckTools => check_tools(),
    }
}

fn check_tools() -> anyhow::Result<()> {
    for tool in ["cargo", "rustfmt"] {
        match which::which(tool) {
            Ok(path) => println!("{tool}: {}", path.display()),
            Err(_) => println!("{tool}: not found on PATH"),
        }
    }
    Ok(())
}
