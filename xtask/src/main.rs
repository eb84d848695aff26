// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Developer tasks for the larder workspace.
// Run with: cargo xtask <command>

mod commands;
mod helpers;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{ci, pack};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "xtask", version, about = helpers::BANNER)]
struct Cli {
    #[command(subcommand)]
    command: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Build all crates in the workspace.
    Build,
    /// Run all tests in the workspace.
    Test,
    /// Run `cargo check` on all crates.
    Check,
    /// Format all code in the workspace.
    Format,
    /// Run clippy on all crates with warnings as errors.
    Clippy,
    /// Run build, test, check, format and clippy in sequence.
    All,
    /// Build a resource package from a manifest.
    Pack {
        /// Manifest listing the source directories and the output file.
        #[arg(long, default_value = "Package.toml")]
        manifest: PathBuf,
    },
    /// List the entries of a resource package.
    List {
        package: PathBuf,
        /// Read every entry back and check its checksum.
        #[arg(long)]
        verify: bool,
    },
}

fn run(task: Task) -> Result<()> {
    match task {
        Task::Build => ci::run(&ci::BUILD),
        Task::Test => ci::run(&ci::TEST),
        Task::Check => ci::run(&ci::CHECK_TASK),
        Task::Format => ci::run(&ci::FORMAT),
        Task::Clippy => ci::run(&ci::CLIPPY_TASK),
        Task::All => ci::all(),
        Task::Pack { manifest } => pack::pack(&manifest),
        Task::List { package, verify } => pack::list(&package, verify),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            helpers::print_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
