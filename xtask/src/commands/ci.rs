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

use crate::helpers::*;
use anyhow::Result;
use std::time::Instant;

/// A cargo invocation run as one step of the pipeline.
pub struct CargoTask {
    pub name: &'static str,
    pub emoji: &'static str,
    pub color: &'static str,
    pub info: &'static str,
    pub args: &'static [&'static str],
}

pub const BUILD: CargoTask = CargoTask {
    name: "Build",
    emoji: "🔨",
    color: BLUE,
    info: "Compiling all workspace crates in debug mode",
    args: &["build", "--workspace"],
};

pub const TEST: CargoTask = CargoTask {
    name: "Tests",
    emoji: "🧪",
    color: GREEN,
    info: "Running unit tests, integration tests and doc tests",
    args: &["test", "--workspace"],
};

pub const CHECK_TASK: CargoTask = CargoTask {
    name: "Check",
    emoji: "🔍",
    color: CYAN,
    info: "Checking code for errors without building executables",
    args: &["check", "--workspace"],
};

pub const FORMAT: CargoTask = CargoTask {
    name: "Format",
    emoji: "🎨",
    color: MAGENTA,
    info: "Formatting code using rustfmt with default settings",
    // `fmt` takes `--all`, not `--workspace`.
    args: &["fmt", "--all"],
};

pub const CLIPPY_TASK: CargoTask = CargoTask {
    name: "Clippy",
    emoji: "📎",
    color: YELLOW,
    info: "Running Clippy linter with warnings as errors",
    args: &["clippy", "--workspace", "--", "-D", "warnings"],
};

pub fn run(task: &CargoTask) -> Result<()> {
    print_task_start(task.name, task.emoji, task.color);
    print_info(task.info);
    run_cargo(task.args, task.name)
}

/// Runs every task in order, continuing past failures, then prints a summary.
pub fn all() -> Result<()> {
    println!("{}", BANNER);
    println!("{}{}Starting full pipeline...{}", BOLD, CYAN, RESET);

    let tasks = [&BUILD, &TEST, &CHECK_TASK, &FORMAT, &CLIPPY_TASK];
    let start_time = Instant::now();
    let mut failed = Vec::new();

    for (i, task) in tasks.iter().enumerate() {
        println!("\n{}{}[{}/{}]{}", BOLD, BLUE, i + 1, tasks.len(), RESET);
        if run(task).is_err() {
            failed.push(task.name);
        }
    }

    println!(
        "\n{}{}━━━ Summary ({:.2}s) ━━━{}",
        BOLD,
        CYAN,
        start_time.elapsed().as_secs_f64(),
        RESET
    );
    if failed.is_empty() {
        print_success(&format!("All {} tasks completed 🚀", tasks.len()));
        Ok(())
    } else {
        print_error(&format!("Failed: {}", failed.join(", ")));
        anyhow::bail!("{}/{} tasks failed", failed.len(), tasks.len());
    }
}
