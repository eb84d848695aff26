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

//! Terminal output and process helpers shared by the tasks.

use anyhow::Result;
use std::process::Command;
use std::time::Instant;

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const GREEN: &str = "\x1b[32m";
pub const RED: &str = "\x1b[31m";
pub const BLUE: &str = "\x1b[34m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";
pub const MAGENTA: &str = "\x1b[35m";

pub const CHECK: &str = "✓";
pub const CROSS: &str = "✗";

pub const BANNER: &str = concat!(
    "\x1b[1m\x1b[36m",
    "╔═══════════════════════════════════════════════════════════╗\n",
    "║                        📦 LARDER                          ║\n",
    "║              Resource Cache Developer Tool                ║\n",
    "╚═══════════════════════════════════════════════════════════╝",
    "\x1b[0m"
);

/// Wraps `text` in a bold color.
pub fn paint(color: &str, text: &str) -> String {
    format!("{BOLD}{color}{text}{RESET}")
}

pub fn print_task_start(task_name: &str, emoji: &str, color: &str) {
    println!("\n{}", paint(color, &format!("━━━ {emoji} {task_name} {emoji} ━━━")));
}

pub fn print_info(message: &str) {
    println!("{BOLD}💡 Info:{RESET} {message}");
}

pub fn print_success(message: &str) {
    println!("{}", paint(GREEN, &format!("{CHECK} {message}")));
}

pub fn print_error(message: &str) {
    println!("{}", paint(RED, &format!("{CROSS} {message}")));
}

/// Formats a byte count with the largest unit that keeps it above one.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}

/// Runs `cargo` with `args`, reporting the outcome and elapsed time.
pub fn run_cargo(args: &[&str], task_name: &str) -> Result<()> {
    println!("{} cargo {}", paint(CYAN, "📋 Command:"), args.join(" "));
    let start = Instant::now();
    let status = Command::new("cargo").args(args).status()?;
    let seconds = start.elapsed().as_secs_f64();

    if !status.success() {
        print_error(&format!("{task_name} failed after {seconds:.2}s"));
        anyhow::bail!("{task_name} failed with status: {status}");
    }
    print_success(&format!("{task_name} completed in {seconds:.2}s"));
    Ok(())
}
