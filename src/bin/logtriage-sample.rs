// logtriage - GPL-3.0-or-later
// This file is part of logtriage.
//
// Copyright (C) 2025 The logtriage authors
//
// logtriage is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// logtriage is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with logtriage.  If not, see <https://www.gnu.org/licenses/>.


//! Writes a synthetic test-suite log for trying out `logtriage analyze`.

use anyhow::Context;
use chrono::{DateTime, Duration, Local};
use clap::Parser;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const TEST_NAMES: [&str; 10] = [
    "Login with valid credentials",
    "Login with invalid credentials",
    "User registration",
    "Password reset",
    "Session timeout",
    "API endpoint test",
    "Database connection",
    "File upload",
    "Email notification",
    "Payment processing",
];

const ERROR_DETAILS: [&str; 8] = [
    "Database connection timeout error occurred",
    "JavaScript undefined variable error in login.js",
    "Python API endpoint failed with 500 error",
    "SQL query timeout after 30 seconds",
    "Authentication token expired",
    "Network connection refused",
    "File upload size exceeds limit",
    "Email service unavailable",
];

#[derive(Parser, Debug)]
#[command(name = "logtriage-sample")]
#[command(version)]
#[command(about = "Generate a sample test-suite log", long_about = None)]
struct Args {
    /// Seed for reproducible output
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of test cases
    #[arg(long, default_value_t = 10)]
    tests: usize,

    /// Probability that a test case fails
    #[arg(long, default_value_t = 0.3, value_parser = parse_rate)]
    failure_rate: f64,

    /// Output file; stdout when omitted
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn parse_rate(s: &str) -> Result<f64, String> {
    let rate: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(format!("{rate} is not between 0 and 1"))
    }
}

fn render(rng: &mut impl Rng, tests: usize, failure_rate: f64, start: DateTime<Local>) -> String {
    let stamp = |offset: usize| {
        let secs = i64::try_from(offset).unwrap_or_default();
        (start + Duration::seconds(secs)).format("%Y-%m-%d %H:%M:%S")
    };

    let mut out = String::new();
    let mut failed = 0;
    let _ = writeln!(out, "[{}] [INFO] Starting Test Suite Execution", stamp(0));

    for (idx, name) in TEST_NAMES.iter().cycle().take(tests).enumerate() {
        let at = stamp(idx + 1);
        if rng.gen_bool(failure_rate) {
            failed += 1;
            let detail = ERROR_DETAILS.choose(rng).copied().unwrap_or(ERROR_DETAILS[0]);
            let _ = writeln!(out, "[{at}] [FAIL] Test case: {name} - FAILED");
            let _ = writeln!(out, "[{at}] [ERROR] {detail}");
        } else {
            let _ = writeln!(out, "[{at}] [PASS] Test case: {name} - PASSED");
        }
    }

    let end = stamp(tests + 1);
    let _ = writeln!(out, "[{end}] [INFO] Test Suite Completed");
    let _ = writeln!(
        out,
        "[{end}] [SUMMARY] Total Tests: {tests}, Passed: {}, Failed: {failed}",
        tests - failed
    );
    out
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut rng = StdRng::seed_from_u64(args.seed);
    let log = render(&mut rng, args.tests, args.failure_rate, Local::now());

    match &args.output {
        Some(path) => {
            std::fs::write(path, &log)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Sample log with {} test cases written to {}", args.tests, path.display());
        }
        None => print!("{log}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use logtriage::classify::{classify_line, Outcome};

    fn sample(seed: u64, tests: usize, rate: f64) -> String {
        render(&mut StdRng::seed_from_u64(seed), tests, rate, Local::now())
    }

    #[test]
    fn test_same_seed_same_outcomes() {
        let strip = |log: String| -> Vec<String> {
            log.lines()
                .map(|line| line.split_once("] ").map_or(line, |(_, rest)| rest).to_string())
                .collect()
        };
        assert_eq!(strip(sample(7, 25, 0.5)), strip(sample(7, 25, 0.5)));
    }

    #[test]
    fn test_every_failure_has_error_detail() {
        let log = sample(1, 10, 1.0);
        let fails = log.lines().filter(|l| l.contains("[FAIL]")).count();
        let errors = log.lines().filter(|l| l.contains("[ERROR]")).count();
        assert_eq!(fails, 10);
        assert_eq!(errors, 10);
        assert!(log.contains("Passed: 0, Failed: 10"));
    }

    #[test]
    fn test_lines_classify() {
        let log = sample(3, 10, 0.0);
        let passed = log
            .lines()
            .filter(|l| l.contains("[PASS]"))
            .filter(|l| classify_line(l) == Some(Outcome::Passed))
            .count();
        assert_eq!(passed, 10);
    }

    #[test]
    fn test_rate_bounds() {
        assert!(parse_rate("0.25").is_ok());
        assert!(parse_rate("1.5").is_err());
        assert!(parse_rate("abc").is_err());
    }
}
