// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod modes;

use anyhow::{bail, ensure, Context};
use env_logger::Target;
use std::path::PathBuf;
use structopt::StructOpt;

use harness::{BehavioralDivider, DividerDut, Fault, Harness, HarnessConfig, RunReport, Strategy};
use modes::{FaultMode, StrategyMode};

#[derive(StructOpt, Debug)]
#[structopt(
    name = "divider-suite",
    about = "Verifies a programmable clock divider against its transfer function"
)]
struct Arguments {
    /// supported strategies: Default, Single, Random, Boundary, Exhaustive
    #[structopt(short, long, default_value = "Default")]
    strategy: StrategyMode,
    /// divisor programmed by the Single strategy
    #[structopt(short, long, default_value = "4")]
    divisor: u64,
    /// width of the divisor control input
    #[structopt(short, long, default_value = "4")]
    width: usize,
    /// number of Random cases; overrides the configuration
    #[structopt(short, long)]
    iterations: Option<usize>,
    /// seed for the Random strategy; overrides the configuration
    #[structopt(long)]
    seed: Option<u64>,
    /// YAML configuration file
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,
    /// dump waveforms to this VCD file
    #[structopt(long, parse(from_os_str))]
    vcd: Option<PathBuf>,
    /// supported faults: None, OffByOne, SkewedDuty, Stuck
    #[structopt(short, long, default_value = "None")]
    fault: FaultMode,
    /// divisor at which a Stuck divider stops toggling
    #[structopt(long, default_value = "0")]
    fault_divisor: u64,
}

fn configuration(args: &Arguments) -> anyhow::Result<HarnessConfig> {
    let mut config = match &args.config {
        Some(path) => HarnessConfig::from_file(path)?,
        None => HarnessConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(iterations) = args.iterations {
        config.random_iterations = iterations;
    }
    if args.vcd.is_some() {
        config.vcd = args.vcd.clone();
    }
    Ok(config)
}

fn run(args: &Arguments) -> anyhow::Result<RunReport> {
    ensure!(
        args.width > 0 && args.width < 64,
        "Divisor width must be between 1 and 63, got {}",
        args.width
    );
    let config = configuration(args)?;
    let fault = match args.fault {
        FaultMode::None => Fault::None,
        FaultMode::OffByOne => Fault::OffByOne,
        FaultMode::SkewedDuty => Fault::SkewedDuty,
        FaultMode::Stuck => Fault::Stuck(args.fault_divisor),
    };
    let strategy = match args.strategy {
        StrategyMode::Default => Strategy::Default,
        StrategyMode::Single => Strategy::Single(args.divisor),
        StrategyMode::Random => Strategy::Random(config.random_iterations),
        StrategyMode::Boundary => Strategy::Boundary,
        StrategyMode::Exhaustive => Strategy::Exhaustive,
    };
    let divider = BehavioralDivider::with_fault(args.width, fault);
    let dut = DividerDut::new(Box::new(divider)).context("Failed to elaborate the divider")?;
    let mut harness = Harness::new(dut, config);
    let report = harness
        .run(strategy)
        .with_context(|| format!("{:?} strategy failed", args.strategy))?;
    Ok(report)
}

fn main() -> anyhow::Result<()> {
    let args = Arguments::from_args();

    let _logger = env_logger::builder()
        .filter(Some("divider_suite"), log::LevelFilter::Info)
        .filter(Some("harness"), log::LevelFilter::Info)
        .target(Target::Stderr)
        .parse_default_env()
        .init();

    let report = run(&args)?;
    if !report.passed() {
        bail!("{}", report.summary());
    }
    log::info!("{}", report.summary());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use harness::{Error, Quantity, SoftFailure};

    fn arguments(cmdline: &[&str]) -> Arguments {
        let _logger = env_logger::builder().is_test(true).try_init();
        Arguments::from_iter(std::iter::once("divider_suite").chain(cmdline.iter().cloned()))
    }

    fn divider_harness(width: usize, fault: Fault) -> Harness {
        let dut = DividerDut::new(Box::new(BehavioralDivider::with_fault(width, fault))).unwrap();
        Harness::new(dut, HarnessConfig::default())
    }

    #[test]
    fn test_divide_by_four() {
        let report = run(&arguments(&["--strategy", "Single", "--divisor", "4"])).unwrap();
        assert_eq!(report.cases.len(), 1);
        let measurement = report.cases[0].measurement;
        assert!(measurement.full_period() > 3.96 && measurement.full_period() < 4.04);
        assert!(measurement.half_period() > 1.98 && measurement.half_period() < 2.02);
    }

    #[test]
    fn test_largest_divisor_for_four_bits() {
        let report = run(&arguments(&["-s", "Single", "-d", "15"])).unwrap();
        let full = report.cases[0].measurement.full_period();
        assert!(full > 14.85 && full < 15.15, "measured {}", full);
    }

    #[test]
    fn test_passthrough_divisors() {
        for divisor in &["0", "1"] {
            let report = run(&arguments(&["-s", "Single", "-d", divisor])).unwrap();
            assert_eq!(report.cases[0].measurement.full_period(), 1.0);
            assert_eq!(report.cases[0].measurement.half_period(), 0.5);
        }
    }

    #[test]
    fn test_divisor_too_wide_for_control() {
        let err = run(&arguments(&["-s", "Single", "-d", "16"])).unwrap_err();
        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::DivisorOutOfRange {
                divisor: 16,
                max: 15
            })
        );
    }

    #[test]
    fn test_repeated_cases_measure_the_same() {
        let mut harness = divider_harness(4, Fault::None);
        let first = harness.single_case(6).unwrap();
        let second = harness.single_case(6).unwrap();
        assert_eq!(
            first.measurement.full_period(),
            second.measurement.full_period()
        );
        assert_eq!(
            first.measurement.half_period(),
            second.measurement.half_period()
        );
        assert!(second.measurement.rising > first.measurement.next_rising);
    }

    #[test]
    fn test_exhaustive_sweep_in_order() {
        let report = run(&arguments(&["-s", "Exhaustive", "-w", "4"])).unwrap();
        assert!(report.passed());
        assert_eq!(report.divisors(), (0..=15).collect::<Vec<_>>());
    }

    #[test]
    fn test_exhaustive_sweep_reports_off_by_one() {
        let report = run(&arguments(&["-s", "Exhaustive", "-w", "3", "-f", "OffByOne"])).unwrap();
        assert!(!report.passed());
        match &report.failures[0] {
            SoftFailure::OutOfTolerance(mismatch) => {
                assert_eq!(mismatch.divisor, 2);
                assert_eq!(mismatch.quantity, Quantity::FullPeriod);
                assert_eq!(mismatch.expected, 2.0);
                assert_eq!(mismatch.measured, 3.0);
            }
            other => panic!("unexpected failure {:?}", other),
        }
    }

    #[test]
    fn test_single_case_stops_on_skewed_duty_cycle() {
        let err = run(&arguments(&["-s", "Single", "-d", "4", "-f", "SkewedDuty"])).unwrap_err();
        match err.downcast_ref::<Error>() {
            Some(Error::OutOfTolerance(mismatch)) => {
                assert_eq!(mismatch.quantity, Quantity::HalfPeriod);
                assert_eq!(mismatch.expected, 2.0);
                assert_eq!(mismatch.measured, 2.5);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_random_cases_follow_the_seed() {
        let cmdline = ["-s", "Random", "-i", "5", "--seed", "42"];
        let first = run(&arguments(&cmdline)).unwrap();
        let second = run(&arguments(&cmdline)).unwrap();
        assert_eq!(first.cases.len(), 5);
        assert_eq!(first.divisors(), second.divisors());
        assert!(first.divisors().iter().all(|divisor| *divisor <= 15));
    }

    #[test]
    fn test_boundary_cases_for_wide_control() {
        let report = run(&arguments(&["-s", "Boundary", "-w", "6"])).unwrap();
        assert_eq!(report.divisors(), vec![0, 1, 63]);
        assert_eq!(report.cases[2].measurement.full_period(), 63.0);
    }

    #[test]
    fn test_default_strategy_checks_nothing() {
        let report = run(&arguments(&[])).unwrap();
        assert!(report.passed());
        assert!(report.cases.is_empty());
    }

    #[test]
    fn test_configuration_file_and_overrides() {
        let mut path = std::env::temp_dir();
        path.push("divider_suite_test.yaml");
        std::fs::write(&path, "---\nclock_period_ns: 2.0\nrandom_iterations: 3\nseed: 9\n").unwrap();
        let config_arg = path.to_str().unwrap();
        let args = arguments(&["-s", "Random", "-c", config_arg, "--seed", "11"]);
        let config = configuration(&args).unwrap();
        assert_eq!(config.clock_period(), 2_000);
        assert_eq!(config.random_iterations, 3);
        assert_eq!(config.seed, 11);
        let report = run(&arguments(&["-s", "Single", "-d", "5", "-c", config_arg])).unwrap();
        assert_eq!(report.cases[0].measurement.full_period(), 10.0);
    }

    #[test]
    fn test_invalid_width_rejected() {
        assert!(run(&arguments(&["-w", "0"])).is_err());
        assert!(run(&arguments(&["-w", "64"])).is_err());
    }
}
