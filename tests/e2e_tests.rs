//! End-to-end integration tests
//!
//! These tests validate the complete pipeline using predefined CSV fixtures.
//! Each test:
//! 1. Reads input.csv from a fixture directory
//! 2. Applies all operations through the selected strategy
//! 3. Compares the account table with expected.csv
//! 4. Compares the ledger with expected_ledger.csv when the fixture has one
//!
//! Test fixtures are located in tests/fixtures/ and cover:
//! - Happy path money flow down the hierarchy
//! - Permission, funds and amount failures
//! - Claw-back by the Mother Admin
//! - Activate, deactivate and ban flows
//! - Profile edits and logins
//! - Malformed rows
//! - Email uniqueness across updates and signups
//!
//! Each fixture is run with both the synchronous and the async strategy.

#[cfg(test)]
mod tests {
    use admin_ledger::cli::StrategyType;
    use admin_ledger::strategy::{create_strategy, BatchConfig};
    use rstest::rstest;
    use std::fs;
    use std::io::Write;
    use std::path::Path;

    /// Run a fixture and compare both outputs with the expected files
    fn run_test_fixture(fixture_name: &str, strategy_type: StrategyType, config: Option<BatchConfig>) {
        let fixture_dir = format!("tests/fixtures/{}", fixture_name);
        let input_path = format!("{}/input.csv", fixture_dir);
        let expected_path = format!("{}/expected.csv", fixture_dir);
        let expected_ledger_path = format!("{}/expected_ledger.csv", fixture_dir);

        assert!(
            Path::new(&input_path).exists(),
            "Input file not found: {}",
            input_path
        );

        let strategy = create_strategy(strategy_type, config);
        let mut output = Vec::new();
        let mut ledger = Vec::new();

        strategy
            .process(
                Path::new(&input_path),
                &mut output,
                Some(&mut ledger as &mut dyn Write),
            )
            .unwrap_or_else(|e| panic!("Failed to process operations: {}", e));

        let actual_output = String::from_utf8(output).expect("output is not UTF-8");
        let expected_output = fs::read_to_string(&expected_path)
            .unwrap_or_else(|e| panic!("Failed to read expected file {}: {}", expected_path, e));

        assert_eq!(
            actual_output, expected_output,
            "\n\nOutput mismatch for fixture: {} (strategy: {:?})\n\nActual output:\n{}\n\nExpected output:\n{}\n",
            fixture_name, strategy_type, actual_output, expected_output
        );

        if Path::new(&expected_ledger_path).exists() {
            let actual_ledger = String::from_utf8(ledger).expect("ledger is not UTF-8");
            let expected_ledger = fs::read_to_string(&expected_ledger_path).unwrap_or_else(|e| {
                panic!("Failed to read expected file {}: {}", expected_ledger_path, e)
            });

            assert_eq!(
                actual_ledger, expected_ledger,
                "\n\nLedger mismatch for fixture: {} (strategy: {:?})\n",
                fixture_name, strategy_type
            );
        }
    }

    /// End-to-end test for all fixtures with both processing strategies
    #[rstest]
    #[case("happy_path")]
    #[case("permission_denied")]
    #[case("claw_back")]
    #[case("status_changes")]
    #[case("profile_updates")]
    #[case("malformed_data")]
    #[case("unique_fields")]
    fn test_fixtures(
        #[case] fixture: &str,
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        run_test_fixture(fixture, strategy, None);
    }

    /// Small batches split signups and the rows that use them across batches
    #[rstest]
    #[case("happy_path")]
    #[case("status_changes")]
    #[case("profile_updates")]
    #[case("unique_fields")]
    fn test_fixtures_with_small_batches(#[case] fixture: &str) {
        run_test_fixture(fixture, StrategyType::Async, Some(BatchConfig::new(3, 2)));
    }
}
