use outbreak::data_management::run_model;
use std::fs;
use std::path::Path;

const PARMS: &str = "
model_name: runner test
model_description: two scenarios, two replicates
replicates: 2
seed: 7
sim_parms:
  population_size: 400
  r0: 2
  illness_duration: 10
  infectious_window: {min: 1, max: 4}
  fatality_rate: 5
  initial_infectious: 4
scenario_parms:
  scenario_variable: fatality_rate
  scenario_values: [0, 100]
";

fn read_csv(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect()
}

#[test]
fn writes_a_table_per_replicate_and_a_summary_per_scenario() {
    let root = tempfile::tempdir().unwrap();
    fs::write(root.path().join("parms.yaml"), PARMS).unwrap();

    run_model(root.path()).unwrap();

    for scenario in 1..=2 {
        let dir = root
            .path()
            .join("Scenarios")
            .join(format!("scenario_{:04}", scenario));
        let summary = read_csv(&dir.join("summary.csv"));
        assert_eq!(summary.len(), 2);
        for replicate in 0..2 {
            let rows = read_csv(&dir.join(format!("results_rep_{:03}.csv", replicate)));
            // day 0: 4 infectious, no recovered, no dead, 396 susceptible
            assert_eq!(rows[0], vec!["0", "4", "0", "0", "396", "400"]);
            assert_eq!(rows.last().unwrap()[1], "0");
        }
    }

    // everybody who resolves dies in the 100% scenario
    let certain_death = read_csv(
        &root
            .path()
            .join("Scenarios")
            .join("scenario_0002")
            .join("summary.csv"),
    );
    for row in certain_death {
        // total_recovered column
        assert_eq!(row[11], "0");
        assert_eq!(row[4], "true");
    }
}

#[test]
fn reruns_replace_old_results() {
    let root = tempfile::tempdir().unwrap();
    fs::write(root.path().join("parms.yaml"), PARMS).unwrap();
    run_model(root.path()).unwrap();
    let first = fs::read_to_string(
        root.path()
            .join("Scenarios")
            .join("scenario_0001")
            .join("results_rep_000.csv"),
    )
    .unwrap();

    run_model(root.path()).unwrap();
    let second = fs::read_to_string(
        root.path()
            .join("Scenarios")
            .join("scenario_0001")
            .join("results_rep_000.csv"),
    )
    .unwrap();
    // same seed, same numbers, nothing appended
    assert_eq!(first, second);
}

#[test]
fn missing_parameter_file_is_an_error() {
    let root = tempfile::tempdir().unwrap();
    assert!(run_model(root.path()).is_err());
}
