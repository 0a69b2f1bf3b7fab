/////////////////////////////////////////////////////////////////////////////////////
//
// Outbreak model
//
// data_management module
//
// functions to read and write from file system
//
////////////////////////////////////////////////////////////////////////////////////

use super::error::OutbreakError;
use super::policy::{DemographicPolicy, FatalityPolicy, TransmissionPolicy};
use super::simulation::{self, SimParms};
use super::stats::{ReportRow, SummaryRow, TableLog};
use log::{info, warn};
use std::convert::TryFrom;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use yaml_rust::{Yaml, YamlLoader};

// -------------------------------- File paths -------------------------------------------------------------
pub struct ModelDataStore {
    parameter_file: PathBuf,
    scenario_dir: PathBuf,
}

impl ModelDataStore {
    // file paths start at model_root, which must hold parms.yaml
    // the scenario folder is recreated from scratch
    pub fn new<P: AsRef<Path>>(model_root: P) -> Result<ModelDataStore, OutbreakError> {
        let model_dir = model_root.as_ref();
        info!("model root path: {}", model_dir.display());
        let parameter_file = model_dir.join("parms.yaml");
        let scenario_dir = model_dir.join("Scenarios");

        if !parameter_file.exists() {
            return Err(OutbreakError::Parameter(format!(
                "no parameter file at {}",
                parameter_file.display()
            )));
        }

        // create the scenario directory - delete first if it exists
        if scenario_dir.exists() {
            fs::remove_dir_all(&scenario_dir)?;
        }
        fs::create_dir(&scenario_dir)?;

        Ok(ModelDataStore {
            parameter_file,
            scenario_dir,
        })
    }

    pub fn scenario_root(&self) -> &Path {
        &self.scenario_dir
    }

    pub fn get_model_parms(&self) -> Result<ModelParameters, OutbreakError> {
        let parm_string = fs::read_to_string(&self.parameter_file)?;
        ModelParameters::from_yaml_str(&parm_string)
    }

    fn get_scenario_directory(&self, scenario_number: usize) -> PathBuf {
        self.scenario_dir
            .join(format!("scenario_{:04}", scenario_number))
    }

    pub fn create_scenario_directory(&self, scenario_number: usize) -> Result<PathBuf, OutbreakError> {
        let dir_full_path = self.get_scenario_directory(scenario_number);
        if !dir_full_path.exists() {
            fs::create_dir(&dir_full_path)?;
        }
        Ok(dir_full_path)
    }
}

// ----------------------------- Scenario output ------------------------------------------------------------
// the results of one scenario: a day table per replicate and one summary table
pub struct ScenarioLog {
    dir: PathBuf,
    summary: TableLog,
}

impl ScenarioLog {
    pub fn new<P: AsRef<Path>>(scenario_dir: P) -> Result<ScenarioLog, OutbreakError> {
        let dir = scenario_dir.as_ref().to_path_buf();
        let summary = TableLog::new(dir.join("summary.csv"), SummaryRow::header())?;
        Ok(ScenarioLog { dir, summary })
    }

    pub fn replicate_path(&self, replicate: usize) -> PathBuf {
        self.dir.join(format!("results_rep_{:03}.csv", replicate))
    }

    pub fn write_replicate(&self, replicate: usize, rows: &[ReportRow]) -> Result<(), OutbreakError> {
        let log = TableLog::new(self.replicate_path(replicate), ReportRow::header())?;
        log.append(rows)
    }

    pub fn append_summary(&self, row: SummaryRow) -> Result<(), OutbreakError> {
        self.summary.append(&[row])
    }
}

// ----------------------------- Scenario parameters -------------------------------------------------------
//
//  Scenario parameters manage a series of runs each differing from the base
//  parameters by the value of one variable
#[derive(Hash, Debug, Copy, Clone, Eq, PartialEq)]
pub enum SensitivityVariable {
    R0,
    PopulationSize,
    FatalityRate,
    TransmissionRate,
    InitialImmunity,
    InitialInfectious,
    IllnessDuration,
}
impl fmt::Display for SensitivityVariable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
impl FromStr for SensitivityVariable {
    type Err = OutbreakError;

    fn from_str(s: &str) -> Result<SensitivityVariable, OutbreakError> {
        match s {
            "r0" => Ok(SensitivityVariable::R0),
            "population_size" => Ok(SensitivityVariable::PopulationSize),
            "fatality_rate" => Ok(SensitivityVariable::FatalityRate),
            "transmission_rate" => Ok(SensitivityVariable::TransmissionRate),
            "initial_immunity" => Ok(SensitivityVariable::InitialImmunity),
            "initial_infectious" => Ok(SensitivityVariable::InitialInfectious),
            "illness_duration" => Ok(SensitivityVariable::IllnessDuration),
            _ => Err(OutbreakError::Parameter(format!(
                "unknown scenario variable '{}'",
                s
            ))),
        }
    }
}

impl SensitivityVariable {
    // base parameters with this variable set to `value`
    // counts and percentages must be whole and non-negative, never rounded
    pub fn apply(self, base: &SimParms, value: f64) -> Result<SimParms, OutbreakError> {
        let mut parms = base.clone();
        if self == SensitivityVariable::R0 {
            parms.r0 = value;
            return Ok(parms);
        }

        let whole = self.whole(value)?;
        let small = u32::try_from(whole).map_err(|_| self.out_of_range(value))?;
        let count = usize::try_from(whole).map_err(|_| self.out_of_range(value))?;
        match self {
            SensitivityVariable::R0 => {}
            SensitivityVariable::PopulationSize => parms.population_size = count,
            SensitivityVariable::FatalityRate => parms.fatality = parms.fatality.with_percent(small),
            SensitivityVariable::TransmissionRate => {
                parms.transmission = TransmissionPolicy::from_percent(small)
            }
            SensitivityVariable::InitialImmunity => parms.initial_immunity = small,
            SensitivityVariable::InitialInfectious => parms.initial_infectious = count,
            SensitivityVariable::IllnessDuration => parms.illness.duration = small,
        }
        Ok(parms)
    }

    fn whole(self, value: f64) -> Result<u64, OutbreakError> {
        if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 {
            Ok(value as u64)
        } else {
            Err(self.out_of_range(value))
        }
    }

    fn out_of_range(self, value: f64) -> OutbreakError {
        OutbreakError::Parameter(format!(
            "scenario value {} for {} must be a non-negative whole number",
            value, self
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub number: usize,
    pub value: Option<f64>,
    pub sim_parms: SimParms,
}

#[derive(Debug, Clone)]
pub struct ModelParameters {
    pub model_name: String,
    pub model_description: String,
    pub replicates: usize,
    pub seed: Option<u64>,
    pub base_parms: SimParms,
    pub variable: Option<SensitivityVariable>,
    pub value_vector: Vec<f64>,
    current_increment: Option<usize>,
}

impl ModelParameters {
    pub fn from_yaml_str(parm_string: &str) -> Result<ModelParameters, OutbreakError> {
        // the loader creates an array of yaml documents
        let docs = YamlLoader::load_from_str(parm_string)?;

        // there can be multiple docs in Yaml file.  Only the first one interests us.
        let doc = docs
            .first()
            .ok_or_else(|| OutbreakError::Parameter(String::from("empty parameter file")))?;

        let model_name = required_str(doc, "model_name")?;
        let model_description = optional_str(doc, "model_description")?.unwrap_or_default();
        let replicates = optional_int(doc, "replicates")?.unwrap_or(1) as usize;
        let seed = optional_int(doc, "seed")?.map(|s| s as u64);

        let base_parms = parse_sim_parms(&doc["sim_parms"])?;

        // parse - Scenario parms ---------------------------------------------------
        let sp = &doc["scenario_parms"];
        let (variable, value_vector) = if sp.is_badvalue() {
            (None, Vec::new())
        } else {
            let variable: SensitivityVariable = required_str(sp, "scenario_variable")?.parse()?;
            let values = sp["scenario_values"].as_vec().ok_or_else(|| {
                OutbreakError::Parameter(String::from("expected a 'scenario_values' list"))
            })?;
            let mut scenario_values: Vec<f64> = Vec::with_capacity(values.len());
            for v in values {
                let value = as_number(v).ok_or_else(|| {
                    OutbreakError::Parameter(format!("scenario value {:?} is not a number", v))
                })?;
                variable.apply(&base_parms, value)?;
                scenario_values.push(value);
            }
            (Some(variable), scenario_values)
        };

        if replicates == 0 {
            return Err(OutbreakError::Parameter(String::from(
                "replicates must be at least 1",
            )));
        }

        Ok(ModelParameters {
            model_name,
            model_description,
            replicates,
            seed,
            base_parms,
            variable,
            value_vector,
            current_increment: None,
        })
    }

    pub fn scenario_count(&self) -> usize {
        if self.variable.is_some() {
            self.value_vector.len()
        } else {
            1
        }
    }

    // seed for one replicate; None means draw from entropy
    pub fn replicate_seed(&self, replicate: usize) -> Option<u64> {
        self.seed.map(|s| s.wrapping_add(replicate as u64))
    }
}

impl fmt::Display for ModelParameters {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Model name {}\nModel description {}\nBase parameters {}",
            self.model_name, self.model_description, self.base_parms
        )?;
        if let Some(variable) = self.variable {
            write!(
                f,
                "\nSensitivity analysis on {} with values {:?}",
                variable, self.value_vector
            )?;
        }
        Ok(())
    }
}

// the Iterator trait for scenario parameters issues a sequence of scenarios,
// each one differing from the base parameters by the variable being tested
impl Iterator for ModelParameters {
    type Item = Result<Scenario, OutbreakError>;

    fn next(&mut self) -> Option<Result<Scenario, OutbreakError>> {
        let increment = match self.current_increment {
            Some(increment) => increment + 1,
            None => 0,
        };
        self.current_increment = Some(increment);

        if increment >= self.scenario_count() {
            return None;
        }

        let scenario = match self.variable {
            Some(variable) => {
                let value = self.value_vector[increment];
                match variable.apply(&self.base_parms, value) {
                    Ok(sim_parms) => Scenario {
                        number: increment + 1,
                        value: Some(value),
                        sim_parms,
                    },
                    Err(e) => return Some(Err(e)),
                }
            }
            None => Scenario {
                number: 1,
                value: None,
                sim_parms: self.base_parms.clone(),
            },
        };
        Some(Ok(scenario))
    }
}

// ----------------------------- Model runner ---------------------------------------------------------------
// run every scenario of the model, every replicate of every scenario
pub fn run_model<P: AsRef<Path>>(model_root: P) -> Result<(), OutbreakError> {
    // The model data store handles all models inputs and outputs
    let model_data_store = ModelDataStore::new(model_root)?;
    let model_parms = model_data_store.get_model_parms()?;
    info!("--------------------Outbreak Model-----------------------");
    info!("{}", model_parms);
    info!(
        "Model runs {} scenarios of {} replicates",
        model_parms.scenario_count(),
        model_parms.replicates
    );

    let replicates = model_parms.replicates;
    let seeds: Vec<Option<u64>> = (0..replicates)
        .map(|r| model_parms.replicate_seed(r))
        .collect();

    for scenario in model_parms {
        let scenario = scenario?;
        info!(
            "Starting scenario {} ------------------------------------------------------------",
            scenario.number
        );
        let scenario_dir = model_data_store.create_scenario_directory(scenario.number)?;
        let scenario_log = ScenarioLog::new(&scenario_dir)?;

        for (replicate, seed) in seeds.iter().enumerate() {
            let outcome = match seed {
                Some(seed) => simulation::run_seeded(&scenario.sim_parms, *seed),
                None => simulation::run_from_entropy(&scenario.sim_parms),
            };
            let (result, converged) = match outcome {
                Ok(result) => (result, true),
                Err(OutbreakError::NotConverged { partial, .. }) => {
                    warn!(
                        "scenario {} replicate {} did not converge - keeping partial results",
                        scenario.number, replicate
                    );
                    (*partial, false)
                }
                Err(e) => return Err(e),
            };

            let contact_rates = &result.contact_rates;
            info!(
                "replicate {}: contact rates mean {:.2} max {} ({:.1}% never pass it on)",
                replicate,
                contact_rates.mean,
                contact_rates.max,
                contact_rates.zero_share * 100.0
            );
            scenario_log.write_replicate(replicate, &result.rows())?;
            scenario_log.append_summary(SummaryRow::new(
                scenario.number,
                scenario.value,
                replicate,
                *seed,
                &result.summary(converged),
            ))?;
        }
        info!("Scenario {} written to {}", scenario.number, scenario_dir.display());
    }
    Ok(())
}

// ----------------------------- Yaml helpers ---------------------------------------------------------------
// anything missing takes the default parameter value
fn parse_sim_parms(node: &Yaml) -> Result<SimParms, OutbreakError> {
    let defaults = SimParms::default();
    if node.is_badvalue() {
        return Ok(defaults);
    }

    let population_size = optional_int(node, "population_size")?
        .map_or(defaults.population_size, |v| v as usize);
    let r0 = optional_number(node, "r0")?.unwrap_or(defaults.r0);

    let mut illness = defaults.illness;
    if let Some(duration) = optional_int(node, "illness_duration")? {
        illness.duration = duration as u32;
    }
    let window = &node["infectious_window"];
    if !window.is_badvalue() {
        illness.infectious_from = required_int(window, "min")? as u32;
        illness.infectious_to = required_int(window, "max")? as u32;
    }

    let fatality_rate =
        optional_int(node, "fatality_rate")?.map_or(defaults.fatality.percent(), |v| v as u32);
    let overload = &node["healthcare_overload"];
    let fatality = if overload.is_badvalue() {
        FatalityPolicy::fixed(fatality_rate)
    } else {
        FatalityPolicy::Overload {
            percent: fatality_rate,
            threshold: optional_number(overload, "threshold")?.unwrap_or(0.25),
            multiplier: optional_number(overload, "multiplier")?.unwrap_or(2.0),
        }
    };

    let transmission = optional_int(node, "transmission_rate")?
        .map_or(defaults.transmission, |v| TransmissionPolicy::from_percent(v as u32));

    let demographics_node = &node["demographics"];
    let demographics = if demographics_node.is_badvalue() {
        DemographicPolicy::Closed
    } else {
        DemographicPolicy::Open {
            birth_rate: optional_number(demographics_node, "birth_rate")?.unwrap_or(0.0),
            death_rate: optional_number(demographics_node, "death_rate")?.unwrap_or(0.0),
        }
    };

    Ok(SimParms {
        population_size,
        r0,
        illness,
        initial_infectious: optional_int(node, "initial_infectious")?
            .map_or(defaults.initial_infectious, |v| v as usize),
        initial_immunity: optional_int(node, "initial_immunity")?
            .map_or(defaults.initial_immunity, |v| v as u32),
        fatality,
        transmission,
        demographics,
        max_days: optional_int(node, "max_days")?.map_or(defaults.max_days, |v| v as usize),
    })
}

// yaml-rust keeps integers and reals apart - accept either where a number is expected
fn as_number(value: &Yaml) -> Option<f64> {
    match value {
        Yaml::Integer(i) => Some(*i as f64),
        Yaml::Real(_) => value.as_f64(),
        _ => None,
    }
}

fn optional_number(node: &Yaml, key: &str) -> Result<Option<f64>, OutbreakError> {
    let value = &node[key];
    if value.is_badvalue() || value.is_null() {
        return Ok(None);
    }
    as_number(value)
        .map(Some)
        .ok_or_else(|| OutbreakError::Parameter(format!("'{}' must be a number", key)))
}

// counts and percentages must be whole and non-negative
fn optional_int(node: &Yaml, key: &str) -> Result<Option<i64>, OutbreakError> {
    let value = &node[key];
    if value.is_badvalue() || value.is_null() {
        return Ok(None);
    }
    match value.as_i64() {
        Some(i) if i >= 0 => Ok(Some(i)),
        _ => Err(OutbreakError::Parameter(format!(
            "'{}' must be a non-negative whole number",
            key
        ))),
    }
}

fn required_int(node: &Yaml, key: &str) -> Result<i64, OutbreakError> {
    optional_int(node, key)?
        .ok_or_else(|| OutbreakError::Parameter(format!("expected '{}' parameter", key)))
}

fn optional_str(node: &Yaml, key: &str) -> Result<Option<String>, OutbreakError> {
    let value = &node[key];
    if value.is_badvalue() || value.is_null() {
        return Ok(None);
    }
    value
        .as_str()
        .map(|s| Some(String::from(s)))
        .ok_or_else(|| OutbreakError::Parameter(format!("'{}' must be text", key)))
}

fn required_str(node: &Yaml, key: &str) -> Result<String, OutbreakError> {
    optional_str(node, key)?
        .ok_or_else(|| OutbreakError::Parameter(format!("expected '{}' parameter", key)))
}
