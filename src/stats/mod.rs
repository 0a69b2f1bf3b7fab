/////////////////////////////////////////////////////////////////////////////////////
//
// Outbreak model
//
// stats module
//
// turns the daily records of a run into cumulative series, summaries
// and csv tables
//
////////////////////////////////////////////////////////////////////////////////////

use super::error::OutbreakError;
use super::transition::DailyRecord;
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

// Run result ---------------------------------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub records: Vec<DailyRecord>,
    pub cumulative_dead: Vec<usize>,
    pub cumulative_recovered: Vec<usize>,
    pub population: Vec<usize>,
    pub initial_immune: usize,
    pub contact_rates: ContactRateSummary,
}

impl RunResult {
    // cumulative deaths are a running sum of the daily deaths; recovered is whatever
    // is neither infectious, dead nor susceptible, with day 0 pinned to the immune count
    pub fn from_records(
        records: Vec<DailyRecord>,
        initial_immune: usize,
        contact_rates: ContactRateSummary,
    ) -> RunResult {
        let mut cumulative_dead = Vec::with_capacity(records.len());
        let mut cumulative_recovered = Vec::with_capacity(records.len());
        let mut population = Vec::with_capacity(records.len());
        let mut dead = 0;
        for (day, record) in records.iter().enumerate() {
            dead += record.new_deaths;
            cumulative_dead.push(dead);
            population.push(record.population);
            let recovered = if day == 0 {
                initial_immune
            } else {
                record
                    .population
                    .saturating_sub(record.infectious)
                    .saturating_sub(dead)
                    .saturating_sub(record.susceptible)
            };
            cumulative_recovered.push(recovered);
        }

        RunResult {
            records,
            cumulative_dead,
            cumulative_recovered,
            population,
            initial_immune,
            contact_rates,
        }
    }

    // index of the last simulated day
    pub fn days(&self) -> usize {
        self.records.len().saturating_sub(1)
    }

    pub fn final_infectious(&self) -> usize {
        self.records.last().map_or(0, |r| r.infectious)
    }

    pub fn rows(&self) -> Vec<ReportRow> {
        self.records
            .iter()
            .enumerate()
            .map(|(day, record)| ReportRow {
                day,
                infectious: record.infectious,
                recovered: self.cumulative_recovered[day],
                cumulative_dead: self.cumulative_dead[day],
                susceptible: record.susceptible,
                population: record.population,
            })
            .collect()
    }

    pub fn summary(&self, converged: bool) -> RunSummary {
        let (peak_day, peak_infectious) = self
            .records
            .iter()
            .enumerate()
            .fold((0, 0), |best, (day, r)| {
                if r.infectious > best.1 {
                    (day, r.infectious)
                } else {
                    best
                }
            });
        let ever_infected: usize = self.records.first().map_or(0, |r| r.infectious)
            + self.records.iter().map(|r| r.new_infections).sum::<usize>();
        let initial_population = self.population.first().cloned().unwrap_or(0);
        let attack_rate = if initial_population == 0 {
            0.0
        } else {
            ever_infected as f64 / initial_population as f64
        };
        let last = self.records.last().cloned().unwrap_or_default();

        RunSummary {
            converged,
            days: self.days(),
            peak_infectious,
            peak_day,
            ever_infected,
            attack_rate,
            total_dead: self.cumulative_dead.last().cloned().unwrap_or(0),
            total_recovered: self.cumulative_recovered.last().cloned().unwrap_or(0),
            final_susceptible: last.susceptible,
            final_population: last.population,
            births: self.records.iter().map(|r| r.births).sum(),
            overloaded_days: self.records.iter().filter(|r| r.overloaded).count(),
        }
    }
}

// one line of the results table
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
pub struct ReportRow {
    pub day: usize,
    pub infectious: usize,
    pub recovered: usize,
    pub cumulative_dead: usize,
    pub susceptible: usize,
    pub population: usize,
}

impl ReportRow {
    pub fn header() -> &'static [&'static str] {
        &[
            "day",
            "infectious",
            "recovered",
            "cumulative_dead",
            "susceptible",
            "population",
        ]
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub converged: bool,
    pub days: usize,
    pub peak_infectious: usize,
    pub peak_day: usize,
    pub ever_infected: usize,
    pub attack_rate: f64,
    pub total_dead: usize,
    pub total_recovered: usize,
    pub final_susceptible: usize,
    pub final_population: usize,
    pub births: usize,
    pub overloaded_days: usize,
}

// a run summary tagged with where it comes from, flat so it can go to csv
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub scenario: usize,
    pub scenario_value: Option<f64>,
    pub replicate: usize,
    pub seed: Option<u64>,
    pub converged: bool,
    pub days: usize,
    pub peak_infectious: usize,
    pub peak_day: usize,
    pub ever_infected: usize,
    pub attack_rate: f64,
    pub total_dead: usize,
    pub total_recovered: usize,
    pub final_susceptible: usize,
    pub final_population: usize,
    pub births: usize,
    pub overloaded_days: usize,
}

impl SummaryRow {
    pub fn new(
        scenario: usize,
        scenario_value: Option<f64>,
        replicate: usize,
        seed: Option<u64>,
        s: &RunSummary,
    ) -> SummaryRow {
        SummaryRow {
            scenario,
            scenario_value,
            replicate,
            seed,
            converged: s.converged,
            days: s.days,
            peak_infectious: s.peak_infectious,
            peak_day: s.peak_day,
            ever_infected: s.ever_infected,
            attack_rate: s.attack_rate,
            total_dead: s.total_dead,
            total_recovered: s.total_recovered,
            final_susceptible: s.final_susceptible,
            final_population: s.final_population,
            births: s.births,
            overloaded_days: s.overloaded_days,
        }
    }

    pub fn header() -> &'static [&'static str] {
        &[
            "scenario",
            "scenario_value",
            "replicate",
            "seed",
            "converged",
            "days",
            "peak_infectious",
            "peak_day",
            "ever_infected",
            "attack_rate",
            "total_dead",
            "total_recovered",
            "final_susceptible",
            "final_population",
            "births",
            "overloaded_days",
        ]
    }
}

// Contact rates -------------------------------------------------------------------------------------------------
// distribution of the contact rates drawn for the seeded population
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContactRateSummary {
    pub count: usize,
    pub mean: f64,
    pub max: usize,
    pub zero_share: f64,
    // histogram[k] = number of people with contact rate k
    pub histogram: Vec<usize>,
}

impl ContactRateSummary {
    pub fn from_rates(rates: &[usize]) -> ContactRateSummary {
        if rates.is_empty() {
            return ContactRateSummary::default();
        }
        let max = rates.iter().cloned().max().unwrap_or(0);
        let mut histogram = vec![0; max + 1];
        for &rate in rates {
            histogram[rate] += 1;
        }
        let total: usize = rates.iter().sum();
        ContactRateSummary {
            count: rates.len(),
            mean: total as f64 / rates.len() as f64,
            max,
            zero_share: histogram[0] as f64 / rates.len() as f64,
            histogram,
        }
    }
}

// Csv tables ----------------------------------------------------------------------------------------------------
// A csv file whose header is written on creation. Records are appended later.
pub struct TableLog {
    file_path: PathBuf,
}

impl TableLog {
    pub fn new<P: AsRef<Path>>(file_path: P, header: &[&str]) -> Result<TableLog, OutbreakError> {
        let file_path = file_path.as_ref().to_path_buf();
        let mut wtr = WriterBuilder::new().has_headers(false).from_path(&file_path)?;
        wtr.write_record(header)?;
        wtr.flush()?;
        Ok(TableLog { file_path })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn append<T: Serialize>(&self, records: &[T]) -> Result<(), OutbreakError> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .append(true)
            .open(&self.file_path)?;
        let mut wtr = WriterBuilder::new().has_headers(false).from_writer(file);

        for record in records {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
