/////////////////////////////////////////////////////////////////////////////////////
//
// Outbreak model
//
// simulation module
//
// parameters of a run, their validation, and the driver that seeds the
// population and steps it one day at a time until nobody is infectious
//
////////////////////////////////////////////////////////////////////////////////////

use super::error::OutbreakError;
use super::policy::{DemographicPolicy, FatalityPolicy, TransmissionPolicy};
use super::stats::{ContactRateSummary, RunResult};
use super::transition::{DailyRecord, IllnessTimeline, TransitionEngine};
use super::utilities::ContactRateSampler;
use super::world::Population;
use log::{debug, info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fmt;

// one hundred years
pub const DEFAULT_MAX_DAYS: usize = 36_500;

// Parameters --------------------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq)]
pub struct SimParms {
    pub population_size: usize,
    pub r0: f64,
    pub illness: IllnessTimeline,
    pub initial_infectious: usize,
    // percent of the population immune at the outset
    pub initial_immunity: u32,
    pub fatality: FatalityPolicy,
    pub transmission: TransmissionPolicy,
    pub demographics: DemographicPolicy,
    // the run is abandoned if people are still infectious after this many days
    pub max_days: usize,
}

impl Default for SimParms {
    fn default() -> SimParms {
        SimParms {
            population_size: 10_000,
            r0: 2.5,
            illness: IllnessTimeline {
                duration: 14,
                infectious_from: 1,
                infectious_to: 6,
            },
            initial_infectious: 5,
            initial_immunity: 0,
            fatality: FatalityPolicy::fixed(5),
            transmission: TransmissionPolicy::Certain,
            demographics: DemographicPolicy::Closed,
            max_days: DEFAULT_MAX_DAYS,
        }
    }
}

impl SimParms {
    pub fn initial_immune_count(&self) -> usize {
        (u64::from(self.initial_immunity) * self.population_size as u64 / 100) as usize
    }

    pub fn validate(&self) -> Result<(), OutbreakError> {
        if self.population_size == 0 {
            return Err(OutbreakError::config("population size must be at least 1"));
        }
        if !self.r0.is_finite() || self.r0 <= 0.0 {
            return Err(OutbreakError::config(format!(
                "r0 must be a positive number, got {}",
                self.r0
            )));
        }
        let illness = &self.illness;
        if illness.duration == 0 {
            return Err(OutbreakError::config("illness duration must be at least 1 day"));
        }
        if illness.infectious_from < 1
            || illness.infectious_from >= illness.infectious_to
            || illness.infectious_to > illness.duration
        {
            return Err(OutbreakError::config(format!(
                "infectious window [{}, {}] must satisfy 1 <= min < max <= {}",
                illness.infectious_from, illness.infectious_to, illness.duration
            )));
        }
        if self.initial_immunity > 100 {
            return Err(OutbreakError::config(format!(
                "initial immunity must be between 0 and 100 percent, got {}",
                self.initial_immunity
            )));
        }
        self.fatality.validate()?;
        self.transmission.validate()?;
        self.demographics.validate()?;
        let susceptible_pool = self.population_size - self.initial_immune_count();
        if self.initial_infectious > susceptible_pool {
            return Err(OutbreakError::config(format!(
                "{} initially infectious but only {} people are susceptible",
                self.initial_infectious, susceptible_pool
            )));
        }
        if self.max_days == 0 {
            return Err(OutbreakError::config("max days must be at least 1"));
        }
        Ok(())
    }
}

impl fmt::Display for SimParms {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "population {} r0 {} illness {} days (infectious days {}-{}) fatality {}% \
             transmission {}% immunity {}% initial infectious {}",
            self.population_size,
            self.r0,
            self.illness.duration,
            self.illness.infectious_from,
            self.illness.infectious_to,
            self.fatality.percent(),
            self.transmission.percent(),
            self.initial_immunity,
            self.initial_infectious
        )
    }
}

// Simulation ----------------------------------------------------------------------------------------
// A seeded population and its transition engine. Each simulation owns its own state;
// the random stream is passed in so that runs can share nothing.
#[derive(Debug, Clone)]
pub struct Simulation {
    population: Population,
    engine: TransitionEngine,
    initial_immune: usize,
    contact_rates: ContactRateSummary,
    day: usize,
}

impl Simulation {
    pub fn new<R: Rng + ?Sized>(parms: &SimParms, rng: &mut R) -> Result<Simulation, OutbreakError> {
        parms.validate()?;
        let sampler = ContactRateSampler::new(parms.r0)?;
        let rates = sampler.sample_n(parms.population_size, rng);
        let contact_rates = ContactRateSummary::from_rates(&rates);

        let mut population = Population::new(rates);
        let initial_immune = parms.initial_immune_count();
        population.seed(initial_immune, parms.initial_infectious, rng)?;

        Ok(Simulation {
            population,
            engine: TransitionEngine::new(
                parms.illness,
                parms.fatality,
                parms.transmission,
                parms.demographics,
            ),
            initial_immune,
            contact_rates,
            day: 0,
        })
    }

    pub fn day(&self) -> usize {
        self.day
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn contact_rates(&self) -> &ContactRateSummary {
        &self.contact_rates
    }

    // day 0, straight from the seeded state
    pub fn initial_record(&self) -> DailyRecord {
        self.engine.snapshot(&self.population)
    }

    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> DailyRecord {
        self.day += 1;
        let record = self.engine.step(&mut self.population, rng);
        debug!(
            "day {}: {} infectious, {} susceptible, {} new infections, {} deaths",
            self.day, record.infectious, record.susceptible, record.new_infections, record.new_deaths
        );
        record
    }

    fn into_result(self, records: Vec<DailyRecord>) -> RunResult {
        RunResult::from_records(records, self.initial_immune, self.contact_rates)
    }
}

// Driver --------------------------------------------------------------------------------------------
// Step until nobody is infectious. Hitting `max_days` first is reported as
// `NotConverged`, carrying the days simulated so far.
pub fn run<R: Rng + ?Sized>(parms: &SimParms, rng: &mut R) -> Result<RunResult, OutbreakError> {
    let mut simulation = Simulation::new(parms, rng)?;
    info!("Starting run: {}", parms);

    let mut records = vec![simulation.initial_record()];
    let mut infectious = records[0].infectious;
    while infectious > 0 {
        if simulation.day() >= parms.max_days {
            warn!(
                "run abandoned after {} days with {} still infectious",
                parms.max_days, infectious
            );
            return Err(OutbreakError::NotConverged {
                max_days: parms.max_days,
                partial: Box::new(simulation.into_result(records)),
            });
        }
        let record = simulation.step(rng);
        infectious = record.infectious;
        records.push(record);
    }

    let result = simulation.into_result(records);
    let summary = result.summary(true);
    info!(
        "Run over after {} days: peak {} infectious on day {}, {} dead, {} recovered",
        summary.days, summary.peak_infectious, summary.peak_day, summary.total_dead, summary.total_recovered
    );
    Ok(result)
}

// a reproducible run - the same seed always gives the same result
pub fn run_seeded(parms: &SimParms, seed: u64) -> Result<RunResult, OutbreakError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    run(parms, &mut rng)
}

pub fn run_from_entropy(parms: &SimParms) -> Result<RunResult, OutbreakError> {
    let mut rng = ChaCha8Rng::from_entropy();
    run(parms, &mut rng)
}
