/////////////////////////////////////////////////////////////////////////////////////
//
// Outbreak model
//
// transition module
//
// one simulated day: every infectious person either resolves (recovers or dies),
// passes the disease on, or keeps incubating; then contacts are resolved into new
// infections and births / background deaths are applied
//
////////////////////////////////////////////////////////////////////////////////////

use super::policy::{self, ChurnQuota, DemographicPolicy, FatalityPolicy, TransmissionPolicy};
use super::utilities::{self, ContactRateSampler};
use super::world::Population;
use log::{debug, trace};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

// Illness timeline ----------------------------------------------------------------------------------
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct IllnessTimeline {
    // days sick before the illness resolves
    pub duration: u32,
    // inclusive window of days sick during which a person passes the disease on
    pub infectious_from: u32,
    pub infectious_to: u32,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum IllnessStage {
    Incubating,
    Infectious,
    PostInfectious,
    Resolved,
}

impl IllnessTimeline {
    pub fn stage(&self, days_sick: u32) -> IllnessStage {
        if days_sick > self.duration {
            IllnessStage::Resolved
        } else if days_sick >= self.infectious_from && days_sick <= self.infectious_to {
            IllnessStage::Infectious
        } else if days_sick < self.infectious_from {
            IllnessStage::Incubating
        } else {
            IllnessStage::PostInfectious
        }
    }

    pub fn window_width(&self) -> u32 {
        self.infectious_to.saturating_sub(self.infectious_from)
    }

    // Contacts made on each infectious day: the contact rate spread over the window,
    // rounded up. A zero-width window makes no contacts.
    pub fn daily_contacts(&self, contact_rate: usize) -> usize {
        let width = self.window_width() as usize;
        if width == 0 {
            return 0;
        }
        (contact_rate + width - 1) / width
    }
}

// Daily record ---------------------------------------------------------------------------------------
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize)]
pub struct DailyRecord {
    pub infectious: usize,
    // removed and still alive
    pub recovered: usize,
    pub new_deaths: usize,
    pub susceptible: usize,
    pub population: usize,
    pub new_infections: usize,
    pub births: usize,
    pub overloaded: bool,
}

// Engine ----------------------------------------------------------------------------------------------
#[derive(Debug, Clone)]
pub struct TransitionEngine {
    illness: IllnessTimeline,
    fatality: FatalityPolicy,
    transmission: TransmissionPolicy,
    demographics: DemographicPolicy,
    quota: ChurnQuota,
    cumulative_deaths: usize,
}

impl TransitionEngine {
    pub fn new(
        illness: IllnessTimeline,
        fatality: FatalityPolicy,
        transmission: TransmissionPolicy,
        demographics: DemographicPolicy,
    ) -> TransitionEngine {
        TransitionEngine {
            illness,
            fatality,
            transmission,
            demographics,
            quota: ChurnQuota::default(),
            cumulative_deaths: 0,
        }
    }

    pub fn cumulative_deaths(&self) -> usize {
        self.cumulative_deaths
    }

    // the record of a population before any day has been stepped
    pub fn snapshot(&self, population: &Population) -> DailyRecord {
        let counts = population.status_counts();
        DailyRecord {
            infectious: counts.infectious,
            recovered: counts.removed.saturating_sub(self.cumulative_deaths),
            new_deaths: 0,
            susceptible: counts.susceptible,
            population: population.len(),
            new_infections: 0,
            births: 0,
            overloaded: false,
        }
    }

    pub fn step<R: Rng + ?Sized>(&mut self, population: &mut Population, rng: &mut R) -> DailyRecord {
        // everyone infectious at the start of the day, fixed for the whole pass
        let infectious_ids = population.infectious_indices();
        let living = population.len().saturating_sub(self.cumulative_deaths);
        let overloaded = self.fatality.is_overloaded(infectious_ids.len(), living);
        let p_death = self.fatality.probability(infectious_ids.len(), living);
        if overloaded {
            debug!(
                "health care overloaded: {} infectious of {} living, fatality {:.2}",
                infectious_ids.len(),
                living,
                p_death
            );
        }

        let mut new_deaths = 0;
        let mut contacts = 0;
        for &id in &infectious_ids {
            let (days_sick, contact_rate) = match population.person(id) {
                Some(person) => (person.days_sick, person.contact_rate),
                None => continue,
            };
            match self.illness.stage(days_sick) {
                IllnessStage::Resolved => {
                    population.remove(id);
                    if utilities::chance(p_death, rng) {
                        new_deaths += 1;
                    }
                }
                IllnessStage::Infectious => {
                    contacts += self.illness.daily_contacts(contact_rate);
                    population.advance_illness(id);
                }
                IllnessStage::Incubating | IllnessStage::PostInfectious => {
                    population.advance_illness(id);
                }
            }
        }

        let new_infections = self.resolve_contacts(contacts, population, rng);
        self.cumulative_deaths += new_deaths;

        let (births, background_deaths) = self.apply_churn(population, rng);
        self.cumulative_deaths += background_deaths;

        let counts = population.status_counts();
        let record = DailyRecord {
            infectious: counts.infectious,
            recovered: counts.removed.saturating_sub(self.cumulative_deaths),
            new_deaths: new_deaths + background_deaths,
            susceptible: counts.susceptible,
            population: population.len(),
            new_infections,
            births,
            overloaded,
        };
        trace!("{:?}", record);
        record
    }

    // Contacts land anywhere in the population, with replacement. Only people still
    // susceptible can catch it, and only if the transmission draw succeeds.
    fn resolve_contacts<R: Rng + ?Sized>(
        &self,
        contacts: usize,
        population: &mut Population,
        rng: &mut R,
    ) -> usize {
        let size = population.len();
        if size == 0 {
            return 0;
        }
        let mut new_infections = 0;
        for _ in 0..contacts {
            let target = rng.gen_range(0..size);
            if population.is_susceptible(target)
                && self.transmission.transmits(rng)
                && population.infect(target)
            {
                new_infections += 1;
            }
        }
        new_infections
    }

    // background deaths first (never among the infectious), then births
    fn apply_churn<R: Rng + ?Sized>(&mut self, population: &mut Population, rng: &mut R) -> (usize, usize) {
        if !self.demographics.is_open() {
            return (0, 0);
        }
        let living = population.len().saturating_sub(self.cumulative_deaths);
        let (births, deaths) = self.quota.today(&self.demographics, living);

        let counts = population.status_counts();
        let removed_alive = counts.removed.saturating_sub(self.cumulative_deaths);
        let (from_susceptible, from_removed) =
            policy::apportion_deaths(deaths, counts.susceptible, removed_alive);
        let dying: Vec<usize> = population
            .susceptible_indices()
            .choose_multiple(rng, from_susceptible)
            .cloned()
            .collect();
        for id in dying {
            population.remove(id);
        }

        if births > 0 {
            match ContactRateSampler::with_mean(population.mean_contact_rate()) {
                Ok(sampler) => {
                    for _ in 0..births {
                        population.add_person(sampler.sample(rng));
                    }
                }
                Err(e) => debug!("no births today - {}", e),
            }
        }
        (births, from_susceptible + from_removed)
    }
}
