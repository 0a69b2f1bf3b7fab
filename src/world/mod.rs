/////////////////////////////////////////////////////////////////////////////////////
//
// Outbreak model
//
// world module
//
// the world is a single well-mixed population of people
// each person carries a disease status, a days-sick counter and a contact rate
//
////////////////////////////////////////////////////////////////////////////////////

use super::error::OutbreakError;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::fmt;

// Person ---------------------------------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub id: usize,
    pub disease_status: DiseaseStatus,
    // days since onset, only meaningful once infected
    pub days_sick: u32,
    // contacts generated over the infectious window, fixed at creation
    pub contact_rate: usize,
}

impl Person {
    fn new(id: usize, contact_rate: usize) -> Person {
        Person {
            id,
            disease_status: DiseaseStatus::Susceptible,
            days_sick: 0,
            contact_rate,
        }
    }
}

// Disease -------------------------------------------------------------------------------------------
// S > I > R only, Removed covers both recovered and dead
#[derive(Hash, Debug, Copy, Clone, Eq, PartialEq, Serialize)]
pub enum DiseaseStatus {
    Susceptible,
    Infectious,
    Removed,
}
impl fmt::Display for DiseaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize)]
pub struct StatusCounts {
    pub susceptible: usize,
    pub infectious: usize,
    pub removed: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.susceptible + self.infectious + self.removed
    }
}

// Population ---------------------------------------------------------------------------------------------------
#[derive(Debug, Clone)]
pub struct Population {
    people: Vec<Person>,
}

impl Population {
    // everybody starts susceptible, one person per contact rate
    pub fn new(contact_rates: Vec<usize>) -> Population {
        let people = contact_rates
            .into_iter()
            .enumerate()
            .map(|(id, rate)| Person::new(id, rate))
            .collect();
        Population { people }
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    pub fn people(&self) -> &[Person] {
        &self.people
    }

    pub fn person(&self, id: usize) -> Option<&Person> {
        self.people.get(id)
    }

    // Partition the population into immune (Removed), infectious and susceptible people.
    // Infectious people are drawn without replacement from those not already immune.
    pub fn seed<R: Rng + ?Sized>(
        &mut self,
        immune_count: usize,
        infectious_count: usize,
        rng: &mut R,
    ) -> Result<(), OutbreakError> {
        if immune_count > self.len() {
            return Err(OutbreakError::config(format!(
                "cannot make {} people immune in a population of {}",
                immune_count,
                self.len()
            )));
        }
        let person_ids: Vec<usize> = (0..self.len()).collect();
        let immune_ids: Vec<usize> = person_ids
            .choose_multiple(rng, immune_count)
            .cloned()
            .collect();
        for id in immune_ids {
            self.remove(id);
        }

        let susceptible_ids = self.susceptible_indices();
        if infectious_count > susceptible_ids.len() {
            return Err(OutbreakError::config(format!(
                "cannot infect {} people with only {} susceptible",
                infectious_count,
                susceptible_ids.len()
            )));
        }
        let infectee_ids: Vec<usize> = susceptible_ids
            .choose_multiple(rng, infectious_count)
            .cloned()
            .collect();
        for id in infectee_ids {
            self.infect(id);
            self.people[id].days_sick = 1;
        }
        Ok(())
    }

    // O(N) scan
    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for person in &self.people {
            match person.disease_status {
                DiseaseStatus::Susceptible => counts.susceptible += 1,
                DiseaseStatus::Infectious => counts.infectious += 1,
                DiseaseStatus::Removed => counts.removed += 1,
            }
        }
        counts
    }

    pub fn infectious_indices(&self) -> Vec<usize> {
        self.indices_with(DiseaseStatus::Infectious)
    }

    pub fn susceptible_indices(&self) -> Vec<usize> {
        self.indices_with(DiseaseStatus::Susceptible)
    }

    fn indices_with(&self, status: DiseaseStatus) -> Vec<usize> {
        self.people
            .iter()
            .filter(|p| p.disease_status == status)
            .map(|p| p.id)
            .collect()
    }

    pub fn is_susceptible(&self, id: usize) -> bool {
        self.people
            .get(id)
            .map_or(false, |p| p.disease_status == DiseaseStatus::Susceptible)
    }

    // Susceptible -> Infectious. Returns false if the person was not susceptible.
    pub fn infect(&mut self, id: usize) -> bool {
        match self.people.get_mut(id) {
            Some(person) if person.disease_status == DiseaseStatus::Susceptible => {
                person.disease_status = DiseaseStatus::Infectious;
                person.days_sick = 0;
                true
            }
            _ => false,
        }
    }

    // any status -> Removed. Returns false if already removed.
    pub fn remove(&mut self, id: usize) -> bool {
        match self.people.get_mut(id) {
            Some(person) if person.disease_status != DiseaseStatus::Removed => {
                person.disease_status = DiseaseStatus::Removed;
                true
            }
            _ => false,
        }
    }

    pub fn advance_illness(&mut self, id: usize) {
        if let Some(person) = self.people.get_mut(id) {
            person.days_sick += 1;
        }
    }

    // newborns are susceptible; returns the new person's id
    pub fn add_person(&mut self, contact_rate: usize) -> usize {
        let id = self.people.len();
        self.people.push(Person::new(id, contact_rate));
        id
    }

    pub fn contact_rates(&self) -> Vec<usize> {
        self.people.iter().map(|p| p.contact_rate).collect()
    }

    pub fn mean_contact_rate(&self) -> f64 {
        if self.people.is_empty() {
            return 0.0;
        }
        let total: usize = self.people.iter().map(|p| p.contact_rate).sum();
        total as f64 / self.people.len() as f64
    }
}
