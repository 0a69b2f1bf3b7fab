use outbreak::policy::{DemographicPolicy, FatalityPolicy, TransmissionPolicy};
use outbreak::simulation::{self, SimParms};
use outbreak::{OutbreakError, RunResult};

fn scenario_parms() -> SimParms {
    SimParms {
        population_size: 1000,
        r0: 2.5,
        initial_infectious: 5,
        initial_immunity: 0,
        fatality: FatalityPolicy::fixed(5),
        ..SimParms::default()
    }
}

fn assert_conserved(result: &RunResult) {
    for (day, row) in result.rows().iter().enumerate() {
        assert_eq!(
            row.susceptible + row.infectious + row.recovered + row.cumulative_dead,
            row.population,
            "day {}",
            day
        );
    }
}

fn assert_non_decreasing(series: &[usize], name: &str) {
    for pair in series.windows(2) {
        assert!(pair[0] <= pair[1], "{} went down: {:?}", name, pair);
    }
}

#[test]
fn reference_scenario() {
    let result = simulation::run_seeded(&scenario_parms(), 42).unwrap();

    let day0 = result.records[0];
    assert_eq!(
        (day0.infectious, day0.recovered, day0.new_deaths, day0.susceptible),
        (5, 0, 0, 995)
    );

    let last = result.records.last().unwrap();
    let dead = *result.cumulative_dead.last().unwrap();
    let recovered = *result.cumulative_recovered.last().unwrap();
    assert_eq!(last.infectious, 0);
    assert!(dead <= 1000);
    assert_eq!(recovered + dead + last.susceptible, 1000);
    assert_conserved(&result);
}

#[test]
fn runs_are_reproducible() {
    let parms = SimParms {
        transmission: TransmissionPolicy::from_percent(70),
        fatality: FatalityPolicy::overload(10),
        ..scenario_parms()
    };
    let a = simulation::run_seeded(&parms, 1234).unwrap();
    let b = simulation::run_seeded(&parms, 1234).unwrap();
    assert_eq!(a, b);
}

#[test]
fn counts_are_conserved_and_monotone() {
    for seed in 0..20 {
        let result = simulation::run_seeded(&scenario_parms(), seed).unwrap();
        assert_conserved(&result);
        assert_non_decreasing(&result.cumulative_dead, "cumulative dead");
        assert_non_decreasing(&result.cumulative_recovered, "cumulative recovered");
        assert!(result.population.iter().all(|&p| p == 1000));

        // nobody is infectious before the last day, and nobody after it
        let infectious: Vec<usize> = result.records.iter().map(|r| r.infectious).collect();
        let (last, earlier) = infectious.split_last().unwrap();
        assert_eq!(*last, 0);
        assert!(earlier.iter().all(|&i| i > 0), "seed {}", seed);
    }
}

#[test]
fn runs_finish_within_the_loose_bound() {
    for seed in 0..10 {
        let parms = SimParms {
            population_size: 300,
            r0: 4.0,
            ..scenario_parms()
        };
        let result = simulation::run_seeded(&parms, seed).unwrap();
        let bound = parms.illness.duration as usize * (parms.initial_infectious + parms.population_size);
        assert!(result.days() <= bound, "{} days > {}", result.days(), bound);
    }
}

#[test]
fn contact_rates_average_r0() {
    for &r0 in &[0.6, 2.5] {
        // nobody transmits, so the run ends once the seeded cases resolve
        let parms = SimParms {
            population_size: 50_000,
            r0,
            transmission: TransmissionPolicy::from_percent(0),
            ..scenario_parms()
        };
        let rates = simulation::run_seeded(&parms, 42).unwrap().contact_rates;
        assert_eq!(rates.count, 50_000);
        assert!((rates.mean - r0).abs() < 0.1, "r0 {} mean {}", r0, rates.mean);
    }
}

#[test]
fn zero_contact_rates_only_the_seeded_cohort() {
    let parms = SimParms {
        r0: 1e-9,
        ..scenario_parms()
    };
    let result = simulation::run_seeded(&parms, 9).unwrap();

    assert_eq!(result.contact_rates.max, 0);
    assert!(result.records.iter().all(|r| r.new_infections == 0));
    assert!(result.records.iter().all(|r| r.susceptible == 995));
    let duration = parms.illness.duration as usize;
    assert_eq!(result.days(), duration + 1);
    assert_eq!(result.records[duration].infectious, 5);
}

#[test]
fn overload_makes_every_late_case_fatal() {
    // all ten people sick at once, nobody spreading: prevalence stays at 100%
    let parms = SimParms {
        population_size: 10,
        r0: 1e-9,
        initial_infectious: 10,
        fatality: FatalityPolicy::overload(50),
        ..SimParms::default()
    };
    for seed in 0..20 {
        let result = simulation::run_seeded(&parms, seed).unwrap();
        assert_eq!(*result.cumulative_dead.last().unwrap(), 10);
        assert!(result.records[1..].iter().all(|r| r.overloaded));
    }

    // the same population without the overload policy has survivors
    let fixed = SimParms {
        fatality: FatalityPolicy::fixed(50),
        ..parms
    };
    let survivors: usize = (0..20)
        .map(|seed| {
            let result = simulation::run_seeded(&fixed, seed).unwrap();
            *result.cumulative_recovered.last().unwrap()
        })
        .sum();
    assert!(survivors > 0);
}

#[test]
fn imperfect_transmission_shrinks_the_outbreak() {
    let total_infected = |parms: &SimParms| -> usize {
        (0..10)
            .map(|seed| simulation::run_seeded(parms, seed).unwrap().summary(true).ever_infected)
            .sum()
    };
    let certain = total_infected(&scenario_parms());
    let never = total_infected(&SimParms {
        transmission: TransmissionPolicy::from_percent(0),
        ..scenario_parms()
    });
    assert_eq!(never, 50);
    assert!(certain > never);
}

#[test]
fn demographic_churn_keeps_the_books_balanced() {
    let parms = SimParms {
        demographics: DemographicPolicy::Open {
            birth_rate: 200.0,
            death_rate: 100.0,
        },
        ..scenario_parms()
    };
    let result = simulation::run_seeded(&parms, 77).unwrap();
    assert_conserved(&result);
    assert_non_decreasing(&result.cumulative_dead, "cumulative dead");
    assert_non_decreasing(&result.population, "population");
    let births: usize = result.records.iter().map(|r| r.births).sum();
    assert_eq!(*result.population.last().unwrap(), 1000 + births);
    assert!(births > 0);
}

#[test]
fn invalid_parameters_never_start() {
    let parms = SimParms {
        population_size: 1000,
        illness: outbreak::IllnessTimeline {
            duration: 14,
            infectious_from: 4,
            infectious_to: 4,
        },
        ..SimParms::default()
    };
    match simulation::run_seeded(&parms, 1) {
        Err(OutbreakError::Config(msg)) => assert!(msg.contains("infectious window")),
        other => panic!("expected a config error, got {:?}", other),
    }
}
