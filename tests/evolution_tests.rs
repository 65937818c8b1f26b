#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use approx::assert_relative_eq;
use geo::coord;
use neural_racecars::simulation::brain::NeuralNet;
use neural_racecars::simulation::error::SimulationError;
use neural_racecars::simulation::evolution::EvolutionEngine;
use neural_racecars::simulation::params::Params;
use neural_racecars::simulation::population::Population;
use neural_racecars::simulation::track::{Track, TrackData};

fn square_loop() -> Track {
    Track::new(TrackData {
        centerpath: vec![
            coord! { x: 0.1, y: 0.1 },
            coord! { x: 0.9, y: 0.1 },
            coord! { x: 0.9, y: 0.9 },
            coord! { x: 0.1, y: 0.9 },
        ],
        start: coord! { x: 0.2, y: 0.2 },
        stop: coord! { x: 0.8, y: 0.8 },
        box_size: 0.1,
    })
}

fn create_test_params(population_size: usize) -> Params {
    Params {
        population_size,
        worker_threads: 2,
        max_generation_steps: 400,
        ..Params::default()
    }
}

#[test]
fn test_population_creation() {
    let params = create_test_params(12);
    let population = Population::new(square_loop(), params, 1).unwrap();

    assert_eq!(population.cars.len(), 12);
    assert_eq!(population.car_count(), 12);
    assert_eq!(population.generation, 0);
    assert_eq!(population.best_distance, 0.0);
    assert!(population.average_winner().is_none());
    for car in &population.cars {
        assert_eq!(car.position, population.track().start());
        assert!(!car.is_stopped());
    }
}

#[test]
fn test_generation_transition() {
    let params = create_test_params(5);
    let mut population = Population::new(square_loop(), params, 2).unwrap();

    let distances = [5.0, 10.0, 0.0, 7.0, 1.0];
    for (car, distance) in population.cars.iter_mut().zip(distances) {
        car.distance_traveled = distance;
        car.stopped = true;
    }
    let best = population.cars[1].brain.clone();
    let elites = [
        population.cars[1].brain.to_flat_vector(),
        population.cars[3].brain.to_flat_vector(),
        population.cars[0].brain.to_flat_vector(),
    ];

    let summary = population.next_generation().expect("non-empty population");

    assert_eq!(population.cars.len(), 5);
    assert_eq!(population.cars[0].brain, best);

    let averaged = population.cars[1].brain.to_flat_vector();
    for (i, value) in averaged.iter().enumerate() {
        let mean = (elites[0][i] + elites[1][i] + elites[2][i]) / 3.0;
        assert_relative_eq!(*value, mean, epsilon = 1e-12);
    }
    assert_eq!(
        population.average_winner().unwrap().to_flat_vector(),
        averaged
    );

    let params = population.params().mutation;
    let average_net = population.cars[1].brain.clone();
    for car in &population.cars[2..] {
        assert!(car.brain.same_topology(&best));
        assert_ne!(car.brain.to_flat_vector(), averaged);

        // every offspring stays within one mutation step of the average
        for l in 1..average_net.layer_count() {
            let parents = &average_net.layer(l).unwrap().neurons;
            let children = &car.brain.layer(l).unwrap().neurons;
            for (p, c) in parents.iter().zip(children) {
                for (pw, cw) in p.weights.iter().zip(c.weights.iter()) {
                    assert!((pw - cw).abs() <= 1.0 / (2.0 * params.weight_rate) + 1e-12);
                }
                assert!((p.bias - c.bias).abs() <= 1.0 / (2.0 * params.bias_rate) + 1e-12);
            }
        }
    }
    for car in &population.cars {
        assert_eq!(car.position, population.track().start());
        assert_eq!(car.steps, 0);
        assert!(!car.is_stopped());
    }

    assert_eq!(summary.generation, 1);
    assert_eq!(summary.leader_distance, 10.0);
    assert!(summary.improved);
    assert_eq!(population.generation, 1);
    assert_eq!(population.best_distance, 10.0);
    assert_eq!(population.last_improved_generation, 1);
}

#[test]
fn test_best_distance_never_drops() {
    let params = create_test_params(4);
    let mut population = Population::new(square_loop(), params, 3).unwrap();

    population.cars[2].distance_traveled = 3.0;
    population.next_generation().unwrap();
    assert_eq!(population.best_distance, 3.0);

    population.cars[0].distance_traveled = 1.0;
    let summary = population.next_generation().unwrap();
    assert!(!summary.improved);
    assert_eq!(summary.leader_distance, 1.0);
    assert_eq!(population.generation, 2);
    assert_eq!(population.best_distance, 3.0);
    assert_eq!(population.last_improved_generation, 1);
}

#[test]
fn test_ranking_is_stable() {
    let params = create_test_params(3);
    let mut population = Population::new(square_loop(), params, 4).unwrap();
    population.cars[0].distance_traveled = 2.0;
    population.cars[1].distance_traveled = 2.0;

    let ranked = EvolutionEngine::rank(&population.cars);

    assert_eq!(ranked[0].brain, population.cars[0].brain);
    assert_eq!(ranked[1].brain, population.cars[1].brain);
    assert_eq!(ranked[2].brain, population.cars[2].brain);
}

#[test]
fn test_small_population_uses_available_elites() {
    let params = create_test_params(2);
    let mut population = Population::new(square_loop(), params, 5).unwrap();
    population.cars[1].distance_traveled = 1.0;
    let first = population.cars[1].brain.clone();
    let second = population.cars[0].brain.clone();

    population.next_generation().unwrap();

    assert_eq!(population.cars.len(), 2);
    assert_eq!(population.cars[0].brain, first);
    let expected = NeuralNet::average(&[&first, &second]).unwrap();
    assert_eq!(
        population.cars[1].brain.to_flat_vector(),
        expected.to_flat_vector()
    );
}

#[test]
fn test_empty_track_closes_generation_in_one_step() {
    let params = create_test_params(6);
    let mut population = Population::new(Track::default(), params, 6).unwrap();

    let summary = population.step().unwrap().expect("every racecar stops at once");

    assert_eq!(summary.generation, 1);
    assert_eq!(summary.steps, 1);
    assert_eq!(summary.leader_distance, 0.0);
    assert!(!summary.improved);
}

#[test]
fn test_step_limit_halts_generation() {
    let params = Params {
        max_generation_steps: 3,
        ..create_test_params(4)
    };
    let mut population = Population::new(square_loop(), params, 7).unwrap();

    assert!(population.step().unwrap().is_none());
    assert!(population.step().unwrap().is_none());
    let summary = population.step().unwrap().expect("limit reached");

    assert_eq!(summary.steps, 3);
    assert_eq!(population.generation, 1);
}

#[test]
fn test_frame_snapshot() {
    let params = create_test_params(8);
    let mut population = Population::new(square_loop(), params, 8).unwrap();
    population.step().unwrap();

    let frame = population.frame();

    assert_eq!(frame.generation, 0);
    assert_eq!(frame.cars.len(), 8);
    assert_eq!(frame.lead_seen_points.len(), 5);
    assert_eq!(frame.lead_connections.len(), 3);
    assert_eq!(frame.lead_speed, 0.002);
    assert!(frame.lead_turn_rate.abs() <= 20.0);

    let json = serde_json::to_string(&frame).expect("frame serializes");
    assert!(json.contains("lead_connections"));
}

#[test]
fn test_captured_frame_shows_generation_end() {
    let params = create_test_params(8);
    let mut population = Population::new(square_loop(), params, 21).unwrap();

    for expected in 0..3 {
        let (summary, frame) = population
            .run_generation_captured()
            .unwrap()
            .expect("generation closes");

        assert_eq!(frame.generation, expected);
        assert_eq!(summary.generation, expected + 1);
        assert_eq!(frame.lead_seen_points.len(), 5);
        assert_eq!(frame.lead_speed, 0.002);
        assert!(frame.cars.iter().any(|car| car.stopped));
        assert!(frame.lead_position.is_some());
    }
}

#[test]
fn test_zero_step_limit_is_rejected() {
    let params = Params {
        max_generation_steps: 0,
        ..create_test_params(4)
    };

    let result = Population::new(square_loop(), params, 9);
    assert!(matches!(result, Err(SimulationError::InvalidParams(_))));
}

#[test]
fn test_params_file_with_zero_step_limit_is_rejected() {
    let path = std::env::temp_dir().join(format!(
        "neural_racecars_{}_zero_limit.json",
        std::process::id()
    ));
    std::fs::write(&path, r#"{"max_generation_steps": 0}"#).unwrap();

    let result = Params::load(&path);
    assert!(matches!(result, Err(SimulationError::InvalidParams(_))));

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_evolution_end_to_end() {
    let params = create_test_params(20);
    let mut population = Population::new(square_loop(), params, 42).unwrap();

    let mut best = Vec::new();
    for _ in 0..20 {
        let summary = population.run_generation().unwrap().expect("generation closes");
        assert!(summary.steps <= 400);
        best.push(summary.best_distance);
    }

    assert_eq!(population.generation, 20);
    assert!(best.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*best.last().unwrap(), population.best_distance);
    assert!(population.last_improved_generation <= 20);
}

#[test]
fn test_same_seed_same_run() {
    let run = |threads: usize| {
        let params = Params {
            worker_threads: threads,
            ..create_test_params(10)
        };
        let mut population = Population::new(square_loop(), params, 99).unwrap();
        (0..5)
            .map(|_| population.run_generation().unwrap().unwrap())
            .collect::<Vec<_>>()
    };

    assert_eq!(run(1), run(4));
}
