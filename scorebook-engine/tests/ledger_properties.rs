use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use scorebook_engine::{
    AdvanceOutcome, AppearanceEvent, AppearanceExit, Base, BaseOccupancy, D3kContext, D3kDetails,
    D3kOutcome, D3kTotals, Destination, GameState, HalfInning, HowReached, PitcherAppearance,
    PitcherId, PlayerId, RulesConfig, Runner, RunnerTrackingState, SaveClassification,
    StrikeoutType, Team, TrackerError, create_d3k_event, detect_blown_save, detect_hold,
    detect_save, is_d3k_legal,
};

const SEEDS: u64 = 64;
const STEPS: usize = 250;

const HOW_REACHED: [HowReached; 5] = [
    HowReached::Hit,
    HowReached::Walk,
    HowReached::HitByPitch,
    HowReached::Error,
    HowReached::FieldersChoice,
];

fn random_base(rng: &mut ChaCha20Rng) -> Base {
    Base::ALL[rng.gen_range(0..Base::ALL.len())]
}

fn destination_ahead_of(from: Base, rng: &mut ChaCha20Rng) -> Destination {
    let options: Vec<Destination> = [
        Destination::Second,
        Destination::Third,
        Destination::Home,
    ]
    .into_iter()
    .filter(|dest| dest.ordinal() > from.ordinal())
    .collect();
    options[rng.gen_range(0..options.len())]
}

#[test]
fn every_run_is_charged_once_to_the_responsible_pitcher() {
    for seed in 0..SEEDS {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut tracker = RunnerTrackingState::new();
        let mut pitcher_index = 0_u32;
        let mut current = PitcherId::new("p0");
        // Independent model of who is liable for each runner on base.
        let mut liable: HashMap<PlayerId, PitcherId> = HashMap::new();
        let mut next_runner = 0_u32;
        let mut home_advances = 0_u32;

        for _ in 0..STEPS {
            match rng.gen_range(0..6) {
                0 | 1 => {
                    let base = random_base(&mut rng);
                    let how = HOW_REACHED[rng.gen_range(0..HOW_REACHED.len())];
                    next_runner += 1;
                    let runner = Runner::new(&format!("r{next_runner}"), "Runner", how);
                    let id = runner.runner_id.clone();
                    match tracker.add_runner(base, runner, &current) {
                        Ok(()) => {
                            liable.insert(id, current.clone());
                        }
                        Err(err) => assert!(matches!(err, TrackerError::BaseOccupied { .. })),
                    }
                }
                2 => {
                    let from = random_base(&mut rng);
                    if from == Base::Third && !tracker.get_current_bases().is_occupied(from) {
                        continue;
                    }
                    let to = if from == Base::Third {
                        Destination::Home
                    } else {
                        destination_ahead_of(from, &mut rng)
                    };
                    let before = tracker.clone();
                    match tracker.advance_runner(from, to, &current) {
                        Ok(AdvanceOutcome::Scored(run)) => {
                            home_advances += 1;
                            let expected = liable
                                .remove(&run.runner.runner_id)
                                .expect("scoring runner was tracked");
                            assert_eq!(run.charged_to, expected, "seed {seed}");
                        }
                        Ok(AdvanceOutcome::Moved { .. }) => {}
                        Err(_) => assert_eq!(tracker, before, "failed advance mutated state"),
                    }
                }
                3 => {
                    if let Ok(runner) = tracker.runner_out(random_base(&mut rng)) {
                        liable.remove(&runner.runner_id);
                    }
                }
                4 => {
                    tracker.handle_pitching_change(&current);
                    pitcher_index += 1;
                    current = PitcherId::new(&format!("p{pitcher_index}"));
                }
                _ => {
                    tracker.next_inning();
                    liable.clear();
                }
            }

            for (_, runner) in tracker.get_current_bases().iter() {
                let on_mound_since = liable[&runner.runner_id].clone();
                assert_eq!(
                    runner.responsible_pitcher(&current),
                    &on_mound_since,
                    "seed {seed}: responsibility drifted"
                );
            }
        }

        let summary = tracker.get_er_summary();
        assert_eq!(summary.total_earned_runs(), home_advances, "seed {seed}");
        assert_eq!(summary.total_runs(), home_advances, "seed {seed}");
    }
}

fn random_entry(rng: &mut ChaCha20Rng) -> GameState {
    let mut bases = BaseOccupancy::EMPTY;
    for base in Base::ALL {
        if rng.gen_bool(0.4) {
            bases = bases.with(base);
        }
    }
    let away = rng.gen_range(0..6);
    let home = away + rng.gen_range(0..7);
    GameState::default()
        .at(rng.gen_range(1..=9), HalfInning::Top)
        .with_outs(rng.gen_range(0..3))
        .with_score(home, away)
        .with_bases(bases)
}

#[test]
fn at_most_one_of_save_hold_blown_save() {
    let rules = RulesConfig::default();
    for seed in 0..SEEDS * 4 {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut game = random_entry(&mut rng);
        let mut appearance =
            PitcherAppearance::create(&PitcherId::new("rp"), "Reliever", Team::Home, &game, &rules);

        for _ in 0..rng.gen_range(0..8) {
            if rng.gen_bool(0.6) {
                appearance.update(AppearanceEvent::OutsRecorded(rng.gen_range(1..=3)), &game);
            } else {
                let runs = rng.gen_range(1..=3);
                game.add_runs(Team::Away, runs);
                appearance.update(AppearanceEvent::RunsAllowed(runs), &game);
            }
            if rng.gen_bool(0.1) {
                game.add_runs(Team::Home, 1);
                appearance.update(AppearanceEvent::InningCompleted, &game);
            }
        }
        if rng.gen_bool(0.3) {
            appearance.rule_effective_relief(rng.gen_bool(0.5));
        }
        let finished_game = rng.gen_bool(0.5);
        let exit = AppearanceExit {
            finished_game,
            is_winning_pitcher: rng.gen_bool(0.2),
            game_over: finished_game || rng.gen_bool(0.2),
        };
        let classification = appearance.finalize(&game, exit);

        let flags = [
            detect_save(&appearance),
            detect_blown_save(&appearance),
            detect_hold(&appearance),
        ];
        assert!(
            flags.iter().filter(|flag| **flag).count() <= 1,
            "seed {seed}: {flags:?}"
        );
        let expected = match flags {
            [true, _, _] => SaveClassification::Save,
            [_, true, _] => SaveClassification::BlownSave,
            [_, _, true] => SaveClassification::Hold,
            _ => SaveClassification::None,
        };
        assert_eq!(classification, expected, "seed {seed}");
        if appearance.lead_surrendered && appearance.opportunity.is_qualified() {
            assert_eq!(classification, SaveClassification::BlownSave);
        }
    }
}

#[test]
fn d3k_totals_are_order_independent() {
    let outcomes = [
        D3kOutcome::Reached,
        D3kOutcome::ThrownOut,
        D3kOutcome::Error,
        D3kOutcome::WildThrow,
    ];
    for seed in 0..SEEDS {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut events = Vec::new();
        for _ in 0..40 {
            let outs = rng.gen_range(0..3);
            let first = rng.gen_bool(0.5);
            let context = D3kContext {
                batter_id: PlayerId::new(&format!("b{}", rng.gen_range(0..4))),
                batter_name: "Batter".to_string(),
                catcher_id: PlayerId::new(&format!("c{}", rng.gen_range(0..2))),
                catcher_name: "Catcher".to_string(),
                pitcher_id: PitcherId::new("p"),
                pitcher_name: "Pitcher".to_string(),
                inning: 1,
                half_inning: HalfInning::Bottom,
                outs,
                bases: if first {
                    BaseOccupancy::EMPTY.with(Base::First)
                } else {
                    BaseOccupancy::EMPTY
                },
                strikeout_type: StrikeoutType::Looking,
            };
            let outcome = outcomes[rng.gen_range(0..outcomes.len())];
            let event = create_d3k_event(outcome, &context, D3kDetails::default()).unwrap();
            assert_eq!(event.is_legal, is_d3k_legal(outs, first));
            assert_eq!(event.outcome == D3kOutcome::Illegal, !event.is_legal);
            events.push(event);
        }

        let forward = D3kTotals::from_events(&events);
        events.reverse();
        assert_eq!(forward, D3kTotals::from_events(&events));
        assert_eq!(forward, D3kTotals::from_events(&events));

        let attempts: u32 = forward.batters.values().map(|stats| stats.attempts).sum();
        assert_eq!(attempts, 40);
    }
}
