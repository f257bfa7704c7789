use scorebook_engine::{
    AppearanceEvent, AppearanceExit, Base, BaseOccupancy, D3kContext, D3kDetails, D3kOutcome,
    Destination, GameState, HalfInning, HowReached, PitcherAppearance, PitcherId, PlayerId,
    RulesConfig, Runner, RunnerTrackingState, StrikeoutType, SubstitutionEvent, Team,
    create_d3k_event,
};
use serde_json::{Value, json};

#[test]
fn pitching_change_document_parses() {
    let document = json!({
        "event_type": "PITCH_CHANGE",
        "header": {
            "game_id": "2026-04-02-home-away",
            "inning": 6,
            "half_inning": "BOTTOM",
            "outs": 1
        },
        "change": {
            "outgoing_pitcher_id": "away-sp",
            "outgoing_pitcher_name": "Starter",
            "outgoing_pitch_count": 97,
            "bequeathed_runners": [
                {"base": "1B", "runner_id": "home-4", "runner_name": "Four", "how_reached": "walk"},
                {"base": "3B", "runner_id": "home-2", "runner_name": "Two", "how_reached": "FC"}
            ],
            "incoming_pitcher_id": "away-rp",
            "incoming_pitcher_name": "Reliever",
            "incoming_pitcher_role": "RP",
            "inherited_runners": 2
        }
    });
    let event: SubstitutionEvent = serde_json::from_value(document).unwrap();
    assert_eq!(event.event_type(), "PITCH_CHANGE");
    assert_eq!(event.header().half_inning, HalfInning::Bottom);
    assert_eq!(event.header().timestamp, 0);
    let change = event.pitching_change().unwrap();
    assert_eq!(change.bequeathed_runners.len(), 2);
    assert_eq!(change.bequeathed_runners[1].base, Base::Third);
    assert_eq!(
        change.bequeathed_runners[1].how_reached,
        HowReached::FieldersChoice
    );
}

#[test]
fn tracker_state_survives_serialization_mid_inning() {
    let (a, b) = (PitcherId::new("a"), PitcherId::new("b"));
    let mut tracker = RunnerTrackingState::new();
    tracker
        .add_runner(Base::Second, Runner::new("r2", "Two", HowReached::Hit), &a)
        .unwrap();
    tracker.handle_pitching_change(&a);

    let saved = serde_json::to_string(&tracker).unwrap();
    let mut restored: RunnerTrackingState = serde_json::from_str(&saved).unwrap();
    assert_eq!(restored, tracker);

    restored
        .advance_runner(Base::Second, Destination::Home, &b)
        .unwrap();
    assert_eq!(restored.get_er_summary().earned_runs_for(&a), 1);

    let value: Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(value["bases"]["second"]["inherited_from"], "a");
    assert_eq!(value["ledger"]["a"]["runners_allowed"], 1);
}

#[test]
fn d3k_event_uses_wire_names() {
    let context = D3kContext {
        batter_id: PlayerId::new("b"),
        batter_name: "Batter".to_string(),
        catcher_id: PlayerId::new("c"),
        catcher_name: "Catcher".to_string(),
        pitcher_id: PitcherId::new("p"),
        pitcher_name: "Pitcher".to_string(),
        inning: 2,
        half_inning: HalfInning::Top,
        outs: 2,
        bases: BaseOccupancy::LOADED,
        strikeout_type: StrikeoutType::Swinging,
    };
    let event = create_d3k_event(
        D3kOutcome::WildThrow,
        &context,
        D3kDetails {
            throw_sequence: vec!["C".to_string(), "1B".to_string()],
            ..D3kDetails::default()
        },
    )
    .unwrap();
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["outcome"], "D3K_WILD_THROW");
    assert_eq!(value["batter_result"], "second");
    assert_eq!(value["strikeout_type"], "swinging");
    assert_eq!(value["pitcher_strikeout"], true);
    assert_eq!(value["throw_sequence"], json!(["C", "1B"]));
    assert!(value.get("error_info").is_none());
}

#[test]
fn finalized_appearance_reports_classification() {
    let game = GameState::default()
        .at(9, HalfInning::Bottom)
        .with_score(2, 3)
        .with_outs(1);
    let mut appearance = PitcherAppearance::create(
        &PitcherId::new("cl"),
        "Closer",
        Team::Away,
        &game,
        &RulesConfig::default(),
    );
    let final_out = game.with_outs(3);
    appearance.update(AppearanceEvent::OutsRecorded(2), &final_out);
    appearance.finalize(
        &final_out,
        AppearanceExit {
            finished_game: true,
            is_winning_pitcher: false,
            game_over: true,
        },
    );
    let value = serde_json::to_value(&appearance).unwrap();
    assert_eq!(value["opportunity"]["status"], "qualified");
    assert_eq!(value["opportunity"]["tying_run_close"], true);
    assert_eq!(value["classification"], "SAVE");
    assert_eq!(value["team"], "away");
}
