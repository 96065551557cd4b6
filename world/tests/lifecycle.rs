use std::collections::HashSet;

use pursuit_core::{
    AgentConfig, AgentRole, AppleConfig, Command, Event, GameConfig, IllegalMove, OutcomeReason,
    Position, ResolutionOrder, TurnStatus,
};
use pursuit_world::{self as world, query, World};

fn config_with_apples(apples: Vec<AppleConfig>) -> GameConfig {
    GameConfig {
        width: 5,
        height: 5,
        obstacles: vec![Position::new(2, 2)],
        pursuer: AgentConfig::new(Position::new(4, 4), 1),
        evader: AgentConfig::new(Position::new(0, 0), 2),
        apple_target_count: 0,
        apple_lifetime: 10,
        apples,
        danger_radius: 2,
        win_score_threshold: 5,
        seed: Some(0x5eed),
        resolution_order: ResolutionOrder::PursuerFirst,
    }
}

fn apple(x: i32, y: i32, remaining_life: u32) -> AppleConfig {
    AppleConfig {
        position: Position::new(x, y),
        remaining_life,
    }
}

#[test]
fn illegal_moves_leave_state_unchanged() {
    let mut world = World::new(config_with_apples(Vec::new())).expect("valid config");
    let mut events = Vec::new();

    let attempts = [
        (AgentRole::Evader, Position::new(1, 1), IllegalMove::Diagonal),
        (
            AgentRole::Evader,
            Position::new(3, 0),
            IllegalMove::ExceedsStepBudget {
                attempted: 3,
                budget: 2,
            },
        ),
        (AgentRole::Pursuer, Position::new(5, 4), IllegalMove::OutOfBounds),
        (AgentRole::Evader, Position::new(0, -1), IllegalMove::OutOfBounds),
    ];

    for (role, to, expected) in attempts {
        assert_eq!(
            world::apply_move(&mut world, role, to, &mut events),
            Err(expected)
        );
    }

    assert!(events.is_empty());
    assert_eq!(
        query::agent(&world, AgentRole::Pursuer).position,
        Position::new(4, 4)
    );
    assert_eq!(
        query::agent(&world, AgentRole::Evader).position,
        Position::new(0, 0)
    );
}

#[test]
fn moving_onto_an_obstacle_is_rejected() {
    let mut config = config_with_apples(Vec::new());
    config.evader.start = Position::new(0, 2);
    let mut world = World::new(config).expect("valid config");
    let mut events = Vec::new();

    assert_eq!(
        world::apply_move(&mut world, AgentRole::Evader, Position::new(2, 2), &mut events),
        Err(IllegalMove::Obstructed)
    );
    assert_eq!(
        world::apply_move(&mut world, AgentRole::Evader, Position::new(1, 2), &mut events),
        Ok(())
    );
    assert_eq!(
        events,
        vec![Event::AgentMoved {
            role: AgentRole::Evader,
            from: Position::new(0, 2),
            to: Position::new(1, 2),
        }]
    );
}

#[test]
fn uneaten_apple_survives_lifetime_plus_one_ticks() {
    let lifetime = 3;
    let mut world =
        World::new(config_with_apples(vec![apple(1, 3, lifetime)])).expect("valid config");

    for elapsed in 1..=lifetime {
        let mut events = Vec::new();
        assert_eq!(world::tick(&mut world, &mut events), TurnStatus::Continuing);
        let apples = query::apples(&world);
        assert_eq!(apples.len(), 1, "apple missing after {elapsed} ticks");
        assert_eq!(apples[0].remaining_life, lifetime - elapsed);
    }

    let mut events = Vec::new();
    assert_eq!(world::tick(&mut world, &mut events), TurnStatus::Continuing);
    assert!(query::apples(&world).is_empty());
    assert!(events.contains(&Event::AppleSpoiled {
        position: Position::new(1, 3)
    }));
}

#[test]
fn shared_cell_ends_with_pursuer_win() {
    let mut config = config_with_apples(Vec::new());
    config.pursuer.start = Position::new(1, 0);
    let mut world = World::new(config).expect("valid config");
    let mut events = Vec::new();

    world::apply(
        &mut world,
        Command::MoveAgent {
            role: AgentRole::Pursuer,
            to: Position::new(0, 0),
        },
        &mut events,
    );
    let status = world::tick(&mut world, &mut events);

    assert_eq!(status, TurnStatus::PursuerWins(OutcomeReason::Caught));
    assert_eq!(query::status(&world), status);
    assert!(events.contains(&Event::EncounterFinished { status }));

    let mut late_events = Vec::new();
    assert_eq!(
        world::apply_move(
            &mut world,
            AgentRole::Evader,
            Position::new(0, 1),
            &mut late_events
        ),
        Err(IllegalMove::EncounterFinished)
    );
    assert_eq!(world::tick(&mut world, &mut late_events), status);
    assert!(late_events.is_empty());
}

#[test]
fn eating_an_apple_scores_and_replaces_it() {
    let mut config = config_with_apples(vec![apple(0, 1, 6)]);
    config.apple_target_count = 1;
    let mut world = World::new(config).expect("valid config");
    let mut events = Vec::new();

    world::apply_move(&mut world, AgentRole::Evader, Position::new(0, 1), &mut events)
        .expect("legal move");
    assert_eq!(world::tick(&mut world, &mut events), TurnStatus::Continuing);

    assert_eq!(query::agent(&world, AgentRole::Evader).score, 1);
    assert!(events.contains(&Event::AppleConsumed {
        role: AgentRole::Evader,
        position: Position::new(0, 1),
        score: 1,
    }));

    let apples = query::apples(&world);
    assert_eq!(apples.len(), 1);
    assert_eq!(apples[0].remaining_life, 10);
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::AppleSpawned { remaining_life: 10, .. })));
}

#[test]
fn pursuer_threshold_is_checked_before_evader() {
    let mut config = config_with_apples(vec![apple(4, 3, 5), apple(0, 1, 5)]);
    config.win_score_threshold = 1;
    let mut world = World::new(config).expect("valid config");
    let mut events = Vec::new();

    world::apply_move(&mut world, AgentRole::Pursuer, Position::new(4, 3), &mut events)
        .expect("legal move");
    world::apply_move(&mut world, AgentRole::Evader, Position::new(0, 1), &mut events)
        .expect("legal move");
    let status = world::tick(&mut world, &mut events);

    assert_eq!(query::agent(&world, AgentRole::Evader).score, 1);
    assert_eq!(
        status,
        TurnStatus::PursuerWins(OutcomeReason::ScoreThreshold { score: 1 })
    );
}

#[test]
fn evader_wins_on_reaching_threshold() {
    let mut config = config_with_apples(vec![apple(2, 0, 5)]);
    config.win_score_threshold = 1;
    let mut world = World::new(config).expect("valid config");
    let mut events = Vec::new();

    world::apply_move(&mut world, AgentRole::Evader, Position::new(2, 0), &mut events)
        .expect("legal move");
    let status = world::tick(&mut world, &mut events);

    assert_eq!(
        status,
        TurnStatus::EvaderWins(OutcomeReason::ScoreThreshold { score: 1 })
    );
    assert_eq!(
        status.reason().as_deref(),
        Some("the evader ate 1 apples")
    );
}

#[test]
fn replenishment_fills_only_free_cells() {
    let mut config = config_with_apples(vec![apple(0, 1, 50)]);
    config.width = 3;
    config.height = 2;
    config.obstacles = vec![Position::new(1, 0)];
    config.pursuer.start = Position::new(2, 1);
    config.evader.start = Position::new(0, 0);
    config.apple_target_count = 10;

    let world = World::new(config).expect("valid config");
    let cells: HashSet<Position> = query::apples(&world)
        .into_iter()
        .map(|apple| apple.position)
        .collect();

    let expected: HashSet<Position> = [
        Position::new(0, 0),
        Position::new(2, 0),
        Position::new(0, 1),
        Position::new(1, 1),
        Position::new(2, 1),
    ]
    .into_iter()
    .collect();
    assert_eq!(cells, expected);
}

#[test]
fn replenishment_is_deterministic_for_a_seed() {
    let mut config = config_with_apples(Vec::new());
    config.apple_target_count = 3;

    let first = World::new(config.clone()).expect("valid config");
    let second = World::new(config).expect("valid config");

    assert_eq!(query::apples(&first), query::apples(&second));
    assert!(query::apples(&first)
        .iter()
        .all(|apple| apple.position != Position::new(2, 2)));
}

#[test]
fn construction_reports_scattered_apples() {
    let mut config = config_with_apples(vec![apple(0, 1, 4)]);
    config.apple_target_count = 3;
    let mut events = Vec::new();

    let world = World::with_events(config, &mut events).expect("valid config");

    let apples = query::apples(&world);
    let spawned: Vec<Event> = apples[1..]
        .iter()
        .map(|apple| Event::AppleSpawned {
            position: apple.position,
            remaining_life: 10,
        })
        .collect();
    assert_eq!(apples.len(), 3);
    assert_eq!(events, spawned);
}
