use season_engine::{EventSetup, EventStatus, SeasonalEvent};

use super::{Args, CommandReply, CommandResult};
use crate::app::SharedState;

fn describe(event: &SeasonalEvent) -> String {
    let state = &event.state;
    let mut text = match state.status {
        EventStatus::Active => format!(
            "Event '{}' is running: {} community points",
            event.event_key, state.community_total
        ),
        EventStatus::Ended => format!(
            "Event '{}' has ended with {} community points",
            event.event_key, state.community_total
        ),
    };
    if let Some(next) = state.next_milestone() {
        text.push_str(&format!(", next milestone at {next}"));
    }
    if let Some(phase) = &state.phase {
        text.push_str(&format!(" (phase: {phase})"));
    }
    text
}

fn parse_milestones(raw: &str) -> Option<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}

pub(super) async fn show(state: &SharedState, args: &Args<'_>) -> CommandResult {
    let key = args.get(0).map(str::to_string);
    let event = state
        .run_engine(move |engine| match key {
            Some(key) => engine.events.get_event(&key),
            None => engine.events.get_active_event(),
        })
        .await??;

    Ok(match event {
        Some(event) => CommandReply::ok(describe(&event)).with_data(&event),
        None => CommandReply::ok("There is no seasonal event running right now."),
    })
}

pub(super) async fn start(state: &SharedState, args: &Args<'_>) -> CommandResult {
    let key = args.required(0)?.to_string();
    let mut setup = EventSetup::default();
    if let Some(raw) = args.get(1) {
        setup.milestones = parse_milestones(raw).ok_or_else(|| args.usage())?;
    }
    setup.phase = args.get(2).map(str::to_string);

    let event = state
        .run_engine(move |engine| engine.events.start_event(&key, setup))
        .await??;
    Ok(CommandReply::ok(describe(&event)).with_data(&event))
}

pub(super) async fn end(state: &SharedState, args: &Args<'_>) -> CommandResult {
    let key = args.required(0)?.to_string();
    let event = state
        .run_engine(move |engine| engine.events.end_event(&key))
        .await??;
    Ok(CommandReply::ok(describe(&event)).with_data(&event))
}

pub(super) async fn phase(state: &SharedState, args: &Args<'_>) -> CommandResult {
    let key = args.required(0)?.to_string();
    let phase = args.rest(1);
    let event = state
        .run_engine(move |engine| engine.events.set_phase(&key, phase))
        .await??;
    Ok(CommandReply::ok(describe(&event)).with_data(&event))
}

pub(super) async fn reset(state: &SharedState, args: &Args<'_>) -> CommandResult {
    let key = args.required(0)?.to_string();
    let reset_key = key.clone();
    let existed = state
        .run_engine(move |engine| engine.events.reset_event(&reset_key))
        .await??;

    if !existed {
        return Ok(CommandReply::error(format!("There is no event named '{key}'.")));
    }
    Ok(CommandReply::ok(format!("Event '{key}' was reset.")))
}
