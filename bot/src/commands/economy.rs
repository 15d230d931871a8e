use season_engine::{SeasonEngine, SeasonError};
use serde_json::json;

use super::{Args, CommandContext, CommandReply, CommandResult};
use crate::app::SharedState;

pub(super) fn active_key(engine: &SeasonEngine) -> Result<String, SeasonError> {
    engine
        .events
        .get_active_event()?
        .map(|e| e.event_key)
        .ok_or(SeasonError::NoActiveEvent)
}

pub(super) async fn grant(state: &SharedState, args: &Args<'_>) -> CommandResult {
    let user_id = args.user(0)?;
    let amount = args.int(1)?;
    let record = state
        .run_engine(move |engine| {
            let key = active_key(&engine)?;
            engine.ledger.add_currency(user_id, &key, amount)
        })
        .await??;

    Ok(CommandReply::ok(format!(
        "Gave {amount} coins to <@{user_id}>, who now has {}.",
        record.currency_balance
    ))
    .with_data(&record))
}

pub(super) async fn balance(
    state: &SharedState,
    ctx: &CommandContext,
    args: &Args<'_>,
) -> CommandResult {
    let user_id = args.opt_user(0)?.unwrap_or(ctx.user_id);
    let (record, rank) = state
        .run_engine(move |engine| {
            let key = active_key(&engine)?;
            let record = engine.ledger.get_or_create(user_id, &key)?;
            let rank = engine.ledger.get_rank(user_id, &key)?;
            Ok::<_, SeasonError>((record, rank))
        })
        .await??;

    let mut text = format!(
        "<@{user_id}> has {} coins and contributed {} to '{}'",
        record.currency_balance, record.contribution_total, record.event_key
    );
    if let Some(rank) = rank {
        text.push_str(&format!(" (rank #{rank})"));
    }
    Ok(CommandReply::ok(text).with_data(json!({ "record": record, "rank": rank })))
}

pub(super) async fn contribute(
    state: &SharedState,
    ctx: &CommandContext,
    args: &Args<'_>,
) -> CommandResult {
    let amount = args.int(0)?;
    let user_id = ctx.user_id;
    let outcome = state
        .run_engine(move |engine| engine.ledger.contribute(user_id, amount))
        .await??;

    let progress = &outcome.progress;
    state.publish_milestones(&progress.event_key, &progress.reached, progress.total);

    let mut text = format!(
        "Thanks! The community total for '{}' is now {}.",
        progress.event_key, progress.total
    );
    for milestone in &progress.reached {
        text.push_str(&format!(" Milestone {milestone} reached!"));
    }
    let reached = progress.reached.clone();
    Ok(CommandReply::ok(text)
        .with_data(&outcome)
        .with_milestones(reached))
}

pub(super) async fn leaderboard(state: &SharedState, args: &Args<'_>) -> CommandResult {
    // `leaderboard 5` and `leaderboard winter 5` are both accepted.
    let (key, limit) = match args.get(0) {
        Some(first) if first.parse::<i64>().is_ok() => (None, args.opt_int(0)?),
        Some(first) => (Some(first.to_string()), args.opt_int(1)?),
        None => (None, None),
    };
    let default_limit = state.config().await.leaderboard_default_limit;
    let limit = match limit {
        Some(n) if n > 0 => usize::try_from(n).unwrap_or(default_limit).min(100),
        Some(_) => return Err(args.usage()),
        None => default_limit,
    };

    let (key, entries) = state
        .run_engine(move |engine| {
            let key = match key {
                Some(key) => key,
                None => active_key(&engine)?,
            };
            let entries = engine.ledger.get_leaderboard(&key, limit)?;
            Ok::<_, SeasonError>((key, entries))
        })
        .await??;

    if entries.is_empty() {
        return Ok(CommandReply::ok(format!("Nobody has contributed to '{key}' yet.")));
    }
    let lines: Vec<String> = entries
        .iter()
        .map(|e| format!("#{} <@{}> - {}", e.rank, e.user_id, e.contribution_total))
        .collect();
    Ok(CommandReply::ok(format!("Top contributors for '{key}':\n{}", lines.join("\n")))
        .with_data(json!({ "event_key": key, "entries": entries })))
}
