use event_db::quests::{QuestDefinition, QuestKind, QuestProgress};
use season_engine::SeasonError;
use serde_json::json;

use super::economy::active_key;
use super::{Args, CommandContext, CommandReply, CommandResult};
use crate::app::SharedState;

fn quest_line(q: &QuestProgress) -> String {
    let mark = if q.claimed {
        "claimed"
    } else if q.is_complete() {
        "ready to claim"
    } else {
        "in progress"
    };
    format!(
        "[{}] {} - {} {}/{} for {} coins ({mark})",
        q.kind.as_str(),
        q.quest_id,
        q.requirement_type,
        q.progress_count,
        q.requirement,
        q.reward
    )
}

pub(super) async fn define(state: &SharedState, args: &Args<'_>) -> CommandResult {
    let quest_id = args.required(0)?.to_string();
    let kind = QuestKind::parse(&args.required(1)?.to_ascii_lowercase()).ok_or_else(|| args.usage())?;
    let requirement_type = args.required(2)?.to_ascii_lowercase();
    let requirement_count = args.int(3)?;
    let reward = args.int(4)?;
    let description = args.rest(5).unwrap_or_default();

    let def = state
        .run_engine(move |engine| {
            let def = QuestDefinition {
                quest_id,
                event_key: active_key(&engine)?,
                kind,
                requirement_type,
                requirement_count,
                reward,
                description,
            };
            engine.quests.define_quest(&def)?;
            Ok::<_, SeasonError>(def)
        })
        .await??;

    Ok(CommandReply::ok(format!(
        "Quest '{}' saved for '{}'.",
        def.quest_id, def.event_key
    ))
    .with_data(&def))
}

pub(super) async fn list(state: &SharedState, ctx: &CommandContext) -> CommandResult {
    let user_id = ctx.user_id;
    let quests = state
        .run_engine(move |engine| engine.quests.refresh_daily_quests(user_id))
        .await??;

    if quests.is_empty() {
        return Ok(CommandReply::ok("No quests are available for this event."));
    }
    let lines: Vec<String> = quests.iter().map(quest_line).collect();
    Ok(CommandReply::ok(lines.join("\n")).with_data(json!({ "quests": quests })))
}

pub(super) async fn activity(state: &SharedState, args: &Args<'_>) -> CommandResult {
    let user_id = args.user(0)?;
    let requirement_type = args.required(1)?.to_ascii_lowercase();
    let amount = args.opt_int(2)?.unwrap_or(1);

    let completed = state
        .run_engine(move |engine| {
            engine.quests.refresh_daily_quests(user_id)?;
            engine.quests.record_activity(user_id, &requirement_type, amount)
        })
        .await??;

    let text = if completed.is_empty() {
        "Activity recorded.".to_string()
    } else {
        let ids: Vec<&str> = completed.iter().map(|q| q.quest_id.as_str()).collect();
        format!("<@{user_id}> completed: {}", ids.join(", "))
    };
    Ok(CommandReply::ok(text).with_data(json!({ "completed": completed })))
}

pub(super) async fn claim(
    state: &SharedState,
    ctx: &CommandContext,
    args: &Args<'_>,
) -> CommandResult {
    let quest_id = args.required(0)?.to_string();
    let user_id = ctx.user_id;
    let outcome = state
        .run_engine(move |engine| engine.quests.claim_reward(user_id, &quest_id))
        .await??;

    Ok(CommandReply::ok(format!(
        "Claimed {} coins for '{}'. Balance: {}.",
        outcome.reward, outcome.quest.quest_id, outcome.balance
    ))
    .with_data(&outcome))
}
