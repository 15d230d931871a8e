use event_db::relationships::SharedPet;
use season_engine::SeasonError;
use serde_json::json;

use super::{Args, CommandContext, CommandError, CommandReply, CommandResult};
use crate::app::SharedState;

fn pet_line(pet: &SharedPet) -> String {
    format!(
        "{} is level {} ({}/{} exp)",
        pet.name,
        pet.level,
        pet.exp,
        season_engine::companion::exp_to_next(pet.level)
    )
}

pub(super) async fn interact(
    state: &SharedState,
    ctx: &CommandContext,
    args: &Args<'_>,
) -> CommandResult {
    let (me, other) = (ctx.user_id, args.user(0)?);
    let outcome = state
        .run_engine(move |engine| engine.companion.interact(me, other))
        .await??;

    let text = if outcome.created {
        format!("You and <@{other}> just met! Affinity: {}.", outcome.relationship.affinity)
    } else {
        format!(
            "You spent time with <@{other}>. Affinity: {}.",
            outcome.relationship.affinity
        )
    };
    Ok(CommandReply::ok(text).with_data(&outcome))
}

pub(super) async fn relationship(
    state: &SharedState,
    ctx: &CommandContext,
    args: &Args<'_>,
) -> CommandResult {
    let me = ctx.user_id;
    match args.opt_user(0)? {
        Some(other) => {
            let rel = state
                .run_engine(move |engine| engine.companion.get_relationship(me, other))
                .await??
                .ok_or(SeasonError::RelationshipNotFound)?;
            Ok(
                CommandReply::ok(format!("Affinity with <@{other}>: {}.", rel.affinity))
                    .with_data(&rel),
            )
        }
        None => {
            let limit = state.config().await.leaderboard_default_limit;
            let top = state
                .run_engine(move |engine| engine.companion.top_relationships(me, limit))
                .await??;
            if top.is_empty() {
                return Ok(CommandReply::ok("You have not met anyone yet."));
            }
            let lines: Vec<String> = top
                .iter()
                .filter_map(|r| r.partner_of(me).map(|p| format!("<@{p}> - {}", r.affinity)))
                .collect();
            Ok(CommandReply::ok(lines.join("\n")).with_data(json!({ "relationships": top })))
        }
    }
}

pub(super) async fn adopt(
    state: &SharedState,
    ctx: &CommandContext,
    args: &Args<'_>,
) -> CommandResult {
    let (me, other) = (ctx.user_id, args.user(0)?);
    let name = args.rest(1).ok_or_else(|| args.usage())?;
    if name.chars().count() > 32 {
        return Err(CommandError::Usage("pet names are at most 32 characters".into()));
    }

    let pet = state
        .run_engine(move |engine| engine.companion.adopt_pet(me, other, &name))
        .await??;
    Ok(CommandReply::ok(format!("You and <@{other}> adopted {}!", pet.name)).with_data(&pet))
}

pub(super) async fn feed(
    state: &SharedState,
    ctx: &CommandContext,
    args: &Args<'_>,
) -> CommandResult {
    let (me, other) = (ctx.user_id, args.user(0)?);
    let outcome = state
        .run_engine(move |engine| engine.companion.feed_pet(me, other))
        .await??;

    let mut text = format!("Fed {} (+{} exp).", outcome.pet.name, outcome.exp_gained);
    if outcome.levels_gained > 0 {
        text.push_str(&format!(" Level up! {}", pet_line(&outcome.pet)));
    }
    Ok(CommandReply::ok(text).with_data(&outcome))
}

pub(super) async fn show(
    state: &SharedState,
    ctx: &CommandContext,
    args: &Args<'_>,
) -> CommandResult {
    let (me, other) = (ctx.user_id, args.user(0)?);
    let pet = state
        .run_engine(move |engine| engine.companion.get_pet(me, other))
        .await??
        .ok_or(SeasonError::PetNotFound)?;
    Ok(CommandReply::ok(pet_line(&pet)).with_data(&pet))
}
