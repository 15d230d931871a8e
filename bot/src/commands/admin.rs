//! Per-server channel configuration commands.

use event_db::{Database, DbError};
use event_db::server_config::ServerConfig;

use super::{Args, CommandContext, CommandError, CommandReply, CommandResult};
use crate::app::SharedState;

#[derive(Debug, Clone, Copy)]
enum Channel {
    Admin,
    Noitu,
}

impl Channel {
    fn label(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Noitu => "word-chain",
        }
    }
}

/// `[#channel]` sets that channel, `clear` unsets it, nothing means the
/// channel the command was sent from.
fn target_channel(ctx: &CommandContext, args: &Args<'_>) -> Result<Option<i64>, CommandError> {
    match args.get(0) {
        Some("clear" | "none" | "off") => Ok(None),
        Some(_) => args.opt_channel(0),
        None => ctx.channel_id.map(Some).ok_or_else(|| args.usage()),
    }
}

async fn set_channel(
    state: &SharedState,
    ctx: &CommandContext,
    args: &Args<'_>,
    which: Channel,
) -> CommandResult {
    let guild_id = ctx
        .guild_id
        .ok_or_else(|| CommandError::Usage("this command only works inside a server".into()))?;
    let channel_id = target_channel(ctx, args)?;

    let db: Database = state.db().clone();
    let config = tokio::task::spawn_blocking(move || {
        match which {
            Channel::Admin => db.set_admin_channel(guild_id, channel_id)?,
            Channel::Noitu => db.set_noitu_channel(guild_id, channel_id)?,
        }
        Ok::<_, DbError>(db.get_server_config(guild_id)?.unwrap_or(ServerConfig {
            guild_id,
            ..ServerConfig::default()
        }))
    })
    .await??;

    tracing::info!(guild_id, ?channel_id, channel = which.label(), "Server channel updated");
    let text = match channel_id {
        Some(id) => format!("The {} channel is now <#{id}>.", which.label()),
        None => format!("The {} channel was cleared.", which.label()),
    };
    Ok(CommandReply::ok(text).with_data(&config))
}

pub(super) async fn set_admin_channel(
    state: &SharedState,
    ctx: &CommandContext,
    args: &Args<'_>,
) -> CommandResult {
    set_channel(state, ctx, args, Channel::Admin).await
}

pub(super) async fn set_noitu_channel(
    state: &SharedState,
    ctx: &CommandContext,
    args: &Args<'_>,
) -> CommandResult {
    set_channel(state, ctx, args, Channel::Noitu).await
}
