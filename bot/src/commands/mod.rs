//! Chat command layer: a dispatch table keyed by command name.
//!
//! Every handler takes the shared state, the caller context and the raw
//! arguments, and returns a [`CommandReply`] made of plain serde data.
//! Domain rejections become user-facing replies; infrastructure faults are
//! logged and answered with a generic message.

mod admin;
mod args;
mod companion;
mod economy;
mod event;
mod quests;

use std::sync::LazyLock;

use event_db::{DbError, UserId};
use regex::Regex;
use season_engine::SeasonError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::task::JoinError;

use crate::app::SharedState;

pub use args::Args;

/// Who issued the command and where.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandContext {
    pub user_id: UserId,
    #[serde(default)]
    pub guild_id: Option<i64>,
    #[serde(default)]
    pub channel_id: Option<i64>,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandReply {
    pub ok: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
    /// Community milestones crossed by this command.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub milestones: Vec<i64>,
}

impl CommandReply {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            data: Value::Null,
            milestones: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            data: Value::Null,
            milestones: Vec::new(),
        }
    }

    pub fn with_data(mut self, data: impl Serialize) -> Self {
        self.data = serde_json::to_value(data).unwrap_or(Value::Null);
        self
    }

    pub fn with_milestones(mut self, milestones: Vec<i64>) -> Self {
        self.milestones = milestones;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command '{0}', try `help`")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(String),

    #[error("this command is for administrators")]
    Forbidden,

    #[error(transparent)]
    Season(#[from] SeasonError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("background task failed: {0}")]
    Join(#[from] JoinError),
}

impl CommandError {
    fn is_user_error(&self) -> bool {
        match self {
            Self::Season(e) => e.is_user_error(),
            Self::Db(_) | Self::Join(_) => false,
            Self::Unknown(_) | Self::Usage(_) | Self::Forbidden => true,
        }
    }
}

type CommandResult = Result<CommandReply, CommandError>;

/// Static description of one command.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CommandDef {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
    pub admin_only: bool,
}

const fn cmd(
    name: &'static str,
    usage: &'static str,
    description: &'static str,
    admin_only: bool,
) -> CommandDef {
    CommandDef {
        name,
        usage,
        description,
        admin_only,
    }
}

pub const COMMANDS: &[CommandDef] = &[
    cmd("help", "help", "List commands", false),
    cmd("event", "event [event_key]", "Show the active or a named event", false),
    cmd(
        "event_start",
        "event_start <event_key> [milestones,comma,separated] [phase]",
        "Start a seasonal event",
        true,
    ),
    cmd("event_end", "event_end <event_key>", "End the active event", true),
    cmd("event_phase", "event_phase <event_key> [phase]", "Set or clear the event phase", true),
    cmd("event_reset", "event_reset <event_key>", "Delete an event so it can start again", true),
    cmd(
        "quest_define",
        "quest_define <quest_id> <daily|fixed> <requirement_type> <count> <reward> [description...]",
        "Add or replace a quest of the active event",
        true,
    ),
    cmd("grant", "grant <@user> <amount>", "Give event currency to a user", true),
    cmd("balance", "balance [@user]", "Show event currency and contribution", false),
    cmd("contribute", "contribute <amount>", "Spend currency on the community goal", false),
    cmd("leaderboard", "leaderboard [event_key] [limit]", "Top contributors", false),
    cmd("quests", "quests", "Show today's quests", false),
    cmd(
        "activity",
        "activity <@user> <requirement_type> [amount]",
        "Record activity towards quests",
        true,
    ),
    cmd("claim", "claim <quest_id>", "Claim a completed quest's reward", false),
    cmd("interact", "interact <@user>", "Spend time with someone", false),
    cmd("relationship", "relationship [@user]", "Show a relationship or your closest ones", false),
    cmd("pet_adopt", "pet_adopt <@user> <name...>", "Adopt a pet together", false),
    cmd("pet_feed", "pet_feed <@user>", "Feed your shared pet", false),
    cmd("pet", "pet <@user>", "Show your shared pet", false),
    cmd(
        "config_admin_channel",
        "config_admin_channel [#channel]",
        "Set or clear this server's admin channel",
        true,
    ),
    cmd(
        "config_noitu_channel",
        "config_noitu_channel [#channel]",
        "Set or clear this server's word-chain channel",
        true,
    ),
];

pub fn find_command(name: &str) -> Option<&'static CommandDef> {
    COMMANDS.iter().find(|c| c.name == name)
}

static RE_COMMAND_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[!/]?([a-z_]+)$").unwrap());

/// Strip an optional `!` or `/` prefix and lowercase the name.
pub fn normalize_name(raw: &str) -> Option<String> {
    let lower = raw.trim().to_ascii_lowercase();
    RE_COMMAND_NAME
        .captures(&lower)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Run one command. Never fails: every error is turned into a reply.
pub async fn dispatch(
    state: &SharedState,
    ctx: &CommandContext,
    name: &str,
    args: &[String],
) -> CommandReply {
    let Some(def) = normalize_name(name).and_then(|n| find_command(&n)) else {
        return reply_for_error(name, CommandError::Unknown(name.trim().to_string()));
    };

    if def.admin_only && !ctx.is_admin {
        return reply_for_error(def.name, CommandError::Forbidden);
    }

    let args = Args::new(def, args);
    let result = match def.name {
        "help" => help(ctx),
        "event" => event::show(state, &args).await,
        "event_start" => event::start(state, &args).await,
        "event_end" => event::end(state, &args).await,
        "event_phase" => event::phase(state, &args).await,
        "event_reset" => event::reset(state, &args).await,
        "quest_define" => quests::define(state, &args).await,
        "grant" => economy::grant(state, &args).await,
        "balance" => economy::balance(state, ctx, &args).await,
        "contribute" => economy::contribute(state, ctx, &args).await,
        "leaderboard" => economy::leaderboard(state, &args).await,
        "quests" => quests::list(state, ctx).await,
        "activity" => quests::activity(state, &args).await,
        "claim" => quests::claim(state, ctx, &args).await,
        "interact" => companion::interact(state, ctx, &args).await,
        "relationship" => companion::relationship(state, ctx, &args).await,
        "pet_adopt" => companion::adopt(state, ctx, &args).await,
        "pet_feed" => companion::feed(state, ctx, &args).await,
        "pet" => companion::show(state, ctx, &args).await,
        "config_admin_channel" => admin::set_admin_channel(state, ctx, &args).await,
        "config_noitu_channel" => admin::set_noitu_channel(state, ctx, &args).await,
        other => Err(CommandError::Unknown(other.to_string())),
    };

    match result {
        Ok(reply) => reply,
        Err(e) => reply_for_error(def.name, e),
    }
}

fn reply_for_error(command: &str, error: CommandError) -> CommandReply {
    if error.is_user_error() {
        tracing::debug!(command, %error, "Command rejected");
        CommandReply::error(user_message(&error))
    } else {
        tracing::error!(command, %error, "Command failed");
        CommandReply::error("Something went wrong, please try again later.")
    }
}

fn user_message(error: &CommandError) -> String {
    match error {
        CommandError::Season(SeasonError::NoActiveEvent) => {
            "There is no seasonal event running right now.".into()
        }
        CommandError::Season(SeasonError::InsufficientFunds { balance, requested }) => {
            format!("You only have {balance} coins, {requested} needed.")
        }
        CommandError::Season(SeasonError::OnCooldown { remaining_secs }) => {
            format!("Not yet, try again in {}.", format_duration(*remaining_secs))
        }
        other => {
            let mut text = other.to_string();
            if let Some(first) = text.get_mut(..1) {
                first.make_ascii_uppercase();
            }
            text
        }
    }
}

/// `1h 5m`, `42s` style durations.
pub(crate) fn format_duration(secs: i64) -> String {
    let secs = secs.max(0);
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    match (h, m) {
        (0, 0) => format!("{s}s"),
        (0, _) => format!("{m}m {s}s"),
        _ => format!("{h}h {m}m"),
    }
}

fn help(ctx: &CommandContext) -> CommandResult {
    let visible: Vec<&CommandDef> = COMMANDS
        .iter()
        .filter(|c| ctx.is_admin || !c.admin_only)
        .collect();
    let text = visible
        .iter()
        .map(|c| format!("{} - {}", c.usage, c.description))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(CommandReply::ok(text).with_data(json!({ "commands": visible })))
}
