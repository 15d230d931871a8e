//! Positional argument parsing shared by the command handlers.

use std::sync::LazyLock;

use event_db::UserId;
use regex::Regex;

use super::{CommandError, CommandDef};

static RE_USER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:<@!?(\d+)>|(\d+))$").unwrap());
static RE_CHANNEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:<#(\d+)>|(\d+))$").unwrap());

fn snowflake(re: &Regex, raw: &str) -> Option<i64> {
    let caps = re.captures(raw.trim())?;
    caps.get(1).or_else(|| caps.get(2))?.as_str().parse().ok()
}

pub struct Args<'a> {
    def: &'static CommandDef,
    items: &'a [String],
}

impl<'a> Args<'a> {
    pub fn new(def: &'static CommandDef, items: &'a [String]) -> Self {
        Self { def, items }
    }

    pub fn usage(&self) -> CommandError {
        CommandError::Usage(self.def.usage.to_string())
    }

    pub fn get(&self, i: usize) -> Option<&'a str> {
        self.items.get(i).map(|s| s.trim()).filter(|s| !s.is_empty())
    }

    pub fn required(&self, i: usize) -> Result<&'a str, CommandError> {
        self.get(i).ok_or_else(|| self.usage())
    }

    pub fn int(&self, i: usize) -> Result<i64, CommandError> {
        self.required(i)?.parse().map_err(|_| self.usage())
    }

    pub fn opt_int(&self, i: usize) -> Result<Option<i64>, CommandError> {
        self.get(i)
            .map(|s| s.parse().map_err(|_| self.usage()))
            .transpose()
    }

    pub fn user(&self, i: usize) -> Result<UserId, CommandError> {
        snowflake(&RE_USER, self.required(i)?).ok_or_else(|| self.usage())
    }

    pub fn opt_user(&self, i: usize) -> Result<Option<UserId>, CommandError> {
        self.get(i)
            .map(|s| snowflake(&RE_USER, s).ok_or_else(|| self.usage()))
            .transpose()
    }

    pub fn opt_channel(&self, i: usize) -> Result<Option<i64>, CommandError> {
        self.get(i)
            .map(|s| snowflake(&RE_CHANNEL, s).ok_or_else(|| self.usage()))
            .transpose()
    }

    /// Remaining arguments from `i` joined by spaces.
    pub fn rest(&self, i: usize) -> Option<String> {
        let joined = self.items.get(i..)?.join(" ");
        let trimmed = joined.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::find_command;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_mentions_and_plain_ids() {
        let items = strings(&["<@123>", "<@!456>", "789", "@bob"]);
        let args = Args::new(find_command("pet").unwrap(), &items);
        assert_eq!(args.user(0).unwrap(), 123);
        assert_eq!(args.user(1).unwrap(), 456);
        assert_eq!(args.user(2).unwrap(), 789);
        assert!(matches!(args.user(3), Err(CommandError::Usage(_))));
        assert!(matches!(args.user(4), Err(CommandError::Usage(_))));
        assert_eq!(args.opt_user(4).unwrap(), None);
    }

    #[test]
    fn parses_channels_and_rest() {
        let items = strings(&["<#42>", "Mochi", "the", "cat"]);
        let args = Args::new(find_command("pet_adopt").unwrap(), &items);
        assert_eq!(args.opt_channel(0).unwrap(), Some(42));
        assert_eq!(args.rest(1).as_deref(), Some("Mochi the cat"));
        assert_eq!(args.rest(4), None);
        assert_eq!(args.rest(9), None);
    }

    #[test]
    fn int_errors_carry_usage() {
        let items = strings(&["ten"]);
        let args = Args::new(find_command("contribute").unwrap(), &items);
        match args.int(0) {
            Err(CommandError::Usage(usage)) => assert_eq!(usage, "contribute <amount>"),
            other => panic!("expected usage error, got {other:?}"),
        }
    }
}
