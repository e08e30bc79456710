//! Available commands, autocomplete and parsing

use color_eyre::{eyre::eyre, Result};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub usage: &'static str,
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "first",
    aliases: &["f", "home"],
    usage: "",
    description: "Go to the first page",
  },
  Command {
    name: "last",
    aliases: &["end"],
    usage: "",
    description: "Go to the last page",
  },
  Command {
    name: "next",
    aliases: &["n"],
    usage: "",
    description: "Go to the next page",
  },
  Command {
    name: "prev",
    aliases: &["p", "previous"],
    usage: "",
    description: "Go to the previous page",
  },
  Command {
    name: "page",
    aliases: &["pg", "goto"],
    usage: "N",
    description: "Jump to page N",
  },
  Command {
    name: "refresh",
    aliases: &["r", "reload"],
    usage: "",
    description: "Drop cached pages and reload",
  },
  Command {
    name: "set",
    aliases: &["update"],
    usage: "KEY=VALUE FIELD=VALUE",
    description: "Set FIELD on cached rows where KEY matches",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    usage: "",
    description: "Exit gridpager",
  },
];

/// A parsed command line
#[derive(Debug, Clone, PartialEq)]
pub enum CommandAction {
  First,
  Last,
  Next,
  Prev,
  /// Zero-based page index
  Page(usize),
  Refresh,
  Set {
    filter_key: String,
    filter_value: Value,
    update_key: String,
    update_value: Value,
  },
  Quit,
}

/// Get autocomplete suggestions for the command name (first word) of `input`
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input
    .split_whitespace()
    .next()
    .unwrap_or_default()
    .to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0));
      continue;
    }

    // Exact match on alias
    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    // Prefix match on name
    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    // Prefix match on alias
    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
    }
  }

  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

fn find(name: &str) -> Option<&'static Command> {
  let name = name.to_lowercase();
  COMMANDS
    .iter()
    .find(|c| c.name == name || c.aliases.contains(&name.as_str()))
}

/// Parse a command line like `page 3` or `set status=open status=closed`
pub fn parse_command(line: &str) -> Result<CommandAction> {
  let mut words = line.split_whitespace();
  let name = words.next().ok_or_else(|| eyre!("Empty command"))?;
  let cmd = find(name).ok_or_else(|| eyre!("Unknown command: {}", name))?;
  let args: Vec<&str> = words.collect();

  let action = match cmd.name {
    "first" => CommandAction::First,
    "last" => CommandAction::Last,
    "next" => CommandAction::Next,
    "prev" => CommandAction::Prev,
    "refresh" => CommandAction::Refresh,
    "quit" => CommandAction::Quit,
    "page" => {
      let number = args
        .first()
        .and_then(|n| n.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .ok_or_else(|| eyre!("Usage: page N (N starts at 1)"))?;
      CommandAction::Page(number - 1)
    }
    "set" => {
      let usage = || eyre!("Usage: set {}", cmd.usage);
      let (filter_key, filter_value) = args
        .first()
        .and_then(|a| split_assignment(a))
        .ok_or_else(usage)?;
      let (update_key, update_value) = args
        .get(1)
        .and_then(|a| split_assignment(a))
        .ok_or_else(usage)?;
      CommandAction::Set {
        filter_key,
        filter_value,
        update_key,
        update_value,
      }
    }
    other => return Err(eyre!("Unknown command: {}", other)),
  };

  if !matches!(action, CommandAction::Set { .. } | CommandAction::Page(_)) && !args.is_empty() {
    return Err(eyre!("{} takes no arguments", cmd.name));
  }
  Ok(action)
}

fn split_assignment(arg: &str) -> Option<(String, Value)> {
  let (key, raw) = arg.split_once('=')?;
  if key.is_empty() {
    return None;
  }
  Some((key.to_string(), parse_value(raw)))
}

/// JSON literals (`42`, `true`, `null`, `"quoted"`) keep their type; anything else is a string
fn parse_value(raw: &str) -> Value {
  serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
