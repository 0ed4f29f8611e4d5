/// Available commands and autocomplete logic

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "products",
    aliases: &["p", "product"],
    description: "Browse and edit products",
  },
  Command {
    name: "categories",
    aliases: &["c", "category"],
    description: "Manage categories",
  },
  Command {
    name: "viruses",
    aliases: &["v", "virus"],
    description: "Manage target viruses",
  },
  Command {
    name: "orders",
    aliases: &["o", "order"],
    description: "Review orders and update status",
  },
  Command {
    name: "dashboard",
    aliases: &["d", "stats", "home"],
    description: "Catalog overview",
  },
  Command {
    name: "cart",
    aliases: &["w", "whatsapp", "checkout"],
    description: "WhatsApp checkout cart",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    description: "Exit raythu-admin",
  },
];

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.trim().to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    if cmd.name == input_lower {
      matches.push((cmd, 0));
      continue;
    }

    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
      continue;
    }

    if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((cmd, 5));
    }
  }

  // Stable sort keeps table order within a priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), COMMANDS.len());
  }

  #[test]
  fn test_exact_match() {
    let suggestions = get_suggestions("viruses");
    assert_eq!(suggestions[0].name, "viruses");
  }

  #[test]
  fn test_alias_match() {
    assert_eq!(get_suggestions("o")[0].name, "orders");
    assert_eq!(get_suggestions("whatsapp")[0].name, "cart");
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("cat");
    assert_eq!(suggestions[0].name, "categories");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("board");
    assert_eq!(suggestions[0].name, "dashboard");
  }

  #[test]
  fn test_no_match() {
    assert!(get_suggestions("zzz").is_empty());
  }
}
