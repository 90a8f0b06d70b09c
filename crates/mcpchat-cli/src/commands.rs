//! Slash commands typed at the prompt

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Empty,
    Help,
    Quit,
    Tools,
    History,
    /// Spawn a stdio MCP server and register its tools
    Connect {
        name: String,
        command: String,
        args: Vec<String>,
    },
    Disconnect {
        name: String,
    },
    /// Offer a tool to the model again
    Enable {
        tool: String,
    },
    /// Stop offering a tool to the model
    Disable {
        tool: String,
    },
    /// Anything that is not a command goes to the model
    Message(String),
}

pub const USAGE: &str = "\
Commands:
  /tools                              list connected tools
  /connect <name> <command> [args...] start an MCP server over stdio
  /disconnect <name>                  remove a provider and its tools
  /enable <tool>                      offer a tool to the model
  /disable <tool>                     stop offering a tool to the model
  /history                            show the conversation so far
  /help                               show this help
  /quit                               exit";

/// Parse one input line; errors are usage messages
pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Empty);
    }
    if !line.starts_with('/') {
        return Ok(Command::Message(line.to_string()));
    }

    let mut words = line.split_whitespace();
    let head = words.next().unwrap_or_default();
    let rest: Vec<String> = words.map(str::to_string).collect();

    match (head, rest.as_slice()) {
        ("/quit" | "/exit", []) => Ok(Command::Quit),
        ("/help", []) => Ok(Command::Help),
        ("/tools", []) => Ok(Command::Tools),
        ("/history", []) => Ok(Command::History),
        ("/connect", [name, command, args @ ..]) => Ok(Command::Connect {
            name: name.clone(),
            command: command.clone(),
            args: args.to_vec(),
        }),
        ("/connect", _) => Err("Usage: /connect <name> <command> [args...]".to_string()),
        ("/disconnect", [name]) => Ok(Command::Disconnect { name: name.clone() }),
        ("/disconnect", _) => Err("Usage: /disconnect <name>".to_string()),
        ("/enable", [tool]) => Ok(Command::Enable { tool: tool.clone() }),
        ("/enable", _) => Err("Usage: /enable <tool>".to_string()),
        ("/disable", [tool]) => Ok(Command::Disable { tool: tool.clone() }),
        ("/disable", _) => Err("Usage: /disable <tool>".to_string()),
        (other, _) => Err(format!("Unknown command {}\n\n{}", other, USAGE)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_a_message() {
        assert_eq!(
            parse("  which tables hold orders?  ").unwrap(),
            Command::Message("which tables hold orders?".into())
        );
        assert_eq!(parse("   ").unwrap(), Command::Empty);
    }

    #[test]
    fn test_connect() {
        assert_eq!(
            parse("/connect openmetadata python -m mcp_modules.openmetadata.src").unwrap(),
            Command::Connect {
                name: "openmetadata".into(),
                command: "python".into(),
                args: vec!["-m".into(), "mcp_modules.openmetadata.src".into()],
            }
        );
        assert!(parse("/connect openmetadata").is_err());
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse("/quit").unwrap(), Command::Quit);
        assert_eq!(parse("/exit").unwrap(), Command::Quit);
        assert_eq!(parse("/tools").unwrap(), Command::Tools);
        assert_eq!(parse("/history").unwrap(), Command::History);
        assert_eq!(
            parse("/disconnect postgres").unwrap(),
            Command::Disconnect { name: "postgres".into() }
        );
        assert!(parse("/disconnect").is_err());
        assert_eq!(
            parse("/disable execute_postgres_query").unwrap(),
            Command::Disable { tool: "execute_postgres_query".into() }
        );
        assert_eq!(
            parse("/enable get_om_table").unwrap(),
            Command::Enable { tool: "get_om_table".into() }
        );
        assert_eq!(parse("/enable").unwrap_err(), "Usage: /enable <tool>");
    }

    #[test]
    fn test_unknown_command_shows_usage() {
        let err = parse("/drop").unwrap_err();
        assert!(err.starts_with("Unknown command /drop"));
        assert!(err.contains("/connect"));
    }
}
