//! Parsing of terminal input lines.

/// One line of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text sent as a visitor message.
    Send(String),
    /// Click a quick-reply button by label or by its 1-based number on the last message.
    Click(String),
    /// Replace the user message at `index` and resend it.
    Edit { index: usize, text: String },
    /// Start a fresh conversation.
    Reset,
    /// Print the transcript as plain text.
    Export,
    /// Feed the page snapshot through the section detector again.
    Scroll,
    /// Simulate the tab being hidden (`false`) or shown (`true`).
    Tab(bool),
    /// Print the widget status.
    Status,
    Help,
    Quit,
}

/// Parse error shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(pub String);

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub const HELP: &str = "\
Commands:
  /click <label|n>     click a quick-reply button
  /edit <n> <text>     edit user message n and resend
  /reset               clear the conversation and start over
  /export              print the transcript
  /scroll              re-read the page snapshot
  /hide, /show         simulate tab visibility changes
  /status              show scheduler and timer state
  /quit                exit
Anything else is sent as a message.";

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(Command::Send(line.to_string())));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let command = match name.to_lowercase().as_str() {
        "click" if !arg.is_empty() => Command::Click(arg.to_string()),
        "click" => return Err(ParseError("usage: /click <label|n>".to_string())),
        "edit" => parse_edit(arg)?,
        "reset" => Command::Reset,
        "export" => Command::Export,
        "scroll" => Command::Scroll,
        "hide" => Command::Tab(false),
        "show" => Command::Tab(true),
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(ParseError(format!("unknown command: /{}", other))),
    };

    Ok(Some(command))
}

fn parse_edit(arg: &str) -> Result<Command, ParseError> {
    let usage = || ParseError("usage: /edit <n> <text>".to_string());

    let (index, text) = arg.split_once(char::is_whitespace).ok_or_else(usage)?;
    let index = index.parse::<usize>().map_err(|_| usage())?;
    let text = text.trim();
    if text.is_empty() {
        return Err(usage());
    }

    Ok(Command::Edit {
        index,
        text: text.to_string(),
    })
}
