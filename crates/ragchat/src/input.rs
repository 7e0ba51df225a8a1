use std::fmt::{self, Display};

use ragchat::core::transcript::Reaction;

/// One line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Empty,
    Question(String),
    NewChat,
    Clear,
    Copy(usize),
    React(usize, Reaction),
    Sources(usize),
    Ask(usize),
    Theme,
    Health,
    Stats,
    Config,
    Links,
    Api,
    Help,
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    UnknownCommand(String),
    MissingNumber(&'static str),
    BadNumber(String),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnknownCommand(name) => {
                write!(f, "unknown command `/{name}`, try /help")
            }
            ParseError::MissingNumber(name) => {
                write!(f, "usage: /{name} <message number>")
            }
            ParseError::BadNumber(arg) => {
                write!(f, "`{arg}` is not a valid number")
            }
        }
    }
}

pub const HELP: &str = "\
/new           start a new chat
/clear         clear the current chat
/copy N        copy message N to the clipboard
/like N        like message N
/dislike N     dislike message N
/sources N     show or hide the sources of message N
/ask N         ask suggested question N
/theme         switch between light and dark
/health        show backend health
/stats         show knowledge base statistics
/config        show backend configuration
/links         show links
/api           show the API endpoint in use
/help          show this help
/quit          exit";

pub fn parse(line: &str) -> Result<Input, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Input::Empty);
    }
    let Some(command) = line.strip_prefix('/') else {
        return Ok(Input::Question(line.to_owned()));
    };

    let mut words = command.split_whitespace();
    let name = words.next().unwrap_or_default();
    let arg = words.next();
    let input = match name {
        "new" => Input::NewChat,
        "clear" => Input::Clear,
        "copy" => Input::Copy(number("copy", arg)?),
        "like" => Input::React(number("like", arg)?, Reaction::Like),
        "dislike" => Input::React(number("dislike", arg)?, Reaction::Dislike),
        "sources" => Input::Sources(number("sources", arg)?),
        "ask" => Input::Ask(number("ask", arg)?),
        "theme" => Input::Theme,
        "health" => Input::Health,
        "stats" => Input::Stats,
        "config" => Input::Config,
        "links" => Input::Links,
        "api" => Input::Api,
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        _ => return Err(ParseError::UnknownCommand(name.to_owned())),
    };
    Ok(input)
}

/// Parses a 1-based number.
fn number(name: &'static str, arg: Option<&str>) -> Result<usize, ParseError> {
    let arg = arg.ok_or(ParseError::MissingNumber(name))?;
    match arg.parse() {
        Ok(0) | Err(_) => Err(ParseError::BadNumber(arg.to_owned())),
        Ok(n) => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_questions() {
        assert_eq!(parse("   "), Ok(Input::Empty));
        assert_eq!(
            parse("  What is the evidence for God?\n"),
            Ok(Input::Question("What is the evidence for God?".to_owned()))
        );
    }

    #[test]
    fn test_commands() {
        assert_eq!(parse("/new"), Ok(Input::NewChat));
        assert_eq!(parse("/copy 2"), Ok(Input::Copy(2)));
        assert_eq!(parse("/like 3"), Ok(Input::React(3, Reaction::Like)));
        assert_eq!(parse("/dislike 3"), Ok(Input::React(3, Reaction::Dislike)));
        assert_eq!(parse("/sources  4 "), Ok(Input::Sources(4)));
        assert_eq!(parse("/exit"), Ok(Input::Quit));
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            parse("/frobnicate"),
            Err(ParseError::UnknownCommand("frobnicate".to_owned()))
        );
        assert_eq!(parse("/copy"), Err(ParseError::MissingNumber("copy")));
        assert_eq!(parse("/ask 0"), Err(ParseError::BadNumber("0".to_owned())));
        assert_eq!(
            parse("/like two"),
            Err(ParseError::BadNumber("two".to_owned()))
        );
        assert_eq!(
            ParseError::MissingNumber("copy").to_string(),
            "usage: /copy <message number>"
        );
    }
}
