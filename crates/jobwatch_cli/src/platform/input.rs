//! Line commands typed on stdin.

use jobwatch_core::{ArchiveCategory, Msg};

pub(crate) const HELP: &str = "\
commands:
  tab <rename|index|scan|error>   switch archive tab
  more                             load the next archive page
  range <start|-> <end|->          filter archive by date (YYYY-MM-DD)
  scan [YYYY-MM-DD]                scan documents newer than a date
  index [YYYY-MM-DD]               index documents older than a date
  process <id,id,...>              process specific documents
  clear-errors                     delete the error archive
  dismiss <notice id>              hide a notice
  help                             show this text
  quit                             exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Tab(ArchiveCategory),
    More,
    Range {
        start_date: Option<String>,
        end_date: Option<String>,
    },
    Scan(Option<String>),
    Index(Option<String>),
    Process(String),
    ClearErrors,
    Dismiss(u64),
    Help,
    Quit,
}

impl Command {
    /// `None` for commands handled outside the state machine.
    pub(crate) fn into_msg(self, active_tab: ArchiveCategory) -> Option<Msg> {
        match self {
            Command::Tab(category) => Some(Msg::TabActivated(category)),
            Command::More => Some(Msg::SentinelVisible(active_tab)),
            Command::Range {
                start_date,
                end_date,
            } => Some(Msg::DateRangeChanged {
                start_date,
                end_date,
            }),
            Command::Scan(newer_than) => Some(Msg::ScanRequested { newer_than }),
            Command::Index(older_than) => Some(Msg::IndexRequested { older_than }),
            Command::Process(raw) => Some(Msg::ProcessRequested(raw)),
            Command::ClearErrors => Some(Msg::ClearErrorsRequested),
            Command::Dismiss(id) => Some(Msg::NoticeDismissed(id)),
            Command::Quit => Some(Msg::Unmounted),
            Command::Help => None,
        }
    }
}

/// `Ok(None)` for a blank line.
pub(crate) fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word {
        "" => return Ok(None),
        "tab" => Command::Tab(rest.parse()?),
        "more" => Command::More,
        "range" => {
            let mut bounds = rest.split_whitespace().map(optional_date);
            let start_date = bounds.next().flatten();
            let end_date = bounds.next().flatten();
            if bounds.next().is_some() {
                return Err("range takes at most two dates".to_string());
            }
            Command::Range {
                start_date,
                end_date,
            }
        }
        "scan" => Command::Scan(optional_date(rest)),
        "index" => Command::Index(optional_date(rest)),
        "process" => Command::Process(rest.to_string()),
        "clear-errors" => Command::ClearErrors,
        "dismiss" => Command::Dismiss(
            rest.parse()
                .map_err(|_| format!("'{rest}' is not a notice id"))?,
        ),
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(Some(command))
}

fn optional_date(raw: &str) -> Option<String> {
    match raw.trim() {
        "" | "-" => None,
        value => Some(value.to_string()),
    }
}
