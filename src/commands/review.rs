use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use crate::cli::ReviewArgs;
use crate::commands::export::{default_export_path, export_store};
use crate::commands::load_corpus;
use crate::commands::render::{EntryView, write_entry_text};
use crate::error::SessionError;
use crate::model::Rating;
use crate::raw_input::RawInputInterpreter;
use crate::session::SessionController;
use crate::store::UpsertOutcome;


const HELP: &str = "\
commands:
  next | n                  go to the next request
  prev | p                  go to the previous request
  goto <request_id>         jump to a request
  section <name>            choose the output to evaluate
  rate <rating> [comment]   save correct | incorrect | ambiguous (c | i | a)
  show                      print the current entry again
  user <id>                 switch user
  export [path]             write your evaluations as csv
  reset                     delete all of your evaluations (asks to confirm)
  help                      show this list
  quit | q                  leave the session";

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReviewCommand {
    Next,
    Previous,
    Goto(String),
    Section(String),
    Rate { rating: Rating, comment: String },
    Show,
    User(String),
    Export(Option<PathBuf>),
    Reset,
    Confirm,
    Help,
    Quit,
}

pub fn run(args: ReviewArgs) -> Result<()> {
    let (corpus, _) = load_corpus(&args.source.corpus)?;
    let interpreter = RawInputInterpreter::new()?;
    let mut session = SessionController::new(&corpus, &args.source.data_dir);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    run_session(
        &mut session,
        &interpreter,
        args.user.as_deref(),
        stdin.lock(),
        &mut stdout,
    )
}

pub fn run_session<R: BufRead, W: Write>(
    session: &mut SessionController<'_>,
    interpreter: &RawInputInterpreter,
    initial_user: Option<&str>,
    mut input: R,
    output: &mut W,
) -> Result<()> {
    let mut candidate = initial_user.map(ToOwned::to_owned);
    loop {
        let user_id = match candidate.take() {
            Some(user_id) => user_id,
            None => {
                write!(output, "user> ")?;
                output.flush()?;
                match read_line(&mut input)? {
                    Some(line) => line,
                    None => return Ok(()),
                }
            }
        };
        if login(session, &user_id, output)? {
            break;
        }
    }
    render_current(session, interpreter, output)?;

    let mut reset_armed = false;
    loop {
        write!(output, "> ")?;
        output.flush()?;
        let Some(line) = read_line(&mut input)? else {
            break;
        };

        let confirm_allowed = std::mem::take(&mut reset_armed);
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                writeln!(output, "error: {message}")?;
                continue;
            }
        };

        match command {
            ReviewCommand::Next => {
                session.next();
                render_current(session, interpreter, output)?;
            }
            ReviewCommand::Previous => {
                session.previous();
                render_current(session, interpreter, output)?;
            }
            ReviewCommand::Goto(request_id) => match session.jump_to(&request_id) {
                Ok(()) => render_current(session, interpreter, output)?,
                Err(err) => report(output, &err)?,
            },
            ReviewCommand::Section(name) => match session.select_section(&name) {
                Ok(()) => render_current(session, interpreter, output)?,
                Err(err) => report(output, &err)?,
            },
            ReviewCommand::Rate { rating, comment } => match session.save(rating, &comment) {
                Ok(outcome) => {
                    let action = match outcome {
                        UpsertOutcome::Inserted { .. } => "saved",
                        UpsertOutcome::Replaced { .. } => "updated",
                    };
                    writeln!(
                        output,
                        "{action} evaluation for `{}` -> `{}`: {rating}",
                        session.current_request().request_id,
                        session.current_section()
                    )?;
                }
                Err(err) => {
                    write!(output, "evaluation NOT saved, ")?;
                    report(output, &err)?;
                }
            },
            ReviewCommand::Show => render_current(session, interpreter, output)?,
            ReviewCommand::User(user_id) => {
                if login(session, &user_id, output)? {
                    render_current(session, interpreter, output)?;
                }
            }
            ReviewCommand::Export(path) => {
                let Some(store) = session.store() else {
                    report(output, &SessionError::NoActiveUser)?;
                    continue;
                };
                let path = path.unwrap_or_else(|| default_export_path(store.user_id()));
                match export_store(store, &path) {
                    Ok(()) => writeln!(
                        output,
                        "exported {} evaluations to {}",
                        store.records().len(),
                        path.display()
                    )?,
                    Err(err) => writeln!(output, "error: {err:#}")?,
                }
            }
            ReviewCommand::Reset => {
                let count = session.store().map_or(0, |store| store.records().len());
                writeln!(
                    output,
                    "this deletes all {count} evaluations for {}; type `confirm` to proceed",
                    session.user_id().unwrap_or_default()
                )?;
                reset_armed = true;
            }
            ReviewCommand::Confirm if confirm_allowed => match session.reset() {
                Ok(()) => writeln!(output, "all evaluations deleted")?,
                Err(err) => report(output, &err)?,
            },
            ReviewCommand::Confirm => writeln!(output, "nothing to confirm")?,
            ReviewCommand::Help => writeln!(output, "{HELP}")?,
            ReviewCommand::Quit => break,
        }
    }

    info!(user = %session.user_id().unwrap_or_default(), "review session ended");
    Ok(())
}

fn login<W: Write>(
    session: &mut SessionController<'_>,
    user_id: &str,
    output: &mut W,
) -> Result<bool> {
    let binding = match session.select_user(user_id) {
        Ok(binding) => binding,
        Err(SessionError::EmptyIdentity) => {
            writeln!(output, "enter a user name to continue")?;
            return Ok(false);
        }
        Err(err) => {
            report(output, &err)?;
            return Ok(false);
        }
    };

    if let Some(warning) = &binding.warning {
        write!(output, "warning: ")?;
        report_chain(output, warning)?;
        writeln!(output, "starting with an empty evaluation list")?;
    }
    if binding.changed {
        let saved = session.store().map_or(0, |store| store.records().len());
        let resume_note = if binding.resumed {
            ", resuming where you left off"
        } else {
            ""
        };
        writeln!(
            output,
            "logged in as {} ({saved} saved evaluations{resume_note})",
            session.user_id().unwrap_or_default()
        )?;
    }

    Ok(true)
}

fn render_current<W: Write>(
    session: &SessionController<'_>,
    interpreter: &RawInputInterpreter,
    output: &mut W,
) -> Result<()> {
    let view = EntryView::build(session, interpreter);
    write_entry_text(output, &view)
}

fn report<W: Write>(output: &mut W, err: &dyn Error) -> Result<()> {
    write!(output, "error: ")?;
    report_chain(output, err)
}

fn report_chain<W: Write>(output: &mut W, err: &dyn Error) -> Result<()> {
    write!(output, "{err}")?;
    let mut source = err.source();
    while let Some(cause) = source {
        write!(output, ": {cause}")?;
        source = cause.source();
    }
    writeln!(output)?;
    Ok(())
}

fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

fn parse_command(line: &str) -> Result<Option<ReviewCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let required = |what: &str| {
        if rest.is_empty() {
            Err(format!("`{verb}` needs {what}"))
        } else {
            Ok(rest.to_string())
        }
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "next" | "n" => ReviewCommand::Next,
        "prev" | "previous" | "p" => ReviewCommand::Previous,
        "goto" | "g" => ReviewCommand::Goto(required("a request id")?),
        "section" | "s" => ReviewCommand::Section(required("a section name")?),
        "rate" | "r" => {
            let (rating, comment) = match rest.split_once(char::is_whitespace) {
                Some((rating, comment)) => (rating, comment.trim()),
                None => (rest, ""),
            };
            if rating.is_empty() {
                return Err(format!("`{verb}` needs a rating"));
            }
            ReviewCommand::Rate {
                rating: rating.parse()?,
                comment: comment.to_string(),
            }
        }
        "show" => ReviewCommand::Show,
        "user" | "login" => ReviewCommand::User(required("a user name")?),
        "export" => ReviewCommand::Export((!rest.is_empty()).then(|| PathBuf::from(rest))),
        "reset" => ReviewCommand::Reset,
        "confirm" => ReviewCommand::Confirm,
        "help" | "?" => ReviewCommand::Help,
        "quit" | "q" | "exit" => ReviewCommand::Quit,
        other => return Err(format!("unknown command `{other}`, type `help`")),
    };

    Ok(Some(command))
}
