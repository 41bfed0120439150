use std::io::{self, BufWriter};

use anyhow::{Context, Result};

use crate::cli::ShowArgs;
use crate::commands::load_corpus;
use crate::commands::render::{EntryView, write_entry_text};
use crate::raw_input::RawInputInterpreter;
use crate::session::SessionController;
use crate::util::write_json_pretty;

pub fn run(args: ShowArgs) -> Result<()> {
    let (corpus, _) = load_corpus(&args.source.corpus)?;
    let interpreter = RawInputInterpreter::new()?;

    let mut session = SessionController::new(&corpus, &args.source.data_dir);
    session.jump_to(&args.request)?;
    if let Some(section) = &args.section {
        session
            .select_section(section)
            .with_context(|| format!("cannot show section '{section}'"))?;
    }

    let view = EntryView::build(&session, &interpreter);
    let mut output = BufWriter::new(io::stdout().lock());
    if args.json {
        write_json_pretty(&mut output, &view)
    } else {
        write_entry_text(&mut output, &view)
    }
}
