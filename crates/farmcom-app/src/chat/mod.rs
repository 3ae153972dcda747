//! Line-oriented terminal chat loop.

mod command;
mod render;

use std::io::{self, Write};
use std::sync::Arc;

use farmcom_ai::{TranscriptController, TranscriptEvent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;

use command::{Command, HELP};
use render::{write_transcript, write_usage, TranscriptPrinter};

/// Read lines from stdin until `/quit` or EOF, submitting each message and
/// printing the reply as it streams.
pub async fn run(
    controller: Arc<TranscriptController>,
    mut events: UnboundedReceiver<TranscriptEvent>,
) -> io::Result<()> {
    let mut printer = TranscriptPrinter::default();
    let mut stdout = io::stdout();
    drain(&mut events, &mut printer, &mut stdout)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        write!(stdout, "you> ")?;
        stdout.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(stdout)?;
            break;
        };

        match Command::parse(&line) {
            Command::Quit => break,
            Command::Help => writeln!(stdout, "{HELP}")?,
            Command::Transcript => write_transcript(&mut stdout, &controller.transcript())?,
            Command::Usage => match controller.session() {
                Some(session) => write_usage(&mut stdout, &session.usage())?,
                None => writeln!(stdout, "no session")?,
            },
            Command::Unknown(name) => writeln!(stdout, "unknown command {name}, try /help")?,
            Command::Message(text) => {
                let submit = controller.submit(&text);
                tokio::pin!(submit);
                loop {
                    tokio::select! {
                        () = &mut submit => break,
                        Some(event) = events.recv() => printer.apply(&mut stdout, &event)?,
                    }
                }
                drain(&mut events, &mut printer, &mut stdout)?;

                if let Some(error) = controller.last_error() {
                    eprintln!("[error] {error}");
                    controller.dismiss_error();
                }
            }
        }
    }
    Ok(())
}

/// Print events that are already queued.
fn drain<W: Write>(
    events: &mut UnboundedReceiver<TranscriptEvent>,
    printer: &mut TranscriptPrinter,
    out: &mut W,
) -> io::Result<()> {
    while let Ok(event) = events.try_recv() {
        printer.apply(out, &event)?;
    }
    Ok(())
}
