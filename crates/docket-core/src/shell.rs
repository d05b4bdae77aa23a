use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::commands::{Outcome, Session};
use crate::config::Config;
use crate::due::DueNotice;
use crate::reminder::{Clock, DueWatcher, SystemClock};
use crate::render::Renderer;
use crate::store::TaskStore;
use crate::view::ViewContext;

/// Builds a session from `cfg` and serves commands from stdin until EOF or
/// `quit`. Due notices are printed as they arrive between commands.
#[tracing::instrument(skip(cfg))]
pub async fn run_shell(cfg: Config, reminders: bool) -> anyhow::Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = TaskStore::new(cfg.id_source()?);
    let ctx = ViewContext {
        sort_by: cfg.default_sort()?,
        show_completed: cfg.default_show_completed()?,
        ..ViewContext::default()
    };
    let mut session = Session::new(
        store,
        ctx,
        Renderer::new(cfg.color()?),
        cfg.default_priority()?,
        Arc::clone(&clock),
    );

    let (notice_tx, notice_rx) = mpsc::unbounded_channel();
    let watcher = if reminders && cfg.reminders_enabled()? {
        Some(DueWatcher::spawn(
            session.store().subscribe(),
            clock,
            cfg.reminder_interval()?,
            notice_tx,
        ))
    } else {
        info!("due reminders disabled");
        drop(notice_tx);
        None
    };

    let interactive = io::stdin().is_terminal();
    serve(
        &mut session,
        BufReader::new(tokio::io::stdin()),
        &mut io::stdout(),
        notice_rx,
        watcher,
        interactive,
    )
    .await?;

    info!("shell finished");
    Ok(())
}

/// Reads command lines from `input` and writes their output to `out`,
/// interleaving notices from `notices` as they arrive. Returns on EOF or
/// `quit`, after stopping `watcher`.
pub async fn serve<R, W>(
    session: &mut Session,
    input: R,
    out: &mut W,
    mut notices: mpsc::UnboundedReceiver<DueNotice>,
    watcher: Option<DueWatcher>,
    interactive: bool,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    prompt(out, interactive)?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read command")? else {
                    debug!("input closed");
                    break;
                };

                match session.execute(&line, out) {
                    Ok(Outcome::Quit) => break,
                    Ok(Outcome::Continue) => {}
                    Err(err) => writeln!(out, "error: {err:#}")?,
                }
                prompt(out, interactive)?;
            }
            Some(notice) = notices.recv() => {
                session.renderer().write_notice(out, &notice)?;
                prompt(out, interactive)?;
            }
        }
    }
    out.flush()?;

    if let Some(watcher) = watcher {
        watcher.stop().await;
    }
    Ok(())
}

fn prompt<W: Write>(out: &mut W, interactive: bool) -> anyhow::Result<()> {
    if interactive {
        write!(out, "docket> ")?;
    }
    out.flush()?;
    Ok(())
}
