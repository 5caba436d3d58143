//! ConsoleActor - The only writer of program output
//!
//! Alerts from the historian and report lines requested by users arrive from
//! many tasks at once. Everything is funnelled through this actor so a group
//! of lines is always written in one piece.

use anyhow::{Context as _, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, instrument, trace, warn};

use crate::alerts::AlertEvent;

use super::{historian::HistorianHandle, messages::ConsoleCommand};

/// Separator printed after raw probe output in verbose mode
const RAW_SEPARATOR: &str = "    ↳----------↴";

pub struct ConsoleActor<W> {
    writer: W,

    command_rx: mpsc::Receiver<ConsoleCommand>,

    /// Alert stream subscription
    alert_rx: broadcast::Receiver<AlertEvent>,

    /// Print the raw probe output in front of every alert
    verbose: bool,
}

impl<W> ConsoleActor<W>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(
        writer: W,
        command_rx: mpsc::Receiver<ConsoleCommand>,
        alert_rx: broadcast::Receiver<AlertEvent>,
        verbose: bool,
    ) -> Self {
        Self {
            writer,
            command_rx,
            alert_rx,
            verbose,
        }
    }

    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!("starting console actor");
        let mut alerts_open = true;

        loop {
            tokio::select! {
                result = self.alert_rx.recv(), if alerts_open => {
                    match result {
                        Ok(event) => self.print_alert(event).await,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("console lagged, skipped {skipped} alerts");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            trace!("alert channel closed");
                            alerts_open = false;
                        }
                    }
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        ConsoleCommand::Print { lines } => self.write_lines(&lines).await,

                        ConsoleCommand::Flush { respond_to } => {
                            if let Err(e) = self.writer.flush().await {
                                error!("failed to flush output: {e}");
                            }
                            let _ = respond_to.send(());
                        }

                        ConsoleCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }

                else => {
                    warn!("command channel closed, shutting down");
                    break;
                }
            }
        }

        let _ = self.writer.flush().await;
        debug!("console actor stopped");
    }

    async fn print_alert(&mut self, event: AlertEvent) {
        if self.verbose && !event.raw.is_empty() {
            let raw = format!("\n{}\n{RAW_SEPARATOR}", event.raw.trim_end());
            self.write_lines(&[raw]).await;
        }

        self.write_lines(&event.lines).await;
    }

    async fn write_lines(&mut self, lines: &[String]) {
        let mut block = String::new();
        for line in lines {
            block.push_str(line);
            block.push('\n');
        }

        if let Err(e) = self.writer.write_all(block.as_bytes()).await {
            error!("failed to write output: {e}");
            return;
        }

        if let Err(e) = self.writer.flush().await {
            error!("failed to flush output: {e}");
        }
    }
}

/// Handle for sending output to the ConsoleActor
#[derive(Clone)]
pub struct ConsoleHandle {
    sender: mpsc::Sender<ConsoleCommand>,
}

impl ConsoleHandle {
    /// Spawn a console writing to `writer`
    pub fn spawn<W>(writer: W, alert_rx: broadcast::Receiver<AlertEvent>, verbose: bool) -> Self
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel(64);

        let actor = ConsoleActor::new(writer, cmd_rx, alert_rx, verbose);

        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Print a group of lines as one block
    pub async fn print(&self, lines: Vec<String>) -> Result<()> {
        self.sender
            .send(ConsoleCommand::Print { lines })
            .await
            .context("failed to send Print command")
    }

    /// Wait until everything queued so far is written
    pub async fn flush(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ConsoleCommand::Flush { respond_to: tx })
            .await
            .context("failed to send Flush command")?;

        rx.await.context("failed to receive flush confirmation")
    }

    /// Shutdown the console actor
    pub async fn shutdown(&self) {
        let _ = self.sender.send(ConsoleCommand::Shutdown).await;
    }
}

fn help_lines() -> Vec<String> {
    vec![
        "ENTER      summary of every target".to_string(),
        "<target>  drill-down for one target".to_string(),
        "help       this list".to_string(),
    ]
}

/// Interactive command surface
///
/// Reads commands line by line until `reader` is exhausted: an empty line
/// prints the full report, a configured target name prints its drill-down.
pub async fn serve_commands<R>(
    reader: R,
    targets: &[String],
    historian: &HistorianHandle,
    console: &ConsoleHandle,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await.context("failed to read command")? {
        let input = line.trim();
        trace!("command: {input:?}");

        let output = match input {
            "" => historian.report().await?,
            "help" => help_lines(),
            target if targets.iter().any(|t| t == target) => historian.drill(target).await?,
            other => vec![format!(
                "unknown command or target {other:?}, press ENTER for a summary or type help"
            )],
        };

        console.print(output).await?;
    }

    debug!("command input closed");
    Ok(())
}
