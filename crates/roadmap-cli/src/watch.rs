//! `roadmap watch`: keep an SVG in sync with an HTML file

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use roadmap_live::{DocumentProvider, Notification, RoadmapSession, Signal};
use roadmap_parser::{DocumentRegion, ParseError};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};

use crate::Settings;

/// Document read from disk on every re-parse
#[derive(Clone, Debug)]
pub struct FileDocument {
    path: PathBuf,
}

impl FileDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DocumentProvider for FileDocument {
    fn document(&self) -> Result<DocumentRegion, ParseError> {
        let html = std::fs::read_to_string(&self.path)?;
        Ok(DocumentRegion::from_html(&html)?)
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Send a table update whenever the file's modification time moves
async fn poll_changes(path: PathBuf, interval: Duration, signals: mpsc::Sender<Signal>) {
    let mut last = modified(&path);
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let current = modified(&path);
        if current != last {
            last = current;
            tracing::debug!("{} changed", path.display());
            if signals.send(Signal::TableUpdated).await.is_err() {
                break;
            }
        }
    }
}

async fn write_redraws<P: DocumentProvider>(
    session: &RoadmapSession<P>,
    redraws: &mut broadcast::Receiver<Notification>,
    output: &Path,
) -> Result<()> {
    loop {
        match redraws.recv().await {
            Ok(Notification::Redrawn) => {
                if let Some(svg) = session.svg().await {
                    tokio::fs::write(output, svg)
                        .await
                        .with_context(|| format!("Failed to write {}", output.display()))?;
                    tracing::info!("wrote {}", output.display());
                }
            }
            Ok(Notification::RenderFailed(message)) => {
                tracing::error!("render failed, keeping previous output: {}", message);
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "redraw notifications lagged");
            }
            Err(RecvError::Closed) => return Ok(()),
        }
    }
}

pub async fn watch(file: &Path, output: &Path, settings: Settings, interval: Duration) -> Result<()> {
    let session = RoadmapSession::new(
        FileDocument::new(file),
        settings.options,
        settings.layout,
        settings.width,
    );
    let mut redraws = session.subscribe();
    session.refresh().await;

    let (signals, rx) = mpsc::channel(16);
    tokio::spawn(poll_changes(file.to_path_buf(), interval, signals));
    tracing::info!("watching {}", file.display());

    tokio::select! {
        () = session.run(rx) => Ok(()),
        result = write_redraws(&session, &mut redraws, output) => result,
    }
}
