//! # roadmap-live
//!
//! Keeps a rendered roadmap in sync with a changing document.
//!
//! A [`RoadmapSession`] owns the parsed swimlanes and the latest SVG. Host
//! integrations feed it [`Signal`]s: table content updates trigger a
//! debounced re-parse, viewport changes a debounced re-render. Every
//! successful redraw is announced on a broadcast channel.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use roadmap_live::{HtmlDocument, Notification, RoadmapSession, Signal};
//! use roadmap_layout::LayoutConfig;
//! use roadmap_parser::ParseOptions;
//!
//! # async fn run() {
//! let provider = HtmlDocument::new("<table>...</table>");
//! let session = Arc::new(RoadmapSession::new(
//!     provider,
//!     ParseOptions::default(),
//!     LayoutConfig::default(),
//!     1200.0,
//! ));
//! let mut redraws = session.subscribe();
//!
//! let (signals, rx) = tokio::sync::mpsc::channel(16);
//! let runner = Arc::clone(&session);
//! tokio::spawn(async move { runner.run(rx).await });
//!
//! signals.send(Signal::TableUpdated).await.unwrap();
//! assert_eq!(redraws.recv().await.unwrap(), Notification::Redrawn);
//! # }
//! ```

pub mod debounce;

pub use debounce::Debouncer;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use roadmap_core::{RenderError, Swimlane, Timestamp};
use roadmap_layout::{LayoutConfig, TimelineLayout};
use roadmap_parser::{parse_with_report, DocumentRegion, ParseError, ParseOptions, TableIssue};
use roadmap_render::{Renderer, RoadmapTheme, SvgRoadmapRenderer};
use tokio::sync::{broadcast, mpsc, RwLock};

/// Quiet period before a table update is re-parsed
pub const REPARSE_DELAY: Duration = Duration::from_millis(500);

/// Quiet period before a viewport change is re-rendered
pub const RERENDER_DELAY: Duration = Duration::from_millis(300);

const NOTIFICATION_CAPACITY: usize = 16;

/// Host event the session reacts to
#[derive(Clone, Debug, PartialEq)]
pub enum Signal {
    /// Table content was injected or replaced
    TableUpdated,
    /// Chart width changed, in pixels
    Resized(f64),
    SidebarToggled,
}

/// Announcement sent to the host after a render attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    Redrawn,
    RenderFailed(String),
}

// ============================================================================
// Documents
// ============================================================================

/// Supplies the region of the page the tables live in
pub trait DocumentProvider: Send + Sync + 'static {
    fn document(&self) -> Result<DocumentRegion, ParseError>;
}

/// Provider over an HTML string that can be swapped at runtime
#[derive(Clone, Debug, Default)]
pub struct HtmlDocument {
    html: Arc<Mutex<String>>,
}

impl HtmlDocument {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: Arc::new(Mutex::new(html.into())),
        }
    }

    pub fn set(&self, html: impl Into<String>) {
        *self.html.lock().unwrap_or_else(PoisonError::into_inner) = html.into();
    }
}

impl DocumentProvider for HtmlDocument {
    fn document(&self) -> Result<DocumentRegion, ParseError> {
        let html = self.html.lock().unwrap_or_else(PoisonError::into_inner).clone();
        Ok(DocumentRegion::from_html(&html)?)
    }
}

impl DocumentProvider for DocumentRegion {
    fn document(&self) -> Result<DocumentRegion, ParseError> {
        Ok(self.clone())
    }
}

// ============================================================================
// Session
// ============================================================================

#[derive(Debug, Default)]
struct SessionState {
    swimlanes: Vec<Swimlane>,
    issues: Vec<TableIssue>,
    width: f64,
    svg: Option<String>,
}

struct Shared<P> {
    provider: P,
    options: ParseOptions,
    layout: LayoutConfig,
    renderer: SvgRoadmapRenderer,
    state: RwLock<SessionState>,
    notifications: broadcast::Sender<Notification>,
    rerender: Debouncer,
}

impl<P: DocumentProvider> Shared<P> {
    /// Parse the current document into the session state
    async fn reload(&self) -> bool {
        let region = match self.provider.document() {
            Ok(region) => region,
            Err(e) => {
                tracing::warn!("Failed to read document: {}", e);
                return false;
            }
        };

        let report = parse_with_report(&region, &self.options).await;
        for issue in &report.issues {
            tracing::warn!(
                table = issue.table,
                row = issue.issue.row,
                "Failed to parse table content: {}",
                issue.issue.title
            );
        }
        tracing::debug!(
            swimlanes = report.swimlanes.len(),
            events = report.event_count(),
            "reloaded roadmap"
        );

        let mut state = self.state.write().await;
        state.swimlanes = report.swimlanes;
        state.issues = report.issues;
        state.svg = None;
        true
    }

    /// Rebuild the layout from scratch and repaint the target
    async fn render(&self) {
        let result = {
            let state = self.state.read().await;
            TimelineLayout::with_config(self.layout.clone())
                .layout(&state.swimlanes, state.width, now())
                .map_err(RenderError::from)
                .and_then(|chart| self.renderer.render(&chart))
        };

        let notification = match result {
            Ok(svg) => {
                self.state.write().await.svg = Some(svg);
                Notification::Redrawn
            }
            Err(e) => {
                tracing::warn!("Failed to render roadmap: {}", e);
                Notification::RenderFailed(e.to_string())
            }
        };
        // Nobody listening is fine
        let _ = self.notifications.send(notification);
    }

    fn schedule_render(self: &Arc<Self>) {
        let shared = Arc::clone(self);
        self.rerender.schedule(async move { shared.render().await });
    }
}

fn now() -> Timestamp {
    chrono::Utc::now().timestamp_millis()
}

/// A live roadmap bound to one document.
///
/// Dropping the session cancels scheduled re-parses and re-renders.
pub struct RoadmapSession<P: DocumentProvider> {
    shared: Arc<Shared<P>>,
    reparse: Debouncer,
}

impl<P: DocumentProvider> RoadmapSession<P> {
    pub fn new(provider: P, options: ParseOptions, layout: LayoutConfig, width: f64) -> Self {
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                provider,
                options,
                layout,
                renderer: SvgRoadmapRenderer::new(),
                state: RwLock::new(SessionState {
                    width,
                    ..SessionState::default()
                }),
                notifications,
                rerender: Debouncer::new(RERENDER_DELAY),
            }),
            reparse: Debouncer::new(REPARSE_DELAY),
        }
    }

    /// Replace the chart theme before any signal is handled
    pub fn with_theme(mut self, theme: RoadmapTheme) -> Self {
        if let Some(shared) = Arc::get_mut(&mut self.shared) {
            shared.renderer = SvgRoadmapRenderer::new().theme(theme);
        }
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.shared.notifications.subscribe()
    }

    /// Latest rendered SVG; `None` until a render succeeded after the last parse
    pub async fn svg(&self) -> Option<String> {
        self.shared.state.read().await.svg.clone()
    }

    pub async fn swimlanes(&self) -> Vec<Swimlane> {
        self.shared.state.read().await.swimlanes.clone()
    }

    pub async fn issues(&self) -> Vec<TableIssue> {
        self.shared.state.read().await.issues.clone()
    }

    /// Parse and render right away, dropping anything scheduled
    pub async fn refresh(&self) {
        self.reparse.cancel();
        self.shared.rerender.cancel();
        if self.shared.reload().await {
            self.shared.render().await;
        }
    }

    /// React to one host signal
    pub async fn handle(&self, signal: Signal) {
        tracing::trace!(?signal, "signal");
        match signal {
            Signal::TableUpdated => {
                let shared = Arc::clone(&self.shared);
                self.reparse.schedule(async move {
                    if shared.reload().await {
                        shared.schedule_render();
                    }
                });
            }
            Signal::Resized(width) => {
                self.shared.state.write().await.width = width;
                self.shared.schedule_render();
            }
            Signal::SidebarToggled => self.shared.schedule_render(),
        }
    }

    /// Consume signals until every sender is gone
    pub async fn run(&self, mut signals: mpsc::Receiver<Signal>) {
        while let Some(signal) = signals.recv().await {
            self.handle(signal).await;
        }
        tracing::debug!("signal channel closed, session stopped");
    }
}

impl<P: DocumentProvider> Drop for RoadmapSession<P> {
    fn drop(&mut self) {
        self.reparse.cancel();
        self.shared.rerender.cancel();
    }
}
