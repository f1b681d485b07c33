//! Session behaviour under host signals, on paused time

use std::sync::Arc;
use std::time::Duration;

use roadmap_layout::LayoutConfig;
use roadmap_live::{HtmlDocument, Notification, RoadmapSession, Signal};
use roadmap_parser::{DocumentRegion, ParseOptions};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::{broadcast, mpsc};

const HEADER: &str = "<tr><th>Swimlane</th><th>Title</th><th>Status</th><th>Start date</th><th>End date</th></tr>";

fn table(rows: &[(&str, &str, &str, &str)]) -> String {
    let body: String = rows
        .iter()
        .map(|(lane, title, start, end)| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>green</td><td>{}</td><td>{}</td></tr>",
                lane, title, start, end
            )
        })
        .collect();
    format!("<table><tbody>{}{}</tbody></table>", HEADER, body)
}

fn session(provider: HtmlDocument) -> RoadmapSession<HtmlDocument> {
    RoadmapSession::new(provider, ParseOptions::default(), LayoutConfig::default(), 1000.0)
}

fn drain(rx: &mut broadcast::Receiver<Notification>) -> Vec<Notification> {
    let mut seen = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(n) => seen.push(n),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => return seen,
        }
    }
}

// =============================================================================
// Immediate refresh
// =============================================================================

#[tokio::test(start_paused = true)]
async fn refresh_parses_and_renders() {
    let provider = HtmlDocument::new(table(&[("Backend", "Build API", "2024-01-01", "2024-03-01")]));
    let session = session(provider);
    let mut rx = session.subscribe();

    session.refresh().await;

    assert_eq!(drain(&mut rx), vec![Notification::Redrawn]);
    let svg = session.svg().await.unwrap();
    assert!(svg.contains("Backend"));
    assert!(svg.contains("Build API"));
    assert_eq!(session.swimlanes().await.len(), 1);
    assert!(session.issues().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn row_problems_are_kept_as_issues() {
    let provider = HtmlDocument::new(table(&[
        ("Backend", "Build API", "2024-01-01", "2024-03-01"),
        ("Backend", "", "2024-01-01", "2024-03-01"),
    ]));
    let session = session(provider);

    session.refresh().await;

    let issues = session.issues().await;
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].issue.row, Some(1));
    assert!(session.svg().await.is_some());
}

#[tokio::test(start_paused = true)]
async fn empty_document_reports_render_failure() {
    let session = session(HtmlDocument::new("<p>No tables here</p>"));
    let mut rx = session.subscribe();

    session.refresh().await;

    match drain(&mut rx).as_slice() {
        [Notification::RenderFailed(message)] => assert!(message.contains("No events")),
        other => panic!("expected a render failure, got {:?}", other),
    }
    assert_eq!(session.svg().await, None);
}

// =============================================================================
// Debounced signals
// =============================================================================

#[tokio::test(start_paused = true)]
async fn table_updates_are_debounced_into_one_reparse() {
    let provider = HtmlDocument::new(table(&[("Backend", "Build API", "2024-01-01", "2024-03-01")]));
    let session = session(provider.clone());
    session.refresh().await;
    let mut rx = session.subscribe();

    provider.set(table(&[
        ("Backend", "Build API", "2024-01-01", "2024-03-01"),
        ("Frontend", "Wireframes", "2024-01-01", "2024-02-01"),
    ]));
    for _ in 0..4 {
        session.handle(Signal::TableUpdated).await;
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    // Still inside the quiet period of the last update
    assert!(drain(&mut rx).is_empty());

    // 500 ms re-parse plus 300 ms re-render
    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(drain(&mut rx), vec![Notification::Redrawn]);
    assert!(session.svg().await.unwrap().contains("Frontend"));
}

#[tokio::test(start_paused = true)]
async fn resize_burst_renders_once_at_final_width() {
    let provider = HtmlDocument::new(table(&[("Backend", "Build API", "2024-01-01", "2024-03-01")]));
    let session = session(provider);
    session.refresh().await;
    let mut rx = session.subscribe();

    for width in [900.0, 800.0, 700.0] {
        session.handle(Signal::Resized(width)).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    session.handle(Signal::SidebarToggled).await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(drain(&mut rx), vec![Notification::Redrawn]);
    assert!(session.svg().await.unwrap().contains("width=\"700\""));
}

#[tokio::test(start_paused = true)]
async fn run_consumes_signal_channel() {
    let provider = HtmlDocument::new(table(&[("Ops", "Audit", "2024-01-01", "2024-02-01")]));
    let session = Arc::new(session(provider));
    let mut rx = session.subscribe();

    let (signals, receiver) = mpsc::channel(8);
    let runner = Arc::clone(&session);
    let task = tokio::spawn(async move { runner.run(receiver).await });

    signals.send(Signal::TableUpdated).await.unwrap();
    let notification = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(notification, Notification::Redrawn);

    drop(signals);
    task.await.unwrap();
}

// =============================================================================
// Superseded waits
// =============================================================================

#[tokio::test(start_paused = true)]
async fn newer_update_supersedes_a_waiting_reparse() {
    // The table starts empty, so the first re-parse waits for rows
    let (region, populators) = DocumentRegion::from_html_live("<table></table>").unwrap();
    let session = RoadmapSession::new(region, ParseOptions::default(), LayoutConfig::default(), 1000.0);
    let mut rx = session.subscribe();

    session.handle(Signal::TableUpdated).await;
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(drain(&mut rx).is_empty());

    populators[0]
        .append_rows(&format!(
            "{}<tr><td>Ops</td><td>Audit</td><td>green</td><td>2024-01-01</td><td>2024-02-01</td></tr>",
            HEADER
        ))
        .unwrap();
    session.handle(Signal::TableUpdated).await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(drain(&mut rx), vec![Notification::Redrawn]);
    assert_eq!(session.swimlanes().await[0].name, "Ops");
}
