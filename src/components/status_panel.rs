// src/components/status_panel.rs
//! Scheduler controls and last-run statistics.

use std::fmt::Write as _;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::client::DynResearchApi;
use crate::fetch::{FetchFuture, Mutation};
use crate::format::{format_last_run, text};
use crate::models::{CollectionStats, ProcessingStats, SchedulerAck, SystemStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    StartScheduler,
    StopScheduler,
    CollectNow,
    ProcessNow,
}

impl ControlAction {
    pub const ALL: [ControlAction; 4] = [
        ControlAction::StartScheduler,
        ControlAction::StopScheduler,
        ControlAction::CollectNow,
        ControlAction::ProcessNow,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ControlAction::StartScheduler => "start_scheduler",
            ControlAction::StopScheduler => "stop_scheduler",
            ControlAction::CollectNow => "collect",
            ControlAction::ProcessNow => "process",
        }
    }

    /// Desk route the button posts to.
    pub fn route(self) -> &'static str {
        match self {
            ControlAction::StartScheduler => "/scheduler/start",
            ControlAction::StopScheduler => "/scheduler/stop",
            ControlAction::CollectNow => "/collect",
            ControlAction::ProcessNow => "/process",
        }
    }

    fn label(self) -> &'static str {
        match self {
            ControlAction::StartScheduler => "Start Scheduler",
            ControlAction::StopScheduler => "Stop Scheduler",
            ControlAction::CollectNow => "Collect Papers Now",
            ControlAction::ProcessNow => "Process Papers Now",
        }
    }

    fn class(self) -> &'static str {
        match self {
            ControlAction::StartScheduler => "success",
            ControlAction::StopScheduler => "danger",
            ControlAction::CollectNow => "primary",
            ControlAction::ProcessNow => "info",
        }
    }

    /// Start needs a stopped scheduler, stop a running one; nothing fires
    /// while another control is in flight.
    pub fn is_enabled(self, running: bool, any_loading: bool) -> bool {
        if any_loading {
            return false;
        }
        match self {
            ControlAction::StartScheduler => !running,
            ControlAction::StopScheduler => running,
            ControlAction::CollectNow | ControlAction::ProcessNow => true,
        }
    }
}

/// Four independent mutation slots, one per control, behind one in-flight gate.
pub struct StatusControls {
    start: Mutation<(), SchedulerAck>,
    stop: Mutation<(), SchedulerAck>,
    collect: Mutation<(), CollectionStats>,
    process: Mutation<(), ProcessingStats>,
    in_flight: AtomicBool,
}

// Clears the gate when the mutation finishes or its future is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl StatusControls {
    pub fn new(api: DynResearchApi, process_limit: u32) -> Self {
        let start = {
            let api = api.clone();
            Mutation::new("start_scheduler", move |_: ()| {
                let api = api.clone();
                Box::pin(async move { api.start_scheduler().await }) as FetchFuture<SchedulerAck>
            })
        };
        let stop = {
            let api = api.clone();
            Mutation::new("stop_scheduler", move |_: ()| {
                let api = api.clone();
                Box::pin(async move { api.stop_scheduler().await }) as FetchFuture<SchedulerAck>
            })
        };
        let collect = {
            let api = api.clone();
            Mutation::new("collect", move |_: ()| {
                let api = api.clone();
                Box::pin(async move { api.collect().await }) as FetchFuture<CollectionStats>
            })
        };
        let process = Mutation::new("process", move |_: ()| {
            let api = api.clone();
            Box::pin(async move { api.process(process_limit).await }) as FetchFuture<ProcessingStats>
        });
        Self {
            start,
            stop,
            collect,
            process,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn any_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
            || self.start.is_loading()
            || self.stop.is_loading()
            || self.collect.is_loading()
            || self.process.is_loading()
    }

    /// First error among start, stop, collect, process.
    pub fn first_error(&self) -> Option<String> {
        self.start
            .error()
            .or_else(|| self.stop.error())
            .or_else(|| self.collect.error())
            .or_else(|| self.process.error())
    }

    pub fn is_enabled(&self, action: ControlAction, running: bool) -> bool {
        action.is_enabled(running, self.any_loading())
    }

    /// Fire `action` unless it is disabled, then await `refresh` whether the
    /// call succeeded or not. Returns whether the action fired.
    ///
    /// At most one control runs at a time: the in-flight flag is claimed with a
    /// compare-and-swap, so concurrent triggers on other workers are refused.
    pub async fn run<F, Fut>(&self, action: ControlAction, running: bool, refresh: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        let claimed = action.is_enabled(running, false)
            && self
                .in_flight
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok();
        if !claimed {
            warn!(target: "desk::page", action = action.name(), running, "control disabled, ignoring trigger");
            crate::metrics::record_control_refused(action.name());
            return false;
        }

        let ok = {
            let _gate = InFlight(&self.in_flight);
            match action {
                ControlAction::StartScheduler => self.start.mutate(()).await.is_some(),
                ControlAction::StopScheduler => self.stop.mutate(()).await.is_some(),
                ControlAction::CollectNow => self.collect.mutate(()).await.is_some(),
                ControlAction::ProcessNow => self.process.mutate(()).await.is_some(),
            }
        };
        info!(target: "desk::page", action = action.name(), ok, "control finished");

        refresh().await;
        true
    }

    pub fn render(&self, status: &SystemStatus) -> String {
        let any_loading = self.any_loading();
        let mut html = String::with_capacity(2048);

        html.push_str(r#"<section class="system-status"><h2>System Status</h2>"#);
        let (dot, label) = if status.running {
            ("running", "Running")
        } else {
            ("stopped", "Stopped")
        };
        let _ = write!(
            html,
            r#"<div class="scheduler-state"><span class="dot {dot}"></span><strong>Scheduler: {label}</strong></div>"#
        );

        html.push_str(r#"<div class="controls">"#);
        for action in ControlAction::ALL {
            let disabled = if action.is_enabled(status.running, any_loading) {
                ""
            } else {
                " disabled"
            };
            let _ = write!(
                html,
                r#"<form method="post" action="{route}"><button type="submit" class="{class}" data-action="{name}"{disabled}>{label}</button></form>"#,
                route = action.route(),
                class = action.class(),
                name = action.name(),
                label = action.label(),
            );
        }
        html.push_str("</div>");

        html.push_str(r#"<div class="last-run"><h3>Last Run Statistics</h3><div class="grid">"#);
        push_collection(&mut html, status.last_collection.as_deref(), &status.collection_stats);
        push_processing(&mut html, status.last_processing.as_deref(), &status.processing_stats);
        html.push_str("</div></div>");

        if any_loading {
            html.push_str(
                r#"<div class="notice info"><span class="spinner small"></span><span>Operation in progress...</span></div>"#,
            );
        }
        if let Some(err) = self.first_error() {
            let _ = write!(
                html,
                r#"<div class="notice error"><strong>Error: </strong>{}</div>"#,
                text(&err)
            );
        }

        html.push_str("</section>");
        html
    }
}

fn count(v: Option<u64>) -> String {
    v.map(|n| n.to_string()).unwrap_or_else(|| "0".to_string())
}

fn push_collection(html: &mut String, last: Option<&str>, stats: &CollectionStats) {
    html.push_str("<div><h4>Collection</h4>");
    let _ = write!(
        html,
        "<div><strong>Last Run:</strong> {}</div>",
        text(&format_last_run(last))
    );
    if stats.has_counters() {
        let _ = write!(
            html,
            "<div><strong>Total Collected:</strong> {} papers</div><div><strong>From arXiv:</strong> {} papers</div><div><strong>From SSRN:</strong> {} papers</div>",
            count(stats.total),
            count(stats.arxiv),
            count(stats.ssrn)
        );
    }
    if let Some(err) = stats.error.as_deref() {
        let _ = write!(html, r#"<div class="run-error">{}</div>"#, text(err));
    }
    html.push_str("</div>");
}

fn push_processing(html: &mut String, last: Option<&str>, stats: &ProcessingStats) {
    html.push_str("<div><h4>Processing</h4>");
    let _ = write!(
        html,
        "<div><strong>Last Run:</strong> {}</div>",
        text(&format_last_run(last))
    );
    if stats.has_counters() {
        let _ = write!(
            html,
            "<div><strong>Summarized:</strong> {} papers</div><div><strong>Embedded:</strong> {} papers</div><div><strong>Errors:</strong> {}</div>",
            count(stats.summarized),
            count(stats.embedded),
            count(stats.errors)
        );
    }
    if let Some(err) = stats.error.as_deref() {
        let _ = write!(html, r#"<div class="run-error">{}</div>"#, text(err));
    }
    html.push_str("</div>");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_and_stop_follow_running_flag() {
        use ControlAction::*;
        assert!(!StartScheduler.is_enabled(true, false));
        assert!(StopScheduler.is_enabled(true, false));
        assert!(StartScheduler.is_enabled(false, false));
        assert!(!StopScheduler.is_enabled(false, false));
    }

    #[test]
    fn everything_is_disabled_while_a_control_is_in_flight() {
        for running in [true, false] {
            for action in ControlAction::ALL {
                assert!(!action.is_enabled(running, true), "{action:?}");
            }
            assert!(ControlAction::CollectNow.is_enabled(running, false));
            assert!(ControlAction::ProcessNow.is_enabled(running, false));
        }
    }

    #[test]
    fn counters_default_to_zero_when_partially_present() {
        let mut html = String::new();
        let stats = CollectionStats {
            total: Some(12),
            ..Default::default()
        };
        push_collection(&mut html, None, &stats);
        assert!(html.contains("<strong>Last Run:</strong> Never"));
        assert!(html.contains("Total Collected:</strong> 12 papers"));
        assert!(html.contains("From SSRN:</strong> 0 papers"));
    }
}
