//! Terminal rendering of the maintenance dashboard

use owo_colors::OwoColorize;
use std::fmt::Write as _;
use steward_common::orchestrator::version_line;
use steward_common::{ClientMaintenanceState, DashboardReport, MaintenanceAction};

/// Plain text when `color` is false, otherwise coloured for a terminal
pub fn render(report: &DashboardReport, color: bool) -> String {
    if !color {
        return report.render();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        "Here are some details about your Ethereum clients.".bright_white().bold()
    );
    let _ = writeln!(out);
    render_client(&mut out, &report.execution);
    let _ = writeln!(out);
    render_client(&mut out, &report.consensus);
    let _ = writeln!(out);

    if report.maintenance_needed {
        let _ = writeln!(out, "{}", report.summary_message().yellow().bold());
    } else {
        let _ = writeln!(out, "{}", report.summary_message().bright_green().bold());
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{}",
        "Versions legend - I: Installed, R: Running, A: Available, L: Latest".dimmed()
    );
    out
}

fn render_client(out: &mut String, state: &ClientMaintenanceState) {
    let _ = writeln!(
        out,
        "{} details ({})",
        state.client.display_name().cyan().bold(),
        version_line(state)
    );

    let services: Vec<String> = state
        .services
        .iter()
        .map(|s| {
            let flag = if s.state.running {
                "running".bright_green().to_string()
            } else if s.state.found {
                "stopped".bright_red().to_string()
            } else {
                "not found".bright_red().to_string()
            };
            format!("{}: {}", s.label, flag)
        })
        .collect();
    let _ = writeln!(out, "Running services - {}", services.join(", "));

    let task = state.next_step.description();
    let task = match state.next_step {
        MaintenanceAction::DoNothing => task.bright_green().to_string(),
        MaintenanceAction::CheckAgainSoon => task.yellow().to_string(),
        _ => task.bright_red().to_string(),
    };
    let _ = writeln!(out, "Maintenance task: {}", task);
}
