use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use super::{Groups, Report, MISSING_KEY};
use crate::license::spdx::is_permissive;
use crate::models::{DependencyAdvanced, DependencySimple};

/// Render a report as coloured tables on stdout.
pub fn render(report: &Report, path: &Path, quiet: bool, color: bool) -> Result<()> {
    if !quiet {
        println!(
            "\n {} v{}",
            "depsman".bold(),
            env!("CARGO_PKG_VERSION")
        );
        println!(" Project: {}  Report: {}\n", path.display(), report.kind());
    }

    print!("{}", format_report(report, color));
    Ok(())
}

pub fn format_report(report: &Report, color: bool) -> String {
    match report {
        Report::Simple(simples) if simples.is_empty() => empty(),
        Report::Advanced(advanceds) | Report::GitHub(advanceds) if advanceds.is_empty() => empty(),
        Report::Simple(simples) => format!("{}\n", simple_table(simples, color)),
        Report::Advanced(advanceds) => format!("{}\n", advanced_table(advanceds, color)),
        Report::GitHub(advanceds) => format!("{}\n", github_table(advanceds, color)),
        Report::Esm(groups) => format_groups(groups, color, |key| match key {
            "true" => ("ES modules".to_string(), colored::Color::Green),
            _ => ("CommonJS".to_string(), colored::Color::Yellow),
        }),
        Report::License(groups) => format_groups(groups, color, |key| {
            let label = if key == MISSING_KEY { "Unknown license" } else { key };
            (label.to_string(), spdx_colors(Some(key)).0)
        }),
        Report::Owner(groups) => format_groups(groups, color, |key| {
            if key == MISSING_KEY {
                ("No owner".to_string(), colored::Color::BrightBlack)
            } else {
                (key.to_string(), colored::Color::Cyan)
            }
        }),
        Report::Duplicates(groups) => {
            format_groups(groups, color, |key| (key.to_string(), colored::Color::Magenta))
        }
    }
}

fn empty() -> String {
    format!(" {}\n", "No dependencies found.".dimmed())
}

fn format_groups<F>(groups: &Groups, color: bool, heading: F) -> String
where
    F: Fn(&str) -> (String, colored::Color),
{
    if groups.is_empty() {
        return empty();
    }

    let mut out = String::new();
    for group in groups.iter() {
        let (label, tone) = heading(&group.key);
        let title = format!("{} ({})", label, group.items.len());
        let _ = writeln!(out, " {}\n", title.color(tone).bold());
        let _ = writeln!(out, "{}\n", advanced_table(&group.items, color));
    }
    out
}

fn new_table(headers: &[&str], color: bool) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
    if !color {
        table.force_no_tty();
    }
    table
}

fn simple_table(simples: &[DependencySimple], color: bool) -> Table {
    let mut table = new_table(&["Name", "Version", "Nodes", "Registry"], color);
    for simple in simples {
        table.add_row(vec![
            Cell::new(&simple.name),
            Cell::new(&simple.version),
            Cell::new(simple.nodes_nr).set_alignment(CellAlignment::Right),
            Cell::new(simple.registry.as_deref().unwrap_or("-")),
        ]);
    }
    table
}

fn advanced_table(advanceds: &[DependencyAdvanced], color: bool) -> Table {
    let mut table = new_table(
        &["Name", "Version", "ESM", "License", "Owner", "Repository", "Description"],
        color,
    );
    for dep in advanceds {
        table.add_row(vec![
            Cell::new(dep.name()),
            Cell::new(dep.version()),
            Cell::new(if dep.esm { "yes" } else { "no" }).set_alignment(CellAlignment::Center),
            Cell::new(dep.spdx.as_deref().unwrap_or("unknown"))
                .fg(spdx_colors(dep.spdx.as_deref()).1),
            Cell::new(dep.owner.as_deref().unwrap_or("-")),
            Cell::new(dep.repository_url.as_deref().unwrap_or("-")),
            Cell::new(dep.package.description().unwrap_or("")),
        ]);
    }
    table
}

fn github_table(advanceds: &[DependencyAdvanced], color: bool) -> Table {
    let mut table = new_table(
        &[
            "Name", "Description", "Topics", "Stars", "Watchers", "Forks", "Issues",
            "Repository", "Owner", "Issues URL", "Pulls URL",
        ],
        color,
    );
    for dep in advanceds {
        let Some(repo) = &dep.repository else {
            table.add_row(vec![
                Cell::new(dep.name()),
                Cell::new(dep.package.description().unwrap_or("")),
            ]);
            continue;
        };

        let count = |n: u64| Cell::new(n).set_alignment(CellAlignment::Right);
        table.add_row(vec![
            Cell::new(dep.name()),
            Cell::new(repo.description.as_deref().or(dep.package.description()).unwrap_or("")),
            Cell::new(repo.topics.join(", ")),
            count(repo.stargazers_count),
            count(repo.watchers_count),
            count(repo.forks_count),
            count(repo.open_issues),
            Cell::new(repo.html_url.as_deref().unwrap_or("-")),
            Cell::new(
                repo.owner
                    .as_ref()
                    .and_then(|o| o.html_url.as_deref().or(o.login.as_deref()))
                    .unwrap_or("-"),
            ),
            Cell::new(strip_template(repo.issues_url.as_deref().unwrap_or("-"))),
            Cell::new(strip_template(repo.pulls_url.as_deref().unwrap_or("-"))),
        ]);
    }
    table
}

/// Drop the `{/number}` URI template suffix GitHub appends to collection URLs.
fn strip_template(url: &str) -> &str {
    url.strip_suffix("{/number}").unwrap_or(url)
}

/// Permissive green, other named licenses yellow, unknown red.
fn spdx_colors(spdx: Option<&str>) -> (colored::Color, Color) {
    match spdx {
        Some(id) if is_permissive(id) => (colored::Color::Green, Color::Green),
        Some(id) if id != MISSING_KEY => (colored::Color::Yellow, Color::Yellow),
        _ => (colored::Color::Red, Color::Red),
    }
}
