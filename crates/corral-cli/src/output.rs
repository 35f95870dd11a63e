//! Output layer for the `crl` binary: pretty, text, and JSON renderings of
//! the merged board.

use std::io::{self, Write};

use clap::ValueEnum;
use serde::Serialize;

use corral_core::{Dispatcher, Highlight, Lead};

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Human-optimized table.
    #[default]
    Pretty,
    /// Tab-separated plain text for pipes.
    Text,
    /// Machine-readable JSON.
    Json,
}

/// Serializable view of one board row, payments folded in.
#[derive(Debug, Serialize)]
struct RowView<'a> {
    id: &'a str,
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    status: &'static str,
    comments: &'a [String],
    created_at: String,
    highlight: &'static str,
    payments: usize,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    unconfirmed: bool,
}

const fn highlight_label(highlight: Highlight) -> &'static str {
    match highlight {
        Highlight::None => "",
        Highlight::Message => "message",
        Highlight::Meeting => "meeting",
    }
}

fn row<'a>(dispatcher: &'a Dispatcher, lead: &'a Lead) -> RowView<'a> {
    RowView {
        id: lead.id.as_str(),
        name: &lead.name,
        email: &lead.email,
        phone: &lead.phone,
        status: lead.status.as_str(),
        comments: &lead.comments,
        created_at: lead.created_at.display(),
        highlight: highlight_label(dispatcher.payments().highlight_for(&lead.id)),
        payments: dispatcher.payments().payments_for(&lead.id).len(),
        unconfirmed: lead.has_unconfirmed_edits(),
    }
}

/// Render the given leads (already filtered) in the requested mode.
pub fn render_board(
    w: &mut dyn Write,
    dispatcher: &Dispatcher,
    leads: &[&Lead],
    mode: OutputMode,
) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            let rows: Vec<RowView<'_>> = leads.iter().map(|l| row(dispatcher, l)).collect();
            serde_json::to_writer_pretty(&mut *w, &rows)?;
            writeln!(w)?;
        }
        OutputMode::Text => {
            for lead in leads {
                let r = row(dispatcher, lead);
                writeln!(
                    w,
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    r.id, r.name, r.email, r.phone, r.status, r.payments, r.highlight
                )?;
            }
        }
        OutputMode::Pretty => {
            writeln!(
                w,
                "{:<10} {:<16} {:<26} {:<12} {:<13} {:>4}  {}",
                "ID", "NOME", "EMAIL", "TELEFONE", "STATUS", "PAG", "DESTAQUE"
            )?;
            writeln!(w, "{:-<90}", "")?;
            for lead in leads {
                let r = row(dispatcher, lead);
                let status = if r.unconfirmed {
                    format!("{}*", r.status)
                } else {
                    r.status.to_string()
                };
                writeln!(
                    w,
                    "{:<10} {:<16} {:<26} {:<12} {:<13} {:>4}  {}",
                    r.id,
                    r.name,
                    r.email,
                    if r.phone.is_empty() { "-" } else { r.phone },
                    status,
                    r.payments,
                    r.highlight
                )?;
                for comment in r.comments {
                    writeln!(w, "           - {comment}")?;
                }
            }
            writeln!(w, "{} leads", leads.len())?;
        }
    }
    Ok(())
}

/// Convenience wrapper writing to stdout.
pub fn render_board_stdout(
    dispatcher: &Dispatcher,
    leads: &[&Lead],
    mode: OutputMode,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    render_board(&mut lock, dispatcher, leads, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use corral_core::{Intake, RawDoc};
    use serde_json::json;

    fn dispatcher_with_one_lead() -> Dispatcher {
        let mut dispatcher = Dispatcher::new();
        dispatcher.push(Intake::LeadsSnapshot(vec![RawDoc::from_pairs(
            "l1",
            [
                ("name", json!("Bia")),
                ("email", json!("bia@example.com")),
                ("status", json!("Fechado")),
            ],
        )]));
        dispatcher.push(Intake::PaymentsSnapshot(vec![RawDoc::from_pairs(
            "p1",
            [("userId", json!("l1")), ("option", json!("meeting"))],
        )]));
        dispatcher.run_until_idle();
        dispatcher
    }

    #[test]
    fn text_mode_emits_one_line_per_lead() {
        let dispatcher = dispatcher_with_one_lead();
        let leads: Vec<&Lead> = dispatcher.board().leads().iter().collect();
        let mut buf = Vec::new();
        render_board(&mut buf, &dispatcher, &leads, OutputMode::Text).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert_eq!(out.lines().count(), 1);
        assert!(out.contains("meeting"));
        assert!(out.contains("Fechado"));
    }

    #[test]
    fn json_mode_is_parseable() {
        let dispatcher = dispatcher_with_one_lead();
        let leads: Vec<&Lead> = dispatcher.board().leads().iter().collect();
        let mut buf = Vec::new();
        render_board(&mut buf, &dispatcher, &leads, OutputMode::Json).unwrap();
        let rows: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(rows[0]["highlight"], "meeting");
        assert_eq!(rows[0]["payments"], 1);
    }

    #[test]
    fn pretty_mode_shows_counts() {
        let dispatcher = dispatcher_with_one_lead();
        let leads: Vec<&Lead> = dispatcher.board().leads().iter().collect();
        let mut buf = Vec::new();
        render_board(&mut buf, &dispatcher, &leads, OutputMode::Pretty).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("1 leads"));
    }
}
