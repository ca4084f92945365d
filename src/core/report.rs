// logsift - core/report.rs
//
// Text and HTML rendering of run results, plus the daily summary page.
// All writers render from the same in-memory structures, so the text and
// HTML reports can never diverge in content — only in presentation.
// Writers target any `io::Write`; the *_file helpers bind them to the
// `<prefix>.txt` / `<prefix>.html` / `<prefix>_daily_summary.html` paths.

use crate::core::engine::RunParams;
use crate::core::model::{RunResult, SummaryResult};
use chrono::NaiveDate;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use crate::util::error::ReportError;

/// Shared stylesheet for both HTML artefacts.
const HTML_STYLE: &str = "\
  body { font-family: Arial, sans-serif; margin: 20px; }
  h1 { color: #333; }
  h2 { margin-top: 1.5em; }
  pre { background: #f5f5f5; padding: 0.5em; border-radius: 4px; }
  .result-line { margin: 5px 0; padding: 5px; border-bottom: 1px solid #eee; font-family: monospace; white-space: pre-wrap; }
  .file-info { color: #555; font-weight: bold; }
  .match { color: #008800; font-weight: bold; }
  .mismatch { color: #CC0000; font-weight: bold; }
  .configuration { color: #0066CC; font-weight: bold; }
  .summary { margin: 20px 0; padding: 10px; background-color: #f0f0f0; border-radius: 5px; }
  .no-logs { color: #888; font-style: italic; }";

/// Minimal HTML escaping for text interpolated into the reports.
pub fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "no date".to_string())
}

/// Escape a protocol line and wrap the literal words "mismatch" / "match"
/// in tag-classed spans, so only the verdict words carry colour in the
/// summary and the rest of the line stays neutral. "mismatch" is taken
/// whole before "match" is considered, since the latter is a substring.
fn highlight_protocol_words(text: &str) -> String {
    let escaped = html_escape(text);
    let mut out = String::with_capacity(escaped.len());
    let mut rest = escaped.as_str();

    loop {
        let word = match (rest.find("mismatch"), rest.find("match")) {
            (Some(a), Some(b)) if a <= b => ("mismatch", a),
            (Some(a), None) => ("mismatch", a),
            (None, Some(b)) | (Some(_), Some(b)) => ("match", b),
            (None, None) => break,
        };
        let (name, pos) = word;
        out.push_str(&rest[..pos]);
        out.push_str(&format!("<span class=\"{name}\">{name}</span>"));
        rest = &rest[pos + name.len()..];
    }
    out.push_str(rest);
    out
}

// =============================================================================
// Filter run reports
// =============================================================================

/// Plain-text report: one line per classified line, discovery order.
pub fn write_text_report<W: Write>(result: &RunResult, w: &mut W) -> io::Result<()> {
    writeln!(w, "Total matches found: {}", result.lines.len())?;
    writeln!(w, "{}", "=".repeat(50))?;
    writeln!(w)?;
    for line in &result.lines {
        writeln!(
            w,
            "[{}] {}: {}",
            format_date(line.source_date),
            line.source_file,
            line.text
        )?;
    }
    if !result.serials_without_logs.is_empty() {
        writeln!(w)?;
        for serial in &result.serials_without_logs {
            writeln!(w, "{serial}: No LOG files found")?;
        }
    }
    Ok(())
}

/// HTML report: same lines in the same order as the text report, each
/// wrapped with the CSS class of its tag and the colour of the rule that
/// matched it.
pub fn write_html_report<W: Write>(
    result: &RunResult,
    params: &RunParams,
    w: &mut W,
) -> io::Result<()> {
    writeln!(w, "<!DOCTYPE html>")?;
    writeln!(w, "<html>")?;
    writeln!(w, "<head>")?;
    writeln!(w, "<meta charset=\"UTF-8\">")?;
    writeln!(w, "<title>LOG File Filtering Results</title>")?;
    writeln!(w, "<style>\n{HTML_STYLE}\n</style>")?;
    writeln!(w, "</head>")?;
    writeln!(w, "<body>")?;
    writeln!(w, "<h1>LOG File Filtering Results</h1>")?;

    writeln!(w, "<div class=\"summary\">")?;
    writeln!(
        w,
        "<p>Total matches found: {}</p>",
        result.lines.len()
    )?;
    writeln!(
        w,
        "<p>Serials: {}</p>",
        html_escape(&params.serials.join(", "))
    )?;
    writeln!(
        w,
        "<p>Date range: {} to {}</p>",
        params
            .from
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string()),
        params
            .to
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string()),
    )?;
    writeln!(w, "</div>")?;

    for line in &result.lines {
        writeln!(w, "<div class=\"result-line\">")?;
        writeln!(
            w,
            "  <span class=\"file-info\">[{}] {}:</span> <span class=\"{}\" style=\"color: {}\">{}</span>",
            format_date(line.source_date),
            html_escape(&line.source_file),
            line.tag.css_class(),
            line.color,
            html_escape(&line.text)
        )?;
        writeln!(w, "</div>")?;
    }

    if !result.serials_without_logs.is_empty() {
        writeln!(w, "<h2>No LOG files found</h2>")?;
        writeln!(w, "<ul>")?;
        for serial in &result.serials_without_logs {
            writeln!(
                w,
                "<li><span class=\"no-logs\">{}: No LOG files found</span></li>",
                html_escape(serial)
            )?;
        }
        writeln!(w, "</ul>")?;
    }

    writeln!(w, "</body>")?;
    writeln!(w, "</html>")?;
    Ok(())
}

/// Write `<prefix>.txt` and `<prefix>.html` from one run result.
/// Returns the two paths written.
pub fn write_report_files(
    result: &RunResult,
    params: &RunParams,
) -> Result<(PathBuf, PathBuf), ReportError> {
    let txt_path = PathBuf::from(format!("{}.txt", params.output_prefix));
    let html_path = PathBuf::from(format!("{}.html", params.output_prefix));

    let mut txt = open(&txt_path)?;
    write_text_report(result, &mut txt).map_err(|e| ReportError::Io {
        path: txt_path.clone(),
        source: e,
    })?;

    let mut html = open(&html_path)?;
    write_html_report(result, params, &mut html).map_err(|e| ReportError::Io {
        path: html_path.clone(),
        source: e,
    })?;

    tracing::info!(txt = %txt_path.display(), html = %html_path.display(), "Reports written");
    Ok((txt_path, html_path))
}

// =============================================================================
// Daily summary
// =============================================================================

/// Daily summary page: one section per vehicle (config lines first, then
/// protocol lines), trailing list of serials without readout logs.
pub fn write_summary_html<W: Write>(
    summary: &SummaryResult,
    title: &str,
    w: &mut W,
) -> io::Result<()> {
    writeln!(w, "<!DOCTYPE html>")?;
    writeln!(w, "<html>")?;
    writeln!(w, "<head>")?;
    writeln!(w, "<meta charset=\"UTF-8\">")?;
    writeln!(w, "<title>{}</title>", html_escape(title))?;
    writeln!(w, "<style>\n{HTML_STYLE}\n</style>")?;
    writeln!(w, "</head>")?;
    writeln!(w, "<body>")?;
    writeln!(w, "<h1>{}</h1>", html_escape(title))?;

    for group in &summary.vehicles {
        writeln!(w, "<h2>{}</h2>", html_escape(&group.name))?;

        if let Some(latest) = &group.latest_source {
            writeln!(w, "Latest log: {}<br>", html_escape(latest))?;
        } else if let Some(newest) = group.sources.iter().next_back() {
            writeln!(w, "{}<br>", html_escape(newest))?;
        }

        if !group.config_lines.is_empty() {
            writeln!(w, "<pre>")?;
            for line in &group.config_lines {
                writeln!(
                    w,
                    "<span class=\"configuration\">{}</span>",
                    html_escape(line)
                )?;
            }
            writeln!(w, "</pre>")?;
        }

        if !group.protocol_lines.is_empty() {
            writeln!(w, "<pre>")?;
            for (line, _) in &group.protocol_lines {
                writeln!(w, "{}", highlight_protocol_words(line))?;
            }
            writeln!(w, "</pre>")?;
        }
    }

    if !summary.serials_without_logs.is_empty() {
        writeln!(w, "<h2>Vehicles with no LOG files in selected range</h2>")?;
        writeln!(w, "<ul>")?;
        for serial in &summary.serials_without_logs {
            writeln!(
                w,
                "<li><span class=\"no-logs\">{}: No LOG files found</span></li>",
                html_escape(serial)
            )?;
        }
        writeln!(w, "</ul>")?;
    }

    writeln!(w, "</body>")?;
    writeln!(w, "</html>")?;
    Ok(())
}

/// Write `<prefix>_daily_summary.html`; returns the path written.
pub fn write_summary_file(
    summary: &SummaryResult,
    params: &RunParams,
    title: &str,
) -> Result<PathBuf, ReportError> {
    let path = PathBuf::from(format!("{}_daily_summary.html", params.output_prefix));
    let mut w = open(&path)?;
    write_summary_html(summary, title, &mut w).map_err(|e| ReportError::Io {
        path: path.clone(),
        source: e,
    })?;
    tracing::info!(path = %path.display(), "Summary written");
    Ok(path)
}

fn open(path: &PathBuf) -> Result<BufWriter<File>, ReportError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| ReportError::Io {
            path: path.clone(),
            source: e,
        })
}

// =============================================================================
// Tests
// =============================================================================
