//! Plain aligned tables for stdout.

use portal_core::{contribution::Contribution, filter::TopicRow};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Topic rows in the order given, or a single "No topics found." line.
pub fn topics(rows: &[TopicRow<'_>]) -> String {
  if rows.is_empty() {
    return "No topics found.\n".to_owned();
  }
  table(
    &["ID", "NAME", "RELEASE", "END", "STATE"],
    rows
      .iter()
      .map(|row| {
        vec![
          row.topic.topic_id.clone(),
          row.topic.name.clone(),
          row.topic.release_date.format(DATE_FORMAT).to_string(),
          row.topic.end_date.format(DATE_FORMAT).to_string(),
          row.state().to_string(),
        ]
      })
      .collect(),
  )
}

pub fn contributions(items: &[Contribution]) -> String {
  if items.is_empty() {
    return "No contributions found.\n".to_owned();
  }
  table(
    &["ID", "TITLE", "STATUS", "FILES", "SUBMITTED"],
    items
      .iter()
      .map(|c| {
        vec![
          c.contribution_id.clone(),
          c.title.clone(),
          c.status.name.to_string(),
          c.files.len().to_string(),
          c.submitted_at.format(DATE_FORMAT).to_string(),
        ]
      })
      .collect(),
  )
}

fn table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
  let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
  for row in &rows {
    for (width, cell) in widths.iter_mut().zip(row) {
      *width = (*width).max(cell.chars().count());
    }
  }

  let mut out = String::new();
  push_line(&mut out, headers.iter().copied(), &widths);
  for row in &rows {
    push_line(&mut out, row.iter().map(String::as_str), &widths);
  }
  out
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
  let line = cells
    .zip(widths)
    .map(|(cell, &width)| format!("{cell:<width$}"))
    .collect::<Vec<_>>()
    .join("  ");
  out.push_str(line.trim_end());
  out.push('\n');
}
