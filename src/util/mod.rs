//! Utility functions: tracing, mail parsing and text cleanup.

use mailparse::{MailHeaderMap, ParsedMail};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize pretty CLI logging.
pub fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  fmt()
    .with_env_filter(filter)
    .with_target(false)
    .pretty()
    .init();
}

/// Collect headers into a lowercase HashMap.
pub fn collect_headers(parsed: &ParsedMail<'_>) -> std::collections::HashMap<String, String> {
  let mut map = std::collections::HashMap::new();
  for h in &parsed.headers {
    map.insert(h.get_key().to_ascii_lowercase(), h.get_value());
  }
  map
}

/// Extract first text and HTML bodies from a MIME tree.
pub fn extract_bodies(parsed: &ParsedMail<'_>) -> (Option<String>, Option<String>) {
  if parsed.subparts.is_empty() {
    if is_attachment(parsed) {
      return (None, None);
    }
    let data = parsed.get_body().unwrap_or_default();
    match parsed.ctype.mimetype.as_str() {
      "text/html" => (None, Some(data)),
      "text/plain" => (Some(data), None),
      _ => (None, None),
    }
  } else {
    let mut text = None;
    let mut html = None;
    for part in &parsed.subparts {
      let (t, h) = extract_bodies(part);
      if text.is_none() && t.is_some() {
        text = t;
      }
      if html.is_none() && h.is_some() {
        html = h;
      }
    }
    (text, html)
  }
}

fn attachment_filename(parsed: &ParsedMail<'_>) -> Option<String> {
  let disp = parsed
    .headers
    .get_first_value("Content-Disposition")
    .unwrap_or_default();
  let mut filename: Option<String> = None;
  if let Some(pos) = disp.to_lowercase().find("filename=") {
    let part = &disp[pos + 9..];
    let cleaned = part
      .trim()
      .trim_matches(['"', '\''])
      .split(';')
      .next()
      .unwrap_or("")
      .trim_matches(['"', '\'']);
    if !cleaned.is_empty() {
      filename = Some(cleaned.to_string());
    }
  }
  for (k, v) in &parsed.ctype.params {
    if k.eq_ignore_ascii_case("name") {
      filename.get_or_insert(v.clone());
    }
  }
  filename
}

fn is_attachment(parsed: &ParsedMail<'_>) -> bool {
  let disp = parsed
    .headers
    .get_first_value("Content-Disposition")
    .unwrap_or_default();
  let ctype = parsed.ctype.mimetype.as_str();
  let is_text = ctype == "text/plain" || ctype == "text/html";
  disp.to_ascii_lowercase().contains("attachment")
    || attachment_filename(parsed).is_some()
    || !is_text
}

/// Traverse MIME parts and collect attachment filenames in order. Content is not kept.
pub fn collect_attachment_names(parsed: &ParsedMail<'_>) -> Vec<String> {
  let mut out = Vec::new();
  walk_attachments(parsed, &mut out);
  out
}

fn walk_attachments(parsed: &ParsedMail<'_>, out: &mut Vec<String>) {
  if parsed.subparts.is_empty() {
    if is_attachment(parsed) {
      out.push(attachment_filename(parsed).unwrap_or_else(|| "(unnamed attachment)".to_string()));
    }
  } else {
    for part in &parsed.subparts {
      walk_attachments(part, out);
    }
  }
}

static BREAKS: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?i)<br\s*/?>|</p\s*>|</div\s*>|</tr\s*>").expect("static regex"));
static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("static regex"));

/// Rough plain-text rendering of an HTML body, enough for header-line detection.
pub fn html_to_text(html: &str) -> String {
  let with_breaks = BREAKS.replace_all(html, "\n");
  TAGS
    .replace_all(&with_breaks, "")
    .replace("&nbsp;", " ")
    .replace("&lt;", "<")
    .replace("&gt;", ">")
    .replace("&quot;", "\"")
    .replace("&amp;", "&")
}
