//! Forwarded-message detection.
//!
//! Mail clients wrap forwarded content in a delimiter line followed by a small
//! header block (`From:`, `To:`, `Date:`, `Subject:`). This module recognises the
//! common delimiters and recovers that header block from a plain-text body.

use once_cell::sync::Lazy;
use regex::Regex;

/// Delimiters in priority order. The earliest one in the body wins.
static MARKERS: Lazy<Vec<Regex>> = Lazy::new(|| {
  [
    r"(?i)-{2,}\s*Forwarded message\s*-{2,}",
    r"(?i)={2,}\s*Forwarded message\s*={2,}",
    r"(?i)-{2,}\s*Original Message\s*-{2,}",
    r"(?i)Begin forwarded message\s*:",
    r"(?im)^\s*Forwarded message\s*:?\s*$",
  ]
  .iter()
  .filter_map(|p| Regex::new(p).ok())
  .collect()
});

static FROM_LINE: Lazy<Regex> = Lazy::new(|| header_regex("From"));
static TO_LINE: Lazy<Regex> = Lazy::new(|| header_regex("To"));
static DATE_LINE: Lazy<Regex> = Lazy::new(|| header_regex("Date|Sent"));
static SUBJECT_LINE: Lazy<Regex> = Lazy::new(|| header_regex("Subject"));

static ANGLE_ADDR: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r#"^\s*["']?(?P<name>[^"'<]*?)["']?\s*<(?P<email>[^<>\s]+@[^<>\s]+)>"#)
    .expect("static regex")
});
static BARE_ADDR: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?:mailto:)?(?P<email>[\w.+-]+@[\w-]+(?:\.[\w-]+)+)").expect("static regex")
});
static ANGLE_ONLY: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"<(?P<email>[^<>\s]+@[^<>\s]+)>").expect("static regex"));

fn header_regex(name: &str) -> Regex {
  // Quoted ("> From:") and bold ("*From:*") variants are accepted.
  Regex::new(&format!(r"(?im)^[ \t>*]*(?:{name})\s*:\*?[ \t]*(?P<value>.*?)[ \t]*$"))
    .expect("static regex")
}

/// Header block recovered from a forwarded body. Only found fields are set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardingInfo {
  pub original_from: Option<String>,
  pub original_from_name: Option<String>,
  pub original_to: Option<String>,
  /// Verbatim; the sender's date format and timezone are not normalised.
  pub original_date: Option<String>,
  pub original_subject: Option<String>,
}

impl ForwardingInfo {
  fn is_empty(&self) -> bool {
    self.original_from.is_none()
      && self.original_from_name.is_none()
      && self.original_to.is_none()
      && self.original_date.is_none()
      && self.original_subject.is_none()
  }
}

/// Detect a forwarded message and extract the original headers.
///
/// Returns `None` when no delimiter is present, or when a delimiter is present
/// but none of the header lines could be found after it.
pub fn parse_forwarding(body: Option<&str>) -> Option<ForwardingInfo> {
  let body = body?;
  let start = MARKERS
    .iter()
    .filter_map(|re| re.find(body))
    .min_by_key(|m| m.start())?
    .end();
  let block = &body[start..];

  let mut info = ForwardingInfo::default();
  if let Some(line) = capture_value(&FROM_LINE, block) {
    let (email, name) = parse_mailbox(line);
    info.original_from = email;
    info.original_from_name = name;
  }
  info.original_to = capture_value(&TO_LINE, block).and_then(parse_recipient);
  info.original_date = capture_value(&DATE_LINE, block).map(str::to_string);
  info.original_subject = capture_value(&SUBJECT_LINE, block).map(str::to_string);

  if info.is_empty() { None } else { Some(info) }
}

fn capture_value<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
  re.captures(text)
    .and_then(|c| c.name("value"))
    .map(|m| m.as_str().trim())
    .filter(|s| !s.is_empty())
}

/// Split a mailbox line into `(email, display name)`.
///
/// Tries `Name <addr>` first, then an embedded bare address with the rest of the
/// line as the name, and finally treats the whole line as a name.
pub fn parse_mailbox(line: &str) -> (Option<String>, Option<String>) {
  let line = line.trim();
  if let Some(c) = ANGLE_ADDR.captures(line) {
    let email = c["email"].trim().to_string();
    return (Some(email), clean_name(&c["name"]));
  }
  if let Some(m) = BARE_ADDR.captures(line) {
    let email = m["email"].to_string();
    let rest = line.replacen(m.get(0).map_or("", |x| x.as_str()), "", 1);
    return (Some(email), clean_name(&rest));
  }
  (None, clean_name(line))
}

fn parse_recipient(line: &str) -> Option<String> {
  if let Some(c) = ANGLE_ONLY.captures(line) {
    return Some(c["email"].to_string());
  }
  let v = line.trim().trim_matches(['"', '\'']).trim();
  if v.is_empty() { None } else { Some(v.to_string()) }
}

fn clean_name(raw: &str) -> Option<String> {
  let name = raw
    .trim()
    .trim_matches(|c: char| matches!(c, '"' | '\'' | '<' | '>' | '[' | ']' | '(' | ')') || c.is_whitespace());
  if name.is_empty() { None } else { Some(name.to_string()) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extracts_angle_bracket_sender() {
    let body = "See below\n\n===== Forwarded message =====\nFrom: Jane Doe <jane@x.com>\nDate: Mon, 6 Oct 2025 10:00\nSubject: Q3 numbers\nTo: Bob <bob@y.com>\n\nHello";
    let info = parse_forwarding(Some(body)).unwrap();
    assert_eq!(info.original_from.as_deref(), Some("jane@x.com"));
    assert_eq!(info.original_from_name.as_deref(), Some("Jane Doe"));
    assert_eq!(info.original_to.as_deref(), Some("bob@y.com"));
    assert_eq!(info.original_date.as_deref(), Some("Mon, 6 Oct 2025 10:00"));
    assert_eq!(info.original_subject.as_deref(), Some("Q3 numbers"));
  }

  #[test]
  fn no_delimiter_means_not_forwarded() {
    let body = "From: Jane Doe <jane@x.com>\nSubject: hi";
    assert_eq!(parse_forwarding(Some(body)), None);
    assert_eq!(parse_forwarding(None), None);
  }

  #[test]
  fn delimiter_without_headers_is_absent() {
    let body = "---------- Forwarded message ---------\njust some text";
    assert_eq!(parse_forwarding(Some(body)), None);
  }

  #[test]
  fn first_of_multiple_markers_wins() {
    let body = "-----Original Message-----\nFrom: First <first@a.com>\nSubject: outer\n\n---------- Forwarded message ---------\nFrom: Second <second@b.com>\nSubject: inner\n";
    let info = parse_forwarding(Some(body)).unwrap();
    assert_eq!(info.original_from.as_deref(), Some("first@a.com"));
    assert_eq!(info.original_subject.as_deref(), Some("outer"));
  }

  #[test]
  fn bare_address_keeps_remaining_text_as_name() {
    let body = "Begin forwarded message:\n\nFrom: alerts@bank.example (Bank Alerts)\nSubject: Statement";
    let info = parse_forwarding(Some(body)).unwrap();
    assert_eq!(info.original_from.as_deref(), Some("alerts@bank.example"));
    assert_eq!(info.original_from_name.as_deref(), Some("Bank Alerts"));
  }

  #[test]
  fn from_line_without_email_is_a_name() {
    let body = "----- Original Message -----\nFrom: The Front Desk\nSubject: Keys";
    let info = parse_forwarding(Some(body)).unwrap();
    assert_eq!(info.original_from, None);
    assert_eq!(info.original_from_name.as_deref(), Some("The Front Desk"));
  }

  #[test]
  fn missing_to_line_leaves_field_unset() {
    let body = "===== Forwarded message =====\nFrom: A <a@a.com>\nSubject: s";
    let info = parse_forwarding(Some(body)).unwrap();
    assert_eq!(info.original_to, None);
  }

  #[test]
  fn quoted_to_line_is_unwrapped() {
    let body = "===== Forwarded message =====\nTo: \"team list\"";
    let info = parse_forwarding(Some(body)).unwrap();
    assert_eq!(info.original_to.as_deref(), Some("team list"));
  }

  #[test]
  fn unicode_display_names_survive() {
    let body = "---------- Forwarded message ---------\nFrom: \"José Müller\" <jose@exämple.de>\nSubject: Grüße";
    let info = parse_forwarding(Some(body)).unwrap();
    assert_eq!(info.original_from_name.as_deref(), Some("José Müller"));
    assert_eq!(info.original_from.as_deref(), Some("jose@exämple.de"));
    assert_eq!(info.original_subject.as_deref(), Some("Grüße"));
  }

  #[test]
  fn mailbox_without_name() {
    assert_eq!(parse_mailbox("<a@b.com>"), (Some("a@b.com".into()), None));
    assert_eq!(parse_mailbox("a@b.com"), (Some("a@b.com".into()), None));
  }
}
