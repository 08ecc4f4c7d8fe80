//! Small utility helpers used across modules.

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads. The cut point
/// backs up to a char boundary; `max` is a byte budget, not a char count.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) {
    cut -= 1;
  }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn short_strings_pass_through() {
    assert_eq!(trunc_for_log("hello", 300), "hello");
    assert_eq!(trunc_for_log("", 0), "");
  }

  #[test]
  fn truncation_reports_total_size() {
    let long = "a".repeat(400);
    let out = trunc_for_log(&long, 300);
    assert!(out.starts_with(&"a".repeat(300)));
    assert!(out.ends_with("(400 bytes total)"));
  }

  #[test]
  fn multibyte_char_straddling_the_cut_does_not_panic() {
    // "é" is two bytes; place it so the budget lands inside it.
    let mut s = "a".repeat(299);
    s.push_str("é rest of a remote error body");
    let out = trunc_for_log(&s, 300);
    assert!(out.starts_with(&"a".repeat(299)));
    assert!(!out.contains("rest"));

    // Budget inside a 4-byte char as well.
    let emoji = "🙂🙂🙂";
    for max in 1..emoji.len() {
      let _ = trunc_for_log(emoji, max);
    }
  }
}
