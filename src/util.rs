//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Log-safe truncation for large strings. Counts chars, so multi-byte text never splits.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    s.to_string()
  } else {
    let head: String = s.chars().take(max).collect();
    format!("{}… ({} bytes total)", head, s.len())
  }
}

/// Boolean environment flag: "1", "true", "yes" and "on" count as set.
pub fn env_flag(name: &str) -> bool {
  std::env::var(name).map(|v| parse_flag(&v)).unwrap_or(false)
}

fn parse_flag(v: &str) -> bool {
  matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fill_template_replaces_every_key() {
    let out = fill_template("{count} x {difficulty} ({count})", &[("count", "5"), ("difficulty", "hard")]);
    assert_eq!(out, "5 x hard (5)");
  }

  #[test]
  fn trunc_for_log_keeps_char_boundaries() {
    assert_eq!(trunc_for_log("short", 10), "short");
    let out = trunc_for_log("ééééé", 2);
    assert!(out.starts_with("éé…"));
    assert!(out.ends_with("(10 bytes total)"));
  }

  #[test]
  fn parse_flag_accepts_common_truthy_values() {
    assert!(parse_flag("1"));
    assert!(parse_flag("TRUE"));
    assert!(parse_flag(" on "));
    assert!(!parse_flag("0"));
    assert!(!parse_flag(""));
  }
}
