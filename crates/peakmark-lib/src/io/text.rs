use anyhow::{Context, Result};
use std::fmt::Write as _;

/// Parse newline-delimited floating point series, ignoring blank/comment lines.
pub fn parse_f64_series(text: &str) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let val: f64 = trimmed
            .parse()
            .with_context(|| format!("line {} is not f64: {}", idx + 1, trimmed))?;
        out.push(val);
    }
    if out.is_empty() {
        anyhow::bail!("no numeric samples found");
    }
    Ok(out)
}

/// Render samples one per line, preceded by an optional `#` comment.
pub fn format_f64_series(samples: &[f64], comment: Option<&str>) -> String {
    let mut out = String::with_capacity(samples.len() * 10);
    if let Some(comment) = comment {
        let _ = writeln!(out, "# {comment}");
    }
    for sample in samples {
        let _ = writeln!(out, "{sample}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_comments_and_blank_lines() {
        let parsed = parse_f64_series("# ecg lead II\n0.5\n\n-0.25\n  1e-3 \n").unwrap();
        assert_eq!(parsed, vec![0.5, -0.25, 0.001]);
    }

    #[test]
    fn reports_offending_line() {
        let err = parse_f64_series("0.1\nabc\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
        assert!(parse_f64_series("# only a comment\n").is_err());
    }

    #[test]
    fn formatted_series_parses_back() {
        let text = format_f64_series(&[1.25, -3.0, 0.0], Some("fs=125"));
        assert!(text.starts_with("# fs=125\n"));
        assert_eq!(parse_f64_series(&text).unwrap(), vec![1.25, -3.0, 0.0]);
    }
}
