//! Generic head-and-tail truncation
//!
//! Keeps the first and last 40% of the budget in whole lines with an
//! elision marker between them. Safe for any content; the fallback for
//! every other strategy.

use crate::TruncateOutcome;

pub(crate) fn truncate_generic(text: &str, max_bytes: usize) -> TruncateOutcome {
    let lines: Vec<&str> = text.lines().collect();
    let head_budget = max_bytes * 2 / 5;
    let tail_budget = max_bytes * 2 / 5;

    let mut head: Vec<&str> = Vec::new();
    let mut used = 0;
    for line in &lines {
        if used + line.len() + 1 > head_budget {
            break;
        }
        used += line.len() + 1;
        head.push(line);
    }

    let mut tail: Vec<&str> = Vec::new();
    let mut used = 0;
    for line in lines.iter().rev() {
        if used + line.len() + 1 > tail_budget {
            break;
        }
        used += line.len() + 1;
        tail.push(line);
    }
    tail.reverse();

    // Head and tail may overlap on small inputs; drop tail lines already
    // covered by the head.
    let overlap = head.len() + tail.len() > lines.len();
    if overlap {
        let extra = head.len() + tail.len() - lines.len();
        tail.drain(..extra.min(tail.len()));
    }

    let elided = lines.len() - head.len() - tail.len();
    let mut out = head.join("\n");
    if elided > 0 {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("... [{elided} of {} lines elided] ...", lines.len()));
    }
    if !tail.is_empty() {
        out.push('\n');
        out.push_str(&tail.join("\n"));
    }

    // A single line longer than the whole budget defeats the line loop;
    // keep a raw prefix instead of only the marker.
    if head.is_empty() && tail.is_empty() {
        let cut = floor_char_boundary(text, max_bytes.saturating_sub(3));
        out = format!("{}...", &text[..cut]);
    }

    if out.len() > max_bytes {
        let cut = floor_char_boundary(&out, max_bytes.saturating_sub(3));
        out = format!("{}...", &out[..cut]);
    }

    TruncateOutcome {
        final_size: out.len(),
        content: out,
        truncated: true,
        original_size: text.len(),
        syntax_valid: true,
        method: "head-tail",
    }
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    let mut i = index.min(s.len());
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_and_tail_kept() {
        let text = (0..200).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let outcome = truncate_generic(&text, 400);
        assert!(outcome.final_size <= 400);
        assert!(outcome.content.starts_with("line 0"));
        assert!(outcome.content.ends_with("line 199"));
        assert!(outcome.content.contains("lines elided"));
    }

    #[test]
    fn test_oversized_single_line_hard_cut() {
        let text = "x".repeat(10_000);
        let outcome = truncate_generic(&text, 100);
        assert!(outcome.final_size <= 100);
        assert!(outcome.content.ends_with("..."));
    }

    #[test]
    fn test_multibyte_hard_cut_stays_on_boundary() {
        let text = "ü".repeat(5_000);
        let outcome = truncate_generic(&text, 99);
        assert!(outcome.final_size <= 99);
    }

    #[test]
    fn test_elided_count_accurate() {
        let text = (0..100).map(|i| format!("l{i}")).collect::<Vec<_>>().join("\n");
        let outcome = truncate_generic(&text, 200);
        let marker_start = outcome.content.find("... [").unwrap();
        let rest = &outcome.content[marker_start + 5..];
        let elided: usize = rest.split(' ').next().unwrap().parse().unwrap();
        let kept = outcome
            .content
            .lines()
            .filter(|l| l.starts_with('l') && !l.starts_with("lines"))
            .count();
        assert_eq!(elided + kept, 100);
    }
}
