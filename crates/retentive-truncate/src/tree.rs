//! Codebase-tree truncation strategy
//!
//! Buckets listing lines by depth, spends more of the quota at shallow
//! depths, samples each bucket evenly, and re-emits the survivors in their
//! original order. Depths past the fifth level are dropped outright.

use crate::TruncateOutcome;

const MAX_DEPTH: usize = 5;
/// Quota weights per depth, shallow first
const DEPTH_WEIGHTS: [usize; MAX_DEPTH] = [16, 8, 4, 2, 1];

pub(crate) fn truncate_tree(
    text: &str,
    max_bytes: usize,
    max_attempts: usize,
) -> Option<TruncateOutcome> {
    let lines: Vec<&str> = text.lines().collect();
    let depths: Vec<usize> = lines.iter().map(|l| line_depth(l)).collect();
    let avg_line = (text.len() / lines.len().max(1)).max(1);

    let mut budget_lines = (max_bytes / avg_line).max(1);
    for _ in 0..max_attempts.max(1) {
        let keep = select_lines(&lines, &depths, budget_lines);
        let marker = format!("... [{} entries elided]", lines.len() - keep.len());
        let mut out = keep
            .iter()
            .map(|&i| lines[i])
            .collect::<Vec<_>>()
            .join("\n");
        if keep.len() < lines.len() {
            out.push('\n');
            out.push_str(&marker);
        }
        if out.len() <= max_bytes {
            return Some(TruncateOutcome {
                final_size: out.len(),
                content: out,
                truncated: true,
                original_size: text.len(),
                syntax_valid: true,
                method: "tree-sample",
            });
        }
        budget_lines = (budget_lines / 2).max(1);
    }
    None
}

/// Pick line indices by per-depth quota with even sampling, returned sorted
/// so the original order is preserved
fn select_lines(lines: &[&str], depths: &[usize], budget_lines: usize) -> Vec<usize> {
    let weight_total: usize = DEPTH_WEIGHTS.iter().sum();
    let mut selected: Vec<usize> = Vec::new();

    for depth in 0..MAX_DEPTH {
        let bucket: Vec<usize> = (0..lines.len()).filter(|&i| depths[i] == depth).collect();
        if bucket.is_empty() {
            continue;
        }
        let quota = (budget_lines * DEPTH_WEIGHTS[depth] / weight_total).max(1);
        if bucket.len() <= quota {
            selected.extend(bucket);
        } else {
            let step = bucket.len() as f64 / quota as f64;
            for k in 0..quota {
                selected.push(bucket[(k as f64 * step) as usize]);
            }
        }
    }

    selected.sort_unstable();
    selected.dedup();
    selected
}

/// Depth of a tree line: column of its branch glyph divided by the standard
/// four-column indent, plus one; lines without a glyph are roots
fn line_depth(line: &str) -> usize {
    for (col, c) in line.chars().enumerate() {
        if c == '├' || c == '└' {
            return col / 4 + 1;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> String {
        let mut lines = vec!["project".to_string()];
        for d in 0..8 {
            for n in 0..20 {
                let indent = "│   ".repeat(d);
                lines.push(format!("{indent}├── entry_{d}_{n}"));
            }
        }
        lines.join("\n")
    }

    #[test]
    fn test_tree_sampling_fits_budget() {
        let tree = sample_tree();
        let outcome = truncate_tree(&tree, 600, 3).unwrap();
        assert!(outcome.final_size <= 600);
        assert_eq!(outcome.method, "tree-sample");
    }

    #[test]
    fn test_shallow_depths_favored() {
        let tree = sample_tree();
        let outcome = truncate_tree(&tree, 600, 3).unwrap();
        let depth1 = outcome.content.matches("entry_0_").count();
        let depth4 = outcome.content.matches("entry_3_").count();
        assert!(
            depth1 >= depth4,
            "shallow entries should outnumber deep ones: {depth1} vs {depth4}"
        );
    }

    #[test]
    fn test_depths_past_cap_dropped() {
        let tree = sample_tree();
        let outcome = truncate_tree(&tree, 2_000, 3).unwrap();
        // Depth 6+ entries (entry_5_*, entry_6_*, entry_7_*) are gone.
        assert!(!outcome.content.contains("entry_6_"));
        assert!(!outcome.content.contains("entry_7_"));
    }

    #[test]
    fn test_original_order_preserved() {
        let tree = sample_tree();
        let outcome = truncate_tree(&tree, 1_000, 3).unwrap();
        let a = outcome.content.find("entry_0_0");
        let b = outcome.content.find("entry_1_0");
        if let (Some(a), Some(b)) = (a, b) {
            assert!(a < b, "depth-1 entry should precede depth-2 entry");
        }
    }

    #[test]
    fn test_elision_marker_present() {
        let tree = sample_tree();
        let outcome = truncate_tree(&tree, 600, 3).unwrap();
        assert!(outcome.content.contains("entries elided]"));
    }

    #[test]
    fn test_line_depth() {
        assert_eq!(line_depth("project"), 0);
        assert_eq!(line_depth("├── src"), 1);
        assert_eq!(line_depth("│   ├── lib.rs"), 2);
        assert_eq!(line_depth("│   │   └── deep.rs"), 3);
    }
}
