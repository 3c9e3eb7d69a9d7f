//! JavaScript / TypeScript truncation strategy
//!
//! Splits the source into top-level blocks, scores them (exported >
//! default > class/interface > function > const > import), then emits the
//! imports followed by one stub comment per retained block. The output
//! never contains a half-open declaration.

use crate::TruncateOutcome;
use regex::Regex;
use std::sync::OnceLock;

static DECL_RE: OnceLock<Regex> = OnceLock::new();

fn decl_re() -> &'static Regex {
    DECL_RE.get_or_init(|| {
        Regex::new(
            r"^(?P<export>export\s+)?(?P<default>default\s+)?(?:async\s+)?(?P<kind>function|class|interface|type|enum|const|let|var|import)\b",
        )
        .unwrap()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Import,
    Class,
    Interface,
    Type,
    Enum,
    Function,
    Const,
}

impl BlockKind {
    fn label(self) -> &'static str {
        match self {
            BlockKind::Import => "IMPORT",
            BlockKind::Class => "CLASS",
            BlockKind::Interface => "INTERFACE",
            BlockKind::Type => "TYPE",
            BlockKind::Enum => "ENUM",
            BlockKind::Function => "FUNCTION",
            BlockKind::Const => "CONST",
        }
    }

    fn weight(self) -> u32 {
        match self {
            BlockKind::Class | BlockKind::Interface => 40,
            BlockKind::Type | BlockKind::Enum => 35,
            BlockKind::Function => 30,
            BlockKind::Const => 20,
            BlockKind::Import => 10,
        }
    }
}

#[derive(Debug)]
struct Block {
    kind: BlockKind,
    exported: bool,
    default: bool,
    start_line: usize,
    end_line: usize,
}

impl Block {
    fn score(&self) -> u32 {
        let mut score = self.kind.weight();
        if self.exported {
            score += 100;
        }
        if self.default {
            score += 50;
        }
        score
    }
}

pub(crate) fn truncate_code(text: &str, max_bytes: usize) -> TruncateOutcome {
    let lines: Vec<&str> = text.lines().collect();
    let (blocks, import_lines) = split_blocks(&lines);

    const TERMINATOR: &str = "// [TRUNCATED]";
    let mut out = String::new();

    // Imports first, bounded to a tenth of the budget.
    let import_budget = max_bytes / 10;
    let mut import_bytes = 0;
    for line in &import_lines {
        if import_bytes + line.len() + 1 > import_budget {
            break;
        }
        out.push_str(line);
        out.push('\n');
        import_bytes += line.len() + 1;
    }

    // Highest-scored blocks become stubs, emitted in source order.
    let mut ranked: Vec<&Block> = blocks.iter().filter(|b| b.kind != BlockKind::Import).collect();
    ranked.sort_by(|a, b| b.score().cmp(&a.score()).then(a.start_line.cmp(&b.start_line)));

    let reserve = TERMINATOR.len() + 1;
    let mut selected: Vec<&Block> = Vec::new();
    let mut used = out.len();
    for block in ranked {
        let stub = stub_line(block);
        if used + stub.len() + 1 + reserve > max_bytes {
            continue;
        }
        used += stub.len() + 1;
        selected.push(block);
    }
    selected.sort_by_key(|b| b.start_line);
    for block in selected {
        out.push_str(&stub_line(block));
        out.push('\n');
    }
    out.push_str(TERMINATOR);

    TruncateOutcome {
        final_size: out.len(),
        content: out,
        truncated: true,
        original_size: text.len(),
        syntax_valid: true,
        method: "code-blocks",
    }
}

fn stub_line(block: &Block) -> String {
    format!(
        "// {}: lines {}-{}",
        block.kind.label(),
        block.start_line + 1,
        block.end_line + 1
    )
}

/// Group lines into top-level blocks; continuation lines (indented or
/// blank) attach to the open block
fn split_blocks<'a>(lines: &[&'a str]) -> (Vec<Block>, Vec<&'a str>) {
    let mut blocks: Vec<Block> = Vec::new();
    let mut imports: Vec<&str> = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if let Some(caps) = decl_re().captures(line) {
            let kind = match caps.name("kind").map(|m| m.as_str()) {
                Some("import") => BlockKind::Import,
                Some("class") => BlockKind::Class,
                Some("interface") => BlockKind::Interface,
                Some("type") => BlockKind::Type,
                Some("enum") => BlockKind::Enum,
                Some("function") => BlockKind::Function,
                _ => BlockKind::Const,
            };
            if kind == BlockKind::Import {
                imports.push(line);
            }
            blocks.push(Block {
                kind,
                exported: caps.name("export").is_some(),
                default: caps.name("default").is_some(),
                start_line: i,
                end_line: i,
            });
        } else if let Some(open) = blocks.last_mut() {
            if !line.trim().is_empty() {
                open.end_line = i;
            }
        }
    }

    (blocks, imports)
}
