//! Layout clean-up applied when saving from scripted edits.
//!
//! Only whitespace changes: trailing whitespace is stripped, leading blank
//! lines are removed, runs of blank lines collapse to one, every section
//! after the first is separated from what precedes it by a blank line (placed
//! above any comment lines directly attached to the header), and the text
//! ends with exactly one newline.

/// Clean up the layout of rendered hgrc text. Output always uses `\n`.
pub fn tidy(content: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();

    for line in content.lines() {
        let line = line.trim_end_matches([' ', '\t', '\r']);
        let blank = line.trim().is_empty();

        // Leading blank lines and runs of blank lines
        if blank && lines.last().map_or(true, |prev| prev.is_empty()) {
            continue;
        }

        if is_header(line) {
            separate_section(&mut lines);
        }

        lines.push(if blank { "" } else { line });
    }

    normalize_eof_newline(&lines.join("\n"))
}

/// Indented lines are continuations, never headers.
fn is_header(line: &str) -> bool {
    line.starts_with('[') && line.contains(']')
}

fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with(['#', ';'])
}

fn separate_section(lines: &mut Vec<&str>) {
    let mut at = lines.len();
    while at > 0 && is_comment(lines[at - 1]) {
        at -= 1;
    }
    if at > 0 && !lines[at - 1].is_empty() {
        lines.insert(at, "");
    }
}

fn normalize_eof_newline(content: &str) -> String {
    let trimmed = content.trim_end_matches('\n');
    if trimmed.is_empty() {
        return String::new();
    }
    format!("{trimmed}\n")
}
