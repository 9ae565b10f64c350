use similar::{ChangeTag, TextDiff};

/// Unified diff between two renderings of a file, with three lines of context.
pub fn unified_diff(label: &str, original: &str, content: &str) -> String {
    let diff = TextDiff::from_lines(original, content);
    let mut out = format!("--- {label}\n+++ {label}\n");

    for (idx, group) in diff.grouped_ops(3).iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }

        for op in group {
            for change in diff.iter_changes(op) {
                let sign = match change.tag() {
                    ChangeTag::Delete => '-',
                    ChangeTag::Insert => '+',
                    ChangeTag::Equal => ' ',
                };
                out.push(sign);
                out.push_str(change.value());
                if change.missing_newline() {
                    out.push('\n');
                }
            }
        }
    }

    out
}
