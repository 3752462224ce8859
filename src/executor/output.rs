//! Shaping of captured tool output for error messages.

const MAX_LINE_CHARS: usize = 200;
const MAX_EXCERPT_BYTES: usize = 1000;

/// The last `max_lines` non-blank lines of `output`, each clipped to a
/// readable width.
///
/// Tools like openssl print the actual reason for a failure last, after
/// any progress noise, so the tail is what ends up in the step failure.
pub fn tail_excerpt(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().filter(|l| !l.trim().is_empty()).collect();
    let skipped = lines.len().saturating_sub(max_lines);

    let mut excerpt = String::new();
    if skipped > 0 {
        excerpt.push_str(&format!("[{} earlier line(s) omitted]", skipped));
    }

    for line in &lines[skipped..] {
        let clipped = clip(line);
        if excerpt.len() + clipped.len() > MAX_EXCERPT_BYTES {
            excerpt.push_str("\n[truncated]");
            break;
        }
        if !excerpt.is_empty() {
            excerpt.push('\n');
        }
        excerpt.push_str(&clipped);
    }

    excerpt
}

fn clip(line: &str) -> String {
    match line.char_indices().nth(MAX_LINE_CHARS) {
        Some((idx, _)) => format!("{}...", &line[..idx]),
        None => line.to_string(),
    }
}
