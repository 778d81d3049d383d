//! "Did you mean?" diagnostics for missing variable/function/tag names.

/// Levenshtein edit distance between two strings, measured in chars.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (n, m) = (a.len(), b.len());
    let mut prev: Vec<usize> = (0..=m).collect();
    let mut curr = vec![0usize; m + 1];
    for i in 1..=n {
        curr[0] = i;
        for j in 1..=m {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[m]
}

fn max_distance(target: &str) -> usize {
    2.max(target.chars().count() / 2)
}

/// Up to `limit` candidates within edit distance of `target`, sorted
/// ascending by distance then by name.
pub fn find_similar(target: &str, candidates: &[String], limit: usize) -> Vec<String> {
    let threshold = max_distance(target);
    let mut scored: Vec<(usize, &String)> = candidates
        .iter()
        .map(|c| (edit_distance(target, c), c))
        .filter(|(d, _)| *d <= threshold)
        .collect();
    scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    scored.into_iter().take(limit).map(|(_, c)| c.clone()).collect()
}

/// A diagnostic suffix: either a short "did you mean x, y?" list, or a
/// fallback listing of available keys capped at 5 with a "(N more)" tail.
pub fn suggest(target: &str, candidates: &[String]) -> Option<String> {
    if candidates.is_empty() {
        return None;
    }
    let near = find_similar(target, candidates, 3);
    if !near.is_empty() {
        return Some(format!("did you mean {}?", near.join(", ")));
    }
    let mut sorted: Vec<&String> = candidates.iter().collect();
    sorted.sort();
    let shown: Vec<&str> = sorted.iter().take(5).map(|s| s.as_str()).collect();
    let remaining = sorted.len().saturating_sub(shown.len());
    let mut msg = format!("available: {}", shown.join(", "));
    if remaining > 0 {
        msg.push_str(&format!(" ({} more)", remaining));
    }
    Some(msg)
}
