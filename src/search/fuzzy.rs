//! Approximate substring matching
//!
//! A pattern matches a text when some substring of the text is within a few
//! edits of the pattern. Edits are insertions, deletions, substitutions and
//! adjacent transpositions. The score is the edit count divided by the pattern
//! length: 0.0 is an exact substring, 1.0 and above means no useful match.

/// Lowercased char buffer, compared char by char
pub fn prepare(text: &str) -> Vec<char> {
    text.chars().flat_map(char::to_lowercase).collect()
}

/// Fewest edits turning `pattern` into any substring of `text`
pub fn substring_distance(pattern: &[char], text: &[char]) -> usize {
    let m = pattern.len();
    if m == 0 {
        return 0;
    }

    // Columns j-2, j-1 and j of the edit matrix; row 0 is free so a match may
    // start anywhere in the text
    let mut before: Vec<usize> = (0..=m).collect();
    let mut prev: Vec<usize> = (0..=m).collect();
    let mut cur = vec![0; m + 1];
    let mut best = m;

    for (j, &tc) in text.iter().enumerate() {
        cur[0] = 0;
        for i in 1..=m {
            let cost = usize::from(pattern[i - 1] != tc);
            let mut d = (prev[i - 1] + cost).min(prev[i] + 1).min(cur[i - 1] + 1);
            if i > 1 && j > 0 && pattern[i - 1] == text[j - 1] && pattern[i - 2] == tc {
                d = d.min(before[i - 2] + 1);
            }
            cur[i] = d;
        }
        best = best.min(cur[m]);
        std::mem::swap(&mut before, &mut prev);
        std::mem::swap(&mut prev, &mut cur);
    }
    best
}

/// Normalized score of `pattern` against `text`
pub fn score(pattern: &[char], text: &[char]) -> f64 {
    if pattern.is_empty() {
        return 0.0;
    }
    substring_distance(pattern, text) as f64 / pattern.len() as f64
}
