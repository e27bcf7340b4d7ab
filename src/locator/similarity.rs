//! Fuzzy text similarity

/// Lower-cased, trimmed form both sides are compared in
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Unit-cost edit distance over Unicode scalar values
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// Score in `[0, 1]`: 1.0 for equal text, 0.9 when one contains the other,
/// otherwise one minus the edit distance over the longer length.
/// Text that is empty after trimming scores 0.0 rather than counting as contained.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    if a.contains(&b) || b.contains(&a) {
        return 0.9;
    }

    let longest = a.chars().count().max(b.chars().count());
    1.0 - levenshtein(&a, &b) as f64 / longest as f64
}
