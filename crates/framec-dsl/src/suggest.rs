//! "Did you mean" support: edit distance and nearest-name lookup.

/// Candidates further away than this are never suggested.
pub const MAX_SUGGESTION_DISTANCE: usize = 3;
/// At most this many names are suggested.
pub const MAX_SUGGESTIONS: usize = 3;

/// Levenshtein distance over `char`s.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Single rolling row.
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut diag = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            let next = (row[j + 1] + 1).min(row[j] + 1).min(diag + cost);
            diag = row[j + 1];
            row[j + 1] = next;
        }
    }
    row[b.len()]
}

/// Names from `candidates` within [`MAX_SUGGESTION_DISTANCE`] of `target`
/// (compared case-insensitively), closest first. Ties keep the order in which
/// the candidates were given.
pub fn similar_names<'c, I>(target: &str, candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = &'c str>,
{
    let target = target.to_lowercase();
    let mut scored: Vec<(usize, &str)> = candidates
        .into_iter()
        .map(|c| (levenshtein(&target, &c.to_lowercase()), c))
        .filter(|(score, _)| *score <= MAX_SUGGESTION_DISTANCE)
        .collect();
    // stable sort keeps first-found order among equal scores
    scored.sort_by_key(|(score, _)| *score);
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, name)| name.to_string())
        .collect()
}

/// Render suggestions as a single "Did you mean ..." sentence.
pub fn did_you_mean(names: &[String]) -> Option<String> {
    match names {
        [] => None,
        [only] => Some(format!("Did you mean '{only}'?")),
        [init @ .., last] => {
            let head: Vec<String> = init.iter().map(|n| format!("'{n}'")).collect();
            Some(format!("Did you mean {} or '{last}'?", head.join(", ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_basics() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("", "ab"), 2);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("nope", "note"), 1);
        assert_eq!(levenshtein("route", "route"), 0);
    }

    #[test]
    fn similar_names_orders_by_distance() {
        let names = similar_names("nme", ["route", "name", "nam"]);
        assert_eq!(names, vec!["name".to_string(), "nam".to_string()]);
    }

    #[test]
    fn ties_keep_first_found_order() {
        let names = similar_names("ab", ["ax", "ay", "az", "aw"]);
        assert_eq!(names, vec!["ax", "ay", "az"]);
    }

    #[test]
    fn comparison_ignores_case() {
        assert_eq!(similar_names("KEYTYPE", ["keyType"]), vec!["keyType"]);
    }

    #[test]
    fn far_names_are_dropped() {
        assert!(similar_names("visibility", ["a", "b"]).is_empty());
    }

    #[test]
    fn did_you_mean_sentences() {
        assert_eq!(did_you_mean(&[]), None);
        assert_eq!(did_you_mean(&["note".into()]).as_deref(), Some("Did you mean 'note'?"));
        assert_eq!(
            did_you_mean(&["a".into(), "b".into(), "c".into()]).as_deref(),
            Some("Did you mean 'a', 'b' or 'c'?")
        );
    }
}
