//! "Did you mean" suggestions for unresolved names

/// Compute Levenshtein edit distance between two strings
pub(crate) fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0usize; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Find up to three candidates within `max_distance` edits of `target`, closest first
pub(crate) fn find_similar<'a>(
    candidates: impl IntoIterator<Item = &'a str>,
    target: &str,
    max_distance: usize,
) -> Vec<String> {
    let mut scored: Vec<(usize, &str)> = candidates
        .into_iter()
        .filter_map(|name| {
            let dist = levenshtein_distance(name, target);
            (dist > 0 && dist <= max_distance).then_some((dist, name))
        })
        .collect();

    scored.sort();
    scored.dedup();
    scored
        .into_iter()
        .take(3)
        .map(|(_, name)| name.to_string())
        .collect()
}

/// Render suggestions as a trailing hint for error messages
pub(crate) fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", suggestions.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_same() {
        assert_eq!(levenshtein_distance("KFUpdator", "KFUpdator"), 0);
    }

    #[test]
    fn test_levenshtein_one_off() {
        assert_eq!(levenshtein_distance("KFFitter", "KFFiter"), 1);
        assert_eq!(levenshtein_distance("Chi2", "Chi3"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", ""), 3);
    }

    #[test]
    fn test_find_similar_orders_by_distance() {
        let names = ["KFSmoother", "KFFitter", "KFFittingSmoother", "DAFFitter"];
        let suggestions = find_similar(names, "KFFiter", 2);
        assert_eq!(suggestions[0], "KFFitter");
        assert!(!suggestions.contains(&"KFFittingSmoother".to_string()));
    }

    #[test]
    fn test_find_similar_excludes_exact_match() {
        let suggestions = find_similar(["Chi2"], "Chi2", 2);
        assert!(suggestions.is_empty());
    }

    #[test]
    fn test_format_suggestions() {
        assert_eq!(format_suggestions(&[]), "");
        assert_eq!(
            format_suggestions(&["a".to_string(), "b".to_string()]),
            " (did you mean: a, b?)"
        );
    }
}
