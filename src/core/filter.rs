// FollowDiff - core/filter.rs
//
// Search over the computed non-follower list.
// Core layer: pure logic, never mutates or re-orders its input.

use crate::core::model::Username;

/// Return the entries of `list` containing `substring` (case-insensitive),
/// in the same order as `list`.
///
/// An empty substring matches everything.
pub fn filter_usernames<'a>(list: &'a [Username], substring: &str) -> Vec<&'a Username> {
    if substring.is_empty() {
        return list.iter().collect();
    }

    // Stored usernames are already lowercase, so only the needle needs folding.
    let needle = substring.to_lowercase();
    list.iter()
        .filter(|username| username.as_str().contains(needle.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(names: &[&str]) -> Vec<Username> {
        names.iter().filter_map(|n| Username::new(n)).collect()
    }

    fn as_strs<'a>(v: &[&'a Username]) -> Vec<&'a str> {
        v.iter().map(|u| u.as_str()).collect()
    }

    #[test]
    fn test_empty_substring_returns_all() {
        let names = list(&["carl", "amy", "bob"]);
        assert_eq!(as_strs(&filter_usernames(&names, "")), vec!["carl", "amy", "bob"]);
    }

    #[test]
    fn test_substring_is_case_insensitive_and_keeps_order() {
        let names = list(&["zbob", "bobby", "amy", "abo"]);
        assert_eq!(
            as_strs(&filter_usernames(&names, "BO")),
            vec!["zbob", "bobby", "abo"]
        );
    }

    #[test]
    fn test_no_match_returns_empty() {
        let names = list(&["amy", "bob"]);
        assert!(filter_usernames(&names, "xyz").is_empty());
    }
}
