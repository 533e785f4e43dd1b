use std::sync::LazyLock;

use regex::Regex;

use crate::compiled::RouteArgument;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{(.*?)\}").expect("valid regex"));

/// `{name}` placeholders of a route template, left to right. Duplicates are
/// kept.
pub fn route_arguments(route: &str) -> Vec<RouteArgument> {
    PLACEHOLDER
        .captures_iter(route)
        .filter_map(|c| c.get(1))
        .map(|m| RouteArgument { name: m.as_str().to_string() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(route: &str) -> Vec<String> {
        route_arguments(route).into_iter().map(|a| a.name).collect()
    }

    #[test]
    fn extracts_in_order() {
        assert_eq!(names("/user/{id}/post/{postId}"), ["id", "postId"]);
    }

    #[test]
    fn keeps_duplicates() {
        assert_eq!(names("/{a}/{a}"), ["a", "a"]);
    }

    #[test]
    fn no_placeholders() {
        assert!(names("/welcome").is_empty());
        assert!(names("").is_empty());
    }

    #[test]
    fn non_greedy() {
        assert_eq!(names("/{a}-{b}"), ["a", "b"]);
        assert_eq!(names("/{}"), [""]);
    }
}
