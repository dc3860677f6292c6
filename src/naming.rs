//! Collection naming: type name -> plural, lower-case collection name.

/// Suffixes that take "es" rather than "s".
const ES_SUFFIXES: &[&str] = &["s", "sh", "ch", "x", "z"];

/// Derive a collection name from a type name.
///
/// Accepts qualified names in either `models.Todo` or `crate::models::Todo` form, optionally
/// wrapped once in a pointer marker (`*`) and then once in a list marker (`[]`).
/// "*models.Todo" -> "todos", "*[]models.Box" -> "boxes".
pub fn pluralize(type_name: &str) -> String {
    let stripped = type_name.strip_prefix('*').unwrap_or(type_name);
    let stripped = stripped.strip_prefix("[]").unwrap_or(stripped);
    let noun = last_segment(stripped).to_lowercase();
    if ES_SUFFIXES.iter().any(|end| noun.ends_with(end)) {
        format!("{}es", noun)
    } else {
        format!("{}s", noun)
    }
}

fn last_segment(path: &str) -> &str {
    let after_dot = path.rsplit('.').next().unwrap_or(path);
    after_dot.rsplit("::").next().unwrap_or(after_dot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::pointer("*models.Todo", "todos")]
    #[case::pointer_slice("*[]models.Todo", "todos")]
    #[case::base("models.Todo", "todos")]
    #[case::es_suffix("*models.Box", "boxes")]
    #[case::package("main.Box", "boxes")]
    #[case::rust_path("crate::models::Todo", "todos")]
    #[case::unqualified("Church", "churches")]
    #[case::sh("models.Wish", "wishes")]
    #[case::z("models.Quiz", "quizes")]
    #[case::trailing_s("models.Status", "statuses")]
    #[case::slice_only("[]models.Todo", "todos")]
    fn pluralizes_type_names(#[case] input: &str, #[case] want: &str) {
        assert_eq!(pluralize(input), want);
    }

    #[rstest]
    #[case("models.Todo")]
    #[case("main.Box")]
    #[case("Person")]
    fn wrapper_forms_share_a_collection(#[case] name: &str) {
        let plain = pluralize(name);
        assert_eq!(pluralize(&format!("*{}", name)), plain);
        assert_eq!(pluralize(&format!("[]{}", name)), plain);
    }

    #[test]
    fn list_inside_pointer_only() {
        // Pointer is stripped before list, so a pointer inside a list survives.
        assert_eq!(pluralize("[]*Todo"), "*todos");
    }

    #[test]
    fn empty_name_yields_bare_suffix() {
        assert_eq!(pluralize(""), "s");
    }
}
