//! Display-name parsing for registration.

/// Split a free-form display name into structured first/last name parts.
///
/// One token yields a first name only; two tokens map onto first and last;
/// with more tokens the first one is the first name and the remainder joins
/// into the last name. Surrounding and repeated whitespace is ignored.
pub fn split_display_name(name: &str) -> (String, Option<String>) {
    let mut tokens = name.split_whitespace();
    let first = match tokens.next() {
        Some(t) => t.to_string(),
        None => return (String::new(), None),
    };
    let rest: Vec<&str> = tokens.collect();
    if rest.is_empty() {
        (first, None)
    } else {
        (first, Some(rest.join(" ")))
    }
}

#[cfg(test)]
mod tests {
    use super::split_display_name;

    #[test]
    fn single_token_is_first_name_only() {
        assert_eq!(split_display_name("Ada"), ("Ada".into(), None));
    }

    #[test]
    fn two_tokens_split_into_first_and_last() {
        assert_eq!(
            split_display_name("Ada Lovelace"),
            ("Ada".into(), Some("Lovelace".into()))
        );
    }

    #[test]
    fn extra_tokens_join_into_last_name() {
        assert_eq!(
            split_display_name("Juan de la Cierva"),
            ("Juan".into(), Some("de la Cierva".into()))
        );
    }

    #[test]
    fn whitespace_is_normalized() {
        assert_eq!(
            split_display_name("  Ada   Lovelace  "),
            ("Ada".into(), Some("Lovelace".into()))
        );
    }

    #[test]
    fn empty_input_yields_empty_first_name() {
        assert_eq!(split_display_name("   "), (String::new(), None));
    }
}
