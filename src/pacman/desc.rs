//! Parser for the `%SECTION%` text format shared by `desc` and `files`.
use std::collections::HashMap;

#[derive(Debug, Default)]
pub(super) struct Sections {
    values: HashMap<String, Vec<String>>,
}

impl Sections {
    pub(super) fn parse(text: &str) -> Self {
        let mut values: HashMap<String, Vec<String>> = HashMap::new();
        let mut current: Option<String> = None;
        for line in text.lines() {
            if line.is_empty() {
                current = None;
                continue;
            }
            match &current {
                Some(key) => values.entry(key.clone()).or_default().push(line.to_string()),
                None => {
                    if let Some(key) = section_header(line) {
                        values.entry(key.to_string()).or_default();
                        current = Some(key.to_string());
                    }
                }
            }
        }
        Self { values }
    }

    pub(super) fn first(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub(super) fn all(&self, key: &str) -> &[String] {
        self.values.get(key).map(Vec::as_slice).unwrap_or_default()
    }
}

fn section_header(line: &str) -> Option<&str> {
    let key = line.strip_prefix('%')?.strip_suffix('%')?;
    (!key.is_empty()).then_some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multi_value_sections() {
        let sections = Sections::parse(
            "%NAME%\nbash\n\n%GROUPS%\nbase\nbase-devel\n\n%EMPTY%\n\n",
        );
        assert_eq!(sections.first("NAME"), Some("bash"));
        assert_eq!(sections.all("GROUPS"), ["base", "base-devel"]);
        assert!(sections.all("EMPTY").is_empty());
        assert_eq!(sections.first("MISSING"), None);
    }

    #[test]
    fn values_that_look_like_headers_stay_values() {
        let sections = Sections::parse("%DESC%\n%literal%\n\n");
        assert_eq!(sections.all("DESC"), ["%literal%"]);
    }
}
