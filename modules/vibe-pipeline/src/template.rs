use std::collections::HashMap;

/// Fill `{{name}}` placeholders from `vars`.
///
/// Unknown names are left in place. An unclosed `{{` is emitted as-is.
pub fn render(template: &str, vars: &HashMap<&str, &str>) -> String {
    let mut result = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '{' || chars.peek() != Some(&'{') {
            result.push(c);
            continue;
        }
        chars.next();

        let mut name = String::new();
        let mut closed = false;
        while let Some(ch) = chars.next() {
            if ch == '}' && chars.peek() == Some(&'}') {
                chars.next();
                closed = true;
                break;
            }
            name.push(ch);
        }

        if !closed {
            result.push_str("{{");
            result.push_str(&name);
            return result;
        }

        match vars.get(name.trim()) {
            Some(value) => result.push_str(value),
            None => {
                result.push_str("{{");
                result.push_str(name.trim());
                result.push_str("}}");
            }
        }
    }

    result
}

/// Placeholder names in order of first appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else { break };
        let name = after[..end].trim().to_string();
        if !names.contains(&name) {
            names.push(name);
        }
        rest = &after[end + 2..];
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_known_vars() {
        let result = render(
            "Kind: {{kind}}\n{{ payload }}",
            &HashMap::from([("kind", "sentiment"), ("payload", "[]")]),
        );
        assert_eq!(result, "Kind: sentiment\n[]");
    }

    #[test]
    fn leaves_unknown_vars() {
        let result = render("{{kind}} {{other}}", &HashMap::from([("kind", "video")]));
        assert_eq!(result, "video {{other}}");
    }

    #[test]
    fn values_are_not_rescanned() {
        let result = render("{{payload}}", &HashMap::from([("payload", "{{kind}}")]));
        assert_eq!(result, "{{kind}}");
    }

    #[test]
    fn unclosed_placeholder_is_emitted() {
        let result = render("start {{kind", &HashMap::from([("kind", "video")]));
        assert_eq!(result, "start {{kind");
    }

    #[test]
    fn lists_placeholders() {
        assert_eq!(
            placeholders("{{kind}} then {{payload}} and {{kind}}"),
            vec!["kind", "payload"]
        );
        assert!(placeholders("no vars {{ open").is_empty());
    }
}
