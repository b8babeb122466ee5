// Template Substitution
// Python str.format style placeholders: {name} is replaced through a lookup,
// {{ and }} are literal braces.

/// Substitute `{name}` placeholders in `template` using `lookup`.
///
/// Returns the unresolved placeholder name on failure so callers can attach
/// their own context.
pub fn format_template<F>(template: &str, lookup: F) -> Result<String, String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed {
                    return Err(name);
                }
                match lookup(&name) {
                    Some(value) => out.push_str(&value),
                    None => return Err(name),
                }
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                }
                out.push('}');
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "x" => Some("1".to_string()),
            "name" => Some("spam".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_simple_substitution() {
        assert_eq!(format_template("echo {x}", lookup).unwrap(), "echo 1");
        assert_eq!(
            format_template("{name}-{x}.out", lookup).unwrap(),
            "spam-1.out"
        );
    }

    #[test]
    fn test_escaped_braces() {
        assert_eq!(
            format_template("awk '{{print $1}}' {name}", lookup).unwrap(),
            "awk '{print $1}' spam"
        );
    }

    #[test]
    fn test_unbound_placeholder() {
        assert_eq!(
            format_template("echo {missing}", lookup),
            Err("missing".to_string())
        );
    }

    #[test]
    fn test_unterminated_placeholder() {
        assert!(format_template("echo {x", lookup).is_err());
    }
}
