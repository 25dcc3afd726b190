use crate::error::DomainError;

/// A string with `{name}` substitution points.
///
/// `{{` and `}}` stand for literal braces, so regular expressions in rule
/// definitions write quantifiers as `\d{{3}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Var(String),
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, DomainError> {
        let err = |message: &str| DomainError::Template {
            template: source.to_string(),
            message: message.to_string(),
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') => return Err(err("nested '{' in variable name")),
                            Some(ch) => name.push(ch),
                            None => return Err(err("unterminated '{'")),
                        }
                    }
                    if name.is_empty() {
                        return Err(err("empty variable name"));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Var(name));
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(err("single '}' encountered")),
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Variable names in order of appearance (duplicates included).
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Var(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Substitutes every variable through `lookup`.
    ///
    /// An unknown variable is an error, never an empty substitution.
    pub fn render<'a>(
        &self,
        lookup: impl Fn(&str) -> Option<&'a str>,
    ) -> Result<String, DomainError> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Var(name) => match lookup(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        return Err(DomainError::Template {
                            template: self.source.clone(),
                            message: format!("unknown variable {{{name}}}"),
                        });
                    }
                },
            }
        }
        Ok(out)
    }

    /// Parses and renders `source` against name/value pairs.
    pub fn expand(source: &str, vars: &[(&str, &str)]) -> Result<String, DomainError> {
        Template::parse(source)?.render(|name| {
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| *value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn substitutes_variables() {
        let out = Template::expand("--rcfile={REPO_HOME}/.pylintrc", &[("REPO_HOME", "/repo")]);
        assert_eq!(out.unwrap(), "--rcfile=/repo/.pylintrc");
    }

    #[test]
    fn doubled_braces_are_literal() {
        let out = Template::expand("--msg-template={{path}}:{{line}}", &[]).unwrap();
        assert_eq!(out, "--msg-template={path}:{line}");
    }

    #[test]
    fn lists_variables_in_order() {
        let t = Template::parse(r"^{filename}:(?P<line>{lines}):\d{{2}}").unwrap();
        assert_eq!(t.variables().collect::<Vec<_>>(), vec!["filename", "lines"]);
    }

    #[test]
    fn unknown_variable_is_an_error() {
        let err = Template::expand("{NOPE}", &[]).unwrap_err();
        assert!(err.to_string().contains("unknown variable {NOPE}"));
    }

    #[test]
    fn malformed_templates_rejected() {
        assert!(Template::parse("{unterminated").is_err());
        assert!(Template::parse("stray }").is_err());
        assert!(Template::parse("{}").is_err());
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(Template::expand("--in-place", &[]).unwrap(), "--in-place");
        assert_eq!(Template::expand("", &[]).unwrap(), "");
    }
}
