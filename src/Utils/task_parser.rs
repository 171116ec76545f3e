/// parse a settings document with structure like " solver max_depth: 200 allow_newton: true newton iterations: 30 "
/// which has section titles followed by pairs key-list of values, into a `SettingsDocument`.
/// Lines starting with //, # or % are comments.
///
/// # Example
/// ```
/// use RustedSymSolve::Utils::task_parser::SettingsDocument;
/// let doc = SettingsDocument::parse("solver\n max_depth: 100\n loglevel: debug").unwrap();
/// assert_eq!(doc.get_usize("solver", "max_depth").unwrap(), Some(100));
/// ```
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{alpha1, alphanumeric1, multispace0, space0},
    combinator::{map, recognize},
    multi::{many0, many1, separated_list1},
    sequence::{delimited, pair, separated_pair, terminated},
};
use std::collections::HashMap;
use std::fmt::Display;

type SectionMap = HashMap<String, Vec<Value>>;
type DocumentMap = HashMap<String, SectionMap>;

/// enum to represent different value types:
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Float(f64),
    Integer(i64),
    Boolean(bool),
}

impl Value {
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        if let Value::Integer(i) = self {
            Some(*i)
        } else {
            None
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        if let Value::Boolean(b) = self {
            Some(*b)
        } else {
            None
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Float(val) => write!(f, "{}", val),
            Value::Integer(val) => write!(f, "{}", val),
            Value::Boolean(val) => write!(f, "{}", val),
        }
    }
}

/// word made of letters, digits and underscores, starting with a letter or underscore
fn parse_word(input: &str) -> IResult<&str, String> {
    let parser = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ));
    map(parser, String::from).parse(input)
}

fn parse_value(input: &str) -> IResult<&str, Value> {
    // a value runs until a separator, whitespace or the end of the line
    let raw = take_while1(|c: char| !matches!(c, ',' | ' ' | '\t' | '\n' | '\r' | ';'));
    map(raw, |s: &str| {
        if let Ok(val) = s.parse::<i64>() {
            Value::Integer(val)
        } else if let Ok(val) = s.parse::<f64>() {
            Value::Float(val)
        } else if let Ok(val) = s.parse::<bool>() {
            Value::Boolean(val)
        } else {
            Value::String(s.to_string())
        }
    })
    .parse(input)
}

/// key: value1, value2
fn parse_key_value_pair(input: &str) -> IResult<&str, (String, Vec<Value>)> {
    let colon = delimited(space0, tag(":"), space0);
    let comma = delimited(space0, tag(","), space0);
    let mut parser = separated_pair(parse_word, colon, separated_list1(comma, parse_value));
    let (input, result) = parser.parse(input)?;
    Ok((input, result))
}

/// section title followed by one or more key-value pairs
fn parse_section(input: &str) -> IResult<&str, (String, SectionMap)> {
    let (input, title) = terminated(parse_word, multispace0).parse(input)?;
    let mut pairs = many1(terminated(parse_key_value_pair, multispace0));
    let (input, pairs) = pairs.parse(input)?;
    Ok((input, (title, pairs.into_iter().collect())))
}

/// drops comment lines (starting with //, # or %) and blank lines
fn filter_comments(input: &str) -> String {
    input
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("//")
                && !trimmed.starts_with('#')
                && !trimmed.starts_with('%')
                && !trimmed.is_empty()
        })
        .collect::<Vec<&str>>()
        .join("\n")
}

fn parse_document(input: &str) -> IResult<&str, DocumentMap> {
    let mut parser = many1(delimited(multispace0, parse_section, multispace0));
    let (input, sections) = parser.parse(input)?;
    let mut result: DocumentMap = HashMap::new();
    for (title, section) in sections {
        result.entry(title).or_default().extend(section);
    }
    Ok((input, result))
}

/// Parsed settings document: section title -> key -> values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsDocument {
    pub sections: DocumentMap,
}

impl SettingsDocument {
    /// parses the whole text; an empty document gives an empty map
    pub fn parse(input: &str) -> Result<SettingsDocument, String> {
        let filtered = filter_comments(input);
        if filtered.trim().is_empty() {
            return Ok(SettingsDocument::default());
        }
        match parse_document(&filtered) {
            Ok((remaining, sections)) => {
                if !remaining.trim().is_empty() {
                    return Err(format!(
                        "Failed to parse entire document. Remaining: '{}'",
                        remaining
                    ));
                }
                Ok(SettingsDocument { sections })
            }
            Err(e) => Err(format!("Parsing error: {:?}", e)),
        }
    }

    /// first value stored under `section.key`
    pub fn get(&self, section: &str, key: &str) -> Option<&Value> {
        self.sections.get(section)?.get(key)?.first()
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    /// names of keys in a section that are not in `known`
    pub fn unknown_keys(&self, section: &str, known: &[&str]) -> Vec<String> {
        let mut unknown: Vec<String> = self
            .sections
            .get(section)
            .map(|s| s.keys().filter(|k| !known.contains(&k.as_str())).cloned().collect())
            .unwrap_or_default();
        unknown.sort();
        unknown
    }

    pub fn get_f64(&self, section: &str, key: &str) -> Result<Option<f64>, String> {
        self.typed(section, key, "a number", Value::as_float)
    }

    pub fn get_usize(&self, section: &str, key: &str) -> Result<Option<usize>, String> {
        self.typed(section, key, "a non-negative integer", |v| {
            v.as_integer().and_then(|i| usize::try_from(i).ok())
        })
    }

    pub fn get_i64(&self, section: &str, key: &str) -> Result<Option<i64>, String> {
        self.typed(section, key, "an integer", Value::as_integer)
    }

    pub fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>, String> {
        self.typed(section, key, "true or false", Value::as_boolean)
    }

    pub fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.get(section, key).map(|v| v.to_string())
    }

    fn typed<T>(
        &self,
        section: &str,
        key: &str,
        expected: &str,
        convert: impl Fn(&Value) -> Option<T>,
    ) -> Result<Option<T>, String> {
        match self.get(section, key) {
            None => Ok(None),
            Some(value) => convert(value).map(Some).ok_or_else(|| {
                format!("{}.{} must be {}, found '{}'", section, key, expected, value)
            }),
        }
    }
}
