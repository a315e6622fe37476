//! ISO 10303-21 (STEP physical file) reader.
//!
//! Only the parts IFC files use: the `FILE_SCHEMA` header entry and simple
//! entity instances in the `DATA` section. Instances may span several lines.

use std::collections::{BTreeMap, HashMap};
use std::iter::Peekable;
use std::str::Chars;

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum StepValue {
    String(String),
    Real(f64),
    Integer(i64),
    Boolean(bool),
    Enum(String),
    Reference(u64),
    List(Vec<StepValue>),
    /// Typed value such as `IFCLABEL('x')`.
    Typed(String, Box<StepValue>),
    Null,
    Derived,
}

impl StepValue {
    /// Text content, looking through a typed wrapper.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StepValue::String(s) => Some(s),
            StepValue::Typed(_, inner) => inner.as_str(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_reference(&self) -> Option<u64> {
        match self {
            StepValue::Reference(id) => Some(*id),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StepValue::Real(f) => Some(*f),
            StepValue::Integer(i) => Some(*i as f64),
            StepValue::Typed(_, inner) => inner.as_f64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[StepValue]> {
        match self {
            StepValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// References held by this value: itself, or the members of a list.
    #[must_use]
    pub fn references(&self) -> Vec<u64> {
        match self {
            StepValue::Reference(id) => vec![*id],
            StepValue::List(items) => items.iter().filter_map(StepValue::as_reference).collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepEntity {
    pub id: u64,
    /// Upper-case entity name as written in the file, e.g. `IFCPUMP`.
    pub entity_type: String,
    pub values: Vec<StepValue>,
}

impl StepEntity {
    #[must_use]
    pub fn value(&self, index: usize) -> Option<&StepValue> {
        self.values.get(index)
    }

    #[must_use]
    pub fn is(&self, entity_type: &str) -> bool {
        self.entity_type.eq_ignore_ascii_case(entity_type)
    }
}

#[derive(Debug, Default)]
pub struct StepFile {
    pub schema: String,
    entities: BTreeMap<u64, StepEntity>,
    by_type: HashMap<String, Vec<u64>>,
}

impl StepFile {
    pub fn parse(content: &str) -> Result<Self, ParseError> {
        let mut file = StepFile::default();
        let mut in_data = false;
        let mut seen_data = false;

        for statement in statements(content) {
            if !in_data {
                if statement.starts_with("FILE_SCHEMA") {
                    file.schema = first_quoted(&statement).unwrap_or_default();
                } else if statement == "DATA" {
                    in_data = true;
                    seen_data = true;
                }
                continue;
            }
            if statement == "ENDSEC" {
                in_data = false;
                continue;
            }
            if let Some(entity) = parse_instance(&statement) {
                file.insert(entity);
            }
        }

        if !seen_data {
            return Err(ParseError::InvalidStep {
                message: "no DATA section".to_string(),
            });
        }
        Ok(file)
    }

    fn insert(&mut self, entity: StepEntity) {
        self.by_type
            .entry(entity.entity_type.to_ascii_uppercase())
            .or_default()
            .push(entity.id);
        self.entities.insert(entity.id, entity);
    }

    #[must_use]
    pub fn get_entity(&self, id: u64) -> Option<&StepEntity> {
        self.entities.get(&id)
    }

    /// Entities of one type in file order of their ids.
    #[must_use]
    pub fn get_entities_by_type(&self, entity_type: &str) -> Vec<&StepEntity> {
        let Some(ids) = self.by_type.get(&entity_type.to_ascii_uppercase()) else {
            return Vec::new();
        };
        let mut ids = ids.clone();
        ids.sort_unstable();
        ids.iter().filter_map(|id| self.entities.get(id)).collect()
    }

    /// All entities in ascending id order.
    pub fn entities(&self) -> impl Iterator<Item = &StepEntity> {
        self.entities.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Splits the file into `;`-terminated statements, ignoring `;` inside
/// strings and dropping `/* */` comments. Whitespace outside strings is
/// collapsed away.
fn statements(content: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_string {
            current.push(ch);
            if ch == '\'' {
                if chars.peek() == Some(&'\'') {
                    current.push('\'');
                    chars.next();
                } else {
                    in_string = false;
                }
            }
            continue;
        }
        match ch {
            '\'' => {
                in_string = true;
                current.push(ch);
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut last = '\0';
                for c in chars.by_ref() {
                    if last == '*' && c == '/' {
                        break;
                    }
                    last = c;
                }
            }
            ';' => {
                let statement = current.trim();
                if !statement.is_empty() {
                    out.push(statement.to_string());
                }
                current.clear();
            }
            c if c.is_whitespace() => {}
            c => current.push(c),
        }
    }

    out
}

fn first_quoted(statement: &str) -> Option<String> {
    let start = statement.find('\'')? + 1;
    let end = statement[start..].find('\'')? + start;
    Some(statement[start..end].to_string())
}

// #123=IFCWALL('guid',#5,'name',$);
fn parse_instance(statement: &str) -> Option<StepEntity> {
    let rest = statement.strip_prefix('#')?;
    let (id, rest) = rest.split_once('=')?;
    let id = id.parse().ok()?;
    let paren = rest.find('(')?;
    let entity_type = rest[..paren].to_string();
    if entity_type.is_empty() {
        return None;
    }

    let mut chars = rest[paren..].chars().peekable();
    let StepValue::List(values) = parse_value(&mut chars)? else {
        return None;
    };
    Some(StepEntity {
        id,
        entity_type,
        values,
    })
}

fn parse_value(chars: &mut Peekable<Chars<'_>>) -> Option<StepValue> {
    match *chars.peek()? {
        '(' => {
            chars.next();
            let mut items = Vec::new();
            if chars.peek() == Some(&')') {
                chars.next();
                return Some(StepValue::List(items));
            }
            loop {
                items.push(parse_value(chars)?);
                match chars.next()? {
                    ',' => {}
                    ')' => return Some(StepValue::List(items)),
                    _ => return None,
                }
            }
        }
        '\'' => {
            chars.next();
            let mut raw = String::new();
            loop {
                let c = chars.next()?;
                if c == '\'' {
                    if chars.peek() == Some(&'\'') {
                        chars.next();
                        raw.push('\'');
                    } else {
                        break;
                    }
                } else {
                    raw.push(c);
                }
            }
            Some(StepValue::String(decode_step_string(&raw)))
        }
        '$' => {
            chars.next();
            Some(StepValue::Null)
        }
        '*' => {
            chars.next();
            Some(StepValue::Derived)
        }
        '#' => {
            chars.next();
            let digits = take_while(chars, |c| c.is_ascii_digit());
            digits.parse().ok().map(StepValue::Reference)
        }
        '.' => {
            chars.next();
            let inner = take_while(chars, |c| c != '.');
            chars.next();
            Some(match inner.as_str() {
                "T" => StepValue::Boolean(true),
                "F" => StepValue::Boolean(false),
                _ => StepValue::Enum(inner),
            })
        }
        c if c.is_ascii_alphabetic() => {
            let name = take_while(chars, |c| c.is_ascii_alphanumeric() || c == '_');
            if chars.peek() != Some(&'(') {
                return Some(StepValue::Enum(name));
            }
            let StepValue::List(mut args) = parse_value(chars)? else {
                return None;
            };
            let inner = if args.len() == 1 {
                args.pop()?
            } else {
                StepValue::List(args)
            };
            Some(StepValue::Typed(name, Box::new(inner)))
        }
        _ => {
            let token = take_while(chars, |c| c != ',' && c != ')');
            if let Ok(i) = token.parse::<i64>() {
                Some(StepValue::Integer(i))
            } else {
                token.parse::<f64>().ok().map(StepValue::Real)
            }
        }
    }
}

fn take_while(chars: &mut Peekable<Chars<'_>>, keep: impl Fn(char) -> bool) -> String {
    let mut out = String::new();
    while let Some(&c) = chars.peek() {
        if !keep(c) {
            break;
        }
        out.push(c);
        chars.next();
    }
    out
}

/// Decodes the control directives of a STEP string (quotes already unescaped).
///
/// - `\X2\0041\X0\` UTF-16 code units in hex (also `\X4\` for 8-digit code points)
/// - `\X\E4` one ISO 8859-1 byte
/// - `\S\d` ISO 8859-1 upper half (`d` + 128)
/// - `\P?\` code page switch, dropped
/// - `\\` backslash
fn decode_step_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find('\\') {
        result.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if let Some(tail) = rest.strip_prefix("\\\\") {
            result.push('\\');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("\\X2\\") {
            let end = tail.find("\\X0\\").unwrap_or(tail.len());
            let units: Vec<u16> = tail[..end]
                .as_bytes()
                .chunks(4)
                .filter_map(|c| std::str::from_utf8(c).ok())
                .filter_map(|h| u16::from_str_radix(h, 16).ok())
                .collect();
            result.extend(char::decode_utf16(units).map(|c| c.unwrap_or('\u{FFFD}')));
            rest = tail.get(end + 4..).unwrap_or("");
        } else if let Some(tail) = rest.strip_prefix("\\X4\\") {
            let end = tail.find("\\X0\\").unwrap_or(tail.len());
            for chunk in tail[..end].as_bytes().chunks(8) {
                let code = std::str::from_utf8(chunk)
                    .ok()
                    .and_then(|h| u32::from_str_radix(h, 16).ok())
                    .and_then(char::from_u32);
                result.push(code.unwrap_or('\u{FFFD}'));
            }
            rest = tail.get(end + 4..).unwrap_or("");
        } else if let Some(tail) = rest.strip_prefix("\\X\\") {
            match tail.get(..2).and_then(|h| u8::from_str_radix(h, 16).ok()) {
                Some(byte) => {
                    result.push(char::from(byte));
                    rest = &tail[2..];
                }
                None => {
                    result.push_str("\\X\\");
                    rest = tail;
                }
            }
        } else if let Some(tail) = rest.strip_prefix("\\S\\") {
            let mut tail_chars = tail.chars();
            match tail_chars.next() {
                Some(c) if c.is_ascii() => {
                    result.push(char::from(c as u8 | 0x80));
                    rest = tail_chars.as_str();
                }
                _ => {
                    result.push_str("\\S\\");
                    rest = tail;
                }
            }
        } else if rest.starts_with("\\P") && rest.get(3..4) == Some("\\") {
            rest = &rest[4..];
        } else {
            result.push('\\');
            rest = &rest[1..];
        }
    }

    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
/* pump on the second floor */
#1=IFCPUMP('0abc',$,'Pumpe; Heizkreis',
  'Umw\\X2\\00E4\\X0\\lzpumpe',$,#2,$,$,.CIRCULATOR.);
#2=IFCLOCALPLACEMENT($,#3);
#3=IFCCARTESIANPOINT((1.5,-2.,3.E1));
#4=IFCPROPERTYSINGLEVALUE('Aktiv',$,IFCBOOLEAN(.T.),$);
#5=IFCRELAGGREGATES('x',$,$,$,#6,(#7,#8));
ENDSEC;
END-ISO-10303-21;
";

    #[test]
    fn parses_multi_line_instances_and_header() {
        let file = StepFile::parse(SAMPLE).unwrap();

        assert_eq!(file.schema, "IFC4");
        assert_eq!(file.len(), 5);

        let pump = file.get_entity(1).unwrap();
        assert_eq!(pump.entity_type, "IFCPUMP");
        assert_eq!(pump.value(2).and_then(StepValue::as_str), Some("Pumpe; Heizkreis"));
        assert_eq!(pump.value(3).and_then(StepValue::as_str), Some("Umwälzpumpe"));
        assert_eq!(pump.value(5).and_then(StepValue::as_reference), Some(2));
        assert_eq!(pump.value(8), Some(&StepValue::Enum("CIRCULATOR".to_string())));
    }

    #[test]
    fn parses_lists_numbers_and_typed_values() {
        let file = StepFile::parse(SAMPLE).unwrap();

        let point = file.get_entity(3).unwrap();
        assert_eq!(
            point.values,
            vec![StepValue::List(vec![
                StepValue::Real(1.5),
                StepValue::Real(-2.0),
                StepValue::Real(30.0),
            ])]
        );

        let property = file.get_entity(4).unwrap();
        assert_eq!(
            property.value(2),
            Some(&StepValue::Typed(
                "IFCBOOLEAN".to_string(),
                Box::new(StepValue::Boolean(true))
            ))
        );

        let aggregates = file.get_entity(5).unwrap();
        assert_eq!(aggregates.value(5).map(StepValue::references), Some(vec![7, 8]));
    }

    #[test]
    fn type_lookup_is_case_insensitive() {
        let file = StepFile::parse(SAMPLE).unwrap();

        let ids: Vec<u64> = file
            .get_entities_by_type("IfcPump")
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![1]);
        assert!(file.get_entities_by_type("IfcWall").is_empty());
    }

    #[test]
    fn missing_data_section_is_an_error() {
        let err = StepFile::parse("ISO-10303-21;\nHEADER;\nENDSEC;\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidStep { .. }));
    }

    #[test]
    fn malformed_instances_are_skipped() {
        let file = StepFile::parse("DATA;\n#1=IFCWALL('a',;\n#x=IFCWALL();\n#2=IFCSLAB();\nENDSEC;\n")
            .unwrap();
        assert_eq!(file.len(), 1);
        assert!(file.get_entity(2).is_some());
    }

    #[test]
    fn decodes_string_directives() {
        assert_eq!(decode_step_string("Geb\\X\\E4ude"), "Gebäude");
        assert_eq!(decode_step_string("K\\S\\|hler"), "Kühler");
        assert_eq!(decode_step_string("\\X2\\00DF00E9\\X0\\!"), "ßé!");
        assert_eq!(decode_step_string("\\X4\\0001F600\\X0\\"), "😀");
        assert_eq!(decode_step_string("a\\\\b"), "a\\b");
        assert_eq!(decode_step_string("\\PA\\plain"), "plain");
        assert_eq!(decode_step_string("trailing\\"), "trailing\\");
    }
}
