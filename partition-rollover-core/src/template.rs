//! Statement text assembly.
//!
//! The store-side partition primitive only accepts literal text, so nothing
//! here binds parameters. Identifiers are validated up front and values are
//! typed until the moment they are rendered.

use crate::error::PlanError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A bare SQL identifier (`[A-Za-z_][A-Za-z0-9_]*`), safe to splice into text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SqlIdent(pub(crate) String);

impl SqlIdent {
    pub fn new(value: impl Into<String>) -> Result<Self, PlanError> {
        Self::named("identifier", value)
    }

    /// Same as [`SqlIdent::new`] but reports `what` in the error.
    pub fn named(what: &'static str, value: impl Into<String>) -> Result<Self, PlanError> {
        let value = value.into();
        let mut chars = value.chars();
        let head_ok = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        let tail_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

        if head_ok && tail_ok {
            Ok(Self(value))
        } else {
            Err(PlanError::InvalidIdentifier { what, value })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SqlIdent {
    type Error = PlanError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SqlIdent> for String {
    fn from(ident: SqlIdent) -> Self {
        ident.0
    }
}

impl fmt::Display for SqlIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot,
}

/// A `printf`-style template with positional `%s` slots. `%%` is a literal
/// percent sign; any other directive is rejected at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementTemplate {
    raw: String,
    segments: Vec<Segment>,
    slots: usize,
}

impl StatementTemplate {
    pub fn parse(raw: impl Into<String>) -> Result<Self, PlanError> {
        let raw = raw.into();
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut slots = 0;
        let mut iter = raw.char_indices();

        while let Some((position, c)) = iter.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            match iter.next() {
                Some((_, 's')) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Slot);
                    slots += 1;
                }
                Some((_, '%')) => literal.push('%'),
                Some((_, other)) => {
                    return Err(PlanError::UnsupportedDirective {
                        directive: format!("%{other}"),
                        position,
                    });
                }
                None => {
                    return Err(PlanError::UnsupportedDirective {
                        directive: "%".to_string(),
                        position,
                    });
                }
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            raw,
            segments,
            slots,
        })
    }

    /// Parses and checks the slot count in one go.
    pub fn with_arity(raw: impl Into<String>, expected: usize) -> Result<Self, PlanError> {
        let template = Self::parse(raw)?;
        template.expect_arity(expected)?;
        Ok(template)
    }

    pub fn slots(&self) -> usize {
        self.slots
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn expect_arity(&self, expected: usize) -> Result<(), PlanError> {
        if self.slots == expected {
            Ok(())
        } else {
            Err(PlanError::TemplateArity {
                expected,
                found: self.slots,
            })
        }
    }

    pub fn render(&self, args: &[&str]) -> Result<String, PlanError> {
        if args.len() != self.slots {
            return Err(PlanError::TemplateArity {
                expected: self.slots,
                found: args.len(),
            });
        }

        let extra: usize = args.iter().map(|a| a.len()).sum();
        let mut out = String::with_capacity(self.raw.len() + extra);
        let mut args = args.iter();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot => {
                    if let Some(arg) = args.next() {
                        out.push_str(arg);
                    }
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_accepts_table_names() {
        let ident = SqlIdent::new("billing_rated_transaction_other_default").unwrap();
        assert_eq!(ident.as_str(), "billing_rated_transaction_other_default");
        assert!(SqlIdent::new("_private2").is_ok());
    }

    #[test]
    fn ident_rejects_injection_and_qualified_names() {
        for bad in ["", "1table", "t; drop table x", "a'b", "schema.table", "usage date"] {
            assert!(SqlIdent::new(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn ident_deserializes_through_validation() {
        let ok: SqlIdent = serde_json::from_str("\"usage_date\"").unwrap();
        assert_eq!(ok.to_string(), "usage_date");
        assert!(serde_json::from_str::<SqlIdent>("\"usage-date\"").is_err());
    }

    #[test]
    fn render_fills_slots_in_order() {
        let template =
            StatementTemplate::parse("SELECT create_new_partition('%s', '%s', '%s', '%s')").unwrap();
        assert_eq!(template.slots(), 4);

        let sql = template
            .render(&["rt", "billing_rt", "billing_rt_202402", "2024-02-01"])
            .unwrap();
        assert_eq!(
            sql,
            "SELECT create_new_partition('rt', 'billing_rt', 'billing_rt_202402', '2024-02-01')"
        );
    }

    #[test]
    fn double_percent_is_literal() {
        let template = StatementTemplate::parse("SELECT '%s' LIKE 'x%%'").unwrap();
        assert_eq!(template.slots(), 1);
        assert_eq!(template.render(&["a"]).unwrap(), "SELECT 'a' LIKE 'x%'");
    }

    #[test]
    fn arity_mismatch_is_reported() {
        let template = StatementTemplate::parse("CALL p('%s', '%s')").unwrap();
        assert_eq!(
            template.render(&["only-one"]),
            Err(PlanError::TemplateArity {
                expected: 2,
                found: 1
            })
        );
        assert!(StatementTemplate::with_arity("CALL p('%s')", 4).is_err());
    }

    #[test]
    fn other_directives_are_rejected() {
        assert!(matches!(
            StatementTemplate::parse("CALL p(%d)"),
            Err(PlanError::UnsupportedDirective { position: 7, .. })
        ));
        assert!(StatementTemplate::parse("trailing %").is_err());
    }
}
