//! RDF term model
//!
//! `Term` is the opaque value bound to a variable during evaluation. The
//! federation layer moves terms between members without interpreting them,
//! except where filter evaluation needs a typed view (numeric comparison,
//! boolean tests) - those accessors live here.
//!
//! Terms are cheap to clone: all string payloads are `Arc<str>`.

use crate::error::{Error, Result};
use crate::vocab::xsd;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// An RDF term: IRI, blank node, or literal
///
/// # Equality
///
/// `PartialEq`/`Eq` is term identity (same kind, same lexical parts), which
/// is what join compatibility and merge checks need. Value-level equality
/// (e.g. `"1"^^xsd:integer` vs `"1.0"^^xsd:double`) is a filter-evaluation
/// concern and lives with the predicate evaluator.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Term {
    /// An IRI reference
    Iri {
        /// The full IRI string
        iri: Arc<str>,
    },
    /// A blank node, identified by a member-scoped label
    Blank {
        /// The blank node label (without the `_:` prefix)
        label: Arc<str>,
    },
    /// A literal: lexical form plus datatype, optionally language-tagged
    Literal {
        /// The lexical form
        lexical: Arc<str>,
        /// Datatype IRI
        datatype: Arc<str>,
        /// Language tag (implies rdf:langString)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<Arc<str>>,
    },
}

/// A numeric view of a literal, used by comparison operators
///
/// Integer-valued and floating-valued literals compare against each other by
/// promoting the integer side, the usual SPARQL numeric type promotion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Numeric {
    /// xsd:integer / xsd:long / xsd:int
    Integer(i64),
    /// xsd:double / xsd:float / xsd:decimal
    Double(f64),
}

impl Term {
    /// Create an IRI term
    pub fn iri(iri: impl Into<Arc<str>>) -> Self {
        Term::Iri { iri: iri.into() }
    }

    /// Create a blank node term
    pub fn blank(label: impl Into<Arc<str>>) -> Self {
        Term::Blank {
            label: label.into(),
        }
    }

    /// Create a literal with an explicit datatype
    pub fn literal(lexical: impl Into<Arc<str>>, datatype: impl Into<Arc<str>>) -> Self {
        Term::Literal {
            lexical: lexical.into(),
            datatype: datatype.into(),
            language: None,
        }
    }

    /// Create an xsd:string literal
    pub fn string(lexical: impl Into<Arc<str>>) -> Self {
        Term::literal(lexical, xsd::STRING)
    }

    /// Create an xsd:integer literal
    pub fn integer(value: i64) -> Self {
        Term::literal(value.to_string(), xsd::INTEGER)
    }

    /// Create an xsd:double literal
    pub fn double(value: f64) -> Self {
        Term::literal(value.to_string(), xsd::DOUBLE)
    }

    /// Create an xsd:boolean literal
    pub fn boolean(value: bool) -> Self {
        Term::literal(if value { "true" } else { "false" }, xsd::BOOLEAN)
    }

    /// Get the IRI string if this is an IRI term
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri { iri } => Some(iri),
            _ => None,
        }
    }

    /// Get the lexical form if this is a literal
    pub fn as_lexical(&self) -> Option<&str> {
        match self {
            Term::Literal { lexical, .. } => Some(lexical),
            _ => None,
        }
    }

    /// Get the datatype IRI if this is a literal
    pub fn datatype(&self) -> Option<&str> {
        match self {
            Term::Literal { datatype, .. } => Some(datatype),
            _ => None,
        }
    }

    /// Get the language tag if this is a language-tagged literal
    pub fn language(&self) -> Option<&str> {
        match self {
            Term::Literal {
                language: Some(lang),
                ..
            } => Some(lang),
            _ => None,
        }
    }

    /// Check if this term is a literal
    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal { .. })
    }

    /// Check if this literal carries a numeric datatype
    pub fn is_numeric(&self) -> bool {
        match self {
            Term::Literal { datatype, .. } => is_numeric_datatype(datatype),
            _ => false,
        }
    }

    /// Read this literal as a number, promoting integers as needed
    ///
    /// Returns an error for non-literals, non-numeric datatypes, and lexical
    /// forms that do not parse as their datatype.
    pub fn as_numeric(&self) -> Result<Numeric> {
        let (lexical, datatype) = match self {
            Term::Literal {
                lexical, datatype, ..
            } => (lexical, datatype),
            _ => {
                return Err(Error::LiteralValue {
                    lexical: self.to_string(),
                    target: "numeric",
                })
            }
        };
        match datatype.as_ref() {
            xsd::INTEGER | xsd::LONG | xsd::INT => lexical
                .parse::<i64>()
                .map(Numeric::Integer)
                .map_err(|_| Error::LiteralValue {
                    lexical: lexical.to_string(),
                    target: "integer",
                }),
            xsd::DOUBLE | xsd::FLOAT | xsd::DECIMAL => lexical
                .parse::<f64>()
                .map(Numeric::Double)
                .map_err(|_| Error::LiteralValue {
                    lexical: lexical.to_string(),
                    target: "double",
                }),
            _ => Err(Error::LiteralValue {
                lexical: lexical.to_string(),
                target: "numeric",
            }),
        }
    }

    /// Read this literal as an xsd:boolean
    pub fn as_boolean(&self) -> Result<bool> {
        match self {
            Term::Literal {
                lexical, datatype, ..
            } if datatype.as_ref() == xsd::BOOLEAN => match lexical.as_ref() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                other => Err(Error::LiteralValue {
                    lexical: other.to_string(),
                    target: "boolean",
                }),
            },
            _ => Err(Error::LiteralValue {
                lexical: self.to_string(),
                target: "boolean",
            }),
        }
    }
}

/// Check whether a datatype IRI is one the comparison operators promote
pub fn is_numeric_datatype(datatype: &str) -> bool {
    matches!(
        datatype,
        xsd::INTEGER | xsd::LONG | xsd::INT | xsd::DECIMAL | xsd::DOUBLE | xsd::FLOAT
    )
}

impl Numeric {
    /// Compare two numerics with integer-to-double promotion
    ///
    /// Returns `None` when either side is NaN.
    pub fn partial_cmp(self, other: Numeric) -> Option<std::cmp::Ordering> {
        use Numeric::*;
        match (self, other) {
            (Integer(a), Integer(b)) => Some(a.cmp(&b)),
            (Integer(a), Double(b)) => (a as f64).partial_cmp(&b),
            (Double(a), Integer(b)) => a.partial_cmp(&(b as f64)),
            (Double(a), Double(b)) => a.partial_cmp(&b),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri { iri } => write!(f, "<{iri}>"),
            Term::Blank { label } => write!(f, "_:{label}"),
            Term::Literal {
                lexical,
                datatype,
                language,
            } => {
                if let Some(lang) = language {
                    write!(f, "\"{lexical}\"@{lang}")
                } else if datatype.as_ref() == xsd::STRING {
                    write!(f, "\"{lexical}\"")
                } else {
                    write!(f, "\"{lexical}\"^^<{datatype}>")
                }
            }
        }
    }
}
