//! A small filter-expression language, compatible with Typesense `filter_by`.
//!
//! ```text
//! year:>2000 && platform:=`Wii U`
//! ```
//!
//! Clauses are joined with `&&`. Each clause is `field:op value`, where `op` is
//! one of `=`, `!=`, `>`, `>=`, `<`, `<=`; a bare `:` means `=`. Whitespace
//! around the colon and operator is ignored. Text fields support equality only.

use std::{fmt, str::FromStr};

use crate::{Error, Result, document::SearchDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
  Game,
  Publisher,
  Platform,
  Year,
  Rank,
  TotalSales,
}

impl Field {
  fn parse(s: &str) -> Result<Self> {
    match s {
      "game" => Ok(Self::Game),
      "publisher" => Ok(Self::Publisher),
      "platform" => Ok(Self::Platform),
      "year" => Ok(Self::Year),
      "rank" => Ok(Self::Rank),
      "total_sales" => Ok(Self::TotalSales),
      other => Err(Error::UnknownFilterField(other.to_owned())),
    }
  }

  fn name(self) -> &'static str {
    match self {
      Self::Game => "game",
      Self::Publisher => "publisher",
      Self::Platform => "platform",
      Self::Year => "year",
      Self::Rank => "rank",
      Self::TotalSales => "total_sales",
    }
  }

  fn is_text(self) -> bool { matches!(self, Self::Game | Self::Publisher | Self::Platform) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
  Eq,
  Ne,
  Gt,
  Ge,
  Lt,
  Le,
}

impl Comparison {
  fn symbol(self) -> &'static str {
    match self {
      Self::Eq => "=",
      Self::Ne => "!=",
      Self::Gt => ">",
      Self::Ge => ">=",
      Self::Lt => "<",
      Self::Le => "<=",
    }
  }

  /// Split a leading operator off `rest`. Two-character operators first.
  fn split(rest: &str) -> (Self, &str) {
    for (sym, op) in [
      ("!=", Self::Ne),
      (">=", Self::Ge),
      ("<=", Self::Le),
      ("=", Self::Eq),
      (">", Self::Gt),
      ("<", Self::Lt),
    ] {
      if let Some(tail) = rest.strip_prefix(sym) {
        return (op, tail);
      }
    }
    (Self::Eq, rest)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Text(String),
  Number(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
  pub field: Field,
  pub op:    Comparison,
  pub value: Value,
}

impl Clause {
  fn parse(raw: &str) -> Result<Self> {
    let invalid = |reason: &str| Error::InvalidFilter {
      clause: raw.to_owned(),
      reason: reason.to_owned(),
    };

    let (field, rest) = raw.split_once(':').ok_or_else(|| invalid("missing ':'"))?;
    let field = Field::parse(field.trim())?;
    let (op, value) = Comparison::split(rest.trim_start());
    let value = value.trim();
    if value.is_empty() {
      return Err(invalid("missing value"));
    }

    let value = if field.is_text() {
      if !matches!(op, Comparison::Eq | Comparison::Ne) {
        return Err(invalid("text fields only support = and !="));
      }
      let unquoted = value
        .strip_prefix('`')
        .and_then(|v| v.strip_suffix('`'))
        .unwrap_or(value);
      if unquoted.contains('`') {
        return Err(invalid("text values cannot contain '`'"));
      }
      Value::Text(unquoted.to_owned())
    } else {
      let n: f64 = value.parse().map_err(|_| invalid("expected a number"))?;
      if !n.is_finite() {
        return Err(invalid("expected a finite number"));
      }
      Value::Number(n)
    };

    Ok(Self { field, op, value })
  }

  pub fn matches(&self, doc: &SearchDocument) -> bool {
    match &self.value {
      Value::Text(expected) => {
        let actual = match self.field {
          Field::Game => &doc.game,
          Field::Publisher => &doc.publisher,
          _ => &doc.platform,
        };
        match self.op {
          Comparison::Ne => actual != expected,
          _ => actual == expected,
        }
      }
      Value::Number(expected) => {
        let actual = match self.field {
          Field::Year => f64::from(doc.year),
          Field::Rank => f64::from(doc.rank),
          _ => doc.total_sales,
        };
        match self.op {
          Comparison::Eq => actual == *expected,
          Comparison::Ne => actual != *expected,
          Comparison::Gt => actual > *expected,
          Comparison::Ge => actual >= *expected,
          Comparison::Lt => actual < *expected,
          Comparison::Le => actual <= *expected,
        }
      }
    }
  }
}

impl fmt::Display for Clause {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.field.name(), self.op.symbol())?;
    match &self.value {
      Value::Text(t) => write!(f, "`{t}`"),
      Value::Number(n) => write!(f, "{n}"),
    }
  }
}

/// A conjunction of clauses; an empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
  pub clauses: Vec<Clause>,
}

impl Filter {
  pub fn matches(&self, doc: &SearchDocument) -> bool {
    self.clauses.iter().all(|c| c.matches(doc))
  }

  pub fn is_empty(&self) -> bool { self.clauses.is_empty() }
}

impl FromStr for Filter {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let clauses = s
      .split("&&")
      .map(str::trim)
      .filter(|c| !c.is_empty())
      .map(Clause::parse)
      .collect::<Result<_>>()?;
    Ok(Self { clauses })
  }
}

/// Canonical Typesense syntax.
impl fmt::Display for Filter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, clause) in self.clauses.iter().enumerate() {
      if i > 0 {
        f.write_str(" && ")?;
      }
      write!(f, "{clause}")?;
    }
    Ok(())
  }
}
