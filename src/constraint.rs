//! Version constraint expressions
//!
//! A constraint is a comma-separated list of operator/version segments, all
//! of which must accept a candidate. The strict inequality operators reject
//! prerelease candidates unless the reference itself is a prerelease; the
//! doubled variants (`<<`, `<<=`, `>>`, `>>=`) skip that gate.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::ConstraintError;
use crate::version::Version;

/// A comparison operator of a constraint segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    LtLoose,
    LeLoose,
    GtLoose,
    GeLoose,
}

impl Op {
    fn parse(token: &str) -> Result<Self, ConstraintError> {
        match token {
            "" | "=" | "==" => Ok(Op::Eq),
            "!=" => Ok(Op::Ne),
            "<" => Ok(Op::Lt),
            "<=" => Ok(Op::Le),
            ">" => Ok(Op::Gt),
            ">=" => Ok(Op::Ge),
            "<<" => Ok(Op::LtLoose),
            "<<=" => Ok(Op::LeLoose),
            ">>" => Ok(Op::GtLoose),
            ">>=" => Ok(Op::GeLoose),
            other => Err(ConstraintError::UnknownOperator(other.to_string())),
        }
    }

    fn is_equality(self) -> bool {
        matches!(self, Op::Eq | Op::Ne)
    }

    fn is_strict(self) -> bool {
        matches!(self, Op::Lt | Op::Le | Op::Gt | Op::Ge)
    }

    fn accepts(self, reference: &Version, candidate: &Version) -> bool {
        if self.is_equality() {
            let identical = candidate == reference
                && candidate.segment_count() == reference.segment_count();
            return match self {
                Op::Eq => identical,
                _ => !identical,
            };
        }

        // stable references reject prerelease candidates, unless loose
        if self.is_strict() && !reference.is_prerelease() && candidate.is_prerelease() {
            return false;
        }

        let ordering = candidate.compare(reference);
        match self {
            Op::Lt | Op::LtLoose => ordering == Ordering::Less,
            Op::Le | Op::LeLoose => ordering != Ordering::Greater,
            Op::Gt | Op::GtLoose => ordering == Ordering::Greater,
            Op::Ge | Op::GeLoose => ordering != Ordering::Less,
            Op::Eq | Op::Ne => unreachable!("handled above"),
        }
    }
}

#[derive(Debug, Clone)]
struct Segment {
    op: Op,
    reference: Version,
}

/// A compiled constraint expression, such as `>= 1.23, < 1.26`.
///
/// ```
/// use k0s_version::{Constraint, Version};
///
/// let constraint: Constraint = ">= 1.23.0, < 1.26.0".parse().unwrap();
/// assert!(constraint.matches(&"v1.24.1+k0s.0".parse::<Version>().unwrap()));
/// ```
#[derive(Debug, Clone)]
pub struct Constraint {
    segments: Vec<Segment>,
    original: String,
}

impl Constraint {
    /// Compiles a constraint expression. Segments are separated by commas
    /// and composed with AND; an omitted operator means equality.
    pub fn parse(expression: &str) -> Result<Self, ConstraintError> {
        let mut segments = Vec::new();
        for part in expression.split(',') {
            segments.push(parse_segment(part)?);
        }

        Ok(Constraint {
            segments,
            original: expression.to_string(),
        })
    }

    /// True when every segment accepts the candidate.
    pub fn matches(&self, candidate: &Version) -> bool {
        self.segments
            .iter()
            .all(|segment| segment.op.accepts(&segment.reference, candidate))
    }

    /// Like [`Constraint::matches`], but parses the candidate first. An
    /// unparseable candidate never matches.
    pub fn matches_str(&self, candidate: &str) -> bool {
        match Version::parse(candidate) {
            Ok(version) => self.matches(&version),
            Err(_) => false,
        }
    }
}

fn parse_segment(part: &str) -> Result<Segment, ConstraintError> {
    let trimmed = part.trim();
    let split = trimmed
        .find(|c| !matches!(c, '<' | '>' | '=' | '!'))
        .unwrap_or(trimmed.len());
    let (op_token, rest) = trimmed.split_at(split);

    let op = Op::parse(op_token)?;
    let expression = rest.trim();
    if expression.is_empty() {
        return Err(ConstraintError::EmptySegment(part.to_string()));
    }

    let mut reference = Version::parse(expression)?;
    // short references are padded for every operator except plain equality:
    // ">= 1-rc.1" means ">= 1.0.0-rc.1" and "!= 1.0" means "!= 1.0.0", but
    // "= 1.0" matches only a rendered "v1.0"
    if op != Op::Eq && reference.segment_count() < 3 {
        reference = reference.zero_padded();
    }

    Ok(Segment { op, reference })
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl FromStr for Constraint {
    type Err = ConstraintError;

    fn from_str(expression: &str) -> Result<Self, Self::Err> {
        Constraint::parse(expression)
    }
}
