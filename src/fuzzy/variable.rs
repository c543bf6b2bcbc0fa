//! Linguistic variables

use indexmap::IndexMap;
use serde::Serialize;

use super::MembershipFunction;
use crate::error::{ErrorCode, FuzzyError, FuzzyResult};

/// Term name → raw `(x, μ)` control points
pub type TermTable = IndexMap<String, Vec<(f64, f64)>>;

/// A named set of terms over one universe (e.g. "temperature" with cold/mild/hot)
///
/// Terms keep their declaration order, which is also the order
/// [`fuzzify`](Self::fuzzify) reports them in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinguisticVariable {
    name: String,
    universe: (f64, f64),
    terms: IndexMap<String, MembershipFunction>,
}

impl LinguisticVariable {
    /// Build a variable from `(term name, points)` pairs
    ///
    /// Without an explicit `universe` the bounds are the smallest and largest
    /// x-coordinate over every term. Fails on an empty table, a duplicated
    /// term name, a bad universe or any term [`MembershipFunction::new`]
    /// rejects; the error names the offending term.
    pub fn from_terms<I, S>(name: &str, terms: I, universe: Option<(f64, f64)>) -> FuzzyResult<Self>
    where
        I: IntoIterator<Item = (S, Vec<(f64, f64)>)>,
        S: Into<String>,
    {
        let mut table: IndexMap<String, MembershipFunction> = IndexMap::new();

        for (term, points) in terms {
            let term = term.into();
            if table.contains_key(&term) {
                return Err(FuzzyError::new(
                    ErrorCode::DuplicateTerm,
                    format!("variable '{}' declares term '{}' more than once", name, term),
                )
                .with_context("variable", name)
                .with_context("term", term));
            }
            let mf = MembershipFunction::new(points).map_err(|e| in_term(e, name, &term))?;
            table.insert(term, mf);
        }

        if table.is_empty() {
            return Err(FuzzyError::new(
                ErrorCode::EmptyTermTable,
                format!("variable '{}' has no terms", name),
            )
            .with_context("variable", name));
        }

        let universe = match universe {
            Some((min, max)) => {
                if !min.is_finite() || !max.is_finite() || min > max {
                    return Err(FuzzyError::new(
                        ErrorCode::InvalidUniverse,
                        format!("variable '{}': universe [{}, {}] is not a valid range", name, min, max),
                    )
                    .with_context("variable", name)
                    .with_hint("The universe is written as [min, max] with min <= max"));
                }
                for (term, mf) in &table {
                    let (lo, hi) = mf.domain();
                    if lo < min || hi > max {
                        tracing::warn!(
                            variable = %name,
                            term = %term,
                            "term points [{}, {}] extend outside universe [{}, {}]",
                            lo, hi, min, max
                        );
                    }
                }
                (min, max)
            }
            None => table.values().map(|mf| mf.domain()).fold(
                (f64::INFINITY, f64::NEG_INFINITY),
                |(lo, hi), (a, b)| (lo.min(a), hi.max(b)),
            ),
        };

        Ok(Self {
            name: name.to_string(),
            universe,
            terms: table,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `(min, max)` of the universe of discourse
    pub fn universe(&self) -> (f64, f64) {
        self.universe
    }

    /// Look up a term's membership function
    pub fn term(&self, name: &str) -> Option<&MembershipFunction> {
        self.terms.get(name)
    }

    pub fn contains_term(&self, name: &str) -> bool {
        self.terms.contains_key(name)
    }

    /// Terms in declaration order
    pub fn terms(&self) -> impl Iterator<Item = (&str, &MembershipFunction)> {
        self.terms.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn term_names(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Fuzzify a crisp value - membership of every term
    pub fn fuzzify(&self, value: f64) -> IndexMap<String, f64> {
        self.terms
            .iter()
            .map(|(name, mf)| (name.clone(), mf.degree(value)))
            .collect()
    }
}

fn in_term(err: FuzzyError, variable: &str, term: &str) -> FuzzyError {
    let message = format!("variable '{}', term '{}': {}", variable, term, err.message);
    FuzzyError { message, ..err }
        .with_context("variable", variable)
        .with_context("term", term)
}
