//! Rewrites a [`Query`] tree into a [`SpanQuery`] bound to one field.
//!
//! The rewrite is pure and total over the positional query kinds. Nodes that
//! target another field collapse to [`SpanQuery::Empty`] and disappear from
//! their parent disjunction; positionless kinds are rejected.

use std::collections::BTreeMap;

use log::debug;

use crate::{
    ast::{Occur, Query},
    error::NormalizeError,
    span::{MultiTermQuery, SpanQuery},
};

/// Converts `query` into the span form that matches it inside `field`.
///
/// Phrase gaps (positions left open by removed stop words, for example) are
/// absorbed into the near span's slop. A phrase declared with slop 0 stays
/// ordered; any declared slop makes it unordered.
pub fn normalize(field: &str, query: &Query) -> Result<SpanQuery, NormalizeError> {
    let span = convert(field, query)?;
    debug!("normalized query for field {field}: {span}");
    Ok(span)
}

/// Recursive worker behind [`normalize`].
fn convert(field: &str, query: &Query) -> Result<SpanQuery, NormalizeError> {
    match query {
        Query::Term { field: f, text } => Ok(if f == field {
            SpanQuery::term(f.clone(), text.clone())
        } else {
            SpanQuery::Empty
        }),

        Query::Phrase {
            field: f,
            terms,
            positions,
            slop,
        } => {
            if terms.is_empty() || f != field {
                return Ok(SpanQuery::Empty);
            }
            let slots = terms.iter().map(|t| vec![t.clone()]).collect::<Vec<_>>();
            phrase_span(f, &slots, positions, *slop, Gaps::Between)
        }

        Query::MultiPhrase {
            field: f,
            terms,
            positions,
            slop,
        } => {
            if terms.iter().all(Vec::is_empty) || f != field {
                return Ok(SpanQuery::Empty);
            }
            phrase_span(f, terms, positions, *slop, Gaps::FromZero)
        }

        Query::Boolean { clauses } => {
            let mut spans = Vec::with_capacity(clauses.len());
            for clause in clauses.iter().filter(|c| c.occur != Occur::MustNot) {
                let span = convert(field, &clause.query)?;
                if accepts(field, &span)? {
                    spans.push(span);
                }
            }
            Ok(disjunction(spans))
        }

        Query::DisjunctionMax { disjuncts } => {
            let mut spans: Vec<SpanQuery> = Vec::with_capacity(disjuncts.len());
            for disjunct in disjuncts {
                let span = convert(field, disjunct)?;
                if accepts(field, &span)? && !spans.contains(&span) {
                    spans.push(span);
                }
            }
            Ok(disjunction(spans))
        }

        Query::ConstantScore { query } | Query::Boost { query, .. } => convert(field, query),

        Query::MatchAll => Ok(SpanQuery::Empty),

        Query::Span { query } => Ok(match query.field()? {
            Some(f) if f == field => query.clone(),
            _ => SpanQuery::Empty,
        }),

        Query::MultiTerm { field: f, pattern } => Ok(if f == field {
            SpanQuery::MultiTerm(MultiTermQuery {
                field: f.clone(),
                pattern: pattern.clone(),
            })
        } else {
            SpanQuery::Empty
        }),

        Query::Exists { .. } | Query::NumericRange { .. } => {
            Err(NormalizeError::UnsupportedQueryKind {
                kind: query.kind_name(),
            })
        }
    }
}

/// Whether a converted child belongs in a disjunction over `field`.
fn accepts(field: &str, span: &SpanQuery) -> Result<bool, NormalizeError> {
    if span.is_empty() {
        return Ok(false);
    }
    Ok(span.field()? == Some(field))
}

/// Collapses a list of converted children: none, one, or many.
fn disjunction(mut spans: Vec<SpanQuery>) -> SpanQuery {
    match spans.len() {
        0 => SpanQuery::Empty,
        1 => spans.swap_remove(0),
        _ => SpanQuery::or(spans),
    }
}

/// Which unfilled positions of a phrase widen its slop.
#[derive(Clone, Copy)]
enum Gaps {
    /// Only holes between filled positions.
    Between,
    /// Every unfilled position from 0, leading ones included.
    FromZero,
}

/// Builds the near span for a phrase whose slots hold one or more alternative
/// terms. Slots sharing a position are merged into one disjunction; every
/// open position counted by `counted` widens the slop by one.
fn phrase_span(
    field: &str,
    slots: &[Vec<String>],
    positions: &[u32],
    declared_slop: u32,
    counted: Gaps,
) -> Result<SpanQuery, NormalizeError> {
    let positions: Vec<u32> = if positions.is_empty() {
        (0..slots.len() as u32).collect()
    } else if positions.len() == slots.len() {
        positions.to_vec()
    } else {
        return Err(NormalizeError::MismatchedPositions {
            field: field.to_string(),
            terms: slots.len(),
            positions: positions.len(),
        });
    };

    // Clauses come out in position order regardless of slot order.
    let mut grouped: BTreeMap<u32, Vec<SpanQuery>> = BTreeMap::new();
    for (slot, &position) in slots.iter().zip(&positions) {
        let entry = grouped.entry(position).or_default();
        for term in slot {
            let span = SpanQuery::term(field, term.clone());
            if !entry.contains(&span) {
                entry.push(span);
            }
        }
    }

    let mut gaps = 0u32;
    let mut previous: Option<u32> = None;
    let mut clauses = Vec::with_capacity(grouped.len());
    for (position, mut terms) in grouped {
        if terms.is_empty() {
            continue;
        }
        match (previous, counted) {
            (Some(previous), _) => gaps += position.saturating_sub(previous).saturating_sub(1),
            (None, Gaps::FromZero) => gaps += position,
            (None, Gaps::Between) => {}
        }
        previous = Some(position);
        clauses.push(if terms.len() == 1 {
            terms.swap_remove(0)
        } else {
            SpanQuery::or(terms)
        });
    }

    if clauses.is_empty() {
        return Ok(SpanQuery::Empty);
    }
    Ok(SpanQuery::near(
        clauses,
        declared_slop + gaps,
        declared_slop == 0,
    ))
}
