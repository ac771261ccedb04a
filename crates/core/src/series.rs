use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeSeq, Serializer};
use std::sync::Arc;

use crate::traits::IndicatorError;

/// A date-indexed sequence of optional values.
///
/// `None` marks an undefined position (warm-up, or a gap in the input). The
/// date index is shared between series derived from the same bar sequence;
/// position `i` of every such series refers to the same date.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    index: Arc<[NaiveDate]>,
    values: Vec<Option<Decimal>>,
}

impl Series {
    /// Build a series, failing if `values` does not match the index length.
    pub fn new(index: Arc<[NaiveDate]>, values: Vec<Option<Decimal>>) -> Result<Self, IndicatorError> {
        if index.len() != values.len() {
            return Err(IndicatorError::IndexMismatch {
                left: index.len(),
                right: values.len(),
            });
        }
        Ok(Self { index, values })
    }

    pub(crate) fn from_parts(index: Arc<[NaiveDate]>, values: Vec<Option<Decimal>>) -> Self {
        debug_assert_eq!(index.len(), values.len());
        Self { index, values }
    }

    /// A series where every position is defined.
    pub fn defined(index: Arc<[NaiveDate]>, values: Vec<Decimal>) -> Result<Self, IndicatorError> {
        Self::new(index, values.into_iter().map(Some).collect())
    }

    /// A series on the same index with every position undefined.
    pub fn undefined_like(&self) -> Self {
        Self::from_parts(Arc::clone(&self.index), vec![None; self.index.len()])
    }

    /// Replace the values while keeping this series' index.
    pub fn with_values(&self, values: Vec<Option<Decimal>>) -> Result<Self, IndicatorError> {
        Self::new(Arc::clone(&self.index), values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn index(&self) -> &Arc<[NaiveDate]> {
        &self.index
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn values(&self) -> &[Option<Decimal>] {
        &self.values
    }

    /// Value at position `i`; `None` if undefined or out of range.
    pub fn get(&self, i: usize) -> Option<Decimal> {
        self.values.get(i).copied().flatten()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (NaiveDate, Option<Decimal>)> + '_ {
        self.index.iter().copied().zip(self.values.iter().copied())
    }

    /// The value at the most recent position, which may be undefined.
    pub fn last_value(&self) -> Option<Decimal> {
        self.values.last().copied().flatten()
    }

    /// The most recent defined value and its date.
    pub fn last_defined(&self) -> Option<(NaiveDate, Decimal)> {
        self.iter()
            .rev()
            .find_map(|(date, value)| value.map(|v| (date, v)))
    }

    pub fn first_defined_index(&self) -> Option<usize> {
        self.values.iter().position(Option::is_some)
    }

    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Whether both series are indexed by the same dates.
    pub fn shares_index(&self, other: &Series) -> bool {
        Arc::ptr_eq(&self.index, &other.index) || self.index == other.index
    }

    /// Apply `f` to every defined value; undefined positions stay undefined.
    pub fn map_defined(&self, f: impl Fn(Decimal) -> Decimal) -> Series {
        Self::from_parts(
            Arc::clone(&self.index),
            self.values.iter().map(|v| v.map(&f)).collect(),
        )
    }

    /// Combine two aligned series position by position. A position is
    /// defined only where both inputs are defined.
    pub fn zip_with(
        &self,
        other: &Series,
        f: impl Fn(Decimal, Decimal) -> Decimal,
    ) -> Result<Series, IndicatorError> {
        if !self.shares_index(other) {
            return Err(IndicatorError::IndexMismatch {
                left: self.len(),
                right: other.len(),
            });
        }
        let values = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| match (a, b) {
                (Some(a), Some(b)) => Some(f(*a, *b)),
                _ => None,
            })
            .collect();
        Ok(Self::from_parts(Arc::clone(&self.index), values))
    }
}

/// Serialized as a list of `{ "date": ..., "value": ... }` points.
impl Serialize for Series {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(serde::Serialize)]
        struct Point {
            date: NaiveDate,
            value: Option<Decimal>,
        }

        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for (date, value) in self.iter() {
            seq.serialize_element(&Point { date, value })?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn index(n: u32) -> Arc<[NaiveDate]> {
        (1..=n)
            .map(|d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap())
            .collect()
    }

    #[test]
    fn test_new_rejects_length_mismatch() {
        let err = Series::new(index(3), vec![Some(dec!(1))]).unwrap_err();
        assert_eq!(err, IndicatorError::IndexMismatch { left: 3, right: 1 });
    }

    #[test]
    fn test_last_and_first_defined() {
        let s = Series::new(index(4), vec![None, Some(dec!(2)), Some(dec!(3)), None]).unwrap();
        assert_eq!(s.first_defined_index(), Some(1));
        assert_eq!(s.last_value(), None);
        assert_eq!(
            s.last_defined(),
            Some((NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(), dec!(3)))
        );
        assert_eq!(s.defined_count(), 2);
        assert_eq!(s.get(0), None);
        assert_eq!(s.get(2), Some(dec!(3)));
        assert_eq!(s.get(10), None);
    }

    #[test]
    fn test_iter_runs_backwards() {
        let s = Series::new(index(3), vec![Some(dec!(1)), None, Some(dec!(3))]).unwrap();
        let reversed: Vec<_> = s.iter().rev().map(|(_, v)| v).collect();
        assert_eq!(reversed, vec![Some(dec!(3)), None, Some(dec!(1))]);
        assert_eq!(s.last_defined().map(|(_, v)| v), Some(dec!(3)));
    }

    #[test]
    fn test_zip_with_propagates_undefined() {
        let idx = index(3);
        let a = Series::new(Arc::clone(&idx), vec![None, Some(dec!(2)), Some(dec!(5))]).unwrap();
        let b = Series::new(idx, vec![Some(dec!(1)), None, Some(dec!(1))]).unwrap();
        let diff = a.zip_with(&b, |x, y| x - y).unwrap();
        assert_eq!(diff.values(), &[None, None, Some(dec!(4))]);
    }

    #[test]
    fn test_zip_with_rejects_foreign_index() {
        let a = Series::defined(index(3), vec![dec!(1); 3]).unwrap();
        let b = Series::defined(index(2), vec![dec!(1); 2]).unwrap();
        assert!(a.zip_with(&b, |x, _| x).is_err());
    }

    #[test]
    fn test_map_defined_and_serialize() {
        let s = Series::new(index(2), vec![None, Some(dec!(1.5))]).unwrap();
        let doubled = s.map_defined(|v| v * dec!(2));
        assert_eq!(doubled.values(), &[None, Some(dec!(3.0))]);

        let json = serde_json::to_value(&doubled).unwrap();
        assert_eq!(json[0]["date"], "2024-03-01");
        assert!(json[0]["value"].is_null());
        assert_eq!(json[1]["value"], "3.0");
    }
}
