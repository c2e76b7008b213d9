// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Column chunk and page statistics: typed aggregation on the write path,
//! and conversion to and from the thrift representation.
//!
//! The thrift `Statistics` struct carries two min/max pairs: the legacy
//! `min`/`max` fields (signed comparison only) and the modern
//! `min_value`/`max_value` fields introduced with column orders. On write,
//! columns with a SIGNED sort order populate both pairs for backward
//! compatibility; all other columns only populate the modern pair. On read,
//! the modern pair is preferred when the column order is type-defined.

use crate::basic::{ColumnOrder, Type};
use crate::data_type::{ByteArray, ParquetValueType};
use crate::errors::{ParquetError, Result};
use crate::format;

/// Plain-encoded statistics of a page or column chunk, ready for the thrift
/// encoder.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EncodedStatistics {
    /// Plain-encoded minimum value (byte arrays without the length prefix).
    pub min: Option<Vec<u8>>,
    /// Plain-encoded maximum value (byte arrays without the length prefix).
    pub max: Option<Vec<u8>>,
    /// Number of null values.
    pub null_count: Option<i64>,
    /// Number of distinct values.
    pub distinct_count: Option<i64>,
    is_signed: bool,
}

impl EncodedStatistics {
    /// Whether any statistic is present.
    pub fn is_set(&self) -> bool {
        self.min.is_some()
            || self.max.is_some()
            || self.null_count.is_some()
            || self.distinct_count.is_some()
    }

    /// Whether both min and max are present.
    pub fn has_min_max(&self) -> bool {
        self.min.is_some() && self.max.is_some()
    }

    /// Marks the column sort order as SIGNED, which enables the legacy
    /// min/max fields on serialization.
    pub fn set_is_signed(&mut self, is_signed: bool) {
        self.is_signed = is_signed;
    }

    /// Drops min and max when either exceeds `max_size` bytes, so oversized
    /// values never inflate the metadata.
    pub fn apply_stat_size_limits(&mut self, max_size: usize) {
        if self.min.as_ref().is_some_and(|v| v.len() > max_size)
            || self.max.as_ref().is_some_and(|v| v.len() > max_size)
        {
            self.min = None;
            self.max = None;
        }
    }

    /// Converts to the thrift representation, or `None` when nothing is set.
    pub(crate) fn to_thrift(&self) -> Option<format::Statistics> {
        if !self.is_set() {
            return None;
        }
        let mut statistics = format::Statistics {
            min_value: self.min.clone(),
            max_value: self.max.clone(),
            null_count: self.null_count,
            distinct_count: self.distinct_count,
            ..Default::default()
        };
        // the legacy pair is only valid under signed comparison
        if self.is_signed {
            statistics.min = self.min.clone();
            statistics.max = self.max.clone();
        }
        Some(statistics)
    }
}

/// Typed statistics for one leaf column.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueStatistics<T: ParquetValueType> {
    min: Option<T>,
    max: Option<T>,
    null_count: i64,
    distinct_count: Option<i64>,
}

impl<T: ParquetValueType> Default for ValueStatistics<T> {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            null_count: 0,
            distinct_count: None,
        }
    }
}

impl<T: ParquetValueType> ValueStatistics<T> {
    /// Creates statistics from already aggregated parts.
    pub fn new(
        min: Option<T>,
        max: Option<T>,
        null_count: i64,
        distinct_count: Option<i64>,
    ) -> Self {
        Self {
            min,
            max,
            null_count,
            distinct_count,
        }
    }

    /// Minimum value, when at least one non-null value was observed.
    pub fn min_opt(&self) -> Option<&T> {
        self.min.as_ref()
    }

    /// Maximum value, when at least one non-null value was observed.
    pub fn max_opt(&self) -> Option<&T> {
        self.max.as_ref()
    }

    /// Number of null values.
    pub fn null_count(&self) -> i64 {
        self.null_count
    }

    /// Number of distinct values, when known.
    pub fn distinct_count(&self) -> Option<i64> {
        self.distinct_count
    }

    /// Folds a batch of values and a null count into the statistics.
    /// Incomparable values (NaN) are ignored by the min/max bounds.
    pub fn update(&mut self, values: &[T], null_count: i64) {
        self.null_count += null_count;
        for value in values {
            let replace_min = match &self.min {
                None => true,
                Some(min) => matches!(value.compare(min), Some(std::cmp::Ordering::Less)),
            };
            if replace_min {
                self.min = Some(value.clone());
            }
            let replace_max = match &self.max {
                None => true,
                Some(max) => matches!(value.compare(max), Some(std::cmp::Ordering::Greater)),
            };
            if replace_max {
                self.max = Some(value.clone());
            }
        }
    }

    /// Merges `other` into `self` (used to fold page statistics into the
    /// chunk statistics).
    pub fn merge(&mut self, other: &Self) {
        if let Some(min) = other.min.as_ref() {
            self.update(std::slice::from_ref(min), 0);
        }
        if let Some(max) = other.max.as_ref() {
            self.update(std::slice::from_ref(max), 0);
        }
        self.null_count += other.null_count;
        // distinct counts cannot be merged
        self.distinct_count = None;
    }

    /// Resets the statistics to their initial state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Plain-encodes the statistics for serialization.
    pub fn encode(&self) -> EncodedStatistics {
        EncodedStatistics {
            min: self.min.as_ref().map(|v| v.stat_bytes()),
            max: self.max.as_ref().map(|v| v.stat_bytes()),
            null_count: Some(self.null_count),
            distinct_count: self.distinct_count,
            is_signed: false,
        }
    }
}

/// Statistics for one column chunk, typed over the physical type.
#[derive(Clone, Debug, PartialEq)]
pub enum Statistics {
    Int32(ValueStatistics<i32>),
    Int64(ValueStatistics<i64>),
    Float(ValueStatistics<f32>),
    Double(ValueStatistics<f64>),
    ByteArray(ValueStatistics<ByteArray>),
}

impl Statistics {
    /// Physical type of these statistics.
    pub fn physical_type(&self) -> Type {
        match self {
            Statistics::Int32(_) => Type::INT32,
            Statistics::Int64(_) => Type::INT64,
            Statistics::Float(_) => Type::FLOAT,
            Statistics::Double(_) => Type::DOUBLE,
            Statistics::ByteArray(_) => Type::BYTE_ARRAY,
        }
    }

    /// Number of null values.
    pub fn null_count(&self) -> i64 {
        match self {
            Statistics::Int32(s) => s.null_count(),
            Statistics::Int64(s) => s.null_count(),
            Statistics::Float(s) => s.null_count(),
            Statistics::Double(s) => s.null_count(),
            Statistics::ByteArray(s) => s.null_count(),
        }
    }

    /// Whether both min and max are present.
    pub fn has_min_max(&self) -> bool {
        match self {
            Statistics::Int32(s) => s.min_opt().is_some() && s.max_opt().is_some(),
            Statistics::Int64(s) => s.min_opt().is_some() && s.max_opt().is_some(),
            Statistics::Float(s) => s.min_opt().is_some() && s.max_opt().is_some(),
            Statistics::Double(s) => s.min_opt().is_some() && s.max_opt().is_some(),
            Statistics::ByteArray(s) => s.min_opt().is_some() && s.max_opt().is_some(),
        }
    }

    /// Plain-encoded minimum, when present.
    pub fn min_bytes_opt(&self) -> Option<Vec<u8>> {
        match self {
            Statistics::Int32(s) => s.min_opt().map(|v| v.stat_bytes()),
            Statistics::Int64(s) => s.min_opt().map(|v| v.stat_bytes()),
            Statistics::Float(s) => s.min_opt().map(|v| v.stat_bytes()),
            Statistics::Double(s) => s.min_opt().map(|v| v.stat_bytes()),
            Statistics::ByteArray(s) => s.min_opt().map(|v| v.stat_bytes()),
        }
    }

    /// Plain-encoded maximum, when present.
    pub fn max_bytes_opt(&self) -> Option<Vec<u8>> {
        match self {
            Statistics::Int32(s) => s.max_opt().map(|v| v.stat_bytes()),
            Statistics::Int64(s) => s.max_opt().map(|v| v.stat_bytes()),
            Statistics::Float(s) => s.max_opt().map(|v| v.stat_bytes()),
            Statistics::Double(s) => s.max_opt().map(|v| v.stat_bytes()),
            Statistics::ByteArray(s) => s.max_opt().map(|v| v.stat_bytes()),
        }
    }
}

fn decode_stat<T: ParquetValueType>(bytes: Option<&[u8]>, fixed_len: usize) -> Result<Option<T>> {
    match bytes {
        None => Ok(None),
        Some(b) => {
            if fixed_len > 0 && b.len() < fixed_len {
                return Err(general_err!(
                    "Insufficient bytes to parse statistics value"
                ));
            }
            let (value, _) = T::decode_plain(b)?;
            Ok(Some(value))
        }
    }
}

/// Converts thrift statistics into typed statistics, selecting the modern or
/// legacy min/max pair based on the column order.
pub(crate) fn from_thrift(
    physical_type: Type,
    thrift_stats: Option<&format::Statistics>,
    column_order: ColumnOrder,
) -> Result<Option<Statistics>> {
    let stats = match thrift_stats {
        Some(stats) => stats,
        None => return Ok(None),
    };

    // Prefer the modern fields when the file declares a type-defined order,
    // otherwise fall back to the legacy signed pair.
    let (min, max) = if matches!(column_order, ColumnOrder::TYPE_DEFINED_ORDER(_)) {
        (stats.min_value.as_deref(), stats.max_value.as_deref())
    } else {
        (
            stats.min_value.as_deref().or(stats.min.as_deref()),
            stats.max_value.as_deref().or(stats.max.as_deref()),
        )
    };

    let null_count = stats.null_count.unwrap_or(0);
    if null_count < 0 {
        return Err(general_err!(
            "Statistics null count is negative {}",
            null_count
        ));
    }
    let distinct_count = stats.distinct_count;

    let res = match physical_type {
        Type::INT32 => Statistics::Int32(ValueStatistics::new(
            decode_stat::<i32>(min, 4)?,
            decode_stat::<i32>(max, 4)?,
            null_count,
            distinct_count,
        )),
        Type::INT64 => Statistics::Int64(ValueStatistics::new(
            decode_stat::<i64>(min, 8)?,
            decode_stat::<i64>(max, 8)?,
            null_count,
            distinct_count,
        )),
        Type::FLOAT => Statistics::Float(ValueStatistics::new(
            decode_stat::<f32>(min, 4)?,
            decode_stat::<f32>(max, 4)?,
            null_count,
            distinct_count,
        )),
        Type::DOUBLE => Statistics::Double(ValueStatistics::new(
            decode_stat::<f64>(min, 8)?,
            decode_stat::<f64>(max, 8)?,
            null_count,
            distinct_count,
        )),
        Type::BYTE_ARRAY => {
            // statistics values are plain encoded without the length prefix
            Statistics::ByteArray(ValueStatistics::new(
                min.map(ByteArray::from),
                max.map(ByteArray::from),
                null_count,
                distinct_count,
            ))
        }
        other => {
            return Err(nyi_err!(
                "Statistics decoding is not supported for type {}",
                other
            ))
        }
    };
    Ok(Some(res))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::SortOrder;

    #[test]
    fn test_update_min_max() {
        let mut stats = ValueStatistics::<i32>::default();
        stats.update(&[3, 1, 4, 1, 5], 0);
        assert_eq!(stats.min_opt(), Some(&1));
        assert_eq!(stats.max_opt(), Some(&5));
        stats.update(&[-7], 2);
        assert_eq!(stats.min_opt(), Some(&-7));
        assert_eq!(stats.null_count(), 2);
    }

    #[test]
    fn test_nan_ignored() {
        let mut stats = ValueStatistics::<f64>::default();
        stats.update(&[1.0, f64::NAN, 2.0], 0);
        assert_eq!(stats.min_opt(), Some(&1.0));
        assert_eq!(stats.max_opt(), Some(&2.0));
    }

    #[test]
    fn test_merge() {
        let mut chunk = ValueStatistics::<i64>::default();
        let mut page = ValueStatistics::<i64>::default();
        page.update(&[10, 20], 1);
        chunk.merge(&page);
        page.reset();
        page.update(&[-5], 0);
        chunk.merge(&page);
        assert_eq!(chunk.min_opt(), Some(&-5));
        assert_eq!(chunk.max_opt(), Some(&20));
        assert_eq!(chunk.null_count(), 1);
    }

    #[test]
    fn test_dual_field_policy_signed() {
        let mut stats = ValueStatistics::<i32>::default();
        stats.update(&[1, 5], 0);
        let mut encoded = stats.encode();
        encoded.set_is_signed(true);
        let thrift = encoded.to_thrift().unwrap();
        assert_eq!(thrift.min, thrift.min_value);
        assert_eq!(thrift.max, thrift.max_value);
        assert!(thrift.min.is_some());
    }

    #[test]
    fn test_dual_field_policy_unsigned() {
        let mut stats = ValueStatistics::<ByteArray>::default();
        stats.update(&[ByteArray::from("a"), ByteArray::from("b")], 0);
        let mut encoded = stats.encode();
        encoded.set_is_signed(false);
        let thrift = encoded.to_thrift().unwrap();
        assert!(thrift.min.is_none());
        assert!(thrift.max.is_none());
        assert_eq!(thrift.min_value, Some(b"a".to_vec()));
        assert_eq!(thrift.max_value, Some(b"b".to_vec()));
    }

    #[test]
    fn test_stat_size_limit() {
        let mut encoded = EncodedStatistics {
            min: Some(vec![0u8; 10]),
            max: Some(vec![0u8; 5000]),
            null_count: Some(0),
            ..Default::default()
        };
        encoded.apply_stat_size_limits(4096);
        assert!(encoded.min.is_none());
        assert!(encoded.max.is_none());
        assert!(encoded.is_set()); // null count survives
    }

    #[test]
    fn test_from_thrift_prefers_modern_fields() {
        let thrift = format::Statistics {
            min: Some(vec![9, 0, 0, 0]),
            max: Some(vec![9, 0, 0, 0]),
            min_value: Some(vec![1, 0, 0, 0]),
            max_value: Some(vec![5, 0, 0, 0]),
            null_count: Some(0),
            distinct_count: None,
        };
        let stats = from_thrift(
            Type::INT32,
            Some(&thrift),
            ColumnOrder::TYPE_DEFINED_ORDER(SortOrder::SIGNED),
        )
        .unwrap()
        .unwrap();
        match stats {
            Statistics::Int32(s) => {
                assert_eq!(s.min_opt(), Some(&1));
                assert_eq!(s.max_opt(), Some(&5));
            }
            _ => panic!("expected Int32 statistics"),
        }
    }

    #[test]
    fn test_from_thrift_legacy_fallback() {
        let thrift = format::Statistics {
            min: Some(vec![2, 0, 0, 0]),
            max: Some(vec![7, 0, 0, 0]),
            ..Default::default()
        };
        let stats = from_thrift(Type::INT32, Some(&thrift), ColumnOrder::UNDEFINED)
            .unwrap()
            .unwrap();
        match stats {
            Statistics::Int32(s) => {
                assert_eq!(s.min_opt(), Some(&2));
                assert_eq!(s.max_opt(), Some(&7));
            }
            _ => panic!("expected Int32 statistics"),
        }
    }
}
