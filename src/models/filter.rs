//! Query filters for listing payments.
//!
//! `GET /payment` accepts these query parameters, all optional:
//!
//! - `id`: comma-separated payment ids, e.g. `id=1,4,7`
//! - `from`, `to`: creation time bounds (inclusive)
//! - `minAmount`, `maxAmount`: amount bounds (inclusive)
//!
//! Malformed values reject the whole request. Blank values count as absent.

use std::{collections::BTreeSet, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::payment::Payment;

/// Raw query parameters as received on `GET /payment`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentQuery {
    pub id: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub min_amount: Option<String>,
    pub max_amount: Option<String>,
}

/// Reasons a filter parameter could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("invalid payment id in `id` filter: {0:?}")]
    InvalidId(String),

    #[error("invalid date in `{field}` filter: {value:?}")]
    InvalidDate { field: &'static str, value: String },

    #[error("invalid amount in `{field}` filter: {value:?}")]
    InvalidAmount { field: &'static str, value: String },
}

/// Typed payment filter. Every `None` is a no-op; supplied filters are
/// ANDed together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentFilter {
    pub ids: Option<BTreeSet<i64>>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
}

impl PaymentFilter {
    /// Whether `payment` satisfies every supplied filter.
    pub fn matches(&self, payment: &Payment) -> bool {
        self.ids.as_ref().is_none_or(|ids| ids.contains(&payment.id))
            && self.from.is_none_or(|from| payment.created_at >= from)
            && self.to.is_none_or(|to| payment.created_at <= to)
            && self.min_amount.is_none_or(|min| payment.amount >= min)
            && self.max_amount.is_none_or(|max| payment.amount <= max)
    }
}

impl TryFrom<PaymentQuery> for PaymentFilter {
    type Error = FilterError;

    fn try_from(query: PaymentQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            ids: non_blank(query.id.as_deref()).map(parse_ids).transpose()?,
            from: non_blank(query.from.as_deref())
                .map(|value| parse_timestamp("from", value))
                .transpose()?,
            to: non_blank(query.to.as_deref())
                .map(|value| parse_timestamp("to", value))
                .transpose()?,
            min_amount: non_blank(query.min_amount.as_deref())
                .map(|value| parse_amount("minAmount", value))
                .transpose()?,
            max_amount: non_blank(query.max_amount.as_deref())
                .map(|value| parse_amount("maxAmount", value))
                .transpose()?,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn parse_ids(value: &str) -> Result<BTreeSet<i64>, FilterError> {
    value
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<i64>()
                .map_err(|_| FilterError::InvalidId(part.trim().to_string()))
        })
        .collect()
}

/// Accepts RFC 3339 (any offset), a naive date-time taken as UTC, or a bare
/// date taken as midnight UTC.
fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, FilterError> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }

    Err(FilterError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

fn parse_amount(field: &'static str, value: &str) -> Result<Decimal, FilterError> {
    Decimal::from_str(value).map_err(|_| FilterError::InvalidAmount {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn query() -> PaymentQuery {
        PaymentQuery::default()
    }

    #[test]
    fn empty_query_applies_no_filter() {
        let filter = PaymentFilter::try_from(query()).unwrap();
        assert_eq!(filter, PaymentFilter::default());
    }

    #[rstest]
    #[case("1,2,3", &[1, 2, 3])]
    #[case(" 7 , 4 ", &[4, 7])]
    #[case("5,5", &[5])]
    fn parses_id_lists(#[case] raw: &str, #[case] expected: &[i64]) {
        let filter = PaymentFilter::try_from(PaymentQuery {
            id: Some(raw.to_string()),
            ..query()
        })
        .unwrap();

        assert_eq!(filter.ids, Some(expected.iter().copied().collect()));
    }

    #[rstest]
    #[case("1,abc")]
    #[case("1,,2")]
    #[case("2.5")]
    fn rejects_malformed_ids(#[case] raw: &str) {
        let result = PaymentFilter::try_from(PaymentQuery {
            id: Some(raw.to_string()),
            ..query()
        });

        assert!(matches!(result, Err(FilterError::InvalidId(_))));
    }

    #[rstest]
    #[case("2024-05-22T15:00:57Z", Utc.with_ymd_and_hms(2024, 5, 22, 15, 0, 57).unwrap())]
    #[case("2024-05-22T17:00:57+02:00", Utc.with_ymd_and_hms(2024, 5, 22, 15, 0, 57).unwrap())]
    #[case("2024-05-22T15:00:57", Utc.with_ymd_and_hms(2024, 5, 22, 15, 0, 57).unwrap())]
    #[case("2024-05-22", Utc.with_ymd_and_hms(2024, 5, 22, 0, 0, 0).unwrap())]
    fn normalizes_dates_to_utc(#[case] raw: &str, #[case] expected: DateTime<Utc>) {
        let filter = PaymentFilter::try_from(PaymentQuery {
            from: Some(raw.to_string()),
            to: Some(raw.to_string()),
            ..query()
        })
        .unwrap();

        assert_eq!(filter.from, Some(expected));
        assert_eq!(filter.to, Some(expected));
    }

    #[test]
    fn rejects_unparseable_dates() {
        let result = PaymentFilter::try_from(PaymentQuery {
            to: Some("22/05/2024".to_string()),
            ..query()
        });

        assert_eq!(
            result,
            Err(FilterError::InvalidDate {
                field: "to",
                value: "22/05/2024".to_string(),
            })
        );
    }

    #[test]
    fn parses_amount_bounds() {
        let filter = PaymentFilter::try_from(PaymentQuery {
            min_amount: Some("100".to_string()),
            max_amount: Some("390.00".to_string()),
            ..query()
        })
        .unwrap();

        assert_eq!(filter.min_amount, Some(dec!(100)));
        assert_eq!(filter.max_amount, Some(dec!(390.00)));
    }

    #[test]
    fn rejects_unparseable_amounts() {
        let result = PaymentFilter::try_from(PaymentQuery {
            min_amount: Some("ten".to_string()),
            ..query()
        });

        assert!(matches!(
            result,
            Err(FilterError::InvalidAmount {
                field: "minAmount",
                ..
            })
        ));
    }

    #[test]
    fn blank_values_count_as_absent() {
        let filter = PaymentFilter::try_from(PaymentQuery {
            id: Some(String::new()),
            from: Some("  ".to_string()),
            max_amount: Some(String::new()),
            ..query()
        })
        .unwrap();

        assert_eq!(filter, PaymentFilter::default());
    }
}
