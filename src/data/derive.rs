use chrono::{NaiveTime, Timelike};
use thiserror::Error;

use super::model::{Record, Value};

// ---------------------------------------------------------------------------
// Derived columns – computed once per load, before any filtering
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeriveError {
    /// Malformed value in a source column. Fatal at load: no skip-bad-row
    /// policy exists.
    #[error("row {row}, column '{column}': cannot parse '{value}' as {expected}")]
    ParseError {
        row: usize,
        column: String,
        value: String,
        expected: &'static str,
    },

    #[error("derived column '{output}' needs missing source column '{source_column}'")]
    MissingSource {
        output: String,
        source_column: String,
    },
}

/// How one derived column is computed from an existing column.
#[derive(Debug, Clone)]
pub enum Transform {
    /// Parse `HH:MM:SS` text into an integer hour of day (0–23).
    HourOfDay { source: String },
    /// Map an integer code to a label; codes absent from the table become
    /// `Value::Null` (the row is kept).
    CodeLabel {
        source: String,
        table: &'static [(i64, &'static str)],
    },
    /// Alias an existing column under a new name.
    CopyColumn { source: String },
}

/// One derived column: output name plus its transform.
#[derive(Debug, Clone)]
pub struct Derivation {
    pub output: String,
    pub transform: Transform,
}

impl Derivation {
    pub fn hour_of_day(output: &str, source: &str) -> Self {
        Derivation {
            output: output.to_string(),
            transform: Transform::HourOfDay {
                source: source.to_string(),
            },
        }
    }

    pub fn code_label(
        output: &str,
        source: &str,
        table: &'static [(i64, &'static str)],
    ) -> Self {
        Derivation {
            output: output.to_string(),
            transform: Transform::CodeLabel {
                source: source.to_string(),
                table,
            },
        }
    }

    pub fn copy_column(output: &str, source: &str) -> Self {
        Derivation {
            output: output.to_string(),
            transform: Transform::CopyColumn {
                source: source.to_string(),
            },
        }
    }
}

/// Apply every derivation to every record, in place. The outputs become
/// ordinary columns; callers rebuild the dataset index afterwards.
pub fn apply_derivations(
    records: &mut [Record],
    derivations: &[Derivation],
) -> Result<(), DeriveError> {
    for derivation in derivations {
        for (row, record) in records.iter_mut().enumerate() {
            let value = derive_one(record, row, derivation)?;
            record.values.insert(derivation.output.clone(), value);
        }
    }
    Ok(())
}

fn derive_one(
    record: &Record,
    row: usize,
    derivation: &Derivation,
) -> Result<Value, DeriveError> {
    match &derivation.transform {
        Transform::HourOfDay { source } => {
            let raw = source_value(record, &derivation.output, source)?;
            let text = match raw {
                Value::String(s) => s.as_str(),
                other => {
                    return Err(DeriveError::ParseError {
                        row,
                        column: source.clone(),
                        value: other.to_string(),
                        expected: "a HH:MM:SS time string",
                    })
                }
            };
            let time = NaiveTime::parse_from_str(text, "%H:%M:%S").map_err(|_| {
                DeriveError::ParseError {
                    row,
                    column: source.clone(),
                    value: text.to_string(),
                    expected: "a HH:MM:SS time string",
                }
            })?;
            Ok(Value::Integer(time.hour() as i64))
        }
        Transform::CodeLabel { source, table } => {
            let raw = source_value(record, &derivation.output, source)?;
            Ok(match raw.as_i64() {
                Some(code) => table
                    .iter()
                    .find(|(c, _)| *c == code)
                    .map(|(_, label)| Value::String(label.to_string()))
                    .unwrap_or(Value::Null),
                None => Value::Null,
            })
        }
        Transform::CopyColumn { source } => {
            Ok(source_value(record, &derivation.output, source)?.clone())
        }
    }
}

fn source_value<'a>(
    record: &'a Record,
    output: &str,
    source: &str,
) -> Result<&'a Value, DeriveError> {
    record.get(source).ok_or_else(|| DeriveError::MissingSource {
        output: output.to_string(),
        source_column: source.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEX_LABELS: &[(i64, &str)] = &[(1, "Male"), (2, "Female")];

    fn record(pairs: &[(&str, Value)]) -> Record {
        Record {
            values: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    #[test]
    fn hour_of_day_parses_time_strings() {
        let mut records = vec![
            record(&[("Time", Value::String("13:05:59".into()))]),
            record(&[("Time", Value::String("00:00:00".into()))]),
        ];
        apply_derivations(&mut records, &[Derivation::hour_of_day("hour", "Time")]).unwrap();
        assert_eq!(records[0].get("hour"), Some(&Value::Integer(13)));
        assert_eq!(records[1].get("hour"), Some(&Value::Integer(0)));
    }

    #[test]
    fn malformed_time_is_a_parse_error() {
        let mut records = vec![record(&[("Time", Value::String("25:99".into()))])];
        let err =
            apply_derivations(&mut records, &[Derivation::hour_of_day("hour", "Time")])
                .unwrap_err();
        assert!(matches!(err, DeriveError::ParseError { row: 0, .. }));
    }

    #[test]
    fn code_label_maps_known_codes() {
        let mut records = vec![
            record(&[("sex", Value::Integer(1))]),
            record(&[("sex", Value::Integer(2))]),
        ];
        apply_derivations(
            &mut records,
            &[Derivation::code_label("sex_bin", "sex", SEX_LABELS)],
        )
        .unwrap();
        assert_eq!(records[0].get("sex_bin"), Some(&Value::String("Male".into())));
        assert_eq!(
            records[1].get("sex_bin"),
            Some(&Value::String("Female".into()))
        );
    }

    #[test]
    fn unknown_code_becomes_null_without_failing() {
        let mut records = vec![record(&[("sex", Value::Integer(9))])];
        apply_derivations(
            &mut records,
            &[Derivation::code_label("sex_bin", "sex", SEX_LABELS)],
        )
        .unwrap();
        assert_eq!(records[0].get("sex_bin"), Some(&Value::Null));
    }

    #[test]
    fn copy_column_aliases_values() {
        let mut records = vec![record(&[("Product line", Value::String("Food".into()))])];
        apply_derivations(
            &mut records,
            &[Derivation::copy_column("product_type", "Product line")],
        )
        .unwrap();
        assert_eq!(
            records[0].get("product_type"),
            Some(&Value::String("Food".into()))
        );
    }

    #[test]
    fn missing_source_column_is_reported() {
        let mut records = vec![record(&[("sex", Value::Integer(1))])];
        let err = apply_derivations(&mut records, &[Derivation::hour_of_day("hour", "Time")])
            .unwrap_err();
        assert_eq!(
            err,
            DeriveError::MissingSource {
                output: "hour".to_string(),
                source_column: "Time".to_string()
            }
        );
    }
}
