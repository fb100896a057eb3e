//! Shared expression helpers used across the aggregators.

use polars::prelude::*;

/// Calendar date of an event, derived from its timestamp column.
pub fn event_date(ts_col: &str) -> Expr {
    col(ts_col).cast(DataType::Date).alias("date")
}

/// Whole minutes (2 decimals) between two Datetime expressions.
/// Null when either side is null.
pub fn minutes_between(later: Expr, earlier: Expr) -> Expr {
    // Datetime subtraction yields a Duration in the column's time unit (ms).
    ((later - earlier).cast(DataType::Int64).cast(DataType::Float64) / lit(60_000.0)).round(2)
}

/// Null stand-ins for optional columns the input file omitted, so
/// downstream selects keep a stable output schema instead of failing on a
/// name lookup.
pub fn absent_as_null(df: &DataFrame, names: &[&str]) -> Vec<Expr> {
    let present = df.get_column_names();
    names
        .iter()
        .filter(|name| !present.contains(name))
        .map(|name| lit(NULL).cast(DataType::String).alias(name))
        .collect()
}

/// numerator / denominator * 100, or 0 when the denominator is zero.
pub fn pct_or_zero(numerator: Expr, denominator: Expr) -> Expr {
    let rate = numerator.cast(DataType::Float64) / denominator.clone().cast(DataType::Float64)
        * lit(100.0);
    when(denominator.gt(lit(0)))
        .then(rate)
        .otherwise(lit(0.0))
        .round(2)
}

/// numerator / denominator * 100, or null when the denominator is zero.
/// Null keeps "no denominator" distinguishable from a true 0%.
pub fn pct_or_null(numerator: Expr, denominator: Expr) -> Expr {
    let rate = numerator.cast(DataType::Float64) / denominator.clone().cast(DataType::Float64)
        * lit(100.0);
    when(denominator.gt(lit(0)))
        .then(rate)
        .otherwise(lit(NULL))
        .round(2)
}

/// numerator / denominator, or 0 when the denominator is zero.
pub fn ratio_or_zero(numerator: Expr, denominator: Expr) -> Expr {
    let ratio = numerator.cast(DataType::Float64) / denominator.clone().cast(DataType::Float64);
    when(denominator.gt(lit(0)))
        .then(ratio)
        .otherwise(lit(0.0))
        .round(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pct_guards_divide_by_zero() {
        let df = df!(
            "num" => &[5i64, 3, 0],
            "den" => &[10i64, 0, 4],
        )
        .unwrap();

        let out = df
            .lazy()
            .select([
                pct_or_zero(col("num"), col("den")).alias("zeroed"),
                pct_or_null(col("num"), col("den")).alias("nulled"),
            ])
            .collect()
            .unwrap();

        let zeroed = out.column("zeroed").unwrap().f64().unwrap();
        assert_eq!(zeroed.get(0), Some(50.0));
        assert_eq!(zeroed.get(1), Some(0.0));

        let nulled = out.column("nulled").unwrap().f64().unwrap();
        assert_eq!(nulled.get(0), Some(50.0));
        assert_eq!(nulled.get(1), None);
        assert_eq!(nulled.get(2), Some(0.0));
    }

    #[test]
    fn absent_columns_get_null_stand_ins() {
        let df = df!("a" => &["x"]).unwrap();
        let exprs = absent_as_null(&df, &["a", "b"]);
        assert_eq!(exprs.len(), 1);

        let out = df.lazy().with_columns(exprs).collect().unwrap();
        assert_eq!(out.column("a").unwrap().null_count(), 0);
        assert_eq!(out.column("b").unwrap().null_count(), 1);
        assert_eq!(out.column("b").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn minutes_between_handles_nulls() {
        let start = df!(
            "start" => &["2026-02-01 09:00:00", "2026-02-01 09:00:00"],
            "end" => &[Some("2026-02-01 09:45:30"), None],
        )
        .unwrap();

        let options = StrptimeOptions {
            format: Some("%Y-%m-%d %H:%M:%S".to_string()),
            strict: false,
            exact: true,
            cache: true,
        };

        let out = start
            .lazy()
            .with_columns([
                col("start").str().to_datetime(
                    Some(TimeUnit::Milliseconds),
                    None,
                    options.clone(),
                    lit("raise"),
                ),
                col("end").str().to_datetime(
                    Some(TimeUnit::Milliseconds),
                    None,
                    options,
                    lit("raise"),
                ),
            ])
            .select([minutes_between(col("end"), col("start")).alias("minutes")])
            .collect()
            .unwrap();

        let minutes = out.column("minutes").unwrap().f64().unwrap();
        assert_eq!(minutes.get(0), Some(45.5));
        assert_eq!(minutes.get(1), None);
    }
}
