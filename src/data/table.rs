//! Observation table: the validated predictor/target view of the input frame

use crate::error::{Result, XaiError};
use ndarray::{Array1, Array2};
use polars::prelude::*;

/// Plant measurements restricted to the model's predictor and target columns.
///
/// Construction guarantees that every required column is present, numeric
/// (stored as `Float64`), finite and free of missing values.
#[derive(Debug, Clone)]
pub struct ObservationTable {
    frame: DataFrame,
    feature_names: Vec<String>,
    target_name: String,
}

impl ObservationTable {
    /// Validate `df` against the expected schema and keep only the required columns
    pub fn from_frame(df: DataFrame, feature_names: &[String], target_name: &str) -> Result<Self> {
        let present: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();

        let mut required: Vec<String> = feature_names.to_vec();
        required.push(target_name.to_string());

        let missing: Vec<&str> = required
            .iter()
            .filter(|name| !present.contains(name))
            .map(|s| s.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(XaiError::DataFormatError(format!(
                "missing required columns: {} (found: {})",
                missing.join(", "),
                present.join(", ")
            )));
        }

        let mut columns = Vec::with_capacity(required.len());
        for name in &required {
            let column = df.column(name)?;
            if column.null_count() > 0 {
                return Err(XaiError::DataFormatError(format!(
                    "column {} has {} missing values",
                    name,
                    column.null_count()
                )));
            }
            let as_f64 = column.cast(&DataType::Float64).map_err(|e| {
                XaiError::DataFormatError(format!("column {} is not numeric: {}", name, e))
            })?;
            if as_f64.null_count() > 0 {
                return Err(XaiError::DataFormatError(format!(
                    "column {} contains {} non-numeric values",
                    name,
                    as_f64.null_count()
                )));
            }
            let non_finite = as_f64.f64()?.into_no_null_iter().filter(|v| !v.is_finite()).count();
            if non_finite > 0 {
                return Err(XaiError::DataFormatError(format!(
                    "column {} contains {} NaN or infinite values",
                    name, non_finite
                )));
            }
            columns.push(as_f64);
        }

        let frame = DataFrame::new(columns)?;

        Ok(Self {
            frame,
            feature_names: feature_names.to_vec(),
            target_name: target_name.to_string(),
        })
    }

    /// Build a table from in-memory arrays
    pub fn from_arrays(
        features: &Array2<f64>,
        target: &Array1<f64>,
        feature_names: &[String],
        target_name: &str,
    ) -> Result<Self> {
        if features.ncols() != feature_names.len() {
            return Err(XaiError::ShapeError {
                expected: format!("{} feature columns", feature_names.len()),
                actual: format!("{} columns", features.ncols()),
            });
        }
        if features.nrows() != target.len() {
            return Err(XaiError::ShapeError {
                expected: format!("target length = {}", features.nrows()),
                actual: format!("target length = {}", target.len()),
            });
        }

        let mut columns: Vec<Column> = feature_names
            .iter()
            .enumerate()
            .map(|(j, name)| Column::new(name.as_str().into(), features.column(j).to_vec()))
            .collect();
        columns.push(Column::new(target_name.into(), target.to_vec()));

        Self::from_frame(DataFrame::new(columns)?, feature_names, target_name)
    }

    /// Number of observations
    pub fn n_rows(&self) -> usize {
        self.frame.height()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    /// The validated frame (predictors followed by the target)
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// First `n` rows, for log previews
    pub fn head(&self, n: usize) -> DataFrame {
        self.frame.head(Some(n))
    }

    /// Predictor matrix, rows × features, in `feature_names` order
    pub fn features(&self) -> Result<Array2<f64>> {
        let col_data: Vec<Vec<f64>> = self
            .feature_names
            .iter()
            .map(|name| self.column_values(name))
            .collect::<Result<Vec<_>>>()?;

        let n_rows = self.n_rows();
        Ok(Array2::from_shape_fn((n_rows, col_data.len()), |(r, c)| col_data[c][r]))
    }

    /// Target vector
    pub fn target(&self) -> Result<Array1<f64>> {
        Ok(Array1::from_vec(self.column_values(&self.target_name)?))
    }

    fn column_values(&self, name: &str) -> Result<Vec<f64>> {
        let column = self
            .frame
            .column(name)
            .map_err(|_| XaiError::DataFormatError(format!("column {} not found", name)))?;
        Ok(column.f64()?.into_no_null_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["AT".to_string(), "V".to_string()]
    }

    #[test]
    fn test_from_frame_selects_and_casts() {
        let df = df!(
            "AT" => &[14.96, 25.18, 5.11],
            "V" => &[41.76, 62.96, 39.4],
            "note" => &["a", "b", "c"],
            "PE" => &[463, 444, 488]
        )
        .unwrap();

        let table = ObservationTable::from_frame(df, &names(), "PE").unwrap();
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.frame().width(), 3);

        let x = table.features().unwrap();
        assert_eq!(x.dim(), (3, 2));
        assert!((x[[1, 0]] - 25.18).abs() < 1e-12);
        assert!((x[[2, 1]] - 39.4).abs() < 1e-12);

        let y = table.target().unwrap();
        assert_eq!(y.to_vec(), vec![463.0, 444.0, 488.0]);
    }

    #[test]
    fn test_missing_column_is_format_error() {
        let df = df!("AT" => &[1.0, 2.0], "PE" => &[3.0, 4.0]).unwrap();
        let err = ObservationTable::from_frame(df, &names(), "PE").unwrap_err();
        match err {
            XaiError::DataFormatError(msg) => assert!(msg.contains('V'), "{}", msg),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_null_values_rejected() {
        let df = df!(
            "AT" => &[Some(1.0), None],
            "V" => &[1.0, 2.0],
            "PE" => &[3.0, 4.0]
        )
        .unwrap();
        let err = ObservationTable::from_frame(df, &names(), "PE").unwrap_err();
        assert!(matches!(err, XaiError::DataFormatError(_)));
    }

    #[test]
    fn test_non_numeric_rejected() {
        let df = df!(
            "AT" => &["1.0", "hot"],
            "V" => &[1.0, 2.0],
            "PE" => &[3.0, 4.0]
        )
        .unwrap();
        let err = ObservationTable::from_frame(df, &names(), "PE").unwrap_err();
        assert!(matches!(err, XaiError::DataFormatError(_)));
    }

    #[test]
    fn test_non_finite_rejected() {
        let df = df!(
            "AT" => &[1.0, 2.0],
            "V" => &[1.0, f64::NAN],
            "PE" => &[3.0, f64::INFINITY]
        )
        .unwrap();
        match ObservationTable::from_frame(df, &names(), "PE").unwrap_err() {
            XaiError::DataFormatError(msg) => assert!(msg.contains("column V contains 1 NaN"), "{}", msg),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_from_arrays_shape_checks() {
        let x = Array2::zeros((3, 2));
        let y = Array1::zeros(2);
        let err = ObservationTable::from_arrays(&x, &y, &names(), "PE").unwrap_err();
        assert!(matches!(err, XaiError::ShapeError { .. }));
    }
}
