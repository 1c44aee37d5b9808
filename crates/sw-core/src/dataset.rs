//! Column-oriented tabular dataset and its reductions to calculator inputs.
//!
//! A [`Dataset`] is what the loading collaborator hands over: named columns,
//! each either numeric or categorical, with missing cells as `None`. The
//! reduction helpers drop missing values the same way for every procedure
//! (row-wise, only over the columns involved).

use serde::{Deserialize, Serialize};

use crate::types::{
    ContingencyTable, GroupedSample, ProportionSample, TwoFactorObservation, TwoFactorSample,
    VariableKind,
};
use crate::{Error, Result};

/// Cell values of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnData {
    /// Numeric column. Non-finite values are treated as missing.
    Numeric(Vec<Option<f64>>),
    /// Categorical (string) column.
    Categorical(Vec<Option<String>>),
}

impl ColumnData {
    /// Number of cells.
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Categorical(v) => v.len(),
        }
    }

    /// `true` when the column has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cell `i` rendered as a label (numbers use their shortest display form).
    pub fn label_at(&self, i: usize) -> Option<String> {
        match self {
            ColumnData::Numeric(v) => v[i].filter(|x| x.is_finite()).map(|x| x.to_string()),
            ColumnData::Categorical(v) => v[i].clone(),
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name (unique within the dataset).
    pub name: String,
    /// Cell values.
    pub values: ColumnData,
}

impl Column {
    /// Numeric column from optional values.
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self { name: name.into(), values: ColumnData::Numeric(values) }
    }

    /// Categorical column from optional strings.
    pub fn categorical(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self { name: name.into(), values: ColumnData::Categorical(values) }
    }
}

/// Rows x named columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDataset")]
pub struct Dataset {
    columns: Vec<Column>,
}

#[derive(Deserialize)]
struct RawDataset {
    columns: Vec<Column>,
}

impl TryFrom<RawDataset> for Dataset {
    type Error = Error;

    fn try_from(raw: RawDataset) -> Result<Self> {
        Self::new(raw.columns)
    }
}

impl Dataset {
    /// Create a dataset. Columns must have equal length and unique names.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let n = first.values.len();
            for (i, c) in columns.iter().enumerate() {
                if c.values.len() != n {
                    return Err(Error::InputShape(format!(
                        "column '{}' has {} rows, expected {}",
                        c.name,
                        c.values.len(),
                        n
                    )));
                }
                if columns[..i].iter().any(|o| o.name == c.name) {
                    return Err(Error::InputShape(format!("duplicate column name '{}'", c.name)));
                }
            }
        }
        Ok(Self { columns })
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    /// Columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Consume into columns.
    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| Error::InputShape(format!("unknown column '{}'", name)))
    }

    /// Names of numeric columns.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| matches!(c.values, ColumnData::Numeric(_)))
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Names of categorical columns.
    pub fn categorical_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| matches!(c.values, ColumnData::Categorical(_)))
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Raw numeric cells of a column (non-finite values mapped to `None`).
    pub fn numeric(&self, name: &str) -> Result<Vec<Option<f64>>> {
        match &self.column(name)?.values {
            ColumnData::Numeric(v) => Ok(v.iter().map(|x| x.filter(|x| x.is_finite())).collect()),
            ColumnData::Categorical(_) => {
                Err(Error::InputShape(format!("column '{}' is not numeric", name)))
            }
        }
    }

    /// Non-missing values of a numeric column.
    pub fn numeric_values(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self.numeric(name)?.into_iter().flatten().collect())
    }

    /// Cells of any column rendered as labels.
    pub fn labels(&self, name: &str) -> Result<Vec<Option<String>>> {
        let col = &self.column(name)?.values;
        Ok((0..col.len()).map(|i| col.label_at(i)).collect())
    }

    /// Two numeric columns with rows dropped where either is missing.
    pub fn paired(&self, x: &str, y: &str) -> Result<(Vec<f64>, Vec<f64>)> {
        let xs = self.numeric(x)?;
        let ys = self.numeric(y)?;
        Ok(xs
            .into_iter()
            .zip(ys)
            .filter_map(|(a, b)| Some((a?, b?)))
            .unzip())
    }

    /// Numeric `value` column split by the `group` column.
    pub fn grouped(&self, group: &str, value: &str) -> Result<GroupedSample> {
        let labels = self.labels(group)?;
        let values = self.numeric(value)?;
        let (ls, vs): (Vec<String>, Vec<f64>) = labels
            .into_iter()
            .zip(values)
            .filter_map(|(l, v)| Some((l?, v?)))
            .unzip();
        GroupedSample::from_pairs(&ls, &vs)
    }

    /// Observations for a two-factor design.
    pub fn two_factor(&self, factor_a: &str, factor_b: &str, value: &str) -> Result<TwoFactorSample> {
        let a = self.labels(factor_a)?;
        let b = self.labels(factor_b)?;
        let v = self.numeric(value)?;
        let observations: Vec<TwoFactorObservation> = a
            .into_iter()
            .zip(b)
            .zip(v)
            .filter_map(|((a, b), v)| Some(TwoFactorObservation { a: a?, b: b?, value: v? }))
            .collect();
        TwoFactorSample::new(observations)
    }

    /// Cross-tabulate two columns. Row and column labels are sorted.
    pub fn crosstab(&self, rows: &str, cols: &str) -> Result<ContingencyTable> {
        let r = self.labels(rows)?;
        let c = self.labels(cols)?;
        let pairs: Vec<(String, String)> =
            r.into_iter().zip(c).filter_map(|(a, b)| Some((a?, b?))).collect();
        crosstab_pairs(&pairs)
    }

    /// Proportion of 1s in a 0/1 coded column (missing dropped).
    pub fn binary_proportion(&self, name: &str) -> Result<ProportionSample> {
        ProportionSample::from_binary(&self.numeric_values(name)?)
    }

    /// Success proportions of a 0/1 outcome for exactly two groups, in sorted
    /// group-label order.
    pub fn group_proportions(
        &self,
        group: &str,
        outcome: &str,
    ) -> Result<((String, ProportionSample), (String, ProportionSample))> {
        let grouped = self.grouped(group, outcome)?;
        if grouped.n_groups() != 2 {
            return Err(Error::InputShape(format!(
                "grouping column '{}' must have exactly two categories, found {}",
                group,
                grouped.n_groups()
            )));
        }
        let mut parts: Vec<(String, ProportionSample)> = grouped
            .iter()
            .map(|(label, values)| Ok((label.to_string(), ProportionSample::from_binary(values)?)))
            .collect::<Result<_>>()?;
        parts.sort_by(|a, b| a.0.cmp(&b.0));
        let second = parts.pop().ok_or_else(|| Error::InputShape("missing group".to_string()))?;
        let first = parts.pop().ok_or_else(|| Error::InputShape("missing group".to_string()))?;
        Ok((first, second))
    }

    /// Binary iff the column has exactly two distinct non-missing values.
    pub fn variable_kind(&self, name: &str) -> Result<VariableKind> {
        let mut distinct: Vec<String> = self.labels(name)?.into_iter().flatten().collect();
        distinct.sort();
        distinct.dedup();
        let is_numeric = matches!(self.column(name)?.values, ColumnData::Numeric(_));
        match distinct.len() {
            2 => Ok(VariableKind::Binary),
            _ if is_numeric => Ok(VariableKind::Continuous),
            n => Err(Error::InputShape(format!(
                "categorical column '{}' has {} categories; only binary categorical columns can be correlated",
                name, n
            ))),
        }
    }
}

/// Count `(row_label, col_label)` pairs into a table with sorted labels.
pub fn crosstab_pairs(pairs: &[(String, String)]) -> Result<ContingencyTable> {
    let mut row_labels: Vec<String> = pairs.iter().map(|(r, _)| r.clone()).collect();
    row_labels.sort();
    row_labels.dedup();
    let mut col_labels: Vec<String> = pairs.iter().map(|(_, c)| c.clone()).collect();
    col_labels.sort();
    col_labels.dedup();
    if row_labels.is_empty() || col_labels.is_empty() {
        return Err(Error::InsufficientData("no complete pairs to cross-tabulate".to_string()));
    }

    let mut counts = vec![vec![0u64; col_labels.len()]; row_labels.len()];
    for (r, c) in pairs {
        // Labels were collected from `pairs`, so both searches succeed.
        let i = row_labels.binary_search(r).unwrap_or_default();
        let j = col_labels.binary_search(c).unwrap_or_default();
        counts[i][j] += 1;
    }
    ContingencyTable::with_labels(counts, row_labels, col_labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    fn sample() -> Dataset {
        Dataset::new(vec![
            Column::categorical("group", vec![s("b"), s("a"), s("b"), s("a"), None, s("a")]),
            Column::numeric("score", vec![Some(1.0), Some(2.0), None, Some(4.0), Some(5.0), Some(6.0)]),
            Column::numeric("passed", vec![Some(1.0), Some(0.0), Some(1.0), Some(1.0), Some(0.0), Some(0.0)]),
            Column::numeric("other", vec![Some(3.0), None, Some(1.0), Some(2.0), Some(2.0), Some(8.0)]),
        ])
        .unwrap()
    }

    #[test]
    fn test_rejects_ragged_and_duplicate_columns() {
        let ragged = Dataset::new(vec![
            Column::numeric("x", vec![Some(1.0)]),
            Column::numeric("y", vec![Some(1.0), Some(2.0)]),
        ]);
        assert!(matches!(ragged, Err(Error::InputShape(_))));
        let dup = Dataset::new(vec![
            Column::numeric("x", vec![Some(1.0)]),
            Column::numeric("x", vec![Some(2.0)]),
        ]);
        assert!(dup.is_err());
    }

    #[test]
    fn test_paired_drops_rows_with_any_missing() {
        let d = sample();
        let (x, y) = d.paired("score", "other").unwrap();
        assert_eq!(x, vec![1.0, 4.0, 5.0, 6.0]);
        assert_eq!(y, vec![3.0, 2.0, 2.0, 8.0]);
    }

    #[test]
    fn test_grouped_drops_missing_and_keeps_order() {
        let g = sample().grouped("group", "score").unwrap();
        let groups: Vec<(&str, Vec<f64>)> = g.iter().map(|(l, v)| (l, v.to_vec())).collect();
        assert_eq!(groups, vec![("b", vec![1.0]), ("a", vec![2.0, 4.0, 6.0])]);
    }

    #[test]
    fn test_crosstab_sorted_labels() {
        let t = sample().crosstab("group", "passed").unwrap();
        assert_eq!(t.row_labels().unwrap(), &["a".to_string(), "b".to_string()]);
        assert_eq!(t.col_labels().unwrap(), &["0".to_string(), "1".to_string()]);
        assert_eq!(t.counts(), &[vec![2, 1], vec![0, 2]]);
    }

    #[test]
    fn test_group_proportions_sorted_by_label() {
        let ((la, pa), (lb, pb)) = sample().group_proportions("group", "passed").unwrap();
        assert_eq!((la.as_str(), pa.successes, pa.trials), ("a", 1, 3));
        assert_eq!((lb.as_str(), pb.successes, pb.trials), ("b", 2, 2));
    }

    #[test]
    fn test_variable_kind() {
        let d = sample();
        assert_eq!(d.variable_kind("passed").unwrap(), VariableKind::Binary);
        assert_eq!(d.variable_kind("score").unwrap(), VariableKind::Continuous);
        assert_eq!(d.variable_kind("group").unwrap(), VariableKind::Binary);
    }

    #[test]
    fn test_unknown_or_wrong_type_column() {
        let d = sample();
        assert!(matches!(d.numeric("nope"), Err(Error::InputShape(_))));
        assert!(matches!(d.numeric("group"), Err(Error::InputShape(_))));
    }

    #[test]
    fn test_deserialize_mixed_columns() {
        let json = r#"{"columns":[
            {"name":"x","values":[1.5,null,3]},
            {"name":"g","values":["a","b",null]}
        ]}"#;
        let d: Dataset = serde_json::from_str(json).unwrap();
        assert_eq!(d.n_rows(), 3);
        assert_eq!(d.numeric_columns(), vec!["x"]);
        assert_eq!(d.categorical_columns(), vec!["g"]);
    }
}
