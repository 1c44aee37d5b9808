//! Categorical encoding of dataset columns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sw_core::{Column, ColumnData, Dataset, Error, Result};

/// Sorted classes and the per-row code of each value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoding {
    /// Distinct labels, ascending; a label's code is its index.
    pub classes: Vec<String>,
    /// Code per row, `None` for missing cells.
    pub codes: Vec<Option<u32>>,
}

/// Encode labels as `0..k-1` in sorted label order.
pub fn label_encode(values: &[Option<String>]) -> LabelEncoding {
    let mut classes: Vec<String> = values.iter().flatten().cloned().collect();
    classes.sort();
    classes.dedup();
    let codes = values
        .iter()
        .map(|v| v.as_ref().and_then(|v| classes.binary_search(v).ok()).map(|i| i as u32))
        .collect();
    LabelEncoding { classes, codes }
}

fn categorical<'a>(dataset: &'a Dataset, name: &str) -> Result<&'a [Option<String>]> {
    match &dataset.column(name)?.values {
        ColumnData::Categorical(v) => Ok(v),
        ColumnData::Numeric(_) => Err(Error::InputShape(format!(
            "column '{}' is numeric; only categorical columns can be encoded",
            name
        ))),
    }
}

fn validate_selection(dataset: &Dataset, columns: &[String]) -> Result<()> {
    if columns.is_empty() {
        return Err(Error::InputShape("select at least one column to encode".to_string()));
    }
    for c in columns {
        categorical(dataset, c)?;
    }
    Ok(())
}

/// Replace each selected column by `<column>_<label>` 0/1 indicator columns.
///
/// Unselected columns keep their order; indicators are appended in selection
/// order with labels ascending. A missing cell is 0 in every indicator.
pub fn one_hot_encode(dataset: &Dataset, columns: &[String]) -> Result<Dataset> {
    validate_selection(dataset, columns)?;
    let mut out: Vec<Column> =
        dataset.columns().iter().filter(|c| !columns.contains(&c.name)).cloned().collect();
    for name in columns {
        let encoded = label_encode(categorical(dataset, name)?);
        for (code, class) in encoded.classes.iter().enumerate() {
            let indicator = encoded
                .codes
                .iter()
                .map(|c| Some(if *c == Some(code as u32) { 1.0 } else { 0.0 }))
                .collect();
            out.push(Column::numeric(format!("{}_{}", name, class), indicator));
        }
    }
    Dataset::new(out)
}

/// Dataset with label-encoded columns plus the classes of each column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoded {
    /// Dataset with the selected columns replaced in place by numeric codes.
    pub dataset: Dataset,
    /// Classes per encoded column.
    pub classes: BTreeMap<String, Vec<String>>,
}

/// Label-encode the selected columns in place.
pub fn label_encode_columns(dataset: &Dataset, columns: &[String]) -> Result<LabelEncoded> {
    validate_selection(dataset, columns)?;
    let mut classes = BTreeMap::new();
    let mut out = Vec::with_capacity(dataset.columns().len());
    for column in dataset.columns() {
        if !columns.contains(&column.name) {
            out.push(column.clone());
            continue;
        }
        let encoded = label_encode(categorical(dataset, &column.name)?);
        let codes = encoded.codes.iter().map(|c| c.map(f64::from)).collect();
        out.push(Column::numeric(column.name.clone(), codes));
        classes.insert(column.name.clone(), encoded.classes);
    }
    Ok(LabelEncoded { dataset: Dataset::new(out)?, classes })
}
