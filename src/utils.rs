//! Utility routines for loading and storing data into files.
use std::collections::BTreeMap;
use std::path::Path;

use csv::{ReaderBuilder, Trim, Writer};
use ndarray::prelude::*;

use crate::error::{Error, Result};
use crate::probes::ProbesByClass;

/// Loads a CSV data file, grouping probes by class.
///
/// The file has no header, and each row reads:
///     label, x1, x2, ...
/// where x1, x2, ... are the attributes of one probe. The label is
/// any string; every row must have the same number of attributes.
pub fn load_data<P: AsRef<Path>>(path: P) -> Result<ProbesByClass> {
    let mut reader = ReaderBuilder::new().has_headers(false)
                                         .flexible(true)
                                         .trim(Trim::All)
                                         .from_path(path)?;

    // Row-major attribute values, probe after probe.
    let mut values: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut d: Option<usize> = None;

    for (line, result) in reader.records().enumerate() {
        let record = result?;
        let line = line + 1;

        if record.len() < 2 {
            return Err(Error::DataFormat(format!(
                "line {}: expected a label and at least one attribute", line
            )));
        }
        match d {
            Some(x) if x != record.len() - 1 => {
                return Err(Error::DataFormat(format!(
                    "line {}: expected {} attributes, found {}", line, x, record.len() - 1
                )));
            }
            Some(_) => {}
            None => d = Some(record.len() - 1),
        }

        let probe = record.iter()
                          .skip(1)  // First one is the label.
                          .map(|x| x.parse::<f64>().map_err(|_| {
                              Error::DataFormat(format!("line {}: `{}` is not a number", line, x))
                          }))
                          .collect::<Result<Vec<f64>>>()?;
        values.entry(record[0].to_string())
              .or_insert_with(Vec::new)
              .extend(probe);
    }

    let d = d.ok_or_else(|| Error::DataFormat("file contains no probes".to_string()))?;

    values.into_iter()
          .map(|(label, values)| -> Result<(String, Array2<f64>)> {
              let n = values.len() / d;
              // Rows are probes in the file; columns are probes in memory.
              let probes = Array2::from_shape_vec((n, d), values)
                                  .map_err(|e| Error::DataFormat(e.to_string()))?
                                  .reversed_axes();
              Ok((label, probes))
          })
          .collect()
}

/// Stores the accuracy of each run into a CSV file.
///
/// Each line after the header reads:
///     run, accuracy
pub fn store_accuracies<P: AsRef<Path>>(accuracies: &[f64], path: P) -> Result<()> {
    let mut writer = Writer::from_path(path)?;

    writer.write_record(&["run", "accuracy"])?;
    for (run, accuracy) in accuracies.iter().enumerate() {
        writer.write_record(&[(run + 1).to_string(), accuracy.to_string()])?;
    }

    writer.flush()?;
    Ok(())
}
