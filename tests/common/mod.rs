//! Utility functions for testing
use anyhow::{anyhow, Result};
use ndarray::{Array1, Array2};
use num_traits::Float;
use std::{
    error::Error,
    fs::File,
    io::{BufRead, BufReader},
    str::FromStr,
};

/// Read y, x rows from a CSV with the response in the first column and any
/// number of covariates after it. Lines starting with '#' are skipped.
#[cfg(test)]
pub fn y_x_from_csv<Y, X>(file: &str) -> Result<(Array1<Y>, Array2<X>)>
where
    Y: FromStr,
    X: Float + FromStr,
    <Y as FromStr>::Err: 'static + Error + Send + Sync,
    <X as FromStr>::Err: 'static + Error + Send + Sync,
{
    let file = File::open(file)?;
    let reader = BufReader::new(file);
    let mut y_vec: Vec<Y> = Vec::new();
    let mut x_vec: Vec<X> = Vec::new();
    let mut n_cov: Option<usize> = None;
    for line_result in reader.lines() {
        let line = line_result?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let split_line: Vec<&str> = line.split(',').map(str::trim).collect();
        let this_cov = split_line.len() - 1;
        match n_cov {
            Some(n) if n != this_cov => {
                return Err(anyhow!("Expected {} covariates, found {}", n, this_cov))
            }
            _ => n_cov = Some(this_cov),
        }
        y_vec.push(split_line[0].parse()?);
        for entry in &split_line[1..] {
            x_vec.push(entry.parse()?);
        }
    }
    let y = Array1::<Y>::from(y_vec);
    let x = Array2::<X>::from_shape_vec((y.len(), n_cov.unwrap_or(0)), x_vec)?;
    Ok((y, x))
}
