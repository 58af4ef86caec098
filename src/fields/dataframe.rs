use polars::prelude::{Column, DataFrame};
use tracing::debug;

use crate::array::FieldArray;
use crate::error::{FieldError, FieldResult};
use super::container::FieldContainer;
use super::KeyFilter;

/// Split `name` into a base field name and a trailing column index, e.g. `vel2` -> (`vel`, 2).
fn split_index_suffix(name: &str) -> FieldResult<(&str, usize)> {
    let base = name.trim_end_matches(|c: char| c.is_ascii_digit());
    if base.len() == name.len() || base.is_empty() {
        return Err(FieldError::dimension(format!("Field '{}' not found", name)));
    }
    let idx = name[base.len()..]
        .parse::<usize>()
        .map_err(|e| FieldError::dimension(format!("bad column index in '{}': {}", name, e)))?;
    Ok((base, idx))
}

impl FieldContainer {
    /// Project every enumerable field (no child containers) into a dataframe.
    pub fn dataframe(&mut self) -> FieldResult<DataFrame> {
        self.get_dataframe(None)
    }

    /// Project the requested fields into a dataframe.
    ///
    /// Two-dimensional fields expand to one column per component (`vel0`,
    /// `vel1`, ...); a name like `vel1` that is not itself a field selects a
    /// single component. Any invalid name aborts the whole projection.
    pub fn get_dataframe(&mut self, fields: Option<&[&str]>) -> FieldResult<DataFrame> {
        let names: Vec<String> = match fields {
            Some(f) => f.iter().map(|s| s.to_string()).collect(),
            None => self.keys(KeyFilter::without_containers()),
        };
        let mut columns: Vec<(String, FieldArray)> = Vec::new();
        for requested in &names {
            let (base, idim) = if self.contains_key(requested) {
                (requested.as_str(), None)
            } else {
                let (b, i) = split_index_suffix(requested)?;
                (b, Some(i))
            };
            let v = match self.array(base) {
                Ok(v) => v,
                Err(e) if e.is_not_found() => return Err(FieldError::dimension(format!("Field '{}' not found", requested))),
                Err(e) => return Err(e),
            };
            if v.ndim() > 2 {
                return Err(FieldError::dimension(format!("field '{}' has ndim={}, at most 2 supported", base, v.ndim())));
            }
            if let Some(i) = idim {
                if v.ndim() <= 1 {
                    return Err(FieldError::dimension(format!("No second dimensional index for {}", base)));
                }
                if i >= v.shape()[1] {
                    return Err(FieldError::dimension(format!("Second dimensional index {} not defined for {}", i, base)));
                }
            }
            if v.ndim() == 2 {
                for i in 0..v.shape()[1] {
                    if idim.map_or(true, |d| d == i) {
                        let cname = format!("{}{}", base, i);
                        if !columns.iter().any(|(n, _)| *n == cname) {
                            columns.push((cname, v.column(i)?));
                        }
                    }
                }
            } else if !columns.iter().any(|(n, _)| n == base) {
                columns.push((base.to_string(), v));
            }
        }
        debug!(target: "fieldstore::fields", container=?self.name(), columns=?columns.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>(), "get_dataframe");

        let mut height: Option<(String, usize)> = None;
        let mut cols: Vec<Column> = Vec::with_capacity(columns.len());
        for (name, arr) in columns {
            let n = arr.len().unwrap_or(0);
            match &height {
                Some((first, h)) if *h != n => {
                    return Err(FieldError::dimension(format!("column '{}' has {} rows, '{}' has {}", name, n, first, h)));
                }
                Some(_) => {}
                None => height = Some((name.clone(), n)),
            }
            cols.push(arr.to_series(&name)?.into());
        }
        Ok(DataFrame::new(cols)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_parsing() {
        assert_eq!(split_index_suffix("vel2").unwrap(), ("vel", 2));
        assert_eq!(split_index_suffix("Coordinates10").unwrap(), ("Coordinates", 10));
        assert!(split_index_suffix("mass").is_err());
        assert!(split_index_suffix("123").is_err());
    }
}
