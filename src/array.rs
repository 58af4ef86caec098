//! Shared n-dimensional array handle used as the value type of every field.
//!
//! `FieldArray` is a thin variant over `ndarray::ArcArray` so cloning a field
//! (caching it, handing it to a caller, copying it during a merge) only bumps a
//! reference count. Published arrays are never mutated in place.

use ndarray::{Array1, ArcArray, ArrayD, Axis, IxDyn};
use polars::prelude::{NamedFrom, Series};

use crate::error::{FieldError, FieldResult};

#[derive(Clone, Debug, PartialEq)]
pub enum FieldArray {
    Float(ArcArray<f64, IxDyn>),
    Int(ArcArray<i64, IxDyn>),
}

impl FieldArray {
    /// Build an array of the given shape from row-major data.
    pub fn from_shape_f64(shape: &[usize], data: Vec<f64>) -> FieldResult<Self> {
        Ok(FieldArray::Float(ArrayD::from_shape_vec(IxDyn(shape), data)?.into_shared()))
    }

    pub fn from_shape_i64(shape: &[usize], data: Vec<i64>) -> FieldResult<Self> {
        Ok(FieldArray::Int(ArrayD::from_shape_vec(IxDyn(shape), data)?.into_shared()))
    }

    /// Build a two-dimensional float array from equally sized rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> FieldResult<Self> {
        let ncols = rows.first().map(|r| r.len()).unwrap_or(0);
        if let Some(bad) = rows.iter().position(|r| r.len() != ncols) {
            return Err(FieldError::dimension(format!(
                "row {} has {} columns, expected {}", bad, rows[bad].len(), ncols
            )));
        }
        let data: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Self::from_shape_f64(&[rows.len(), ncols], data)
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            FieldArray::Float(a) => a.shape(),
            FieldArray::Int(a) => a.shape(),
        }
    }

    pub fn ndim(&self) -> usize { self.shape().len() }

    /// Length of the first dimension; `None` for zero-dimensional arrays.
    pub fn len(&self) -> Option<usize> { self.shape().first().copied() }

    pub fn is_empty(&self) -> bool { self.shape().iter().product::<usize>() == 0 }

    /// Column `idx` of a two-dimensional array (`arr[:, idx]`).
    pub fn column(&self, idx: usize) -> FieldResult<FieldArray> {
        if self.ndim() != 2 {
            return Err(FieldError::dimension(format!("column access needs a 2D array, got ndim={}", self.ndim())));
        }
        if idx >= self.shape()[1] {
            return Err(FieldError::dimension(format!("column {} out of range for shape {:?}", idx, self.shape())));
        }
        Ok(match self {
            FieldArray::Float(a) => FieldArray::Float(a.index_axis(Axis(1), idx).to_owned().into_shared()),
            FieldArray::Int(a) => FieldArray::Int(a.index_axis(Axis(1), idx).to_owned().into_shared()),
        })
    }

    /// Elementwise float map; integer arrays are widened first.
    pub fn map_f64<F: Fn(f64) -> f64>(&self, f: F) -> FieldArray {
        match self {
            FieldArray::Float(a) => FieldArray::Float(a.mapv(f).into_shared()),
            FieldArray::Int(a) => FieldArray::Float(a.mapv(|v| f(v as f64)).into_shared()),
        }
    }

    /// Euclidean norm of every row of a two-dimensional array.
    pub fn row_norm(&self) -> FieldResult<FieldArray> {
        if self.ndim() != 2 {
            return Err(FieldError::dimension(format!("row_norm needs a 2D array, got ndim={}", self.ndim())));
        }
        let sq: ArrayD<f64> = match self {
            FieldArray::Float(a) => a.mapv(|v| v * v),
            FieldArray::Int(a) => a.mapv(|v| (v as f64) * (v as f64)),
        };
        Ok(FieldArray::Float(sq.sum_axis(Axis(1)).mapv(f64::sqrt).into_shared()))
    }

    /// Flattened values in logical (row-major) order, widened to f64.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            FieldArray::Float(a) => a.iter().copied().collect(),
            FieldArray::Int(a) => a.iter().map(|v| *v as f64).collect(),
        }
    }

    pub fn as_float(&self) -> Option<&ArcArray<f64, IxDyn>> {
        match self {
            FieldArray::Float(a) => Some(a),
            FieldArray::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<&ArcArray<i64, IxDyn>> {
        match self {
            FieldArray::Int(a) => Some(a),
            FieldArray::Float(_) => None,
        }
    }

    /// True when both handles share the same underlying buffer.
    pub fn ptr_eq(&self, other: &FieldArray) -> bool {
        match (self, other) {
            (FieldArray::Float(a), FieldArray::Float(b)) => a.as_ptr() == b.as_ptr() && a.shape() == b.shape(),
            (FieldArray::Int(a), FieldArray::Int(b)) => a.as_ptr() == b.as_ptr() && a.shape() == b.shape(),
            _ => false,
        }
    }

    /// Convert a one-dimensional array into a named polars column.
    pub fn to_series(&self, name: &str) -> FieldResult<Series> {
        if self.ndim() != 1 {
            return Err(FieldError::dimension(format!("cannot build column '{}' from ndim={}", name, self.ndim())));
        }
        Ok(match self {
            FieldArray::Float(a) => Series::new(name.into(), a.iter().copied().collect::<Vec<f64>>()),
            FieldArray::Int(a) => Series::new(name.into(), a.iter().copied().collect::<Vec<i64>>()),
        })
    }
}

impl From<Vec<f64>> for FieldArray {
    fn from(v: Vec<f64>) -> Self { FieldArray::Float(Array1::from(v).into_dyn().into_shared()) }
}

impl From<Vec<i64>> for FieldArray {
    fn from(v: Vec<i64>) -> Self { FieldArray::Int(Array1::from(v).into_dyn().into_shared()) }
}

impl From<ArrayD<f64>> for FieldArray {
    fn from(a: ArrayD<f64>) -> Self { FieldArray::Float(a.into_shared()) }
}

impl From<ArrayD<i64>> for FieldArray {
    fn from(a: ArrayD<i64>) -> Self { FieldArray::Int(a.into_shared()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_and_len() {
        let a = FieldArray::from(vec![1.0, 2.0, 3.0]);
        assert_eq!(a.shape(), &[3]);
        assert_eq!(a.ndim(), 1);
        assert_eq!(a.len(), Some(3));
        let v = FieldArray::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        assert_eq!(v.shape(), &[3, 2]);
        assert_eq!(v.len(), Some(3));
    }

    #[test]
    fn ragged_rows_rejected() {
        let e = FieldArray::from_rows(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert_eq!(e.code_str(), "dimension");
    }

    #[test]
    fn column_slicing() {
        let v = FieldArray::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(v.column(1).unwrap().to_f64_vec(), vec![2.0, 5.0]);
        assert!(v.column(3).is_err());
        assert!(FieldArray::from(vec![1i64, 2]).column(0).is_err());
    }

    #[test]
    fn clone_shares_buffer() {
        let a = FieldArray::from(vec![1.0, 2.0]);
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        let c = FieldArray::from(vec![1.0, 2.0]);
        assert_eq!(a, c);
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn row_norm_of_vectors() {
        let v = FieldArray::from_rows(&[vec![3.0, 4.0], vec![0.0, 1.0]]).unwrap();
        assert_eq!(v.row_norm().unwrap().to_f64_vec(), vec![5.0, 1.0]);
    }

    #[test]
    fn int_series() {
        let ids = FieldArray::from(vec![7i64, 8, 9]);
        let s = ids.to_series("uid").unwrap();
        assert_eq!(s.len(), 3);
        assert_eq!(s.name().as_str(), "uid");
    }
}
