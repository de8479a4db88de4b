use std::fmt;

/// Dense row-major matrix. Rows index the input side of a connection, columns the output side.
#[derive(Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    values: Box<[f64]>,
}

impl fmt::Debug for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let mut s = &mut f.debug_struct("Matrix");
        s = s.field("rows", &self.rows).field("cols", &self.cols);
        if self.values.len() < 30 {
            s = s.field("values", &self.values);
        }
        s.finish()
    }
}

impl Matrix {

    pub fn new(rows: usize, cols: usize) -> Self {
        Matrix {
            rows,
            cols,
            values: vec![0.0; rows * cols].into_boxed_slice(),
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        let offset = row * self.cols;
        &self.values[offset..offset + self.cols]
    }

    #[inline]
    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        let offset = row * self.cols;
        &mut self.values[offset..offset + self.cols]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }

}
