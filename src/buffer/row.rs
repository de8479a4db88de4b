use std::fmt;

/// A single contiguous buffer split into rows of varying length, one row per layer.
#[derive(Clone, PartialEq)]
pub struct RowBuffer {
    buffer: Box<[f64]>,
    row_offsets_and_sizes: Box<[(usize, usize)]>,
}

impl fmt::Debug for RowBuffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let mut s = &mut f.debug_struct("RowBuffer");
        if self.buffer.len() < 30 {
            s = s.field("buffer", &self.buffer);
        } else {
            s = s.field("buffer_len", &self.buffer.len());
        }
        s.field("row_offsets_and_sizes", &self.row_offsets_and_sizes)
            .finish()
    }
}

impl RowBuffer {

    pub fn new_with_row_sizes(initial_value: f64, row_sizes: impl AsRef<[usize]>) -> Self {
        let row_sizes = row_sizes.as_ref();
        assert!(row_sizes.len() > 0);
        let total_size: usize = row_sizes.iter().sum();
        let mut row_offsets_and_sizes: Vec<(usize, usize)> = Vec::with_capacity(row_sizes.len());
        let mut offset: usize = 0;
        for &size in row_sizes {
            row_offsets_and_sizes.push((offset, size));
            offset += size;
        }
        RowBuffer {
            buffer: vec![initial_value; total_size].into_boxed_slice(),
            row_offsets_and_sizes: row_offsets_and_sizes.into_boxed_slice()
        }
    }

    #[inline]
    pub fn get_row(&self, row: usize) -> &[f64] {
        let (offset, size) = self.row_offsets_and_sizes[row];
        &self.buffer[offset..offset + size]
    }

    #[inline]
    pub fn get_row_mut(&mut self, row: usize) -> &mut [f64] {
        let (offset, size) = self.row_offsets_and_sizes[row];
        &mut self.buffer[offset..offset + size]
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.row_offsets_and_sizes.len()
    }

    #[inline]
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn get_buffer(&self) -> &[f64] {
        &self.buffer
    }

    #[inline]
    pub fn get_buffer_mut(&mut self) -> &mut [f64] {
        &mut self.buffer
    }

}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_row_sizes_types() {
        RowBuffer::new_with_row_sizes(0.0, vec![1, 2, 3]);
        RowBuffer::new_with_row_sizes(0.0, &vec![1, 2, 3]);
        RowBuffer::new_with_row_sizes(0.0, [1, 2, 3]);
        RowBuffer::new_with_row_sizes(0.0, &[1, 2, 3]);
    }

    #[test]
    #[should_panic(expected = "assertion failed: row_sizes.len() > 0")]
    fn test_empty_not_allowed() {
        RowBuffer::new_with_row_sizes(0.0, Vec::new());
    }

    #[test]
    fn test_basics() {

        let mut buf = RowBuffer::new_with_row_sizes(0.0, vec![1, 0, 10, 2]);

        assert_eq!(4, buf.num_rows());
        assert_eq!(13, buf.buffer_len());
        assert_eq!(1, buf.get_row(0).len());
        assert_eq!(0, buf.get_row(1).len());
        assert_eq!(10, buf.get_row_mut(2).len());
        assert_eq!(2, buf.get_row(3).len());

        for i in 0..buf.num_rows() {
            let row = buf.get_row_mut(i);
            for j in 0..row.len() {
                row[j] = (i * 10 + j) as f64;
            }
        }

        for i in 0..buf.num_rows() {
            let row = buf.get_row(i);
            for j in 0..row.len() {
                assert_eq!(row[j], (i * 10 + j) as f64);
            }
        }

        let mut buf2 = RowBuffer::new_with_row_sizes(0.0, vec![1, 0, 10, 2]);
        assert_ne!(buf, buf2);
        buf2.get_buffer_mut().copy_from_slice(buf.get_buffer());
        assert_eq!(buf, buf2);
    }

}
