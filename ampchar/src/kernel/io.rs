use super::{ConfigError, MeasureError};

use ndarray::{Array1, ArrayView1, ArrayViewMut1};

/// Adapter trait for reading contiguous 1D input.
pub trait Read1D<T> {
    /// Borrow the underlying input as a contiguous slice.
    fn read_slice(&self) -> Result<&[T], ConfigError>;
}

/// Adapter trait for writing contiguous 1D output.
pub trait Write1D<T> {
    /// Borrow the underlying output as a mutable contiguous slice.
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError>;
}

impl<T> Read1D<T> for [T] {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self)
    }
}

impl<T> Write1D<T> for [T] {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        Ok(self)
    }
}

impl<T, const N: usize> Read1D<T> for [T; N] {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self)
    }
}

impl<T, const N: usize> Write1D<T> for [T; N] {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        Ok(self)
    }
}

impl<T> Read1D<T> for Vec<T> {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self.as_slice())
    }
}

impl<T> Write1D<T> for Vec<T> {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        Ok(self.as_mut_slice())
    }
}

impl<T> Read1D<T> for Array1<T> {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        self.as_slice()
            .ok_or(ConfigError::NonContiguous { arg: "array" })
    }
}

impl<T> Write1D<T> for Array1<T> {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        self.as_slice_mut()
            .ok_or(ConfigError::NonContiguous { arg: "array" })
    }
}

impl<'a, T> Read1D<T> for ArrayView1<'a, T> {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        self.as_slice()
            .ok_or(ConfigError::NonContiguous { arg: "array_view" })
    }
}

impl<'a, T> Write1D<T> for ArrayViewMut1<'a, T> {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        self.as_slice_mut().ok_or(ConfigError::NonContiguous {
            arg: "array_view_mut",
        })
    }
}

/// Borrow an `(x, y)` pair of inputs, checking that their lengths agree.
pub(crate) fn read_paired<'a, T, X, Y>(
    x: &'a X,
    y: &'a Y,
    y_arg: &'static str,
) -> Result<(&'a [T], &'a [T]), MeasureError>
where
    X: Read1D<T> + ?Sized,
    Y: Read1D<T> + ?Sized,
{
    let x = x.read_slice()?;
    let y = y.read_slice()?;
    if x.len() != y.len() {
        return Err(MeasureError::LengthMismatch {
            arg: y_arg,
            expected: x.len(),
            got: y.len(),
        });
    }
    Ok((x, y))
}

/// Borrow a caller-provided output, checking its length.
pub(crate) fn write_exact<'a, T, O>(
    out: &'a mut O,
    arg: &'static str,
    expected: usize,
) -> Result<&'a mut [T], MeasureError>
where
    O: Write1D<T> + ?Sized,
{
    let out = out.write_slice_mut()?;
    if out.len() != expected {
        return Err(MeasureError::LengthMismatch {
            arg,
            expected,
            got: out.len(),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_and_array_adapters() {
        let a = [1.0f64, 2.0, 3.0];
        assert_eq!(a.read_slice().expect("array adapter").len(), 3);

        let s: &[f64] = &a;
        assert_eq!(s.read_slice().expect("slice adapter")[1], 2.0);
    }

    #[test]
    fn ndarray_adapters() {
        let arr = Array1::from(vec![1.0f64, 2.0, 3.0]);
        assert_eq!(arr.read_slice().expect("array1 read")[2], 3.0);

        let mut out = Array1::from(vec![0.0f64, 0.0, 0.0]);
        out.write_slice_mut()
            .expect("array1 write")
            .copy_from_slice(&[4.0, 5.0, 6.0]);
        assert_eq!(out.as_slice().expect("slice"), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn strided_views_are_rejected() {
        let arr = Array1::from(vec![1.0f64, 2.0, 3.0, 4.0]);
        let strided = arr.slice(ndarray::s![..;2]);
        assert_eq!(
            strided.read_slice(),
            Err(ConfigError::NonContiguous { arg: "array_view" })
        );
    }

    #[test]
    fn paired_inputs_must_agree_in_length() {
        let t = vec![0.0, 1.0, 2.0];
        let v = vec![0.0, 1.0];
        let err = read_paired(&t, &v, "voltage").expect_err("length mismatch");
        assert_eq!(
            err,
            MeasureError::LengthMismatch {
                arg: "voltage",
                expected: 3,
                got: 2
            }
        );
    }

    #[test]
    fn exact_output_length_is_enforced() {
        let mut out = vec![0.0f64; 4];
        assert!(write_exact(&mut out, "out", 4).is_ok());
        assert!(matches!(
            write_exact(&mut out, "out", 5),
            Err(MeasureError::LengthMismatch { expected: 5, got: 4, .. })
        ));
    }
}
