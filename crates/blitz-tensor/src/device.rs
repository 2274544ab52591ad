//! Device Tensors - Buffers Managed by a Memory Backend
//!
//! `DeviceTensor` keeps its buffer in whatever memory space a [`Backend`]
//! manages. Its pointers are not assumed to be host-addressable: fills go
//! through `memset` or a staged host copy, and CSV output copies the data
//! back to the host first. Element access goes through [`to_host`] and
//! [`copy_from_host`].
//!
//! [`to_host`]: DeviceTensor::to_host
//! [`copy_from_host`]: DeviceTensor::copy_from_host
//!
//! @version 0.1.0
//! @author Blitz Development Team

use std::io::Write;

use blitz_core::backends::Backend;
use blitz_core::dtype::{DType, Element};
use blitz_core::error::{Error, Result};

use crate::csv::{self, CsvFormat};
use crate::shape::Shape;
use crate::tensor::{checked_element_count, Allocate, Instantiated, Tensor, TensorBase};

/// Tensor whose buffer lives in a backend's memory space.
pub struct DeviceTensor<T: Element> {
    base: TensorBase<T>,
    backend: &'static dyn Backend,
    bytes: usize,
}

crate::instantiate_tensor!(DeviceTensor);

impl<T: Element> DeviceTensor<T>
where
    Self: Instantiated,
{
    /// Allocates a zero-initialised tensor for `shape` on `backend`.
    ///
    /// Fails if the backend is unavailable or cannot hold `T`.
    pub fn new(shape: Shape, backend: &'static dyn Backend) -> Result<Self> {
        if !backend.is_available() {
            return Err(Error::DeviceNotAvailable {
                device: backend.device(),
            });
        }
        if T::DTYPE == DType::F64 && !backend.capabilities().supports_f64 {
            return Err(Error::invalid_operation(format!(
                "backend {} has no f64 support",
                backend.name()
            )));
        }
        let mut tensor = Self {
            base: TensorBase::new(shape),
            backend,
            bytes: 0,
        };
        tensor.allocate()?;
        Ok(tensor)
    }

    /// Uploads `data` into a new tensor of `shape`.
    pub fn from_host(data: &[T], shape: Shape, backend: &'static dyn Backend) -> Result<Self> {
        let mut tensor = Self::new(shape, backend)?;
        tensor.copy_from_host(data)?;
        Ok(tensor)
    }
}

impl<T: Element> DeviceTensor<T> {
    /// The backend holding this tensor's buffer.
    #[must_use]
    pub fn backend(&self) -> &'static dyn Backend {
        self.backend
    }

    fn byte_len(&self) -> usize {
        self.base.shape().size() * T::DTYPE.size_of()
    }

    /// Copies the first `size()` elements back to host memory.
    #[must_use]
    pub fn to_host(&self) -> Vec<T> {
        let mut host = vec![T::default(); self.base.shape().size()];
        self.backend.synchronize();
        // SAFETY: `host` and the bound device buffer both hold `byte_len()`
        // bytes.
        unsafe {
            self.backend.copy_to_host(
                bytemuck::cast_slice_mut::<T, u8>(&mut host).as_mut_ptr(),
                self.base.data().cast::<u8>(),
                self.byte_len(),
            );
        }
        host
    }

    /// Overwrites the tensor contents with `data`.
    ///
    /// `data.len()` must equal `size()`.
    pub fn copy_from_host(&mut self, data: &[T]) -> Result<()> {
        let size = self.base.shape().size();
        if data.len() != size {
            return Err(Error::shape_mismatch(&[size], &[data.len()]));
        }
        let len = self.byte_len();
        // SAFETY: `data` has exactly `size()` elements, as does the buffer.
        unsafe {
            self.backend.copy_to_device(
                self.base.data_mut().cast::<u8>(),
                bytemuck::cast_slice::<T, u8>(data).as_ptr(),
                len,
            );
        }
        Ok(())
    }

    /// Frees the bound buffer. The caller rebinds or drops the tensor.
    fn release(&mut self) {
        // SAFETY: callers rebind straight after, or are dropping the tensor.
        let (data, _) = unsafe { self.base.unbind() };
        if !data.is_null() {
            // SAFETY: the buffer came from this backend with `self.bytes`.
            unsafe { self.backend.deallocate(data.cast::<u8>(), self.bytes) };
            tracing::trace!(
                backend = self.backend.name(),
                bytes = self.bytes,
                "released device buffer"
            );
        }
        self.bytes = 0;
    }
}

impl<T: Element> Allocate for DeviceTensor<T> {
    fn allocate(&mut self) -> Result<()> {
        let device = self.backend.device();
        let count = checked_element_count(self.base.shape(), device)?;
        let bytes = count
            .checked_mul(T::DTYPE.size_of())
            .ok_or(Error::AllocationFailed {
                size: usize::MAX,
                device,
            })?;

        let data = self.backend.allocate(bytes);
        if data.is_null() && bytes != 0 {
            tracing::warn!(
                backend = self.backend.name(),
                bytes,
                available = self.backend.capabilities().available_memory,
                "device allocation failed"
            );
            return Err(Error::AllocationFailed {
                size: bytes,
                device,
            });
        }
        // SAFETY: `data` was just allocated with `bytes` bytes.
        unsafe { self.backend.memset(data, 0, bytes) };

        self.release();
        // SAFETY: the backend returned `bytes` bytes, enough for `count`
        // elements; the pointer is only dereferenced through the backend.
        unsafe { self.base.bind(data.cast::<T>(), count) };
        self.bytes = bytes;
        tracing::trace!(backend = self.backend.name(), bytes, "allocated device buffer");
        Ok(())
    }
}

impl<T: Element> Drop for DeviceTensor<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: Element> Tensor<T> for DeviceTensor<T> {
    fn base(&self) -> &TensorBase<T> {
        &self.base
    }

    unsafe fn base_mut(&mut self) -> &mut TensorBase<T> {
        &mut self.base
    }

    fn is_owned(&self) -> bool {
        true
    }

    fn fill(&mut self, value: T) {
        let len = self.byte_len();
        let dst = self.base.data_mut().cast::<u8>();
        let pattern = bytemuck::bytes_of(&value);
        // SAFETY: the bound buffer holds `len` bytes, as does `staged`.
        unsafe {
            if pattern.iter().all(|&b| b == pattern[0]) {
                self.backend.memset(dst, pattern[0], len);
            } else {
                let staged = vec![value; self.base.shape().size()];
                self.backend.copy_to_device(
                    dst,
                    bytemuck::cast_slice::<T, u8>(&staged).as_ptr(),
                    len,
                );
            }
        }
    }

    fn slice(&self, index: usize) -> *const T {
        self.base.data().wrapping_add(self.base.slice_offset(index))
    }

    fn slice_mut(&mut self, index: usize) -> *mut T {
        let offset = self.base.slice_offset(index);
        self.base.data_mut().wrapping_add(offset)
    }

    fn output_csv_with(&self, writer: &mut dyn Write, format: &CsvFormat) -> Result<()> {
        let host = self.to_host();
        csv::write_csv(&host, self.shape(), self.row_major(), writer, format)
    }
}

impl<T: Element> core::fmt::Debug for DeviceTensor<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DeviceTensor")
            .field("backend", &self.backend.name())
            .field("shape", self.base.shape())
            .field("row_major", &self.base.row_major())
            .field("bytes", &self.bytes)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use blitz_core::backends::CpuBackend;

    static CPU: CpuBackend = CpuBackend::new();

    #[test]
    fn test_new_is_zeroed() {
        let t = DeviceTensor::<f32>::new(Shape::new(&[2, 3]), &CPU).unwrap();
        assert_eq!(t.size(), 6);
        assert!(t.is_owned());
        assert_eq!(t.backend().name(), "cpu");
        assert_eq!(t.to_host(), vec![0.0; 6]);
    }

    #[test]
    fn test_fill_uniform_bytes_and_staged() {
        let mut t = DeviceTensor::<i32>::new(Shape::new(&[4]), &CPU).unwrap();
        t.fill(-1);
        assert_eq!(t.to_host(), vec![-1; 4]);
        t.fill(258);
        assert_eq!(t.to_host(), vec![258; 4]);
    }

    #[test]
    fn test_host_round_trip() {
        let data: Vec<f64> = (0..6).map(f64::from).collect();
        let t = DeviceTensor::from_host(&data, Shape::new(&[3, 2]), &CPU).unwrap();
        assert_eq!(t.to_host(), data);
    }

    #[test]
    fn test_copy_from_host_length_mismatch() {
        let mut t = DeviceTensor::<i16>::new(Shape::new(&[2, 2]), &CPU).unwrap();
        let err = t.copy_from_host(&[1, 2, 3]).unwrap_err();
        assert_eq!(err, Error::shape_mismatch(&[4], &[3]));
    }

    #[test]
    fn test_slice_addresses_block() {
        let data: Vec<usize> = (0..6).collect();
        let t = DeviceTensor::from_host(&data, Shape::new(&[3, 2]), &CPU).unwrap();
        let p = t.slice(2);
        // The CPU backend's device memory is host memory.
        let block = unsafe { core::slice::from_raw_parts(p, 2) };
        assert_eq!(block, &[4, 5]);
    }

    #[test]
    fn test_empty_tensor() {
        let t = DeviceTensor::<f32>::new(Shape::new(&[0, 3]), &CPU).unwrap();
        assert_eq!(t.size(), 0);
        assert!(t.to_host().is_empty());
        let mut out = Vec::new();
        t.output_csv(&mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_overflowing_shape_is_rejected() {
        let huge = Shape::new(&[usize::MAX / 2 + 1, 2]);
        let err = DeviceTensor::<f32>::new(huge, &CPU).unwrap_err();
        assert_eq!(
            err,
            Error::AllocationFailed {
                size: usize::MAX,
                device: blitz_core::Device::Cpu
            }
        );

        // Element count fits but the byte count does not.
        let wide = Shape::new(&[usize::MAX / 4 + 1]);
        let err = DeviceTensor::<f64>::new(wide, &CPU).unwrap_err();
        assert!(matches!(err, Error::AllocationFailed { .. }));
    }

    /// Host memory that reports no f64 support.
    struct NoF64Backend;

    impl Backend for NoF64Backend {
        fn name(&self) -> &'static str {
            "no-f64"
        }

        fn device(&self) -> blitz_core::Device {
            CPU.device()
        }

        fn is_available(&self) -> bool {
            true
        }

        fn capabilities(&self) -> blitz_core::DeviceCapabilities {
            blitz_core::DeviceCapabilities {
                supports_f64: false,
                ..CPU.capabilities()
            }
        }

        fn allocate(&self, size: usize) -> *mut u8 {
            CPU.allocate(size)
        }

        unsafe fn deallocate(&self, ptr: *mut u8, size: usize) {
            CPU.deallocate(ptr, size);
        }

        unsafe fn memset(&self, dst: *mut u8, value: u8, size: usize) {
            CPU.memset(dst, value, size);
        }

        unsafe fn copy_to_device(&self, dst: *mut u8, src: *const u8, size: usize) {
            CPU.copy_to_device(dst, src, size);
        }

        unsafe fn copy_to_host(&self, dst: *mut u8, src: *const u8, size: usize) {
            CPU.copy_to_host(dst, src, size);
        }

        fn synchronize(&self) {}
    }

    static NO_F64: NoF64Backend = NoF64Backend;

    #[test]
    fn test_f64_requires_backend_support() {
        let err = DeviceTensor::<f64>::new(Shape::new(&[2]), &NO_F64).unwrap_err();
        assert!(matches!(err, Error::InvalidOperation { ref message } if message.contains("no-f64")));

        let t = DeviceTensor::from_host(&[1.5_f32, 2.5], Shape::new(&[2]), &NO_F64).unwrap();
        assert_eq!(t.to_host(), vec![1.5, 2.5]);
    }

    #[test]
    fn test_output_csv() {
        let data = [1_i32, 2, 3, 4];
        let t = DeviceTensor::from_host(&data, Shape::new(&[2, 2]), &CPU).unwrap();
        let mut out = Vec::new();
        t.output_csv(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1,2\n3,4\n");
    }
}
