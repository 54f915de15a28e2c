// crates/sa_foundation/src/memory.rs

//! 对齐内存缓冲
//!
//! 提供 64 字节对齐（缓存行 / AVX-512）的连续缓冲区 `AlignedVec`，
//! 作为单元场数据的底层存储。长度在构造后固定由调用方控制，
//! 不提供 push/pop 式增长——场的长度由网格决定，不应中途变化。

use bytemuck::Pod;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::alloc::{alloc_zeroed, dealloc, handle_alloc_error, Layout};
use std::ops::{Deref, DerefMut};

/// 缓冲区对齐字节数（缓存行）
const ALIGN: usize = 64;

/// 对齐连续缓冲区
///
/// 零初始化分配，`Deref` 到切片后按普通切片使用。
#[derive(Debug)]
pub struct AlignedVec<T: Pod + Default> {
    ptr: *mut T,
    len: usize,
}

unsafe impl<T: Pod + Default + Send> Send for AlignedVec<T> {}
unsafe impl<T: Pod + Default + Sync> Sync for AlignedVec<T> {}

impl<T: Pod + Default> AlignedVec<T> {
    /// 创建长度为 len 的零初始化缓冲区
    pub fn zeros(len: usize) -> Self {
        if len == 0 {
            return Self { ptr: std::ptr::null_mut(), len: 0 };
        }

        let layout = Self::layout_for(len);
        let ptr = unsafe { alloc_zeroed(layout) as *mut T };
        if ptr.is_null() {
            handle_alloc_error(layout);
        }

        debug_assert_eq!((ptr as usize) % layout.align(), 0);

        Self { ptr, len }
    }

    /// 创建长度为 len 且全部填充 value 的缓冲区
    pub fn filled(len: usize, value: T) -> Self {
        let mut buf = Self::zeros(len);
        buf.as_mut_slice().fill(value);
        buf
    }

    /// 从现有 Vec 复制到对齐缓冲区
    pub fn from_vec(vec: Vec<T>) -> Self {
        let mut buf = Self::zeros(vec.len());
        buf.as_mut_slice().copy_from_slice(&vec);
        buf
    }

    /// 长度
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 只读指针
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }

    /// 只读切片视图
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        if self.len == 0 {
            &[]
        } else {
            unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
        }
    }

    /// 可变切片视图
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        if self.len == 0 {
            &mut []
        } else {
            unsafe { std::slice::from_raw_parts_mut(self.ptr, self.len) }
        }
    }

    #[inline]
    fn layout_for(len: usize) -> Layout {
        Layout::from_size_align(
            len * std::mem::size_of::<T>(),
            ALIGN.max(std::mem::align_of::<T>()),
        )
        .expect("Invalid layout")
    }
}

impl<T: Pod + Default> Deref for AlignedVec<T> {
    type Target = [T];
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T: Pod + Default> DerefMut for AlignedVec<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<T: Pod + Default> Clone for AlignedVec<T> {
    fn clone(&self) -> Self {
        let mut new_buf = Self::zeros(self.len);
        new_buf.as_mut_slice().copy_from_slice(self.as_slice());
        new_buf
    }
}

impl<T: Pod + Default> Default for AlignedVec<T> {
    fn default() -> Self {
        Self { ptr: std::ptr::null_mut(), len: 0 }
    }
}

impl<T: Pod + Default> Drop for AlignedVec<T> {
    fn drop(&mut self) {
        if self.ptr.is_null() || self.len == 0 {
            return;
        }
        let layout = Self::layout_for(self.len);
        unsafe { dealloc(self.ptr as *mut u8, layout) };
    }
}

impl<T: Pod + Default> FromIterator<T> for AlignedVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T: Pod + Default + PartialEq> PartialEq for AlignedVec<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Pod + Default + Serialize> Serialize for AlignedVec<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.as_slice().serialize(serializer)
    }
}

impl<'de, T: Pod + Default + Deserialize<'de>> Deserialize<'de> for AlignedVec<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let vec = Vec::<T>::deserialize(deserializer)?;
        Ok(Self::from_vec(vec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_and_index() {
        let mut buf: AlignedVec<f64> = AlignedVec::zeros(10);
        assert_eq!(buf.len(), 10);
        assert_eq!(buf[3], 0.0);
        buf[0] = 1.5;
        assert!((buf[0] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_filled() {
        let buf: AlignedVec<f64> = AlignedVec::filled(5, 2.5);
        assert!(buf.iter().all(|&v| (v - 2.5).abs() < 1e-12));
    }

    #[test]
    fn test_from_vec_and_clone() {
        let buf = AlignedVec::from_vec(vec![1.0f64, 2.0, 3.0]);
        let cloned = buf.clone();
        assert_eq!(buf, cloned);
        assert!((cloned[2] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_alignment() {
        let buf: AlignedVec<f64> = AlignedVec::zeros(100);
        assert_eq!((buf.as_ptr() as usize) % 64, 0);
    }

    #[test]
    fn test_empty() {
        let buf: AlignedVec<f64> = AlignedVec::zeros(0);
        assert!(buf.is_empty());
        assert_eq!(buf.as_slice().len(), 0);
    }

    #[test]
    fn test_from_iter() {
        let buf: AlignedVec<i64> = (0..5).collect();
        assert_eq!(buf.len(), 5);
        assert_eq!(buf[4], 4);
    }

    #[test]
    fn test_serde_roundtrip() {
        let buf = AlignedVec::from_vec(vec![1.0, 2.0, 3.5]);
        let json = serde_json::to_string(&buf).unwrap();
        let de: AlignedVec<f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(buf, de);
    }
}
