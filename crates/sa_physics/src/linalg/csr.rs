// crates/sa_physics/src/linalg/csr.rs

//! 压缩稀疏行（CSR）矩阵
//!
//! 有限体积离散产生的方阵每行非零元很少（对角 + 面邻居），
//! CSR 是矩阵-向量乘法和行遍历的自然格式。
//!
//! # 格式说明
//!
//! - `row_ptr`: 行指针，长度 n + 1，row_ptr[i] 是第 i 行首个非零元的索引
//! - `col_idx`: 列索引，行内升序
//! - `values`: 非零元值

use sa_foundation::Scalar;
use std::collections::BTreeMap;

/// CSR 格式稀疏方阵
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    n: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<Scalar>,
}

impl CsrMatrix {
    /// 矩阵阶数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n
    }

    /// 非零元数量
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// 获取 (row, col) 位置的值（不存在返回 0）
    pub fn get(&self, row: usize, col: usize) -> Scalar {
        self.find_index(row, col).map_or(0.0, |idx| self.values[idx])
    }

    /// 第 row 行的对角元素
    pub fn diagonal_value(&self, row: usize) -> Option<Scalar> {
        self.find_index(row, row).map(|idx| self.values[idx])
    }

    /// 矩阵-向量乘法 y = A * x
    ///
    /// # Panics
    /// - `x.len() != n` 或 `y.len() != n`
    pub fn mul_vec(&self, x: &[Scalar], y: &mut [Scalar]) {
        assert_eq!(x.len(), self.n, "x 长度必须等于矩阵阶数");
        assert_eq!(y.len(), self.n, "y 长度必须等于矩阵阶数");

        for row in 0..self.n {
            let start = self.row_ptr[row];
            let end = self.row_ptr[row + 1];

            let mut sum = 0.0;
            for idx in start..end {
                sum += self.values[idx] * x[self.col_idx[idx]];
            }
            y[row] = sum;
        }
    }

    fn find_index(&self, row: usize, col: usize) -> Option<usize> {
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        // 行内列索引有序，二分查找
        match self.col_idx[start..end].binary_search(&col) {
            Ok(local) => Some(start + local),
            Err(_) => None,
        }
    }
}

/// CSR 矩阵构建器
///
/// 使用 BTreeMap 临时存储，构建时转换为紧凑 CSR 格式。
pub struct CsrBuilder {
    n: usize,
    rows: Vec<BTreeMap<usize, Scalar>>,
}

impl CsrBuilder {
    /// 创建 n 阶方阵构建器
    ///
    /// # Panics
    /// - `n == 0`
    pub fn new(n: usize) -> Self {
        assert!(n > 0, "矩阵阶数必须大于 0");
        Self { n, rows: vec![BTreeMap::new(); n] }
    }

    /// 设置 (row, col) 的值（覆盖）
    ///
    /// # Panics
    /// - 索引越界
    pub fn set(&mut self, row: usize, col: usize, value: Scalar) {
        assert!(row < self.n && col < self.n, "索引越界");
        self.rows[row].insert(col, value);
    }

    /// 累加到 (row, col)
    ///
    /// # Panics
    /// - 索引越界
    pub fn add(&mut self, row: usize, col: usize, value: Scalar) {
        assert!(row < self.n && col < self.n, "索引越界");
        *self.rows[row].entry(col).or_insert(0.0) += value;
    }

    /// 当前非零元总数
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(|r| r.len()).sum()
    }

    /// 构建 CSR 矩阵（消耗构建器）
    pub fn build(self) -> CsrMatrix {
        let nnz = self.nnz();
        let mut row_ptr = Vec::with_capacity(self.n + 1);
        let mut col_idx = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);

        row_ptr.push(0);
        for row_map in self.rows {
            for (col, val) in row_map {
                col_idx.push(col);
                values.push(val);
            }
            row_ptr.push(col_idx.len());
        }

        CsrMatrix { n: self.n, row_ptr, col_idx, values }
    }
}
