// crates/sa_physics/src/mesh.rs

//! 有限体积网格
//!
//! 二维非结构网格的面寻址表示：内部面在前、边界面在后，
//! 每个面记录 owner/neighbor、单位法向（owner 指向 neighbor 或域外）、
//! 面长度与心距。单元→面的邻接以 CSR 布局存储。
//!
//! 每个网格持有进程内唯一的 [`MeshId`]，供按网格键控的共享缓存
//! （壁面距离注册表）使用。
//!
//! # 示例
//!
//! ```
//! use sa_physics::mesh::FvMesh;
//!
//! let mesh = FvMesh::rect(4, 3, 0.5, 0.5);
//! assert_eq!(mesh.n_cells(), 12);
//! assert_eq!(mesh.n_boundary_faces(), 2 * (4 + 3));
//! ```

use glam::DVec2;
use sa_foundation::Scalar;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// 无效单元索引常量（边界面的 neighbor）
pub const INVALID_CELL: u32 = u32::MAX;

/// 边界类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum BoundaryKind {
    /// 固壁边界（壁面距离的参考面）
    #[default]
    Wall = 0,

    /// 入流边界
    Inflow = 1,

    /// 出流边界
    Outflow = 2,

    /// 对称边界（无摩擦，不参与壁面距离）
    Symmetry = 3,
}

impl BoundaryKind {
    /// 是否为固壁（壁面距离以此类面为参考）
    #[inline]
    pub fn is_wall(&self) -> bool {
        matches!(self, Self::Wall)
    }
}

/// 网格标识，进程内唯一
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(u64);

static NEXT_MESH_ID: AtomicU64 = AtomicU64::new(1);

impl MeshId {
    fn next() -> Self {
        Self(NEXT_MESH_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// 原始编号
    #[inline]
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// 二维有限体积网格
#[derive(Debug)]
pub struct FvMesh {
    id: MeshId,
    n_cells: usize,
    n_interior_faces: usize,

    cell_area: Vec<Scalar>,
    cell_center: Vec<DVec2>,

    face_owner: Vec<u32>,
    face_neighbor: Vec<u32>,
    face_normal: Vec<DVec2>,
    face_center: Vec<DVec2>,
    face_length: Vec<Scalar>,
    /// 内部面：owner 心到 neighbor 心；边界面：owner 心到面心
    face_dist: Vec<Scalar>,

    /// 每个边界面的边界类型，长度 = n_boundary_faces
    boundary_kind: Vec<BoundaryKind>,

    cell_face_offsets: Vec<usize>,
    cell_face_indices: Vec<usize>,
}

impl FvMesh {
    // =========================================================================
    // 基本统计
    // =========================================================================

    /// 网格标识
    #[inline]
    pub fn id(&self) -> MeshId {
        self.id
    }

    /// 单元数量
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    /// 面数量
    #[inline]
    pub fn n_faces(&self) -> usize {
        self.face_owner.len()
    }

    /// 内部面数量
    #[inline]
    pub fn n_interior_faces(&self) -> usize {
        self.n_interior_faces
    }

    /// 边界面数量
    #[inline]
    pub fn n_boundary_faces(&self) -> usize {
        self.n_faces() - self.n_interior_faces
    }

    // =========================================================================
    // 单元访问
    // =========================================================================

    /// 单元面积（带边界检查）
    #[inline]
    pub fn cell_area(&self, cell: usize) -> Option<Scalar> {
        self.cell_area.get(cell).copied()
    }

    /// 单元面积（无边界检查）
    #[inline]
    pub fn cell_area_unchecked(&self, cell: usize) -> Scalar {
        self.cell_area[cell]
    }

    /// 单元中心
    #[inline]
    pub fn cell_center(&self, cell: usize) -> DVec2 {
        self.cell_center[cell]
    }

    /// 单元的所有关联面
    #[inline]
    pub fn cell_faces(&self, cell: usize) -> impl Iterator<Item = usize> + '_ {
        let start = self.cell_face_offsets[cell];
        let end = self.cell_face_offsets[cell + 1];
        self.cell_face_indices[start..end].iter().copied()
    }

    // =========================================================================
    // 面访问
    // =========================================================================

    /// 面 owner 单元索引
    #[inline]
    pub fn face_owner(&self, face: usize) -> usize {
        self.face_owner[face] as usize
    }

    /// 面 neighbor 单元索引；边界面返回 None
    #[inline]
    pub fn face_neighbor(&self, face: usize) -> Option<usize> {
        let n = self.face_neighbor[face];
        if n == INVALID_CELL {
            None
        } else {
            Some(n as usize)
        }
    }

    /// 面单位法向（owner 指向 neighbor / 域外）
    #[inline]
    pub fn face_normal(&self, face: usize) -> DVec2 {
        self.face_normal[face]
    }

    /// 面中心
    #[inline]
    pub fn face_center(&self, face: usize) -> DVec2 {
        self.face_center[face]
    }

    /// 面长度
    #[inline]
    pub fn face_length(&self, face: usize) -> Scalar {
        self.face_length[face]
    }

    /// 面心距（内部面 owner→neighbor，边界面 owner→面心）
    #[inline]
    pub fn face_dist(&self, face: usize) -> Scalar {
        self.face_dist[face]
    }

    /// 是否为边界面
    #[inline]
    pub fn is_boundary_face(&self, face: usize) -> bool {
        face >= self.n_interior_faces
    }

    /// 边界面在边界数组中的索引
    ///
    /// # Panics
    /// - `face` 不是边界面
    #[inline]
    pub fn boundary_index(&self, face: usize) -> usize {
        debug_assert!(self.is_boundary_face(face), "不是边界面");
        face - self.n_interior_faces
    }

    /// 边界面的边界类型
    #[inline]
    pub fn boundary_kind(&self, face: usize) -> BoundaryKind {
        self.boundary_kind[self.boundary_index(face)]
    }

    /// 设置边界面的边界类型
    ///
    /// # Panics
    /// - `face` 不是边界面
    pub fn set_boundary_kind(&mut self, face: usize, kind: BoundaryKind) {
        let idx = self.boundary_index(face);
        self.boundary_kind[idx] = kind;
    }

    // =========================================================================
    // 范围迭代
    // =========================================================================

    /// 单元索引范围
    #[inline]
    pub fn cells(&self) -> std::ops::Range<usize> {
        0..self.n_cells
    }

    /// 面索引范围
    #[inline]
    pub fn faces(&self) -> std::ops::Range<usize> {
        0..self.n_faces()
    }

    /// 内部面索引范围
    #[inline]
    pub fn interior_faces(&self) -> std::ops::Range<usize> {
        0..self.n_interior_faces
    }

    /// 边界面索引范围
    #[inline]
    pub fn boundary_faces(&self) -> std::ops::Range<usize> {
        self.n_interior_faces..self.n_faces()
    }

    // =========================================================================
    // 构建
    // =========================================================================

    /// 构建 nx × ny 的结构化矩形网格
    ///
    /// 单元编号 `i + j*nx`，外边界全部初始化为 [`BoundaryKind::Wall`]，
    /// 可用 [`set_boundary_kind`](Self::set_boundary_kind) 逐面覆盖。
    ///
    /// # Panics
    /// - `nx == 0` 或 `ny == 0`
    /// - `dx <= 0` 或 `dy <= 0`
    pub fn rect(nx: usize, ny: usize, dx: Scalar, dy: Scalar) -> Self {
        assert!(nx > 0 && ny > 0, "网格维度必须大于 0");
        assert!(dx > 0.0 && dy > 0.0, "网格间距必须为正");

        let n_cells = nx * ny;
        let cell_id = |i: usize, j: usize| i + j * nx;

        let mut cell_area = Vec::with_capacity(n_cells);
        let mut cell_center = Vec::with_capacity(n_cells);
        // 行主序，与 cell_id 编号一致
        for j in 0..ny {
            for i in 0..nx {
                cell_area.push(dx * dy);
                cell_center.push(DVec2::new((i as Scalar + 0.5) * dx, (j as Scalar + 0.5) * dy));
            }
        }

        let mut face_owner = Vec::new();
        let mut face_neighbor = Vec::new();
        let mut face_normal = Vec::new();
        let mut face_center = Vec::new();
        let mut face_length = Vec::new();
        let mut face_dist = Vec::new();

        // 内部竖直面：(i,j) 与 (i+1,j) 之间
        for j in 0..ny {
            for i in 0..nx.saturating_sub(1) {
                face_owner.push(cell_id(i, j) as u32);
                face_neighbor.push(cell_id(i + 1, j) as u32);
                face_normal.push(DVec2::X);
                face_center.push(DVec2::new((i as Scalar + 1.0) * dx, (j as Scalar + 0.5) * dy));
                face_length.push(dy);
                face_dist.push(dx);
            }
        }

        // 内部水平面：(i,j) 与 (i,j+1) 之间
        for j in 0..ny.saturating_sub(1) {
            for i in 0..nx {
                face_owner.push(cell_id(i, j) as u32);
                face_neighbor.push(cell_id(i, j + 1) as u32);
                face_normal.push(DVec2::Y);
                face_center.push(DVec2::new((i as Scalar + 0.5) * dx, (j as Scalar + 1.0) * dy));
                face_length.push(dx);
                face_dist.push(dy);
            }
        }

        let n_interior_faces = face_owner.len();

        // 边界面：左、右、下、上
        for j in 0..ny {
            face_owner.push(cell_id(0, j) as u32);
            face_neighbor.push(INVALID_CELL);
            face_normal.push(-DVec2::X);
            face_center.push(DVec2::new(0.0, (j as Scalar + 0.5) * dy));
            face_length.push(dy);
            face_dist.push(0.5 * dx);
        }
        for j in 0..ny {
            face_owner.push(cell_id(nx - 1, j) as u32);
            face_neighbor.push(INVALID_CELL);
            face_normal.push(DVec2::X);
            face_center.push(DVec2::new(nx as Scalar * dx, (j as Scalar + 0.5) * dy));
            face_length.push(dy);
            face_dist.push(0.5 * dx);
        }
        for i in 0..nx {
            face_owner.push(cell_id(i, 0) as u32);
            face_neighbor.push(INVALID_CELL);
            face_normal.push(-DVec2::Y);
            face_center.push(DVec2::new((i as Scalar + 0.5) * dx, 0.0));
            face_length.push(dx);
            face_dist.push(0.5 * dy);
        }
        for i in 0..nx {
            face_owner.push(cell_id(i, ny - 1) as u32);
            face_neighbor.push(INVALID_CELL);
            face_normal.push(DVec2::Y);
            face_center.push(DVec2::new((i as Scalar + 0.5) * dx, ny as Scalar * dy));
            face_length.push(dx);
            face_dist.push(0.5 * dy);
        }

        let n_boundary_faces = face_owner.len() - n_interior_faces;
        let boundary_kind = vec![BoundaryKind::Wall; n_boundary_faces];

        let (cell_face_offsets, cell_face_indices) =
            Self::build_cell_faces(n_cells, &face_owner, &face_neighbor);

        Self {
            id: MeshId::next(),
            n_cells,
            n_interior_faces,
            cell_area,
            cell_center,
            face_owner,
            face_neighbor,
            face_normal,
            face_center,
            face_length,
            face_dist,
            boundary_kind,
            cell_face_offsets,
            cell_face_indices,
        }
    }

    /// 构建单元→面邻接（CSR 布局）
    fn build_cell_faces(
        n_cells: usize,
        face_owner: &[u32],
        face_neighbor: &[u32],
    ) -> (Vec<usize>, Vec<usize>) {
        let mut counts = vec![0usize; n_cells];
        for f in 0..face_owner.len() {
            counts[face_owner[f] as usize] += 1;
            if face_neighbor[f] != INVALID_CELL {
                counts[face_neighbor[f] as usize] += 1;
            }
        }

        let mut offsets = Vec::with_capacity(n_cells + 1);
        offsets.push(0);
        for c in 0..n_cells {
            offsets.push(offsets[c] + counts[c]);
        }

        let mut cursor = offsets[..n_cells].to_vec();
        let mut indices = vec![0usize; offsets[n_cells]];
        for f in 0..face_owner.len() {
            let o = face_owner[f] as usize;
            indices[cursor[o]] = f;
            cursor[o] += 1;
            if face_neighbor[f] != INVALID_CELL {
                let n = face_neighbor[f] as usize;
                indices[cursor[n]] = f;
                cursor[n] += 1;
            }
        }

        (offsets, indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_counts() {
        let mesh = FvMesh::rect(3, 2, 1.0, 1.0);
        assert_eq!(mesh.n_cells(), 6);
        // 内部面：竖直 2*2 + 水平 3*1 = 7
        assert_eq!(mesh.n_interior_faces(), 7);
        // 边界面：2*(3+2) = 10
        assert_eq!(mesh.n_boundary_faces(), 10);
    }

    #[test]
    fn test_rect_geometry() {
        let mesh = FvMesh::rect(2, 2, 0.5, 0.25);
        assert!((mesh.cell_area_unchecked(0) - 0.125).abs() < 1e-12);
        let c = mesh.cell_center(3);
        assert!((c.x - 0.75).abs() < 1e-12);
        assert!((c.y - 0.375).abs() < 1e-12);
    }

    #[test]
    fn test_face_topology() {
        let mesh = FvMesh::rect(2, 1, 1.0, 1.0);
        // 唯一的内部面连接单元 0 和 1
        assert_eq!(mesh.n_interior_faces(), 1);
        assert_eq!(mesh.face_owner(0), 0);
        assert_eq!(mesh.face_neighbor(0), Some(1));
        assert!((mesh.face_dist(0) - 1.0).abs() < 1e-12);

        for f in mesh.boundary_faces() {
            assert!(mesh.is_boundary_face(f));
            assert_eq!(mesh.face_neighbor(f), None);
            assert_eq!(mesh.boundary_kind(f), BoundaryKind::Wall);
        }
    }

    #[test]
    fn test_cell_faces_adjacency() {
        let mesh = FvMesh::rect(3, 3, 1.0, 1.0);
        // 每个单元恰好 4 个面
        for c in mesh.cells() {
            assert_eq!(mesh.cell_faces(c).count(), 4);
        }
        // 角单元 0 的面里有 2 个边界面
        let n_bnd = mesh.cell_faces(0).filter(|&f| mesh.is_boundary_face(f)).count();
        assert_eq!(n_bnd, 2);
    }

    #[test]
    fn test_set_boundary_kind() {
        let mut mesh = FvMesh::rect(2, 2, 1.0, 1.0);
        let f = mesh.boundary_faces().next().unwrap();
        mesh.set_boundary_kind(f, BoundaryKind::Inflow);
        assert_eq!(mesh.boundary_kind(f), BoundaryKind::Inflow);
        assert!(!mesh.boundary_kind(f).is_wall());
    }

    #[test]
    fn test_mesh_id_unique() {
        let a = FvMesh::rect(1, 1, 1.0, 1.0);
        let b = FvMesh::rect(1, 1, 1.0, 1.0);
        assert_ne!(a.id(), b.id());
    }
}
