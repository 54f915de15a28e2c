// crates/sa_physics/src/walldist.rs

//! 壁面距离
//!
//! 为每个单元（及每个边界面）计算到最近固壁边界面中心的距离。
//! 距离场按网格键控缓存在全局注册表中：同一网格的多个模型实例
//! 共享同一份 `Arc<WallDistance>`，注册表保留所有权，模型只持有
//! `Weak` 句柄。
//!
//! 无固壁网格的距离取 `GREAT`（近壁破坏项随之消失）。

use crate::mesh::{FvMesh, MeshId};
use parking_lot::Mutex;
use sa_foundation::scalar::consts::GREAT;
use sa_foundation::Scalar;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// 壁面距离场
#[derive(Debug)]
pub struct WallDistance {
    mesh_id: MeshId,
    cells: Vec<Scalar>,
    boundary: Vec<Scalar>,
}

impl WallDistance {
    /// 所属网格标识
    #[inline]
    pub fn mesh_id(&self) -> MeshId {
        self.mesh_id
    }

    /// 单元距离切片
    #[inline]
    pub fn cells(&self) -> &[Scalar] {
        &self.cells
    }

    /// 边界面距离切片（固壁面为 0）
    #[inline]
    pub fn boundary(&self) -> &[Scalar] {
        &self.boundary
    }

    /// 直接计算距离场（不经注册表）
    pub fn compute(mesh: &FvMesh) -> Self {
        let wall_centers: Vec<_> = mesh
            .boundary_faces()
            .filter(|&f| mesh.boundary_kind(f).is_wall())
            .map(|f| mesh.face_center(f))
            .collect();

        let dist_to_walls = |p: glam::DVec2| -> Scalar {
            wall_centers
                .iter()
                .map(|&w| (p - w).length())
                .fold(GREAT, Scalar::min)
        };

        let cells = mesh.cells().map(|c| dist_to_walls(mesh.cell_center(c))).collect();

        let boundary = mesh
            .boundary_faces()
            .map(|f| {
                if mesh.boundary_kind(f).is_wall() {
                    0.0
                } else {
                    dist_to_walls(mesh.face_center(f))
                }
            })
            .collect();

        Self { mesh_id: mesh.id(), cells, boundary }
    }
}

fn registry() -> &'static Mutex<HashMap<MeshId, Arc<WallDistance>>> {
    static REGISTRY: OnceLock<Mutex<HashMap<MeshId, Arc<WallDistance>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// 获取网格的壁面距离场（首次请求时计算并缓存）
pub fn get(mesh: &FvMesh) -> Arc<WallDistance> {
    let mut reg = registry().lock();
    if let Some(existing) = reg.get(&mesh.id()) {
        return Arc::clone(existing);
    }

    log::debug!("计算网格 {:?} 的壁面距离场 ({} 单元)", mesh.id(), mesh.n_cells());
    let dist = Arc::new(WallDistance::compute(mesh));
    reg.insert(mesh.id(), Arc::clone(&dist));
    dist
}

/// 从注册表移除某网格的距离场
///
/// 返回是否存在并被移除。已持有 `Arc` 的使用方不受影响，
/// 但 `Weak` 句柄在所有 `Arc` 释放后将无法升级。
pub fn release(id: MeshId) -> bool {
    registry().lock().remove(&id).is_some()
}
