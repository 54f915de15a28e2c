// crates/sa_physics/src/config.rs

//! 配置层
//!
//! [`RasConfig`] 是模型的全部外部配置：湍流开关、方程松弛因子、
//! 线性求解器控制参数、以及模型系数字典 [`CoeffDict`]。
//! 全部字段带默认值，可从 JSON 文件加载 / 保存。
//!
//! [`CoeffDict`] 实现"查找或写回默认值"语义：构造模型时逐系数
//! 查询，缺失的写回字典（保存配置可见实际生效值），存在但类型
//! 不对的报 [`ConfigError::InvalidValue`]。

use crate::error::ConfigError;
use crate::linalg::SolverControls;
use sa_foundation::Scalar;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// 模型系数字典
///
/// JSON 对象的薄包装，保留用户写入的任意键。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoeffDict(Map<String, Value>);

impl CoeffDict {
    /// 创建空字典
    pub fn new() -> Self {
        Self::default()
    }

    /// 键数量
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 写入数值键（测试与程序化配置用）
    pub fn set(&mut self, key: &str, value: Scalar) {
        self.0.insert(key.to_string(), Value::from(value));
    }

    /// 写入布尔键
    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.0.insert(key.to_string(), Value::Bool(value));
    }

    /// 查找数值；缺失时写回默认值并返回之
    pub fn lookup_or_insert(&mut self, key: &str, default: Scalar) -> Result<Scalar, ConfigError> {
        match self.0.get(key) {
            Some(v) => v.as_f64().ok_or_else(|| invalid(key, v, "必须为数值")),
            None => {
                self.0.insert(key.to_string(), Value::from(default));
                Ok(default)
            }
        }
    }

    /// 查找布尔；缺失时写回默认值并返回之
    pub fn lookup_or_insert_bool(&mut self, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.0.get(key) {
            Some(v) => v.as_bool().ok_or_else(|| invalid(key, v, "必须为布尔值")),
            None => {
                self.0.insert(key.to_string(), Value::Bool(default));
                Ok(default)
            }
        }
    }

    /// 读取数值（存在则返回 Some，缺失返回 None，类型不对报错）
    pub fn read_if_present(&self, key: &str) -> Result<Option<Scalar>, ConfigError> {
        match self.0.get(key) {
            Some(v) => v.as_f64().map(Some).ok_or_else(|| invalid(key, v, "必须为数值")),
            None => Ok(None),
        }
    }

    /// 读取布尔（存在则返回 Some，缺失返回 None，类型不对报错）
    pub fn read_bool_if_present(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        match self.0.get(key) {
            Some(v) => v.as_bool().map(Some).ok_or_else(|| invalid(key, v, "必须为布尔值")),
            None => Ok(None),
        }
    }
}

fn invalid(key: &str, value: &Value, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// RANS 模型配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasConfig {
    /// 湍流开关（关闭时 correct() 直接返回）
    #[serde(default = "default_turbulence")]
    pub turbulence: bool,

    /// nuTilda 方程松弛因子，(0, 1]，1 表示不松弛
    #[serde(default = "default_relax")]
    pub relax_nu_tilda: Scalar,

    /// 线性求解器控制
    #[serde(default)]
    pub solver: SolverControls,

    /// 模型系数字典
    #[serde(default)]
    pub coeffs: CoeffDict,
}

fn default_turbulence() -> bool {
    true
}
fn default_relax() -> Scalar {
    1.0
}

impl Default for RasConfig {
    fn default() -> Self {
        Self {
            turbulence: default_turbulence(),
            relax_nu_tilda: default_relax(),
            solver: SolverControls::default(),
            coeffs: CoeffDict::new(),
        }
    }
}

impl RasConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: RasConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 保存配置到 JSON 文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.relax_nu_tilda <= 0.0 || self.relax_nu_tilda > 1.0 {
            return Err(ConfigError::InvalidValue {
                key: "relax_nu_tilda".to_string(),
                value: self.relax_nu_tilda.to_string(),
                reason: "松弛因子必须在 (0, 1] 内".to_string(),
            });
        }

        if self.solver.rtol <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "solver.rtol".to_string(),
                value: self.solver.rtol.to_string(),
                reason: "相对容差必须为正".to_string(),
            });
        }

        if self.solver.max_iter == 0 {
            return Err(ConfigError::InvalidValue {
                key: "solver.max_iter".to_string(),
                value: "0".to_string(),
                reason: "最大迭代次数必须大于 0".to_string(),
            });
        }

        Ok(())
    }
}
