/*
 * @Author       : 老董
 * @Date         : 2026-08-18
 * @Description  : 张量规格（TensorSpec）
 *
 * 由形状推断或基础网络的元数据创建，创建后不可变。
 * 两个规格当且仅当所有属性都相同时相等。
 */

use super::shape::{Shape, format_shape};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 张量标识，在同一网络的完整规格（输入 ∪ 隐藏输出 ∪ 输出）中唯一
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TensorId(pub String);

impl TensorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 张量元素类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    #[default]
    Float32,
    Float64,
    Int32,
    Int64,
}

impl ElementType {
    pub const ALL: [Self; 4] = [Self::Float32, Self::Float64, Self::Int32, Self::Int64];

    pub const fn is_integer(&self) -> bool {
        matches!(self, Self::Int32 | Self::Int64)
    }

    pub const fn is_float(&self) -> bool {
        !self.is_integer()
    }

    /// 后端（numpy/Keras）中的类型名
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 维度顺序标记（T：时间，D：深度，H：高，W：宽，C：通道）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DimensionOrder {
    /// 通道在后（Keras默认）
    #[default]
    Tdhwc,
    /// 通道在前
    Tcdhw,
    Unknown,
}

impl DimensionOrder {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Tdhwc => "TDHWC",
            Self::Tcdhw => "TCDHW",
            Self::Unknown => "UNKNOWN",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [Self::Tdhwc, Self::Tcdhw, Self::Unknown]
            .into_iter()
            .find(|o| o.name() == name)
    }
}

/// 张量规格
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TensorSpec {
    id: TensorId,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    batch_size: Option<u64>,
    shape: Shape,
    element_type: ElementType,
    #[serde(default)]
    dimension_order: DimensionOrder,
}

impl TensorSpec {
    /// 创建张量规格（无固定批大小，维度顺序为默认值）
    pub fn new(id: TensorId, name: &str, shape: Shape, element_type: ElementType) -> Self {
        Self {
            id,
            name: name.to_string(),
            batch_size: None,
            shape,
            element_type,
            dimension_order: DimensionOrder::default(),
        }
    }

    /// 以名称作为标识创建张量规格（Keras后端的惯例）
    pub fn named(name: &str, shape: Shape, element_type: ElementType) -> Self {
        Self::new(TensorId::new(name), name, shape, element_type)
    }

    pub fn with_batch_size(mut self, batch_size: Option<u64>) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_dimension_order(mut self, dimension_order: DimensionOrder) -> Self {
        self.dimension_order = dimension_order;
        self
    }

    pub fn id(&self) -> &TensorId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn batch_size(&self) -> Option<u64> {
        self.batch_size
    }

    pub fn shape(&self) -> &[Option<u64>] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn dimension_order(&self) -> DimensionOrder {
        self.dimension_order
    }
}

impl fmt::Display for TensorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let batch = self
            .batch_size
            .map_or_else(|| "?".to_string(), |b| b.to_string());
        write!(
            f,
            "{}: [{}; {}] {}",
            self.name,
            batch,
            format_shape(&self.shape),
            self.element_type
        )
    }
}
