/*
 * @Author       : 老董
 * @Date         : 2026-10-11
 * @Description  : LayerGraph 模块：层图的核心实现
 *
 * 层图以arena形式保存所有层，层之间通过`LayerId`（arena下标）引用，
 * 每个内部层持有按槽位排列的父节点引用（父层 + 输出端口）。
 * 一次遍历/推断/序列化请求所关心的子图由“输出层列表”决定：
 * 即从这些输出层沿父节点反向可达的所有层。
 *
 * 公开 API：
 * - `LayerGraph`: 层的所有者，负责添加层、绑定父节点
 * - `GraphIterator` / `LayerVisitor`: 确定性的拓扑遍历
 * - `SpecInferrer`的结果 `InferredNetwork`: 逐层与网络级张量规格
 * - `GraphSerializer`: 基于下标的持久化格式
 */

mod describe;
mod infer;
mod iterator;
mod naming;
mod serialization;

pub use infer::{InferredNetwork, TensorSource};
pub use iterator::{GraphIterator, LayerVisitor};
pub use naming::TensorNameGenerator;
pub use serialization::{GraphSerializer, KEY_OUTPUTS};

use crate::errors::LayerGraphError;
use crate::nn::layer::{LayerNode, TraitInnerLayer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 层在层图中的唯一标识（arena下标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub usize);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

/// 父节点引用：父层 + 其输出端口（单输出层为0）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParentRef {
    pub layer: LayerId,
    pub output: usize,
}

impl ParentRef {
    pub fn new(layer: LayerId, output: usize) -> Self {
        Self { layer, output }
    }
}

impl From<LayerId> for ParentRef {
    fn from(layer: LayerId) -> Self {
        Self::new(layer, 0)
    }
}

/// 层图中的一个层及其父节点绑定
#[derive(Debug, Clone, PartialEq)]
pub struct LayerHandle {
    id: LayerId,
    name: Option<String>,
    node: LayerNode,
    parents: Vec<Option<ParentRef>>,
}

impl LayerHandle {
    pub fn id(&self) -> LayerId {
        self.id
    }

    /// 用户指定的名称（可选）
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// 用于错误信息与描述的名称：用户名称，否则为`类型标记[id]`
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{}[{}]", self.node.type_tag(), self.id.0))
    }

    pub fn node(&self) -> &LayerNode {
        &self.node
    }

    /// 按槽位排列的父节点（未绑定的槽位为`None`）
    pub fn parents(&self) -> &[Option<ParentRef>] {
        &self.parents
    }

    /// 第一个未绑定的槽位
    pub fn first_unbound_slot(&self) -> Option<usize> {
        self.parents.iter().position(Option::is_none)
    }

    /// 该层的输出个数
    pub fn num_outputs(&self) -> usize {
        self.node.as_inner().map_or(1, TraitInnerLayer::num_outputs)
    }
}

/// 层图：所有层的拥有者
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerGraph {
    layers: Vec<LayerHandle>,
}

impl LayerGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// 添加一个层，按其父节点个数分配（未绑定的）槽位
    pub fn add_layer(&mut self, node: impl Into<LayerNode>) -> LayerId {
        self.push_layer(None, node.into())
    }

    /// 添加一个带用户名称的层
    pub fn add_named_layer(&mut self, name: &str, node: impl Into<LayerNode>) -> LayerId {
        self.push_layer(Some(name.to_string()), node.into())
    }

    fn push_layer(&mut self, name: Option<String>, node: LayerNode) -> LayerId {
        let id = LayerId(self.layers.len());
        let parents = vec![None; node.num_parents()];
        self.layers.push(LayerHandle {
            id,
            name,
            node,
            parents,
        });
        id
    }

    /// 添加一个层并依次把`parents`绑定到槽位0..n（均取输出端口0）
    pub fn add_layer_with_parents(
        &mut self,
        node: impl Into<LayerNode>,
        parents: &[LayerId],
    ) -> Result<LayerId, LayerGraphError> {
        for &parent in parents {
            self.layer(parent)?;
        }
        let id = self.add_layer(node);
        for (slot, &parent) in parents.iter().enumerate() {
            self.set_parent(id, slot, parent)?;
        }
        Ok(id)
    }

    /// 把`child`的第`slot`个槽位绑定到`parent`的输出0
    pub fn set_parent(
        &mut self,
        child: LayerId,
        slot: usize,
        parent: LayerId,
    ) -> Result<(), LayerGraphError> {
        self.set_parent_output(child, slot, parent, 0)
    }

    /// 把`child`的第`slot`个槽位绑定到`parent`的第`output`个输出
    pub fn set_parent_output(
        &mut self,
        child: LayerId,
        slot: usize,
        parent: LayerId,
        output: usize,
    ) -> Result<(), LayerGraphError> {
        if child == parent {
            return Err(LayerGraphError::InvalidOperation(format!(
                "层{child}不能以自身作为父节点"
            )));
        }
        let num_outputs = self.layer(parent)?.num_outputs();
        if output >= num_outputs {
            return Err(LayerGraphError::InvalidOperation(format!(
                "层{parent}只有{num_outputs}个输出，无法引用输出{output}"
            )));
        }
        let handle = self.layer_mut(child)?;
        let num_slots = handle.parents.len();
        let target = handle.parents.get_mut(slot).ok_or_else(|| {
            LayerGraphError::InvalidOperation(format!(
                "层{child}只有{num_slots}个父节点槽位，无法绑定槽位{slot}"
            ))
        })?;
        *target = Some(ParentRef::new(parent, output));
        Ok(())
    }

    pub fn layer(&self, id: LayerId) -> Result<&LayerHandle, LayerGraphError> {
        self.layers
            .get(id.0)
            .ok_or(LayerGraphError::LayerNotFound(id))
    }

    fn layer_mut(&mut self, id: LayerId) -> Result<&mut LayerHandle, LayerGraphError> {
        self.layers
            .get_mut(id.0)
            .ok_or(LayerGraphError::LayerNotFound(id))
    }

    pub fn node(&self, id: LayerId) -> Result<&LayerNode, LayerGraphError> {
        Ok(&self.layer(id)?.node)
    }

    pub fn parents(&self, id: LayerId) -> Result<&[Option<ParentRef>], LayerGraphError> {
        Ok(&self.layer(id)?.parents)
    }

    /// 所有层（按添加顺序）
    pub fn layers(&self) -> impl Iterator<Item = &LayerHandle> {
        self.layers.iter()
    }
}
