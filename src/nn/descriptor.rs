/*
 * @Author       : 老董
 * @Date         : 2026-09-03
 * @Description  : 层图描述符（Graph Descriptor）
 *                 推断完成后的层图快照，用于调试输出、摘要和外部工具
 */

use crate::nn::graph::ParentRef;
use crate::nn::params::ParameterBlock;
use crate::tensor::TensorSpec;
use serde::{Deserialize, Serialize};

/// 层图的可序列化描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDescriptor {
    /// 格式版本（用于向后兼容）
    pub version: String,
    /// 图名称
    pub name: String,
    /// 所有层描述（按遍历顺序）
    pub nodes: Vec<NodeDescriptor>,
    /// 输出层 ID 列表（保持输出顺序）
    pub outputs: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Input,
    Inner,
}

/// 层描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// 层 ID
    pub id: usize,
    /// 层名称（Keras层名，没有时为显示名）
    pub name: String,
    pub kind: NodeKind,
    /// 类型标记
    pub type_tag: String,
    pub parameters: ParameterBlock,
    /// 推断出的输出规格
    pub output_specs: Vec<TensorSpec>,
    /// 父节点（定义拓扑）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<ParentRef>,
}

impl GraphDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            name: name.to_string(),
            nodes: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn add_node(&mut self, node: NodeDescriptor) {
        self.nodes.push(node);
    }

    pub fn node(&self, id: usize) -> Option<&NodeDescriptor> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// 输入层个数
    pub fn num_inputs(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Input)
            .count()
    }

    /// 转换为 JSON 字符串
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// 从 JSON 字符串解析
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
