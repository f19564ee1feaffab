/*
 * @Author       : 老董
 * @Date         : 2026-10-14
 * @Description  : 网络级规格与基础网络（Base Network）
 *
 * 基础网络：已经物化/训练过的网络，其输出可作为新追加层的输入。
 * 本crate只读取它声明的规格，不关心其如何被加载或执行。
 */

use crate::errors::LayerGraphError;
use crate::tensor::{TensorId, TensorSpec};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 网络的完整规格：输入、隐藏输出、输出（均按声明顺序）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSpec {
    inputs: Vec<TensorSpec>,
    #[serde(default)]
    hidden_outputs: Vec<TensorSpec>,
    outputs: Vec<TensorSpec>,
}

impl NetworkSpec {
    pub fn new(inputs: Vec<TensorSpec>, hidden_outputs: Vec<TensorSpec>, outputs: Vec<TensorSpec>) -> Self {
        Self {
            inputs,
            hidden_outputs,
            outputs,
        }
    }

    pub fn inputs(&self) -> &[TensorSpec] {
        &self.inputs
    }

    pub fn hidden_outputs(&self) -> &[TensorSpec] {
        &self.hidden_outputs
    }

    pub fn outputs(&self) -> &[TensorSpec] {
        &self.outputs
    }

    /// 依次遍历输入、隐藏输出、输出
    pub fn all_specs(&self) -> impl Iterator<Item = &TensorSpec> {
        self.inputs
            .iter()
            .chain(&self.hidden_outputs)
            .chain(&self.outputs)
    }

    pub fn find(&self, id: &TensorId) -> Option<&TensorSpec> {
        self.all_specs().find(|spec| spec.id() == id)
    }
}

/// 网络的位置（文件路径、URI或宿主定义的句柄）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkLocation(pub String);

impl NetworkLocation {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 已物化的基础网络：位置 + 规格（只读）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseNetwork {
    location: NetworkLocation,
    spec: NetworkSpec,
}

impl BaseNetwork {
    pub fn new(location: NetworkLocation, spec: NetworkSpec) -> Self {
        Self { location, spec }
    }

    pub fn location(&self) -> &NetworkLocation {
        &self.location
    }

    pub fn spec(&self) -> &NetworkSpec {
        &self.spec
    }

    pub fn output_spec(&self, index: usize) -> Option<&TensorSpec> {
        self.spec.outputs.get(index)
    }
}

/// 基础网络提供者：根据位置返回完整规格的网络（由宿主实现）
pub trait BaseNetworkProvider {
    fn load(&self, location: &NetworkLocation) -> Result<Arc<BaseNetwork>, LayerGraphError>;
}

/// 内存中的基础网络提供者
#[derive(Debug, Default)]
pub struct InMemoryNetworkProvider {
    networks: HashMap<NetworkLocation, Arc<BaseNetwork>>,
}

impl InMemoryNetworkProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个网络，返回其共享引用
    pub fn insert(&mut self, network: BaseNetwork) -> Arc<BaseNetwork> {
        let network = Arc::new(network);
        self.networks
            .insert(network.location().clone(), Arc::clone(&network));
        network
    }
}

impl BaseNetworkProvider for InMemoryNetworkProvider {
    fn load(&self, location: &NetworkLocation) -> Result<Arc<BaseNetwork>, LayerGraphError> {
        self.networks.get(location).cloned().ok_or_else(|| {
            LayerGraphError::InvalidOperation(format!("找不到位于`{location}`的基础网络"))
        })
    }
}
