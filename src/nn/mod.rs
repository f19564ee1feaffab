/*
 * @Author       : 老董
 * @Date         : 2026-10-05
 * @Description  : 层图（layer graph）的构建、推断、物化与序列化
 *
 * - `layer`：各种层及其参数、形状推断规则
 * - `graph`：层图本身、确定性遍历、规格推断与序列化
 * - `materializer`：按拓扑顺序把层图交给外部后端构建
 * - `network`：网络规格与可被继续追加的基础网络
 * - `training`：损失函数、优化器与训练配置
 */

mod descriptor;
mod graph;
pub mod layer;
pub mod materializer;
mod network;
mod params;
mod registry;
pub mod training;

pub use descriptor::{GraphDescriptor, NodeDescriptor, NodeKind};
pub use graph::{
    GraphIterator, GraphSerializer, InferredNetwork, KEY_OUTPUTS, LayerGraph, LayerHandle, LayerId,
    LayerVisitor, ParentRef, TensorNameGenerator, TensorSource,
};
pub use layer::{LayerNode, TraitInnerLayer, TraitInputLayer, TraitLayer};
pub use materializer::{
    BuildRequest, MaterializedNetwork, NetworkBackend, NetworkMaterializer, TensorRef,
};
pub use network::{BaseNetwork, BaseNetworkProvider, InMemoryNetworkProvider, NetworkLocation, NetworkSpec};
pub use params::ParameterBlock;
pub use registry::{LayerFactory, LayerRegistry};
pub use training::{LossFunction, Optimizer, TrainingConfig, TrainingRegistry};

#[cfg(test)]
mod tests;
