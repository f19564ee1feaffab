/*
 * @Author       : 老董
 * @Date         : 2026-10-01
 * @Description  : 网络物化（NetworkMaterializer）
 *
 * 把推断完成的层图交给外部后端编译为可执行/可持久化的网络：
 * 1. 先完成整张图的张量规格推断（任何校验失败都在调用后端之前报告）
 * 2. 按拓扑顺序为每个层分配遍历下标，连同参数块、调用参数、父节点下标一起交给后端
 * 3. 由后端组装最终网络
 * 后端返回的错误统一包装为`LayerGraphError::Materialization`，携带出错层的身份。
 */

mod keras_code;

pub use keras_code::{KerasCodeBackend, KerasCodeError};

use crate::errors::LayerGraphError;
use crate::nn::graph::{InferredNetwork, LayerGraph, LayerId, TensorSource};
use crate::nn::layer::{InputSource, LayerNode, TraitInputLayer};
use crate::nn::network::{BaseNetwork, NetworkLocation, NetworkSpec};
use crate::nn::params::ParameterBlock;
use crate::tensor::TensorSpec;
use std::sync::Arc;
use tracing::{debug, error};

/// 对某个基础网络输出的引用
#[derive(Debug, Clone, Copy)]
pub struct BaseOutputRef<'a> {
    pub network: &'a BaseNetwork,
    pub output_index: usize,
}

/// 交给后端的单个层
#[derive(Debug, Clone)]
pub struct LayerCall<'a> {
    /// 遍历下标（从0开始）
    pub index: usize,
    pub layer: LayerId,
    pub type_tag: &'static str,
    /// Keras层名（如`dense_1`）；引用基础网络输出的输入层为`None`
    pub layer_name: Option<&'a str>,
    pub parameters: ParameterBlock,
    /// 位置参数（Python字面量）
    pub positional_args: Vec<String>,
    /// 命名参数（Python字面量）
    pub named_args: Vec<(String, String)>,
    /// 父节点：(遍历下标, 输出端口)，按槽位顺序
    pub parents: Vec<(usize, usize)>,
    pub output_specs: &'a [TensorSpec],
    pub base_output: Option<BaseOutputRef<'a>>,
}

/// 网络输入/输出张量在后端中的位置
#[derive(Debug, Clone, Copy)]
pub enum TensorRef<'a> {
    /// 基础网络的第`index`个输入
    BaseInput { network: &'a BaseNetwork, index: usize },
    /// 基础网络的第`index`个输出
    BaseOutput { network: &'a BaseNetwork, index: usize },
    /// 遍历下标为`index`的层的第`port`个输出
    Layer { index: usize, port: usize },
}

/// 所有层添加完毕后交给后端的组装请求
#[derive(Debug, Clone)]
pub struct BuildRequest<'a> {
    pub spec: &'a NetworkSpec,
    /// 与`spec.inputs()`一一对应
    pub inputs: Vec<TensorRef<'a>>,
    /// 与`spec.outputs()`一一对应
    pub outputs: Vec<TensorRef<'a>>,
    /// 输出层的遍历下标（按输出层列表顺序）
    pub output_layers: Vec<usize>,
}

/// 外部后端
pub trait NetworkBackend {
    type Network;
    type Error: std::error::Error + Send + Sync + 'static;

    /// 按拓扑顺序逐层调用
    fn add_layer(&mut self, call: &LayerCall<'_>) -> Result<(), Self::Error>;

    /// 所有层添加完毕后组装网络
    fn build(&mut self, request: &BuildRequest<'_>) -> Result<Self::Network, Self::Error>;
}

/// 物化结果：后端网络 + 推断出的网络规格
#[derive(Debug, Clone)]
pub struct MaterializedNetwork<N> {
    network: N,
    spec: NetworkSpec,
}

impl<N> MaterializedNetwork<N> {
    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn spec(&self) -> &NetworkSpec {
        &self.spec
    }

    pub fn into_parts(self) -> (N, NetworkSpec) {
        (self.network, self.spec)
    }

    /// 以`location`登记为新的基础网络，供后续继续追加层
    pub fn to_base_network(&self, location: NetworkLocation) -> Arc<BaseNetwork> {
        Arc::new(BaseNetwork::new(location, self.spec.clone()))
    }
}

pub struct NetworkMaterializer<B> {
    backend: B,
}

impl<B: NetworkBackend> NetworkMaterializer<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn materialize(
        &mut self,
        graph: &LayerGraph,
        outputs: &[LayerId],
    ) -> Result<MaterializedNetwork<B::Network>, LayerGraphError> {
        let inferred = graph.infer_specs(outputs)?;
        let order = inferred.order();
        let index_of = |id: LayerId| -> Result<usize, LayerGraphError> {
            order.iter().position(|&l| l == id).ok_or_else(|| {
                LayerGraphError::InvalidOperation(format!("层{id}不在本次遍历中"))
            })
        };

        for (index, &id) in order.iter().enumerate() {
            let layer = graph.layer(id)?;
            let node = layer.node();
            let mut parameters = ParameterBlock::new();
            node.as_layer()
                .save_parameters(&mut parameters)
                .map_err(|e| e.at_layer(id, &layer.display_name()))?;
            let mut positional_args = Vec::new();
            let mut named_args = Vec::new();
            node.as_layer()
                .populate_call(&mut positional_args, &mut named_args);
            let parents = layer
                .parents()
                .iter()
                .flatten()
                .map(|p| index_of(p.layer).map(|index| (index, p.output)))
                .collect::<Result<Vec<_>, LayerGraphError>>()?;
            let base_output = match node {
                LayerNode::Input(input) => match input
                    .input_source()
                    .map_err(|e| e.at_layer(id, &layer.display_name()))?
                {
                    InputSource::BaseNetwork {
                        network,
                        output_index,
                    } => Some(BaseOutputRef {
                        network: network.as_ref(),
                        output_index,
                    }),
                    InputSource::Declared { .. } => None,
                },
                LayerNode::Inner(_) => None,
            };
            let call = LayerCall {
                index,
                layer: id,
                type_tag: node.type_tag(),
                layer_name: inferred.layer_name(id),
                parameters,
                positional_args,
                named_args,
                parents,
                output_specs: inferred.layer_specs(id).unwrap_or_default(),
                base_output,
            };
            self.backend.add_layer(&call).map_err(|e| {
                let name = inferred
                    .layer_name(id)
                    .map_or_else(|| layer.display_name(), str::to_string);
                error!(layer = %id, name = %name, error = %e, "后端编译层失败");
                LayerGraphError::Materialization {
                    layer: name,
                    source: Box::new(e),
                }
            })?;
        }

        let request = BuildRequest {
            spec: inferred.spec(),
            inputs: inferred
                .input_sources()
                .iter()
                .map(|source| tensor_ref(&inferred, *source))
                .collect::<Result<Vec<_>, _>>()?,
            outputs: inferred
                .output_sources()
                .iter()
                .map(|source| tensor_ref(&inferred, *source))
                .collect::<Result<Vec<_>, _>>()?,
            output_layers: outputs
                .iter()
                .map(|&id| index_of(id))
                .collect::<Result<Vec<_>, _>>()?,
        };
        let network = self
            .backend
            .build(&request)
            .map_err(|e| {
                let names = outputs
                    .iter()
                    .map(|&id| {
                        inferred
                            .layer_name(id)
                            .map_or_else(|| id.to_string(), str::to_string)
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                error!(outputs = %names, error = %e, "后端组装网络失败");
                LayerGraphError::Materialization {
                    layer: names,
                    source: Box::new(e),
                }
            })?;
        debug!(layers = order.len(), "层图物化完成");
        Ok(MaterializedNetwork {
            network,
            spec: inferred.into_spec(),
        })
    }
}

fn tensor_ref(
    inferred: &InferredNetwork,
    source: TensorSource,
) -> Result<TensorRef<'_>, LayerGraphError> {
    let base = |network: usize| {
        inferred
            .base_networks()
            .get(network)
            .map(|b| b.as_ref())
            .ok_or_else(|| {
                LayerGraphError::InvalidOperation(format!("基础网络{network}不在本次推断中"))
            })
    };
    Ok(match source {
        TensorSource::BaseInput { network, index } => TensorRef::BaseInput {
            network: base(network)?,
            index,
        },
        TensorSource::BaseOutput { network, index } => TensorRef::BaseOutput {
            network: base(network)?,
            index,
        },
        TensorSource::BaseHiddenOutput { .. } => {
            return Err(LayerGraphError::InvalidOperation(
                "隐藏输出不能作为网络的输入或输出".to_string(),
            ));
        }
        TensorSource::Layer { layer, port } => {
            let index = inferred
                .order()
                .iter()
                .position(|&l| l == layer)
                .ok_or_else(|| {
                    LayerGraphError::InvalidOperation(format!("层{layer}不在本次遍历中"))
                })?;
            TensorRef::Layer { index, port }
        }
    })
}
