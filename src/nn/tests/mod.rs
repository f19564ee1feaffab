use crate::nn::layer::DefaultInputLayer;
use crate::nn::{BaseNetwork, NetworkLocation, NetworkSpec};
use crate::tensor::{ElementType, TensorSpec};
use std::sync::Arc;

mod infer;
mod iterator;
mod serialization;

/// float32输入，批大小32
fn input(dims: &[u64]) -> DefaultInputLayer {
    DefaultInputLayer::new(dims.iter().map(|&d| Some(d)).collect(), ElementType::Float32)
}

fn float_spec(name: &str, dims: &[u64]) -> TensorSpec {
    TensorSpec::named(name, dims.iter().map(|&d| Some(d)).collect(), ElementType::Float32)
}

/// 一个输入`input_1:0`、一个隐藏输出`dense_1/BiasAdd:0`，以及给定输出的基础网络
fn base_network(location: &str, outputs: &[(&str, &[u64])]) -> Arc<BaseNetwork> {
    let spec = NetworkSpec::new(
        vec![float_spec("input_1:0", &[4]).with_batch_size(Some(32))],
        vec![float_spec("dense_1/BiasAdd:0", &[8])],
        outputs
            .iter()
            .map(|&(name, dims)| float_spec(name, dims))
            .collect(),
    );
    Arc::new(BaseNetwork::new(NetworkLocation::new(location), spec))
}

/// `num_inputs`个输入`input_k:0`（形状[4]）、`num_outputs`个输出`dense_k/BiasAdd:0`（形状[3]）的基础网络；
/// 不同位置生成的网络张量名互相重叠
fn multi_io_base_network(location: &str, num_inputs: usize, num_outputs: usize) -> Arc<BaseNetwork> {
    let spec = NetworkSpec::new(
        (1..=num_inputs)
            .map(|k| float_spec(&format!("input_{k}:0"), &[4]).with_batch_size(Some(32)))
            .collect(),
        vec![],
        (1..=num_outputs)
            .map(|k| float_spec(&format!("dense_{k}/BiasAdd:0"), &[3]))
            .collect(),
    );
    Arc::new(BaseNetwork::new(NetworkLocation::new(location), spec))
}

fn names(specs: &[TensorSpec]) -> Vec<&str> {
    specs.iter().map(TensorSpec::name).collect()
}
