//! # Keras Layer Graph
//!
//! `keras_layer_graph`用来描述Keras风格的层图：
//! 逐层搭建有向无环图，推断每个张量的形状与类型（并生成Keras风格的层名/张量名），
//! 把层图按拓扑顺序交给外部后端物化，以及把层图持久化为JSON并读回。
//! 已物化的网络可以作为基础网络，在其输出之上继续追加新层。
//!

pub mod errors;
pub mod nn;
pub mod tensor;
pub mod utils;
