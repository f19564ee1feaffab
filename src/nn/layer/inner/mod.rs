mod activation;
mod add;
mod concatenate;
mod dense;
mod dropout;
mod embedding;
mod flatten;
mod lstm;
mod reshape;

pub use activation::ActivationLayer;
pub use add::AddLayer;
pub use concatenate::ConcatenateLayer;
pub use dense::DenseLayer;
pub use dropout::DropoutLayer;
pub use embedding::EmbeddingLayer;
pub use flatten::FlattenLayer;
pub use lstm::LstmLayer;
pub use reshape::ReshapeLayer;
