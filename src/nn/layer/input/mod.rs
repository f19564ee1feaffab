mod base_network;
mod default;

pub use base_network::BaseNetworkOutputLayer;
pub use default::DefaultInputLayer;
