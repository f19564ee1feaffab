/*
 * @Author       : 老董
 * @Date         : 2026-10-06
 * @Description  : 基础网络输出层：把某个已物化基础网络的输出作为新层图的输入
 *
 * 持久化时保存基础网络的位置、完整规格与输出序号，加载时无需重新访问基础网络。
 */

use crate::errors::{LayerError, LayerGraphError, check_parameter};
use crate::nn::layer::{InputSource, TraitInputLayer, TraitLayer};
use crate::nn::network::{BaseNetwork, BaseNetworkProvider, NetworkLocation, NetworkSpec};
use crate::nn::params::ParameterBlock;
use crate::utils::python;
use std::sync::Arc;

const CFG_KEY_LOCATION: &str = "base_network_location";
const CFG_KEY_SPEC: &str = "base_network_spec";
const CFG_KEY_OUTPUT_INDEX: &str = "output_index";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaseNetworkOutputLayer {
    network: Option<Arc<BaseNetwork>>,
    output_index: usize,
}

impl BaseNetworkOutputLayer {
    pub const TYPE_TAG: &'static str = "dl.BaseNetworkOutput";

    pub fn new(network: Arc<BaseNetwork>, output_index: usize) -> Self {
        Self {
            network: Some(network),
            output_index,
        }
    }

    /// 通过提供者按位置加载基础网络
    pub fn from_provider(
        provider: &dyn BaseNetworkProvider,
        location: &NetworkLocation,
        output_index: usize,
    ) -> Result<Self, LayerGraphError> {
        Ok(Self::new(provider.load(location)?, output_index))
    }

    pub fn network(&self) -> Option<&Arc<BaseNetwork>> {
        self.network.as_ref()
    }

    pub fn output_index(&self) -> usize {
        self.output_index
    }

    fn require_network(&self) -> Result<&Arc<BaseNetwork>, LayerError> {
        self.network
            .as_ref()
            .ok_or_else(|| LayerError::InvalidParameters("尚未指定基础网络".to_string()))
    }
}

impl TraitLayer for BaseNetworkOutputLayer {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn name_prefix(&self) -> &'static str {
        "base_output"
    }

    fn validate_parameters(&self) -> Result<(), LayerError> {
        let network = self.require_network()?;
        let count = network.spec().outputs().len();
        check_parameter(self.output_index < count, || {
            format!(
                "基础网络`{}`只有{}个输出，无法引用第{}个输出",
                network.location(),
                count,
                self.output_index
            )
        })
    }

    fn save_parameters(&self, params: &mut ParameterBlock) -> Result<(), LayerError> {
        let network = self
            .network
            .as_ref()
            .ok_or_else(|| LayerError::InvalidSettings("尚未指定基础网络，无法保存".to_string()))?;
        params.add_string(CFG_KEY_LOCATION, network.location().as_str());
        params.add_value(CFG_KEY_SPEC, network.spec())?;
        params.add_usize(CFG_KEY_OUTPUT_INDEX, self.output_index)
    }

    fn load_parameters(&mut self, params: &ParameterBlock) -> Result<(), LayerError> {
        let location = NetworkLocation::new(params.get_string(CFG_KEY_LOCATION)?);
        let spec: NetworkSpec = params.get_value(CFG_KEY_SPEC)?;
        self.network = Some(Arc::new(BaseNetwork::new(location, spec)));
        self.output_index = params.get_usize(CFG_KEY_OUTPUT_INDEX)?;
        Ok(())
    }

    fn populate_call(&self, positional: &mut Vec<String>, _named: &mut Vec<(String, String)>) {
        if let Some(network) = &self.network {
            positional.push(python::str_to_python(network.location().as_str()));
        }
        positional.push(self.output_index.to_string());
    }
}

impl TraitInputLayer for BaseNetworkOutputLayer {
    fn input_source(&self) -> Result<InputSource<'_>, LayerError> {
        Ok(InputSource::BaseNetwork {
            network: self.require_network()?,
            output_index: self.output_index,
        })
    }
}
