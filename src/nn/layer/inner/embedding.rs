/*
 * @Author       : 老董
 * @Date         : 2026-10-02
 * @Description  : 嵌入层（Embedding）
 *
 * 输入必须是整数类型（词/类别下标），输出为float32。
 * 可选的`input_length`若给出，其秩必须与输入相同，且逐维与输入匹配；
 * 声明为0的维度表示“接受输入的实际长度”，输入中未知的维度也视为匹配。
 * 输出形状：`input_length`（0替换为输入的对应维度）或输入形状，末尾追加`output_dim`。
 */

use crate::errors::{LayerError, check_input_spec, check_parameter};
use crate::nn::layer::{Initializer, InferredTensor, MAX_UNITS, TraitInnerLayer, TraitLayer, single_input};
use crate::nn::params::ParameterBlock;
use crate::tensor::{ElementType, TensorSpec, format_shape, parse_shape};
use crate::utils::python;

const CFG_KEY_INPUT_DIM: &str = "input_dim";
const CFG_KEY_OUTPUT_DIM: &str = "output_dim";
const CFG_KEY_INITIALIZER: &str = "embeddings_initializer";
const CFG_KEY_MASK_ZERO: &str = "mask_zero";
const CFG_KEY_INPUT_LENGTH: &str = "input_length";

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingLayer {
    input_dim: u64,
    output_dim: u64,
    initializer: Initializer,
    mask_zero: bool,
    input_length: Option<Vec<u64>>,
}

impl Default for EmbeddingLayer {
    fn default() -> Self {
        Self {
            input_dim: 1,
            output_dim: 1,
            initializer: Initializer::RandomUniform,
            mask_zero: false,
            input_length: None,
        }
    }
}

impl EmbeddingLayer {
    pub const TYPE_TAG: &'static str = "keras.layers.Embedding";

    pub fn new(input_dim: u64, output_dim: u64) -> Self {
        Self {
            input_dim,
            output_dim,
            ..Self::default()
        }
    }

    pub fn with_input_length(mut self, input_length: Option<Vec<u64>>) -> Self {
        self.input_length = input_length;
        self
    }

    pub fn with_mask_zero(mut self, mask_zero: bool) -> Self {
        self.mask_zero = mask_zero;
        self
    }

    pub fn with_initializer(mut self, initializer: Initializer) -> Self {
        self.initializer = initializer;
        self
    }

    pub fn input_length(&self) -> Option<&[u64]> {
        self.input_length.as_deref()
    }

    fn input_length_string(&self) -> Option<String> {
        self.input_length.as_ref().map(|len| {
            len.iter()
                .map(u64::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        })
    }
}

impl TraitLayer for EmbeddingLayer {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn name_prefix(&self) -> &'static str {
        "embedding"
    }

    fn validate_parameters(&self) -> Result<(), LayerError> {
        check_parameter((1..=MAX_UNITS).contains(&self.input_dim), || {
            format!("输入维度必须在1到{}之间，实际为{}", MAX_UNITS, self.input_dim)
        })?;
        check_parameter((1..=MAX_UNITS).contains(&self.output_dim), || {
            format!("输出维度必须在1到{}之间，实际为{}", MAX_UNITS, self.output_dim)
        })?;
        if let Some(len) = &self.input_length {
            check_parameter(!len.is_empty(), || "输入长度若给出则不能为空".to_string())?;
        }
        Ok(())
    }

    fn save_parameters(&self, params: &mut ParameterBlock) -> Result<(), LayerError> {
        params.add_u64(CFG_KEY_INPUT_DIM, self.input_dim)?;
        params.add_u64(CFG_KEY_OUTPUT_DIM, self.output_dim)?;
        params.add_string(CFG_KEY_INITIALIZER, self.initializer.keras_name());
        params.add_bool(CFG_KEY_MASK_ZERO, self.mask_zero);
        params.add_optional_string(CFG_KEY_INPUT_LENGTH, self.input_length_string().as_deref());
        Ok(())
    }

    fn load_parameters(&mut self, params: &ParameterBlock) -> Result<(), LayerError> {
        self.input_dim = params.get_u64(CFG_KEY_INPUT_DIM)?;
        self.output_dim = params.get_u64(CFG_KEY_OUTPUT_DIM)?;
        self.initializer = Initializer::from_keras_name(&params.get_string(CFG_KEY_INITIALIZER)?)?;
        self.mask_zero = params.get_bool(CFG_KEY_MASK_ZERO)?;
        self.input_length = match params.get_optional_string(CFG_KEY_INPUT_LENGTH)? {
            None => None,
            Some(text) => {
                let shape = parse_shape(&text).map_err(LayerError::InvalidSettings)?;
                let len = shape.into_iter().collect::<Option<Vec<_>>>().ok_or_else(|| {
                    LayerError::InvalidSettings(format!("输入长度`{text}`不能包含未知维度"))
                })?;
                Some(len)
            }
        };
        Ok(())
    }

    fn populate_call(&self, positional: &mut Vec<String>, named: &mut Vec<(String, String)>) {
        positional.push(self.input_dim.to_string());
        positional.push(self.output_dim.to_string());
        named.push((
            "embeddings_initializer".into(),
            python::str_to_python(self.initializer.keras_name()),
        ));
        named.push(("mask_zero".into(), python::bool_to_python(self.mask_zero)));
        let input_length = self.input_length.as_ref().map(|len| {
            python::tuple_to_python(&len.iter().map(u64::to_string).collect::<Vec<_>>())
        });
        named.push((
            "input_length".into(),
            input_length.unwrap_or_else(|| python::NONE.to_string()),
        ));
    }
}

impl TraitInnerLayer for EmbeddingLayer {
    fn num_parents(&self) -> usize {
        1
    }

    fn tensor_op_name(&self) -> &'static str {
        "embedding_lookup"
    }

    fn validate_inputs(&self, inputs: &[&TensorSpec]) -> Result<(), LayerError> {
        let input = single_input(inputs)?;
        check_input_spec(
            input.element_type().is_integer(),
            "Embedding层的输入必须是整数类型",
        )?;
        let Some(input_length) = &self.input_length else {
            return Ok(());
        };
        let matches = input_length.len() == input.rank()
            && input_length
                .iter()
                .zip(input.shape())
                .all(|(&declared, &incoming)| declared == 0 || incoming.is_none_or(|d| d == declared));
        check_input_spec(matches, &format!(
            "输入长度为[{}]，但实际输入的形状为[{}]",
            self.input_length_string().unwrap_or_default(),
            format_shape(input.shape())
        ))
    }

    fn infer_outputs(&self, inputs: &[&TensorSpec]) -> Result<Vec<InferredTensor>, LayerError> {
        let input = single_input(inputs)?;
        let mut shape = match &self.input_length {
            Some(len) => len
                .iter()
                .zip(input.shape())
                .map(|(&declared, &incoming)| if declared == 0 { incoming } else { Some(declared) })
                .collect(),
            None => input.shape().to_vec(),
        };
        shape.push(Some(self.output_dim));
        Ok(vec![InferredTensor::new(shape, ElementType::Float32)])
    }
}
