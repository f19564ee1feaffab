/*
 * @Author       : 老董
 * @Date         : 2026-10-11
 * @Description  : 默认输入层：用户声明的新网络输入
 */

use crate::errors::{LayerError, check_parameter};
use crate::nn::layer::{InputSource, TraitInputLayer, TraitLayer};
use crate::nn::params::ParameterBlock;
use crate::tensor::{DimensionOrder, ElementType, Shape, format_shape, parse_shape};
use crate::utils::python;

const CFG_KEY_SHAPE: &str = "shape";
const CFG_KEY_BATCH_SIZE: &str = "batch_size";
const CFG_KEY_ELEMENT_TYPE: &str = "element_type";
const CFG_KEY_DIMENSION_ORDER: &str = "dimension_order";

#[derive(Debug, Clone, PartialEq)]
pub struct DefaultInputLayer {
    shape: Shape,
    batch_size: Option<u64>,
    element_type: ElementType,
    dimension_order: DimensionOrder,
}

impl Default for DefaultInputLayer {
    /// 形状`[1]`、批大小32、float32
    fn default() -> Self {
        Self {
            shape: vec![Some(1)],
            batch_size: Some(32),
            element_type: ElementType::Float32,
            dimension_order: DimensionOrder::default(),
        }
    }
}

impl DefaultInputLayer {
    pub const TYPE_TAG: &'static str = "keras.layers.Input";

    pub fn new(shape: Shape, element_type: ElementType) -> Self {
        Self {
            shape,
            element_type,
            ..Self::default()
        }
    }

    pub fn with_batch_size(mut self, batch_size: Option<u64>) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_dimension_order(mut self, dimension_order: DimensionOrder) -> Self {
        self.dimension_order = dimension_order;
        self
    }

    pub fn shape(&self) -> &[Option<u64>] {
        &self.shape
    }

    pub fn batch_size(&self) -> Option<u64> {
        self.batch_size
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }
}

impl TraitLayer for DefaultInputLayer {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn name_prefix(&self) -> &'static str {
        "input"
    }

    fn validate_parameters(&self) -> Result<(), LayerError> {
        check_parameter(!self.shape.is_empty(), || "输入形状不能为空".to_string())?;
        check_parameter(self.shape.iter().all(|d| d.is_none_or(|d| d >= 1)), || {
            format!("输入形状[{}]中的维度必须为正数", format_shape(&self.shape))
        })?;
        check_parameter(self.batch_size.is_none_or(|b| b >= 1), || {
            "批大小必须为正数".to_string()
        })
    }

    fn save_parameters(&self, params: &mut ParameterBlock) -> Result<(), LayerError> {
        params.add_string(CFG_KEY_SHAPE, &format_shape(&self.shape));
        params.add_optional_u64(CFG_KEY_BATCH_SIZE, self.batch_size)?;
        params.add_string(CFG_KEY_ELEMENT_TYPE, self.element_type.name());
        params.add_string(CFG_KEY_DIMENSION_ORDER, self.dimension_order.name());
        Ok(())
    }

    fn load_parameters(&mut self, params: &ParameterBlock) -> Result<(), LayerError> {
        self.shape = parse_shape(&params.get_string(CFG_KEY_SHAPE)?).map_err(LayerError::InvalidSettings)?;
        self.batch_size = params
            .get_optional_int(CFG_KEY_BATCH_SIZE)?
            .map(|b| {
                u64::try_from(b)
                    .map_err(|_| LayerError::InvalidSettings(format!("批大小{b}不能为负数")))
            })
            .transpose()?;
        let element_type = params.get_string(CFG_KEY_ELEMENT_TYPE)?;
        self.element_type = ElementType::from_name(&element_type).ok_or_else(|| {
            LayerError::InvalidSettings(format!("未知的元素类型`{element_type}`"))
        })?;
        let dimension_order = params.get_string(CFG_KEY_DIMENSION_ORDER)?;
        self.dimension_order = DimensionOrder::from_name(&dimension_order).ok_or_else(|| {
            LayerError::InvalidSettings(format!("未知的维度顺序`{dimension_order}`"))
        })?;
        Ok(())
    }

    fn populate_call(&self, _positional: &mut Vec<String>, named: &mut Vec<(String, String)>) {
        named.push(("shape".into(), python::shape_to_python(&self.shape)));
        named.push((
            "batch_size".into(),
            python::optional_to_python(self.batch_size, |b| b.to_string()),
        ));
        named.push(("dtype".into(), python::str_to_python(self.element_type.name())));
    }
}

impl TraitInputLayer for DefaultInputLayer {
    fn input_source(&self) -> Result<InputSource<'_>, LayerError> {
        Ok(InputSource::Declared {
            shape: self.shape.clone(),
            batch_size: self.batch_size,
            element_type: self.element_type,
            dimension_order: self.dimension_order,
        })
    }
}
