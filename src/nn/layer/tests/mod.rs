use crate::tensor::{ElementType, Shape, TensorSpec};

mod reshape;

/// 测试用的张量规格
fn spec(shape: Shape, element_type: ElementType) -> TensorSpec {
    TensorSpec::named("x:0", shape, element_type)
}
