/*
 * @Author       : 老董
 * @Date         : 2026-10-08
 * @Description  : Rust值 -> Python字面量
 *
 * 层在向后端描述自身调用参数时使用，结果直接拼入生成的Keras代码中
 */

pub const NONE: &str = "None";

pub fn bool_to_python(value: bool) -> String {
    if value { "True" } else { "False" }.to_string()
}

pub fn int_to_python(value: i64) -> String {
    value.to_string()
}

/// 浮点数始终保留小数点（`1.0`而不是`1`）
pub fn float_to_python(value: f64) -> String {
    format!("{value:?}")
}

pub fn str_to_python(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

pub fn optional_to_python<T>(value: Option<T>, convert: impl FnOnce(T) -> String) -> String {
    value.map_or_else(|| NONE.to_string(), convert)
}

/// 形状 -> Python元组，未知维度为`None`，单元素元组带逗号
pub fn shape_to_python(shape: &[Option<u64>]) -> String {
    let dims: Vec<String> = shape
        .iter()
        .map(|d| d.map_or_else(|| NONE.to_string(), |d| d.to_string()))
        .collect();
    tuple_to_python(&dims)
}

pub fn tuple_to_python(items: &[String]) -> String {
    match items.len() {
        1 => format!("({},)", items[0]),
        _ => format!("({})", items.join(", ")),
    }
}

pub fn list_to_python(items: &[String]) -> String {
    format!("[{}]", items.join(", "))
}
