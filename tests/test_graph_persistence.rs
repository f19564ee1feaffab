/*
 * @Author       : 老董
 * @Date         : 2026-10-02
 * @Description  : 持久化格式的兼容性：手写的JSON结构可直接加载并推断
 */
use keras_layer_graph::assert_err;
use keras_layer_graph::errors::LayerGraphError;
use keras_layer_graph::nn::{GraphSerializer, LayerRegistry};
use serde_json::json;

#[test]
fn test_load_handwritten_graph() {
    let value = json!({
        "1": {
            "class": "keras.layers.Concatenate",
            "parameters": { "num_inputs": 2, "axis": -1 },
            "parents": [2, 3]
        },
        "2": {
            "class": "keras.layers.Embedding",
            "parameters": {
                "input_dim": 100,
                "output_dim": 4,
                "embeddings_initializer": "random_uniform",
                "mask_zero": false,
                "input_length": null
            },
            "parents": [4]
        },
        "3": {
            "class": "keras.layers.Embedding",
            "parameters": {
                "input_dim": 100,
                "output_dim": 6,
                "embeddings_initializer": "random_uniform",
                "mask_zero": false,
                "input_length": "5"
            },
            "parents": [4]
        },
        "4": {
            "class": "keras.layers.Input",
            "name": "tokens",
            "parameters": {
                "shape": "5",
                "batch_size": null,
                "element_type": "int32",
                "dimension_order": "TDHWC"
            }
        },
        "outputs": [1]
    });

    let registry = LayerRegistry::with_builtin_layers();
    let (graph, outputs) = GraphSerializer::new(&registry).decode(&value).unwrap();
    assert_eq!(graph.len(), 4);
    let spec = graph.infer_specs(&outputs).unwrap().into_spec();
    let output = &spec.outputs()[0];
    assert_eq!(output.name(), "concatenate_1/concat:0");
    assert_eq!(output.shape(), &[Some(5), Some(10)]);
    assert_eq!(output.batch_size(), None);
    assert_eq!(spec.inputs()[0].name(), "input_1:0");
}

#[test]
fn test_extension_layer_requires_registration() {
    let value = json!({
        "1": { "class": "org.example.Attention", "parameters": {}, "parents": [2] },
        "2": {
            "class": "keras.layers.Input",
            "parameters": {
                "shape": "3",
                "batch_size": 32,
                "element_type": "float32",
                "dimension_order": "TDHWC"
            }
        },
        "outputs": [1]
    });
    let registry = LayerRegistry::with_builtin_layers();
    assert_err!(
        GraphSerializer::new(&registry).decode(&value),
        LayerGraphError::UnknownLayerType("org.example.Attention")
    );
}
