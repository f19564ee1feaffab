use super::{base_network, input};
use crate::assert_err;
use crate::errors::LayerGraphError;
use crate::nn::layer::{AddLayer, BaseNetworkOutputLayer, DenseLayer, LstmLayer};
use crate::nn::{GraphSerializer, LayerGraph, LayerId, LayerRegistry, ParentRef};
use serde_json::{Value, json};
use std::sync::Arc;

/// in -> d1 -> {d2, d3} -> add
fn fork_join() -> (LayerGraph, LayerId) {
    let mut graph = LayerGraph::new();
    let in1 = graph.add_layer(input(&[4]));
    let d1 = graph.add_layer_with_parents(DenseLayer::new(4), &[in1]).unwrap();
    let d2 = graph.add_layer_with_parents(DenseLayer::new(4), &[d1]).unwrap();
    let d3 = graph.add_layer_with_parents(DenseLayer::new(4), &[d1]).unwrap();
    let add = graph.add_layer_with_parents(AddLayer::new(), &[d2, d3]).unwrap();
    (graph, add)
}

#[test]
fn test_encode_layout() {
    let registry = LayerRegistry::with_builtin_layers();
    let (graph, add) = fork_join();
    let value = GraphSerializer::new(&registry).encode(&graph, &[add]).unwrap();

    assert_eq!(value["outputs"], json!([1]));
    assert_eq!(value["1"]["class"], "keras.layers.Add");
    assert_eq!(value["1"]["parents"], json!([2, 3]));
    assert_eq!(value["2"]["parents"], json!([4]));
    assert_eq!(value["3"]["parents"], json!([4]));
    assert_eq!(value["4"]["parents"], json!([5]));
    assert_eq!(value["5"]["class"], "keras.layers.Input");
    assert!(value["5"].get("parents").is_none());
    assert!(value["1"].get("parent_outputs").is_none());
    assert!(value["1"].get("name").is_none());
    assert_eq!(value["4"]["parameters"]["units"], 4);
    assert_eq!(value.as_object().unwrap().len(), 6);
}

#[test]
fn test_round_trip_preserves_inference() {
    let registry = LayerRegistry::with_builtin_layers();
    let serializer = GraphSerializer::new(&registry);
    let (graph, add) = fork_join();
    let value = serializer.encode(&graph, &[add]).unwrap();
    let (decoded, outputs) = serializer.decode(&value).unwrap();

    assert_eq!(outputs.len(), 1);
    assert_eq!(decoded.len(), 5);
    assert_eq!(
        decoded.infer_specs(&outputs).unwrap().into_spec(),
        graph.infer_specs(&[add]).unwrap().into_spec()
    );
    // 再次编码得到相同的结构
    assert_eq!(serializer.encode(&decoded, &outputs).unwrap(), value);
}

#[test]
fn test_round_trip_names_and_ports() {
    let registry = LayerRegistry::with_builtin_layers();
    let serializer = GraphSerializer::new(&registry);
    let mut graph = LayerGraph::new();
    let in1 = graph.add_layer(input(&[6, 3]));
    let lstm = graph
        .add_layer_with_parents(LstmLayer::new(4).with_return_state(true), &[in1])
        .unwrap();
    let head_id = graph.add_named_layer("head", DenseLayer::new(2));
    graph.set_parent_output(head_id, 0, lstm, 2).unwrap();

    let value = serializer.encode(&graph, &[head_id, lstm]).unwrap();
    assert_eq!(value["outputs"], json!([1, 2]));
    assert_eq!(value["1"]["name"], "head");
    assert_eq!(value["1"]["parents"], json!([2]));
    assert_eq!(value["1"]["parent_outputs"], json!([2]));

    let (decoded, outputs) = serializer.decode(&value).unwrap();
    let head = decoded.layer(outputs[0]).unwrap();
    assert_eq!(head.name(), Some("head"));
    assert_eq!(head.parents(), &[Some(ParentRef::new(outputs[1], 2))]);
    assert_eq!(
        decoded.infer_specs(&outputs).unwrap().into_spec(),
        graph.infer_specs(&[head_id, lstm]).unwrap().into_spec()
    );
}

#[test]
fn test_round_trip_base_network_reference() {
    let registry = LayerRegistry::with_builtin_layers();
    let serializer = GraphSerializer::new(&registry);
    let base = base_network("file:///base.h5", &[("dense_2/BiasAdd:0", &[3])]);
    let mut graph = LayerGraph::new();
    let out = graph.add_layer(BaseNetworkOutputLayer::new(Arc::clone(&base), 0));
    let dense = graph.add_layer_with_parents(DenseLayer::new(5), &[out]).unwrap();

    let mut buffer = Vec::new();
    serializer.write_graph_to(&graph, &[dense], &mut buffer).unwrap();
    let (decoded, outputs) = serializer.read_graph_from(buffer.as_slice()).unwrap();
    assert_eq!(
        decoded.infer_specs(&outputs).unwrap().into_spec(),
        graph.infer_specs(&[dense]).unwrap().into_spec()
    );
}

#[test]
fn test_decode_is_independent_of_index_order() {
    let registry = LayerRegistry::with_builtin_layers();
    let (graph, add) = fork_join();
    let mut value = GraphSerializer::new(&registry).encode(&graph, &[add]).unwrap();
    // 父节点下标小于子节点下标的结构同样可以加载
    let root = value.as_object_mut().unwrap();
    let input_node = root.remove("5").unwrap();
    let first = root.remove("1").unwrap();
    root.insert("1".to_string(), input_node);
    root.insert("5".to_string(), first);
    for key in ["2", "3", "4"] {
        let parents = &mut root[key]["parents"];
        *parents = json!(parents.as_array().unwrap().iter().map(|p| match p.as_u64() {
            Some(5) => 1,
            Some(other) => other,
            None => 0,
        }).collect::<Vec<_>>());
    }
    root["5"]["parents"] = json!([2, 3]);
    root.insert("outputs".to_string(), json!([5]));

    let (decoded, outputs) = GraphSerializer::new(&registry).decode(&value).unwrap();
    assert_eq!(
        decoded.infer_specs(&outputs).unwrap().into_spec(),
        graph.infer_specs(&[add]).unwrap().into_spec()
    );
}

#[test]
fn test_unknown_layer_type() {
    let registry = LayerRegistry::with_builtin_layers();
    let value = json!({
        "1": { "class": "keras.layers.Foo", "parameters": {} },
        "outputs": [1]
    });
    assert_err!(
        GraphSerializer::new(&registry).decode(&value),
        LayerGraphError::UnknownLayerType(tag) if tag == "keras.layers.Foo"
    );
}

#[test]
fn test_malformed_structures() {
    let registry = LayerRegistry::with_builtin_layers();
    let serializer = GraphSerializer::new(&registry);
    let (graph, add) = fork_join();
    let valid = serializer.encode(&graph, &[add]).unwrap();

    let mut missing_outputs = valid.clone();
    missing_outputs.as_object_mut().unwrap().remove("outputs");
    let mut missing_node = valid.clone();
    missing_node.as_object_mut().unwrap().remove("3");
    let mut dangling_parent = valid.clone();
    dangling_parent["2"]["parents"] = json!([9]);
    let mut wrong_arity = valid.clone();
    wrong_arity["1"]["parents"] = json!([2]);
    let mut bad_port = valid.clone();
    bad_port["1"]["parent_outputs"] = json!([0, 1]);
    let mut bad_parameters = valid.clone();
    bad_parameters["4"]["parameters"] = json!({ "units": "four" });

    for value in [
        Value::Null,
        json!({ "outputs": "1" }),
        missing_outputs,
        missing_node,
        dangling_parent,
        wrong_arity,
        bad_port,
        bad_parameters,
    ] {
        assert_err!(
            serializer.decode(&value),
            LayerGraphError::GraphDeserialization { .. }
        );
    }
}

#[test]
fn test_decode_validates_parameters_before_allocating_slots() {
    let registry = LayerRegistry::with_builtin_layers();
    let serializer = GraphSerializer::new(&registry);
    let input = json!({
        "class": "keras.layers.Input",
        "parameters": {
            "shape": "4",
            "batch_size": 32,
            "element_type": "float32",
            "dimension_order": "TDHWC"
        }
    });
    // 巨大的输入个数在加入层图之前就被拒绝
    let huge_arity = json!({
        "1": {
            "class": "keras.layers.Concatenate",
            "parameters": { "num_inputs": i64::MAX, "axis": -1 },
            "parents": [2, 2]
        },
        "2": input.clone(),
        "outputs": [1]
    });
    assert_err!(
        serializer.decode(&huge_arity),
        LayerGraphError::GraphDeserialization { source: Some(_), .. }
    );

    let zero_units = json!({
        "1": {
            "class": "keras.layers.Dense",
            "parameters": {
                "units": 0,
                "activation": "linear",
                "use_bias": true,
                "kernel_initializer": "glorot_uniform",
                "bias_initializer": "zeros"
            },
            "parents": [2]
        },
        "2": input.clone(),
        "outputs": [1]
    });
    assert_err!(
        serializer.decode(&zero_units),
        LayerGraphError::GraphDeserialization { source: Some(_), .. }
    );

    // 记录的父节点个数与层的槽位数不一致
    let arity_mismatch = json!({
        "1": {
            "class": "keras.layers.Concatenate",
            "parameters": { "num_inputs": 3, "axis": -1 },
            "parents": [2, 2]
        },
        "2": input,
        "outputs": [1]
    });
    assert_err!(
        serializer.decode(&arity_mismatch),
        LayerGraphError::GraphDeserialization { .. }
    );
}

#[test]
fn test_decode_rejects_cycle() {
    let registry = LayerRegistry::with_builtin_layers();
    let (graph, add) = fork_join();
    let mut value = GraphSerializer::new(&registry).encode(&graph, &[add]).unwrap();
    // dense(4) 的父节点改为 add(1)
    value["4"]["parents"] = json!([1]);
    assert_err!(
        GraphSerializer::new(&registry).decode(&value),
        LayerGraphError::GraphDeserialization { source: Some(_), .. }
    );
}

#[test]
fn test_read_invalid_json() {
    let registry = LayerRegistry::with_builtin_layers();
    assert_err!(
        GraphSerializer::new(&registry).read_graph_from("{ not json".as_bytes()),
        LayerGraphError::GraphDeserialization { .. }
    );
}

#[test]
fn test_encode_unbound_parent_fails() {
    let registry = LayerRegistry::with_builtin_layers();
    let mut graph = LayerGraph::new();
    let in1 = graph.add_layer(input(&[4]));
    let add = graph.add_layer(AddLayer::new());
    graph.set_parent(add, 0, in1).unwrap();
    assert_err!(
        GraphSerializer::new(&registry).encode(&graph, &[add]),
        LayerGraphError::GraphSerialization { .. }
    );
}
