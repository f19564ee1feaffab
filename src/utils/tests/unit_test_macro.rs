use crate::assert_err;
use crate::errors::LayerGraphError;

fn unknown(tag: &str) -> Result<(), LayerGraphError> {
    Err(LayerGraphError::UnknownLayerType(tag.to_string()))
}

#[test]
fn test_assert_err_macro() {
    assert_err!(unknown("keras.layers.Foo"));
    assert_err!(
        unknown("keras.layers.Foo"),
        LayerGraphError::UnknownLayerType("keras.layers.Foo")
    );
    assert_err!(unknown("keras.layers.Foo"), LayerGraphError::UnknownLayerType(_));
    assert_err!(
        unknown("keras.layers.Foo"),
        LayerGraphError::UnknownLayerType(tag) if tag.ends_with("Foo")
    );
}

#[test]
#[should_panic]
fn test_assert_err_macro_on_ok() {
    let ok: Result<u8, LayerGraphError> = Ok(1);
    assert_err!(ok);
}
