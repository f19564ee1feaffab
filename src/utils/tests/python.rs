use crate::utils::python::*;

#[test]
fn test_scalar_literals() {
    assert_eq!(bool_to_python(true), "True");
    assert_eq!(bool_to_python(false), "False");
    assert_eq!(int_to_python(-3), "-3");
    assert_eq!(float_to_python(1.0), "1.0");
    assert_eq!(float_to_python(0.25), "0.25");
    assert_eq!(str_to_python("it's"), "'it\\'s'");
    assert_eq!(optional_to_python(None::<i64>, int_to_python), "None");
    assert_eq!(optional_to_python(Some(7), int_to_python), "7");
}

#[test]
fn test_shape_literals() {
    assert_eq!(shape_to_python(&[Some(10)]), "(10,)");
    assert_eq!(shape_to_python(&[None, Some(3)]), "(None, 3)");
    assert_eq!(shape_to_python(&[]), "()");
    assert_eq!(list_to_python(&["a".into(), "b".into()]), "[a, b]");
}
