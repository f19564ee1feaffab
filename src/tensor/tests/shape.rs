use crate::tensor::{fixed_shape, format_shape, num_elements, parse_shape};

#[test]
fn test_parse_shape() {
    assert_eq!(parse_shape("1").unwrap(), vec![Some(1)]);
    assert_eq!(parse_shape("10, ?").unwrap(), vec![Some(10), None]);
    assert_eq!(parse_shape("(28, 28, None)").unwrap(), vec![Some(28), Some(28), None]);
    assert_eq!(parse_shape("(5,)").unwrap(), vec![Some(5)]);
    assert!(parse_shape("").is_err());
    assert!(parse_shape("()").is_err());
    assert!(parse_shape("3, -1").is_err());
    assert!(parse_shape("a").is_err());
}

#[test]
fn test_format_shape_round_trips_through_parse() {
    let shape = vec![Some(3), None, Some(7)];
    let text = format_shape(&shape);
    assert_eq!(text, "3, ?, 7");
    assert_eq!(parse_shape(&text).unwrap(), shape);
}

#[test]
fn test_fixed_shape_and_num_elements() {
    assert_eq!(fixed_shape(&[Some(2), Some(3)]), Some(vec![2, 3]));
    assert_eq!(fixed_shape(&[Some(2), None]), None);
    assert_eq!(num_elements(&[Some(2), Some(3), Some(4)]), Ok(Some(24)));
    assert_eq!(num_elements(&[None]), Ok(None));
    assert!(num_elements(&[Some(1 << 32), Some(1 << 32)]).is_err());
}
