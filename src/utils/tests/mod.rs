mod python;
mod unit_test_macro;
