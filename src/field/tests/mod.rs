mod test_bounds_basic;
mod test_extrapolate_basic;
