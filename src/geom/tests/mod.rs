mod test_bvh_basic;
mod test_triangulation_basic;
