mod test_extract;
mod test_show;
