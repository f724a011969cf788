fn main() {
    built::write_built_file().unwrap_or_else(|e| panic!("failed to acquire build-time info: {e}"));
}
