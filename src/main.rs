fn main() {
    if let Err(e) = cube_duck::core::Engine::run() {
        eprintln!("cube_duck failed: {}", e);
        std::process::exit(1);
    }
}
