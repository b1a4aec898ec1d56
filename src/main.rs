fn main() {
    if let Err(e) = health_profiler::run() {
        eprintln!("health-profiler: {e}");
        std::process::exit(1);
    }
}
