fn main() {
    // Host builds (library + tests) have no ESP-IDF environment to forward.
    if std::env::var("CARGO_FEATURE_FIRMWARE").is_ok() {
        embuild::espidf::sysenv::output();
    }
}
