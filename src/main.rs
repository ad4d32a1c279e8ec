fn main() -> std::process::ExitCode {
    fabric_quick_setup_lib::run()
}
