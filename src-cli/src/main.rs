fn main() -> std::process::ExitCode {
    fir_cli::run()
}
