fn main() {
    std::process::exit(automated_installer::run(std::env::args_os()));
}
