use bootstrap_scheme::{cmdline, Interpreter};

fn main() -> std::io::Result<()> {
    pretty_env_logger::init();
    let mut interpreter = Interpreter::new();
    cmdline::run(&mut interpreter)
}
