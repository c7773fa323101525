//! Binary entry point: wires up logging and runs the REPL until EOF or
//! `exit`, reporting that exit code as the process's own.

use poshell::Shell;

fn main() {
    env_logger::init();

    let mut shell = Shell::new();
    let code = shell.run();
    std::process::exit(code);
}
